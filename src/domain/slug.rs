//! Slug allocation
//!
//! Turns a product name (or an explicit slug request) into a URL-safe slug and
//! resolves collisions with existing products by appending `-<n>`, where `n`
//! is one more than the highest numeric suffix already in use for that base.
//!
//! The lookup and the later write are not atomic. The store's unique index on
//! non-empty slugs is the authoritative guard; writers treat a conflict on
//! save as a signal to allocate again (see `services::products`).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductPatch};
use crate::domain::value_objects::Slug;
use crate::store::{ProductStore, StoreError};

/// Normalized slugs shorter than this fall back to a generated placeholder.
pub const MIN_SLUG_LEN: usize = 2;
pub const FALLBACK_PREFIX: &str = "item";
/// Allocate-and-write attempts before a slug conflict is reported to the caller.
pub const MAX_SLUG_ATTEMPTS: u32 = 3;

/// Applied in order after lowercasing.
const TRANSLITERATIONS: &[(&str, &str)] = &[
    ("ä", "ae"),
    ("ö", "oe"),
    ("ü", "ue"),
    ("ß", "ss"),
    ("æ", "ae"),
    ("œ", "oe"),
    ("ø", "o"),
    ("å", "a"),
    ("á", "a"),
    ("à", "a"),
    ("â", "a"),
    ("ã", "a"),
    ("é", "e"),
    ("è", "e"),
    ("ê", "e"),
    ("ë", "e"),
    ("í", "i"),
    ("ì", "i"),
    ("î", "i"),
    ("ï", "i"),
    ("ó", "o"),
    ("ò", "o"),
    ("ô", "o"),
    ("õ", "o"),
    ("ú", "u"),
    ("ù", "u"),
    ("û", "u"),
    ("ñ", "n"),
    ("ç", "c"),
    ("&", " and "),
];

/// Lowercase, transliterate, collapse every run outside `[a-z0-9]` into one
/// hyphen and trim hyphens from both ends. May return an empty string.
pub fn normalize(input: &str) -> String {
    let mut s = input.to_lowercase();
    for (from, to) in TRANSLITERATIONS {
        if s.contains(from) {
            s = s.replace(from, to);
        }
    }

    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for c in s.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// `item-<base36 milliseconds>`.
pub fn fallback_slug(now: DateTime<Utc>) -> String {
    format!("{FALLBACK_PREFIX}-{}", to_base36(now.timestamp_millis().unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// The base slug for `candidate`, or the placeholder when it normalizes to
/// nothing usable.
pub fn base_slug(candidate: &str, now: DateTime<Utc>) -> String {
    let normalized = normalize(candidate);
    if normalized.len() < MIN_SLUG_LEN {
        fallback_slug(now)
    } else {
        normalized
    }
}

/// Numeric suffix of `slug` relative to `base`: `Some(0)` for the bare base,
/// `Some(n)` for `base-n`, `None` for anything else.
pub fn suffix_of(slug: &str, base: &str) -> Option<u64> {
    if slug == base {
        return Some(0);
    }
    let rest = slug.strip_prefix(base)?.strip_prefix('-')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Pick the next free slug for `base` given the slugs already in use.
/// `None` when the highest suffix in use is already `u64::MAX`.
pub fn next_available(base: &str, taken: &[String]) -> Option<String> {
    let highest = taken.iter().filter_map(|s| suffix_of(s, base)).max().unwrap_or(0);
    highest.max(1).checked_add(1).map(|n| format!("{base}-{n}"))
}

/// Allocate a slug for the product `entity_id` (which is excluded from the
/// collision checks so re-saving a product keeps its own slug).
#[tracing::instrument(skip(store))]
pub async fn allocate_slug<S>(store: &S, candidate: &str, entity_id: Uuid) -> Result<Slug, StoreError>
where
    S: ProductStore + ?Sized,
{
    let base = base_slug(candidate, Utc::now());
    if !store.slug_exists(&base, Some(entity_id)).await? {
        return Ok(Slug::from_normalized(base));
    }
    let family = store.slugs_with_base(&base, Some(entity_id)).await?;
    let slug = next_available(&base, &family).unwrap_or_else(|| fallback_slug(Utc::now()));
    tracing::debug!(%base, %slug, "slug collision resolved with numeric suffix");
    Ok(Slug::from_normalized(slug))
}

/// Insert `product` under a slug allocated from `candidate`. A unique-index
/// conflict means another writer took the slug between allocation and write;
/// allocate again (the competitor is now visible) and retry, up to
/// [`MAX_SLUG_ATTEMPTS`] writes in total.
pub async fn insert_with_unique_slug<S>(store: &S, product: &mut Product, candidate: &str) -> Result<(), StoreError>
where
    S: ProductStore + ?Sized,
{
    let mut attempt = 1;
    loop {
        product.slug = Some(allocate_slug(store, candidate, product.id).await?);
        match store.insert_product(product).await {
            Err(StoreError::Conflict(what)) if attempt < MAX_SLUG_ATTEMPTS => {
                tracing::warn!(product_id = %product.id, attempt, %what, "slug taken concurrently, reallocating");
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Field-level update of product `id`. With a `candidate` the patch's slug is
/// allocated (and reallocated on conflict) the same way as on insert; without
/// one the patch is written as given. `None` when the product does not exist.
pub async fn update_with_unique_slug<S>(
    store: &S,
    id: Uuid,
    patch: &mut ProductPatch,
    candidate: Option<&str>,
) -> Result<Option<Product>, StoreError>
where
    S: ProductStore + ?Sized,
{
    let mut attempt = 1;
    loop {
        if let Some(candidate) = candidate {
            patch.slug = Some(Some(allocate_slug(store, candidate, id).await?));
        }
        match store.update_product_fields(id, patch).await {
            Err(StoreError::Conflict(what)) if candidate.is_some() && attempt < MAX_SLUG_ATTEMPTS => {
                tracing::warn!(product_id = %id, attempt, %what, "slug taken concurrently, reallocating");
                attempt += 1;
            }
            other => return other,
        }
    }
}
