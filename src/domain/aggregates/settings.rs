//! Site settings (single document)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub social: Social,
    #[serde(default)]
    pub payments: Option<PaymentToggles>,
    #[serde(default)]
    pub tax: Option<TaxSettings>,
    #[serde(default)]
    pub shipping: Option<ShippingSettings>,
    #[serde(default)]
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Keys the storefront admin added that this service does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Social {
    pub facebook_url: String,
    pub whatsapp_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentToggles {
    pub stripe_enabled: bool,
    pub cod_enabled: bool,
    pub paypal_enabled: bool,
    pub bank_enabled: bool,
    pub local_enabled: bool,
    pub social_enabled: bool,
    pub stripe_public_key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSettings {
    pub enabled: Option<bool>,
    pub rate: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingSettings {
    pub methods: Option<BTreeMap<String, ShippingMethod>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub enabled: bool,
    pub name: String,
    pub price: Decimal,
    pub free_above: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            social: Social::default(),
            payments: None,
            tax: None,
            shipping: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Replace every top-level key present in `patch`, leaving the rest as is.
    pub fn merged(&self, patch: Map<String, Value>, updated_by: Uuid) -> Result<Self, serde_json::Error> {
        let mut doc = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if key == "createdAt" {
                continue;
            }
            doc.insert(key, value);
        }
        let mut merged: Settings = serde_json::from_value(Value::Object(doc))?;
        merged.updated_by = Some(updated_by);
        merged.updated_at = Utc::now();
        Ok(merged)
    }

    pub fn public_view(&self) -> PublicSettings {
        let tax = self.tax.clone().unwrap_or_default();
        PublicSettings {
            social: self.social.clone(),
            payments: self.payments.clone().unwrap_or_default(),
            tax: PublicTax {
                enabled: tax.enabled.unwrap_or(true),
                rate: tax.rate.unwrap_or(Decimal::TEN),
            },
            shipping: PublicShipping {
                methods: self
                    .shipping
                    .as_ref()
                    .and_then(|s| s.methods.clone())
                    .unwrap_or_else(default_shipping_methods),
            },
            updated_at: self.updated_at,
        }
    }
}

fn default_shipping_methods() -> BTreeMap<String, ShippingMethod> {
    BTreeMap::from([
        (
            "standard".to_string(),
            ShippingMethod { enabled: true, name: "Standard".into(), price: Decimal::TEN, free_above: Decimal::new(50, 0) },
        ),
        (
            "express".to_string(),
            ShippingMethod { enabled: true, name: "Express".into(), price: Decimal::new(20, 0), free_above: Decimal::ZERO },
        ),
    ])
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub social: Social,
    pub payments: PaymentToggles,
    pub tax: PublicTax,
    pub shipping: PublicShipping,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicTax {
    pub enabled: bool,
    pub rate: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicShipping {
    pub methods: BTreeMap<String, ShippingMethod>,
}
