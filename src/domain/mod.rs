//! Domain model
pub mod aggregates;
pub mod events;
pub mod slug;
pub mod value_objects;
