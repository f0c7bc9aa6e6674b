//! luma/crates/luma-core/src/lib.rs
//!
//! The central content model, store and interface definitions for Luma.

pub mod error;
pub mod models;
pub mod persistence;
pub mod store;
pub mod tags;
pub mod traits;
pub mod views;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use persistence::{ContentPersistence, Snapshot};
pub use store::{ContentStore, StoreSettings};
pub use traits::*;
