//! Storage abstractions for the HIRS CTP computations.
//!
//! Provides the collaborator seams the computation depends on:
//! - Stored-product catalog (existence checks, path resolution)
//! - Delivered-software registry (versioned installation lookup)

pub mod catalog;
pub mod delivery;
pub mod error;

pub use catalog::{FilesystemCatalog, ProductCatalog, ProductRef};
pub use delivery::{DeliveredSoftware, DeliveryRegistry, YamlDeliveryRegistry};
pub use error::{StorageError, StorageResult};
