/// Airport domain layer: remote client, payload schemas, formatters, registry, reconciliation.
pub mod client;
pub mod errors;
pub mod format;
pub mod payload;
pub mod reconcile;
pub mod registry;

pub use errors::AirportError;
pub use reconcile::{UrlChange, reconcile};
pub use registry::{AirportProfile, RegistryDocument, RegistryStore};
