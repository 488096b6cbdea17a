//! Data model shared across pipeline stages.

mod catalog;
mod registry;
mod results;
mod variants;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use registry::{RegistryError, TraitRegistry};
pub use results::TraitResult;
pub use variants::{ReferenceError, ReferenceIndex, VariantRecord};
