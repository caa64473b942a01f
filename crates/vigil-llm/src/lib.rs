//! Task classification, provider routing, and the provider client seam.

pub mod classifier;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;
pub mod router;

pub use classifier::{TaskCategory, TaskClassifier};
pub use error::LlmError;
pub use provider::ProviderClient;
pub use router::{ProviderRouter, RouteDecision};
