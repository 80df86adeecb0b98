//! Shared data types for the richdad acquisition layer: provider
//! configuration, resource keys, provenance descriptors and errors.
#![warn(missing_docs)]

mod attempts;
mod capability;
mod config;
mod error;
mod provenance;
mod provider;
mod resource;
mod window;

pub use attempts::{Attempt, AttemptOutcome, AttemptTrail};
pub use capability::{CapabilityKind, ResourceType};
pub use config::{FreshnessConfig, OrchestratorConfig};
pub use error::{FetchError, FetchErrorKind, RichdadError};
pub use provenance::{DataSourceDescriptor, FetchResult, age_ms};
pub use provider::{CredentialRef, ProviderCapability, ProviderConfig, ProviderId, Tier};
pub use resource::ResourceKey;
pub use window::{WindowKind, WindowLimit, builtin_limits};
