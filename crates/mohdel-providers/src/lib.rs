//! Model resolution and vendor dispatch for Mohdel.
//!
//! # Architecture
//!
//! - [`alias`]: disambiguation index that expands short names to `provider/model` ids
//! - [`registry`]: static specs for every supported vendor, injected into the dispatcher
//! - [`adapters`]: one adapter per vendor request-shape family
//! - [`errors`]: per-vendor error interpreters (RETRYABLE / REJECTED)
//! - [`dispatcher::Dispatcher`]: resolve → credential → adapter → normalized result

pub mod adapters;
pub mod alias;
pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod images;
pub mod registry;

// Re-export main types for convenience
pub use adapters::{adapter_for, Adapter, ModelSpec};
pub use alias::{base_name, AliasIndex};
pub use client::ClientOverride;
pub use dispatcher::{Dispatcher, DispatcherBuilder, Model, ResolvedModel};
pub use errors::VendorError;
pub use images::estimate_image_tokens;
pub use registry::{AdapterKind, ProviderRegistry, ProviderSpec, PROVIDERS};
