//! Mohdel core: the vendor-neutral half of the answer pipeline.
//!
//! Holds the curated [`catalog::Catalog`], the normalized request/response
//! types, the error taxonomy, config loading, and the collaborator traits
//! the dispatcher depends on.

pub mod catalog;
pub mod config;
pub mod error;
pub mod sources;
pub mod types;
pub mod utils;

pub use catalog::{Catalog, CatalogEntry, EffortLevels, EffortValue};
pub use error::{BoxError, Error, ErrorCode, InterpretedError, Result};
pub use sources::{CredentialSource, DefaultModelSource, EnvCredentials, EnvFileCredentials, StaticCredentials};
pub use types::{AnswerOptions, AnswerResult, ImageInput, OutputEffort, OutputType};
