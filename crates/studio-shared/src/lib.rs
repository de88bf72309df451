//! # studio-shared
//!
//! Domain core of the studio-booking marketplace: identifiers, closed enums,
//! persisted models, the error taxonomy, and the pure rules that the server
//! composes (pricing, listing visibility, authorization, status transitions).
//!
//! Nothing in this crate performs I/O. Storage is reached only through the
//! traits in [`repository`], which `studio-store` implements.

pub mod constants;
pub mod error;
pub mod models;
pub mod policy;
pub mod pricing;
pub mod repository;
pub mod transitions;
pub mod types;
pub mod visibility;

pub use error::{DomainError, RepositoryError};
pub use types::*;
