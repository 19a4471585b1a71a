//! Logistics REST API module
//!
//! Record model, normalization at the API boundary, the `ResourceApi`
//! collaborator and the admin session.

pub mod auth;
pub mod client;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod normalize;
pub mod session;

pub use client::{CreateResponse, HttpResourceApi, ResourceApi};
pub use error::ApiError;
pub use models::{Coordinates, Draft, FieldValue, Record, Reference, UploadFile};
pub use normalize::{ReferenceEntry, normalize_collection, normalize_record};
pub use session::{BearerToken, CredentialStore, Session};
