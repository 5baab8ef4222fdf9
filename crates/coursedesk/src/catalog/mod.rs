//! Typed access to the course catalog services.
mod client;
mod error;
mod types;

pub use client::{CatalogClientConfig, CourseApiClient, SectionsApi};
pub(crate) use client::new_request_id;
pub use error::ApiError;
pub use types::*;
