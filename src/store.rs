//! Document-store capability consumed by the optimizer.
//!
//! The storage engine itself is an external collaborator; lesto only
//! requires a paged `query` seam and treats every failure behind it as the
//! store being unavailable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PagedResult, QuerySpec};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {message}")]
    Unavailable { message: String },
    #[error("document store timed out")]
    Timeout,
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Read access to a document-oriented store.
///
/// `depth` controls how many levels of relation fields the store resolves
/// into full documents before returning; unresolved relations come back as
/// raw ids. Returned documents include their own `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, spec: &QuerySpec) -> Result<PagedResult, StoreError>;
}
