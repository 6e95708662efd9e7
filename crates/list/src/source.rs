//! Where a list view gets its pages from.

use std::future::Future;

use replydesk_api_client::ClientError;
use thiserror::Error;

use crate::cache::PageResult;
use crate::query::QueryDescriptor;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The fetch task died before producing an answer.
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// One list endpoint. Implementations translate a [`QueryDescriptor`] into a
/// request and the response into a [`PageResult`]; they never retry.
pub trait PageSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    fn fetch(
        &self,
        query: &QueryDescriptor,
    ) -> impl Future<Output = Result<PageResult<Self::Row>, FetchError>> + Send;
}
