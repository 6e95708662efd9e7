//! Mutations issued from a list page.
//!
//! The rule is simple: after a successful create/update/delete the list
//! re-fetches page 0 with the current filters. A failed mutation leaves the
//! store alone.

use std::future::Future;

use replydesk_api::{BulkDeleteEventsRequest, BulkDeleteResponse, BulkDeleteSummariesRequest};
use replydesk_api_client::{ApiClient, ClientError};
use thiserror::Error;
use tracing::info;

use crate::query::QueryDescriptor;
use crate::resources::BotPubkey;
use crate::store::FilterStore;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("refusing to bulk delete every event: set a search term or filter first")]
    Unfiltered,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Await `mutation`, then refresh the list on success.
pub async fn apply_mutation<T, E>(
    store: &mut FilterStore,
    mutation: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let out = mutation.await?;
    store.refresh();
    Ok(out)
}

/// Bulk delete body matching what the events list currently shows.
pub fn events_bulk_delete_request(
    query: &QueryDescriptor,
) -> Result<BulkDeleteEventsRequest, MutationError> {
    let req = BulkDeleteEventsRequest {
        search: query.search().map(str::to_string),
        has_embedding: query.filter_bool("has_embedding"),
        is_japanese: query.filter_bool("is_japanese"),
        event_type: query.filter_text("event_type").map(str::to_string),
    };
    if req.is_unfiltered() {
        return Err(MutationError::Unfiltered);
    }
    Ok(req)
}

/// Delete every event matching the active filters. Never runs unfiltered.
pub async fn bulk_delete_events(
    client: &ApiClient,
    store: &mut FilterStore,
) -> Result<BulkDeleteResponse, MutationError> {
    let req = events_bulk_delete_request(&store.descriptor())?;
    let resp = apply_mutation(store, client.bulk_delete_events(&req)).await?;
    info!(deleted = resp.deleted_count, "bulk deleted events");
    Ok(resp)
}

/// Delete the bot's summaries matching the search term, or all of them when
/// no term is set.
pub async fn bulk_delete_summaries(
    client: &ApiClient,
    bot: &BotPubkey,
    store: &mut FilterStore,
) -> Result<BulkDeleteResponse, MutationError> {
    let req = BulkDeleteSummariesRequest {
        search: store.descriptor().search().map(str::to_string),
    };
    let resp = apply_mutation(store, client.bulk_delete_summaries(bot.as_str(), &req)).await?;
    info!(bot = %bot, deleted = resp.deleted_count, "bulk deleted summaries");
    Ok(resp)
}
