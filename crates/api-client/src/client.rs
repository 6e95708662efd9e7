use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use replydesk_api::*;

use crate::error::{ClientError, Result};

/// Typed HTTP client for the replydesk admin API.
///
/// Every list endpoint takes its query struct and returns the decoded body;
/// mutations return the server's acknowledgement. Nothing is retried: callers
/// decide how to recover.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await?;
        parse_response(resp).await
    }

    async fn get_json_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).query(query).send().await?;
        parse_response(resp).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let resp = self.client.post(&url).json(body).send().await?;
        parse_response(resp).await
    }

    // ── Stats ─────────────────────────────────────────────────────────────

    pub async fn stats(&self) -> Result<Stats> {
        self.get_json("/stats").await
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub async fn list_events(&self, query: &EventListQuery) -> Result<EventsResponse> {
        self.get_json_with_query("/events", query).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<SuccessResponse> {
        let resp = self
            .client
            .delete(self.url(&format!("/events/{id}")))
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn bulk_delete_events(
        &self,
        req: &BulkDeleteEventsRequest,
    ) -> Result<BulkDeleteResponse> {
        let resp = self
            .client
            .post(self.url("/events/bulk-delete"))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Summaries ─────────────────────────────────────────────────────────

    pub async fn list_summaries(
        &self,
        bot_pubkey: &str,
        query: &SummaryListQuery,
    ) -> Result<Vec<SummaryData>> {
        self.get_json_with_query(&format!("/bots/{}/summaries", segment(bot_pubkey)), query)
            .await
    }

    pub async fn update_summary(
        &self,
        id: i64,
        req: &UpdateSummaryRequest,
    ) -> Result<SuccessResponse> {
        let resp = self
            .client
            .put(self.url(&format!("/summaries/{id}")))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn delete_summary(&self, id: i64) -> Result<SuccessResponse> {
        let resp = self
            .client
            .delete(self.url(&format!("/summaries/{id}")))
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn bulk_delete_summaries(
        &self,
        bot_pubkey: &str,
        req: &BulkDeleteSummariesRequest,
    ) -> Result<BulkDeleteResponse> {
        let resp = self
            .client
            .post(self.url(&format!(
                "/bots/{}/summaries/bulk-delete",
                segment(bot_pubkey)
            )))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Replies ───────────────────────────────────────────────────────────

    pub async fn list_replies(&self, bot_pubkey: &str, query: &OffsetQuery) -> Result<Vec<BotReply>> {
        self.get_json_with_query(&format!("/bots/{}/replies", segment(bot_pubkey)), query)
            .await
    }

    // ── Follower cache ────────────────────────────────────────────────────

    pub async fn list_follower_cache(&self) -> Result<Vec<FollowerCacheEntry>> {
        self.get_json("/follower-cache").await
    }

    pub async fn update_follower_cache(
        &self,
        user_pubkey: &str,
        bot_pubkey: &str,
        req: &UpdateFollowerCacheRequest,
    ) -> Result<SuccessResponse> {
        let resp = self
            .client
            .put(self.url(&follower_cache_path(user_pubkey, bot_pubkey)))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn delete_follower_cache(
        &self,
        user_pubkey: &str,
        bot_pubkey: &str,
    ) -> Result<DeletedResponse> {
        let resp = self
            .client
            .delete(self.url(&follower_cache_path(user_pubkey, bot_pubkey)))
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn clear_follower_cache(&self) -> Result<DeletedResponse> {
        let resp = self
            .client
            .delete(self.url("/follower-cache"))
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Token usage ───────────────────────────────────────────────────────

    pub async fn list_token_details(&self, query: &OffsetQuery) -> Result<TokenDetailsResponse> {
        self.get_json_with_query("/analytics/token-details", query).await
    }

    // ── Bots ──────────────────────────────────────────────────────────────

    pub async fn list_bots(&self) -> Result<Vec<BotData>> {
        self.get_json("/bots").await
    }

    pub async fn generate_bot_key(&self) -> Result<GeneratedKey> {
        self.get_json("/bots/generate-key").await
    }

    pub async fn create_bot(&self, req: &BotRequest) -> Result<BotData> {
        self.post_json("/bots", req).await
    }

    pub async fn update_bot(&self, pubkey: &str, req: &BotRequest) -> Result<BotData> {
        let resp = self
            .client
            .put(self.url(&format!("/bots/{}", segment(pubkey))))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn delete_bot(&self, pubkey: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/bots/{}", segment(pubkey))))
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }

    pub async fn toggle_bot(&self, pubkey: &str) -> Result<BotData> {
        let resp = self
            .client
            .post(self.url(&format!("/bots/{}/toggle", segment(pubkey))))
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn global_pause(&self) -> Result<GlobalPause> {
        self.get_json("/global-pause").await
    }

    pub async fn set_global_pause(&self, paused: bool) -> Result<GlobalPause> {
        self.post_json("/global-pause", &GlobalPause { paused }).await
    }

    // ── Settings ──────────────────────────────────────────────────────────

    pub async fn follower_cache_ttl(&self) -> Result<FollowerCacheTtl> {
        self.get_json(&settings_path(SettingsGroup::FollowerCacheTtl))
            .await
    }

    pub async fn set_follower_cache_ttl(&self, ttl_seconds: i64) -> Result<FollowerCacheTtl> {
        self.post_json(
            &settings_path(SettingsGroup::FollowerCacheTtl),
            &FollowerCacheTtl { ttl_seconds },
        )
        .await
    }

    pub async fn bot_behavior(&self) -> Result<BotBehaviorSettings> {
        self.get_json(&settings_path(SettingsGroup::BotBehavior)).await
    }

    pub async fn set_bot_behavior(&self, update: &BotBehaviorUpdate) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::BotBehavior), update)
            .await
    }

    pub async fn conversation_limit(&self) -> Result<ConversationLimitSettings> {
        self.get_json(&settings_path(SettingsGroup::ConversationLimit))
            .await
    }

    pub async fn set_conversation_limit(
        &self,
        update: &ConversationLimitUpdate,
    ) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::ConversationLimit), update)
            .await
    }

    pub async fn rag_settings(&self) -> Result<RagSettings> {
        self.get_json(&settings_path(SettingsGroup::Rag)).await
    }

    pub async fn set_rag_settings(&self, update: &RagUpdate) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::Rag), update).await
    }

    pub async fn gpt_settings(&self) -> Result<GptSettings> {
        self.get_json(&settings_path(SettingsGroup::Gpt)).await
    }

    pub async fn set_gpt_settings(&self, update: &GptUpdate) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::Gpt), update).await
    }

    pub async fn relay_settings(&self) -> Result<RelaySettings> {
        self.get_json(&settings_path(SettingsGroup::Relay)).await
    }

    pub async fn set_relay_settings(&self, update: &RelayUpdate) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::Relay), update).await
    }

    pub async fn blacklist(&self) -> Result<BlacklistSettings> {
        self.get_json(&settings_path(SettingsGroup::Blacklist)).await
    }

    pub async fn set_blacklist(&self, update: &BlacklistUpdate) -> Result<SuccessResponse> {
        self.post_json(&settings_path(SettingsGroup::Blacklist), update)
            .await
    }

    // ── Analytics ─────────────────────────────────────────────────────────

    pub async fn daily_replies(&self) -> Result<DailyRepliesResponse> {
        self.get_json("/analytics/daily-replies").await
    }
}

fn settings_path(group: SettingsGroup) -> String {
    format!("/settings/{}", group.as_str())
}

fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

fn follower_cache_path(user_pubkey: &str, bot_pubkey: &str) -> String {
    format!(
        "/follower-cache/{}/{}",
        segment(user_pubkey),
        segment(bot_pubkey)
    )
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Parse an HTTP response: return the deserialized body on 2xx, a
/// [`ClientError::Status`] otherwise. Bodies that do not decode are reported as
/// [`ClientError::Decode`].
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
