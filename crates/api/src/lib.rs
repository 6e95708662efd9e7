//! Shared wire types for the replydesk admin API.
//!
//! This crate is the **single source of truth** for the request/response shapes
//! the admin server speaks. TypeScript declarations for the browser console are
//! generated via `ts-rs`:
//!   cargo test -p replydesk-api --features ts -- export_typescript --nocapture

use serde::{Deserialize, Serialize};

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Sort direction accepted by every list endpoint.
///
/// The server compares case-insensitively, so the lower-case spelling is used
/// on the wire everywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

// ─── Vectorized events ───────────────────────────────────────────────────────

/// One stored protocol event, as listed by `GET /api/events`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct VectorizedEvent {
    pub id: i64,
    pub event_id: String,
    pub pubkey: String,
    pub kind: i32,
    pub content: String,
    pub created_at: i64,
    pub received_at: i64,
    pub kind0_name: Option<String>,
    pub is_japanese: bool,
    pub has_embedding: bool,
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_json: Option<String>,
}

/// Query parameters for `GET /api/events`. `page` is 1-based.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct EventListQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_embedding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_japanese: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Paginated event listing returned by `GET /api/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct EventsResponse {
    pub events: Vec<VectorizedEvent>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// Body for `POST /api/events/bulk-delete`: every event matching the filters
/// is removed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BulkDeleteEventsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_embedding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_japanese: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl BulkDeleteEventsRequest {
    /// True when no filter narrows the deletion (i.e. it would remove everything).
    pub fn is_unfiltered(&self) -> bool {
        self.search.as_deref().is_none_or(str::is_empty)
            && self.has_embedding.is_none()
            && self.is_japanese.is_none()
            && self.event_type.as_deref().is_none_or(str::is_empty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BulkDeleteResponse {
    pub deleted_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

// ─── Conversation summaries ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SummaryData {
    pub id: i64,
    pub bot_pubkey: String,
    pub summary: String,
    pub user_input: String,
    pub participants: Option<Vec<String>>,
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub created_at: i64,
}

/// Query parameters for `GET /api/bots/:pubkey/summaries`.
///
/// The endpoint returns a bare array without a total.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SummaryListQuery {
    pub limit: u32,
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateSummaryRequest {
    pub summary: String,
    pub user_input: String,
}

/// Body for `POST /api/bots/:pubkey/summaries/bulk-delete`. Without a search
/// term every summary of the bot is removed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BulkDeleteSummariesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

// ─── Bot replies ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotReply {
    pub event_id: String,
    pub content: String,
    pub created_at: i64,
    pub reply_to_event_id: Option<String>,
    pub reply_to_user: Option<String>,
}

/// Query parameters for `GET /api/bots/:pubkey/replies` (newest first).
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct OffsetQuery {
    pub limit: u32,
    pub offset: u64,
}

// ─── Follower cache ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct FollowerCacheEntry {
    pub user_pubkey: String,
    pub user_npub: String,
    pub user_name: Option<String>,
    pub bot_pubkey: String,
    pub bot_npub: String,
    pub bot_name: Option<String>,
    pub is_follower: bool,
    pub cached_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateFollowerCacheRequest {
    pub is_follower: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DeletedResponse {
    pub deleted: u64,
}

// ─── Token usage ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TokenDetail {
    pub id: i64,
    pub bot_pubkey: String,
    pub bot_kind0_content: Option<String>,
    pub category_name: String,
    pub category_display_name: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub prompt_text: String,
    pub completion_text: String,
    pub created_at: i64,
}

/// Paginated token usage rows returned by `GET /api/analytics/token-details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TokenDetailsResponse {
    pub data: Vec<TokenDetail>,
    /// Absent or negative when the server skipped the count.
    #[serde(default)]
    pub total: Option<i64>,
}

// ─── Bots ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotData {
    pub pubkey: String,
    pub secretkey: String,
    pub prompt: String,
    pub content: String,
    /// 0 = active, anything else = paused.
    pub status: i32,
    /// Percent of "air replies" posted as a single note rather than a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_reply_single_ratio: Option<i32>,
}

impl BotData {
    pub fn is_active(&self) -> bool {
        self.status == 0
    }

    /// Display name from the kind-0 profile JSON stored in `content`.
    pub fn display_name(&self) -> Option<String> {
        let profile: serde_json::Value = serde_json::from_str(&self.content).ok()?;
        profile["display_name"]
            .as_str()
            .filter(|s| !s.is_empty())
            .or_else(|| profile["name"].as_str())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotRequest {
    pub secretkey: String,
    pub prompt: String,
    pub content: String,
    /// Ignored on create; the server keeps 30 when absent on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_reply_single_ratio: Option<i32>,
}

/// `GET /api/bots/generate-key`: a fresh hex secret key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GeneratedKey {
    pub secretkey: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GlobalPause {
    pub paused: bool,
}

// ─── Settings ────────────────────────────────────────────────────────────────
//
// Each group is read with `GET /api/settings/<group>` and written with
// `POST /api/settings/<group>`. Writes are partial: absent fields keep their
// stored value, and the server answers `{ "success": true }` (except for the
// follower-cache TTL, which echoes the new value).

/// The server-side settings groups, by URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsGroup {
    FollowerCacheTtl,
    BotBehavior,
    ConversationLimit,
    Rag,
    Gpt,
    Relay,
    Blacklist,
}

impl SettingsGroup {
    pub const ALL: [Self; 7] = [
        Self::FollowerCacheTtl,
        Self::BotBehavior,
        Self::ConversationLimit,
        Self::Rag,
        Self::Gpt,
        Self::Relay,
        Self::Blacklist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FollowerCacheTtl => "follower-cache-ttl",
            Self::BotBehavior => "bot-behavior",
            Self::ConversationLimit => "conversation-limit",
            Self::Rag => "rag",
            Self::Gpt => "gpt",
            Self::Relay => "relay",
            Self::Blacklist => "blacklist",
        }
    }
}

impl std::fmt::Display for SettingsGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct FollowerCacheTtl {
    /// 60 ..= 604800 (one minute to one week).
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotBehaviorSettings {
    pub reaction_percent: i64,
    pub reaction_freq: i64,
    pub timeline_size: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotBehaviorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_percent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_freq: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ConversationLimitSettings {
    /// Replies allowed per user inside the window.
    pub count: i64,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ConversationLimitUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RagSettings {
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RagUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GptSettings {
    pub answer_length: i64,
    pub timeout: i64,
    pub gemini_search_timeout: i64,
    pub recent_context_count: i64,
    pub summary_threshold: i64,
    pub max_summary_tokens: i64,
    pub max_impression_length: i64,
    pub max_mental_diary_length: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GptUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_search_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_context_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_summary_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_impression_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mental_diary_length: Option<i64>,
}

/// Relay URLs by role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RelaySettings {
    #[serde(default)]
    pub write: Vec<String>,
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub search: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RelayUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<String>>,
}

/// A blocked user, with the profile name the server knows for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BlacklistEntry {
    pub pubkey: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BlacklistSettings {
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
}

/// Replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BlacklistUpdate {
    pub blacklist: Vec<String>,
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DailyCount {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: i64,
}

/// `GET /api/analytics/daily-replies`: per-bot reply counts for the last
/// 30 days, keyed by bot public key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DailyRepliesResponse {
    #[serde(default)]
    pub data: std::collections::BTreeMap<String, Vec<DailyCount>>,
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Dashboard summary returned by `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Stats {
    pub bot_status: BotStatus,
    pub reply_stats: ReplyStats,
    pub conversation_stats: ConversationStats,
    pub rag_stats: RagStats,
    #[serde(default)]
    pub error_log: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotStatus {
    pub online: bool,
    pub uptime_seconds: u64,
    pub last_reply_timestamp: i64,
    pub connected_relays: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ReplyStats {
    pub today: u32,
    pub this_week: u32,
    pub this_month: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ConversationStats {
    pub unique_users: u32,
    pub rate_limited_users: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RagStats {
    pub vectorized_events: u32,
    pub total_events: u32,
    pub pending_vectorization: u32,
    pub total_searches: u32,
    pub average_similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ErrorEntry {
    pub timestamp: i64,
    pub error_type: String,
    pub message: String,
}

// ─── Generic responses ───────────────────────────────────────────────────────

/// `{ "success": true }` returned by most single-row mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// JSON error shape `{ "error": "..." }` some handlers return alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ApiError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_either_case() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Asc.reversed(), SortOrder::Desc);
    }

    #[test]
    fn bulk_delete_without_filters_is_unfiltered() {
        assert!(BulkDeleteEventsRequest::default().is_unfiltered());
        let blank_search = BulkDeleteEventsRequest {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(blank_search.is_unfiltered());
        let narrowed = BulkDeleteEventsRequest {
            has_embedding: Some(false),
            ..Default::default()
        };
        assert!(!narrowed.is_unfiltered());
    }

    #[test]
    fn token_details_total_may_be_absent() {
        let resp: TokenDetailsResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(resp.total.is_none());
    }

    #[test]
    fn bot_display_name_prefers_display_name() {
        let bot = BotData {
            pubkey: "ab".into(),
            secretkey: String::new(),
            prompt: String::new(),
            content: r#"{"name":"kuro","display_name":"Kuro Bot"}"#.into(),
            status: 0,
            air_reply_single_ratio: None,
        };
        assert_eq!(bot.display_name().as_deref(), Some("Kuro Bot"));
        assert!(bot.is_active());

        let unnamed = BotData {
            content: "not json".into(),
            status: 1,
            ..bot
        };
        assert!(unnamed.display_name().is_none());
        assert!(!unnamed.is_active());
    }

    #[test]
    fn setting_updates_only_carry_changed_fields() {
        let update = GptUpdate {
            timeout: Some(90),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({ "timeout": 90 }));
        assert_eq!(
            serde_json::to_value(RelayUpdate::default()).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn blacklist_entries_tolerate_a_missing_picture() {
        let settings: BlacklistSettings =
            serde_json::from_str(r#"{"blacklist":[{"pubkey":"ab","name":"ab..."}]}"#).unwrap();
        assert_eq!(settings.blacklist[0].picture, None);
        assert_eq!(SettingsGroup::FollowerCacheTtl.to_string(), "follower-cache-ttl");
    }
}

// ─── TypeScript generation ───────────────────────────────────────────────────
