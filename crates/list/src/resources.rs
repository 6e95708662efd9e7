//! [`PageSource`] implementations for the console's list endpoints.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use replydesk_api::{
    BotReply, EventListQuery, FollowerCacheEntry, OffsetQuery, SummaryData, SummaryListQuery,
    TokenDetail, VectorizedEvent,
};
use replydesk_api_client::ApiClient;

use crate::cache::{PageResult, Total};
use crate::local::{self, LocalRow, contains_folded};
use crate::query::{FilterValue, InputError, QueryDescriptor};
use crate::source::{FetchError, PageSource};

static PUBKEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("pubkey regex should compile"));

/// Hex public key of a bot, checked before it is put into a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotPubkey(String);

impl BotPubkey {
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if PUBKEY_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InputError::InvalidPubkey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn wire_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn check_page_len<R>(rows: &[R], query: &QueryDescriptor) -> Result<(), FetchError> {
    if rows.len() > query.page_size {
        return Err(FetchError::Malformed(format!(
            "asked for {} rows, got {}",
            query.page_size,
            rows.len()
        )));
    }
    Ok(())
}

fn offset_query(query: &QueryDescriptor) -> OffsetQuery {
    OffsetQuery {
        limit: wire_u32(query.page_size),
        offset: query.offset() as u64,
    }
}

// ── Events ────────────────────────────────────────────────────────────────

/// Vectorized events. The endpoint numbers pages from 1.
pub struct EventsSource {
    client: ApiClient,
}

impl EventsSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn wire_query(query: &QueryDescriptor) -> EventListQuery {
        EventListQuery {
            page: wire_u32(query.page_index.saturating_add(1)),
            page_size: wire_u32(query.page_size),
            search: query.search().map(str::to_string),
            has_embedding: query.filter_bool("has_embedding"),
            is_japanese: query.filter_bool("is_japanese"),
            event_type: query.filter_text("event_type").map(str::to_string),
            sort_by: Some(query.sort_by.clone()),
            sort_order: Some(query.sort_order),
        }
    }
}

impl PageSource for EventsSource {
    type Row = VectorizedEvent;

    async fn fetch(&self, query: &QueryDescriptor) -> Result<PageResult<VectorizedEvent>, FetchError> {
        let resp = self.client.list_events(&Self::wire_query(query)).await?;
        check_page_len(&resp.events, query)?;
        Ok(PageResult {
            rows: resp.events,
            total: Total::from_wire(Some(resp.total)),
            page_index: query.page_index,
            page_size: query.page_size,
        })
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────

/// Conversation summaries of one bot; the endpoint never counts.
pub struct SummariesSource {
    client: ApiClient,
    bot: BotPubkey,
}

impl SummariesSource {
    pub fn new(client: ApiClient, bot: BotPubkey) -> Self {
        Self { client, bot }
    }

    pub fn wire_query(query: &QueryDescriptor) -> SummaryListQuery {
        SummaryListQuery {
            limit: wire_u32(query.page_size),
            offset: query.offset() as u64,
            search: query.search().map(str::to_string),
            sort_by: Some(query.sort_by.clone()),
            sort_order: Some(query.sort_order),
        }
    }
}

impl PageSource for SummariesSource {
    type Row = SummaryData;

    async fn fetch(&self, query: &QueryDescriptor) -> Result<PageResult<SummaryData>, FetchError> {
        let rows = self
            .client
            .list_summaries(self.bot.as_str(), &Self::wire_query(query))
            .await?;
        check_page_len(&rows, query)?;
        Ok(PageResult {
            rows,
            total: Total::Unknown,
            page_index: query.page_index,
            page_size: query.page_size,
        })
    }
}

// ── Replies ───────────────────────────────────────────────────────────────

pub struct RepliesSource {
    client: ApiClient,
    bot: BotPubkey,
}

impl RepliesSource {
    pub fn new(client: ApiClient, bot: BotPubkey) -> Self {
        Self { client, bot }
    }
}

impl PageSource for RepliesSource {
    type Row = BotReply;

    async fn fetch(&self, query: &QueryDescriptor) -> Result<PageResult<BotReply>, FetchError> {
        let rows = self
            .client
            .list_replies(self.bot.as_str(), &offset_query(query))
            .await?;
        check_page_len(&rows, query)?;
        Ok(PageResult {
            rows,
            total: Total::Unknown,
            page_index: query.page_index,
            page_size: query.page_size,
        })
    }
}

// ── Token usage ───────────────────────────────────────────────────────────

pub struct TokenUsageSource {
    client: ApiClient,
}

impl TokenUsageSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl PageSource for TokenUsageSource {
    type Row = TokenDetail;

    async fn fetch(&self, query: &QueryDescriptor) -> Result<PageResult<TokenDetail>, FetchError> {
        let resp = self.client.list_token_details(&offset_query(query)).await?;
        check_page_len(&resp.data, query)?;
        Ok(PageResult {
            rows: resp.data,
            total: Total::from_wire(resp.total),
            page_index: query.page_index,
            page_size: query.page_size,
        })
    }
}

// ── Follower cache ────────────────────────────────────────────────────────

/// The endpoint returns every cached pair; see [`local::apply`].
pub struct FollowerCacheSource {
    client: ApiClient,
    max_rows: usize,
}

impl FollowerCacheSource {
    pub fn new(client: ApiClient, max_rows: usize) -> Self {
        Self { client, max_rows }
    }
}

impl PageSource for FollowerCacheSource {
    type Row = FollowerCacheEntry;

    async fn fetch(
        &self,
        query: &QueryDescriptor,
    ) -> Result<PageResult<FollowerCacheEntry>, FetchError> {
        let rows = self.client.list_follower_cache().await?;
        Ok(local::apply("follower_cache", rows, query, self.max_rows))
    }
}

impl LocalRow for FollowerCacheEntry {
    fn matches_search(&self, needle: &str) -> bool {
        contains_folded(
            needle,
            [
                self.user_name.as_deref().unwrap_or_default(),
                self.user_pubkey.as_str(),
                self.user_npub.as_str(),
            ],
        )
    }

    fn matches_filter(&self, name: &str, value: &FilterValue) -> bool {
        match (name, value) {
            ("is_follower", FilterValue::Bool(b)) => self.is_follower == *b,
            ("bot", FilterValue::Text(text)) => {
                let needle = text.trim().to_lowercase();
                needle.is_empty()
                    || contains_folded(
                        &needle,
                        [
                            self.bot_name.as_deref().unwrap_or_default(),
                            self.bot_pubkey.as_str(),
                            self.bot_npub.as_str(),
                        ],
                    )
            }
            _ => true,
        }
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "user_name" => cmp_names(&self.user_name, &other.user_name),
            "bot_name" => cmp_names(&self.bot_name, &other.bot_name),
            _ => self.cached_at.cmp(&other.cached_at),
        }
    }
}

/// Case-folded, with a missing name sorting like an empty one.
fn cmp_names(a: &Option<String>, b: &Option<String>) -> Ordering {
    let fold = |name: &Option<String>| name.as_deref().unwrap_or_default().to_lowercase();
    fold(a).cmp(&fold(b))
}
