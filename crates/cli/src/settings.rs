//! `replydesk settings <group>` and `replydesk daily-replies`.
//!
//! Writes are checked against the same bounds the server enforces, so a bad
//! value fails before any request is made.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use replydesk_api::{
    BlacklistUpdate, BotBehaviorUpdate, ConversationLimitUpdate, DailyRepliesResponse, GptUpdate,
    RagUpdate, RelayUpdate, SettingsGroup,
};
use replydesk_api_client::{ApiClient, ClientError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::manage::parse_pair;
use crate::output::{self, Render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Group {
    FollowerCacheTtl,
    BotBehavior,
    ConversationLimit,
    Rag,
    Gpt,
    Relay,
    Blacklist,
}

impl From<Group> for SettingsGroup {
    fn from(group: Group) -> Self {
        match group {
            Group::FollowerCacheTtl => Self::FollowerCacheTtl,
            Group::BotBehavior => Self::BotBehavior,
            Group::ConversationLimit => Self::ConversationLimit,
            Group::Rag => Self::Rag,
            Group::Gpt => Self::Gpt,
            Group::Relay => Self::Relay,
            Group::Blacklist => Self::Blacklist,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Int { min: i64, max: i64 },
    /// 0.0 ..= 1.0
    Ratio,
    /// Comma-separated relay URLs.
    Relays,
    /// Comma-separated public keys.
    Keys,
}

struct Field {
    key: &'static str,
    kind: Kind,
}

const fn int(key: &'static str, min: i64, max: i64) -> Field {
    Field {
        key,
        kind: Kind::Int { min, max },
    }
}

const TTL_FIELDS: &[Field] = &[int("ttl_seconds", 60, 604_800)];
const BOT_BEHAVIOR_FIELDS: &[Field] = &[
    int("reaction_percent", 0, 100),
    int("reaction_freq", 1, i64::MAX),
    int("timeline_size", 1, 1000),
];
const CONVERSATION_LIMIT_FIELDS: &[Field] = &[int("count", 1, 100), int("minutes", 1, 1440)];
const RAG_FIELDS: &[Field] = &[Field {
    key: "similarity_threshold",
    kind: Kind::Ratio,
}];
const GPT_FIELDS: &[Field] = &[
    int("answer_length", 10, 1000),
    int("timeout", 10, 300),
    int("gemini_search_timeout", 10, 600),
    int("recent_context_count", 1, 100),
    int("summary_threshold", 1000, 50_000),
    int("max_summary_tokens", 1000, 100_000),
    int("max_impression_length", 50, 2000),
    int("max_mental_diary_length", 100, 5000),
];
const RELAY_FIELDS: &[Field] = &[
    Field {
        key: "write",
        kind: Kind::Relays,
    },
    Field {
        key: "read",
        kind: Kind::Relays,
    },
    Field {
        key: "search",
        kind: Kind::Relays,
    },
];
const BLACKLIST_FIELDS: &[Field] = &[Field {
    key: "blacklist",
    kind: Kind::Keys,
}];

fn fields(group: SettingsGroup) -> &'static [Field] {
    match group {
        SettingsGroup::FollowerCacheTtl => TTL_FIELDS,
        SettingsGroup::BotBehavior => BOT_BEHAVIOR_FIELDS,
        SettingsGroup::ConversationLimit => CONVERSATION_LIMIT_FIELDS,
        SettingsGroup::Rag => RAG_FIELDS,
        SettingsGroup::Gpt => GPT_FIELDS,
        SettingsGroup::Relay => RELAY_FIELDS,
        SettingsGroup::Blacklist => BLACKLIST_FIELDS,
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_value(group: SettingsGroup, field: &Field, raw: &str) -> Result<Value> {
    let raw = raw.trim();
    let key = field.key;
    match field.kind {
        Kind::Int { min, max } => {
            let n: i64 = raw
                .parse()
                .with_context(|| format!("{group}.{key} expects a whole number, got `{raw}`"))?;
            if n < min || n > max {
                if max == i64::MAX {
                    bail!("{group}.{key} must be at least {min}");
                }
                bail!("{group}.{key} must be between {min} and {max}");
            }
            Ok(Value::from(n))
        }
        Kind::Ratio => {
            let x: f64 = raw
                .parse()
                .with_context(|| format!("{group}.{key} expects a number, got `{raw}`"))?;
            if !(0.0..=1.0).contains(&x) {
                bail!("{group}.{key} must be between 0 and 1");
            }
            Ok(Value::from(x))
        }
        Kind::Relays => {
            let urls = list(raw);
            if let Some(bad) = urls
                .iter()
                .find(|u| !u.starts_with("wss://") && !u.starts_with("ws://"))
            {
                bail!("{group}.{key}: `{bad}` is not a ws:// or wss:// URL");
            }
            Ok(Value::from(urls))
        }
        Kind::Keys => Ok(Value::from(list(raw))),
    }
}

/// Turn `KEY=VALUE` arguments into the JSON body of a partial write.
fn build_update(group: SettingsGroup, pairs: &[String]) -> Result<Map<String, Value>> {
    let known = fields(group);
    let mut body = Map::new();
    for raw in pairs {
        let (key, value) = parse_pair(raw)?;
        let Some(field) = known.iter().find(|f| f.key == key) else {
            let allowed: Vec<&str> = known.iter().map(|f| f.key).collect();
            bail!("{group} has no setting `{key}` (known: {})", allowed.join(", "));
        };
        body.insert(key, parse_value(group, field, &value)?);
    }
    if body.is_empty() {
        bail!("nothing to set: pass KEY=VALUE");
    }
    Ok(body)
}

fn typed<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(body)).context("Failed to build the settings request")
}

async fn fetch(client: &ApiClient, group: SettingsGroup) -> Result<Value> {
    fn json<T: Serialize>(read: Result<T, ClientError>) -> Result<Value> {
        Ok(serde_json::to_value(read?)?)
    }
    let value = match group {
        SettingsGroup::FollowerCacheTtl => json(client.follower_cache_ttl().await),
        SettingsGroup::BotBehavior => json(client.bot_behavior().await),
        SettingsGroup::ConversationLimit => json(client.conversation_limit().await),
        SettingsGroup::Rag => json(client.rag_settings().await),
        SettingsGroup::Gpt => json(client.gpt_settings().await),
        SettingsGroup::Relay => json(client.relay_settings().await),
        SettingsGroup::Blacklist => json(client.blacklist().await),
    };
    value.with_context(|| format!("Failed to read {group} settings"))
}

fn print_settings(group: SettingsGroup, value: &Value) {
    println!("[{group}]");
    let Some(map) = value.as_object() else {
        println!("  {value}");
        return;
    };
    let width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    for (key, v) in map {
        let shown = match v {
            Value::Array(items) if items.is_empty() => "(none)".to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Object(entry) => format!(
                        "{} ({})",
                        entry.get("pubkey").and_then(Value::as_str).unwrap_or("?"),
                        entry.get("name").and_then(Value::as_str).unwrap_or("-")
                    ),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        println!("  {key:<width$} = {shown}");
    }
}

pub async fn show(client: &ApiClient, group: Group, json: bool) -> Result<()> {
    let group = SettingsGroup::from(group);
    let value = fetch(client, group).await?;
    if json {
        return output::print_json(&value);
    }
    print_settings(group, &value);
    Ok(())
}

pub async fn set(client: &ApiClient, group: Group, pairs: &[String]) -> Result<()> {
    let group = SettingsGroup::from(group);
    let body = build_update(group, pairs)?;
    debug!(%group, ?body, "writing settings");
    let written = match group {
        SettingsGroup::FollowerCacheTtl => {
            let ttl: replydesk_api::FollowerCacheTtl = typed(body)?;
            client.set_follower_cache_ttl(ttl.ttl_seconds).await.map(|_| ())
        }
        SettingsGroup::BotBehavior => client
            .set_bot_behavior(&typed::<BotBehaviorUpdate>(body)?)
            .await
            .map(|_| ()),
        SettingsGroup::ConversationLimit => client
            .set_conversation_limit(&typed::<ConversationLimitUpdate>(body)?)
            .await
            .map(|_| ()),
        SettingsGroup::Rag => client
            .set_rag_settings(&typed::<RagUpdate>(body)?)
            .await
            .map(|_| ()),
        SettingsGroup::Gpt => client
            .set_gpt_settings(&typed::<GptUpdate>(body)?)
            .await
            .map(|_| ()),
        SettingsGroup::Relay => client
            .set_relay_settings(&typed::<RelayUpdate>(body)?)
            .await
            .map(|_| ()),
        SettingsGroup::Blacklist => client
            .set_blacklist(&typed::<BlacklistUpdate>(body)?)
            .await
            .map(|_| ()),
    };
    written.with_context(|| format!("Failed to write {group} settings"))?;
    println!("Updated {group}.");
    print_settings(group, &fetch(client, group).await?);
    Ok(())
}

// ── Daily replies ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DailyRow {
    pub bot_pubkey: String,
    pub bot: String,
    pub date: String,
    pub count: i64,
}

impl Render for DailyRow {
    fn headers() -> &'static [&'static str] {
        &["BOT", "DATE", "REPLIES"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.bot.clone(), self.date.clone(), self.count.to_string()]
    }
}

/// One row per bot and day, bots in key order and days ascending.
fn daily_rows(
    resp: DailyRepliesResponse,
    names: &HashMap<String, String>,
    only: Option<&str>,
) -> Vec<DailyRow> {
    let mut rows = Vec::new();
    for (pubkey, mut days) in resp.data {
        if only.is_some_and(|bot| bot != pubkey) {
            continue;
        }
        days.sort_by(|a, b| a.date.cmp(&b.date));
        let bot = names
            .get(&pubkey)
            .cloned()
            .unwrap_or_else(|| output::short_key(&pubkey));
        for day in days {
            rows.push(DailyRow {
                bot_pubkey: pubkey.clone(),
                bot: bot.clone(),
                date: day.date,
                count: day.count,
            });
        }
    }
    rows
}

pub async fn daily_replies(client: &ApiClient, bot: Option<String>, json: bool) -> Result<()> {
    let bot = bot
        .map(|raw| replydesk_list::BotPubkey::parse(&raw))
        .transpose()?;
    let resp = client
        .daily_replies()
        .await
        .context("Failed to load daily reply counts")?;
    let names: HashMap<String, String> = match client.list_bots().await {
        Ok(bots) => bots
            .into_iter()
            .filter_map(|b| b.display_name().map(|name| (b.pubkey, name)))
            .collect(),
        Err(e) => {
            debug!("bot names unavailable: {e}");
            HashMap::new()
        }
    };
    let rows = daily_rows(resp, &names, bot.as_ref().map(|b| b.as_str()));
    if json {
        return output::print_json(&rows);
    }
    output::print_table(&rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replydesk_api::DailyCount;

    fn pairs(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gpt_update_carries_only_given_keys() {
        let body = build_update(SettingsGroup::Gpt, &pairs(&["timeout=90", "answer_length = 200"]))
            .unwrap();
        let update: GptUpdate = typed(body).unwrap();
        assert_eq!(update.timeout, Some(90));
        assert_eq!(update.answer_length, Some(200));
        assert_eq!(update.summary_threshold, None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = build_update(SettingsGroup::Gpt, &pairs(&["timeout=5"])).unwrap_err();
        assert_eq!(err.to_string(), "gpt.timeout must be between 10 and 300");
        let err = build_update(SettingsGroup::BotBehavior, &pairs(&["reaction_freq=0"])).unwrap_err();
        assert_eq!(err.to_string(), "bot-behavior.reaction_freq must be at least 1");
        assert!(build_update(SettingsGroup::Rag, &pairs(&["similarity_threshold=1.5"])).is_err());
        assert!(build_update(SettingsGroup::FollowerCacheTtl, &pairs(&["ttl_seconds=59"])).is_err());
        assert!(build_update(SettingsGroup::ConversationLimit, &pairs(&["count=abc"])).is_err());
    }

    #[test]
    fn unknown_keys_list_the_known_ones() {
        let err = build_update(SettingsGroup::ConversationLimit, &pairs(&["hours=2"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "conversation-limit has no setting `hours` (known: count, minutes)"
        );
        assert!(build_update(SettingsGroup::Relay, &[]).is_err());
    }

    #[test]
    fn relay_lists_are_split_and_checked() {
        let body = build_update(
            SettingsGroup::Relay,
            &pairs(&["read=wss://a, wss://b,", "write="]),
        )
        .unwrap();
        let update: RelayUpdate = typed(body).unwrap();
        assert_eq!(update.read, Some(vec!["wss://a".into(), "wss://b".into()]));
        assert_eq!(update.write, Some(vec![]));
        assert_eq!(update.search, None);
        assert!(build_update(SettingsGroup::Relay, &pairs(&["read=https://a"])).is_err());
    }

    #[test]
    fn every_group_has_fields() {
        for group in SettingsGroup::ALL {
            assert!(!fields(group).is_empty(), "{group}");
        }
    }

    #[test]
    fn daily_rows_are_named_sorted_and_filtered() {
        let mut resp = DailyRepliesResponse::default();
        resp.data.insert(
            "bb".into(),
            vec![
                DailyCount { date: "2026-10-02".into(), count: 3 },
                DailyCount { date: "2026-10-01".into(), count: 1 },
            ],
        );
        resp.data.insert("aa".into(), vec![DailyCount { date: "2026-10-01".into(), count: 7 }]);
        let names = HashMap::from([("bb".to_string(), "Kuro".to_string())]);

        let rows = daily_rows(resp.clone(), &names, None);
        let cells: Vec<_> = rows.iter().map(Render::cells).collect();
        assert_eq!(cells[0], vec!["aa", "2026-10-01", "7"]);
        assert_eq!(cells[1], vec!["Kuro", "2026-10-01", "1"]);
        assert_eq!(cells[2], vec!["Kuro", "2026-10-02", "3"]);

        let only = daily_rows(resp, &names, Some("aa"));
        assert_eq!(only.len(), 1);
    }
}
