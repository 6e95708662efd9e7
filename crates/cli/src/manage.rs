use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Password};
use replydesk_api::{BotData, BotRequest, UpdateFollowerCacheRequest, UpdateSummaryRequest};
use replydesk_api_client::{ApiClient, ClientError};
use replydesk_list::{BotPubkey, FilterStore, mutation, schemas};

use crate::lists::EventFilterArgs;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PauseState {
    On,
    Off,
}

/// Profile and behavior flags shared by `bots create` and `bots edit`.
#[derive(Debug, Default, clap::Args)]
pub struct BotFields {
    /// System prompt text
    #[arg(long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,
    /// Read the system prompt from a file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    /// Profile field stored in the bot's kind-0 content (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
    /// Remove a profile field (edit only, repeatable)
    #[arg(long = "unset", value_name = "KEY")]
    pub unset: Vec<String>,
    /// Percent of air replies posted as a single note
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=100))]
    pub air_reply_ratio: Option<i32>,
}

impl BotFields {
    fn prompt(&self) -> Result<Option<String>> {
        match (&self.prompt, &self.prompt_file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("Failed to read prompt from {}", path.display())),
            (None, None) => Ok(None),
        }
    }

    fn is_empty(&self) -> bool {
        self.prompt.is_none()
            && self.prompt_file.is_none()
            && self.fields.is_empty()
            && self.unset.is_empty()
            && self.air_reply_ratio.is_none()
    }

    /// Merge the flags into an existing kind-0 content string. Empty
    /// profiles are stored as an empty string.
    fn content(&self, existing: &str) -> Result<String> {
        if self.fields.is_empty() && self.unset.is_empty() {
            return Ok(existing.to_string());
        }
        let mut profile: serde_json::Map<String, serde_json::Value> = if existing.trim().is_empty() {
            serde_json::Map::new()
        } else {
            serde_json::from_str(existing)
                .context("The bot's current content is not a JSON object; edit it on the server")?
        };
        for key in &self.unset {
            profile.remove(key.trim());
        }
        for raw in &self.fields {
            let (key, value) = parse_pair(raw)?;
            profile.insert(key, serde_json::Value::String(value));
        }
        if profile.is_empty() {
            return Ok(String::new());
        }
        Ok(serde_json::Value::Object(profile).to_string())
    }
}

/// Split `KEY=VALUE`; the key is trimmed and must not be empty.
pub fn parse_pair(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got `{raw}`");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in `{raw}`");
    }
    Ok((key.to_string(), value.to_string()))
}

fn not_found(err: &ClientError) -> bool {
    err.status() == Some(404)
}

fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Confirmation prompt failed (pass --yes when not on a terminal)")
}

pub async fn delete_event(client: &ApiClient, id: i64) -> Result<()> {
    client
        .delete_event(id)
        .await
        .with_context(|| format!("Failed to delete event {id}"))?;
    println!("Deleted event {id}.");
    Ok(())
}

pub async fn bulk_delete_events(
    client: &ApiClient,
    filters: &EventFilterArgs,
    search: Option<String>,
    yes: bool,
) -> Result<()> {
    let mut store = FilterStore::new(schemas::events());
    filters.apply(&mut store)?;
    if let Some(search) = search {
        store.set_search_text(&search);
    }
    // Fail on an unfiltered request before asking anything.
    mutation::events_bulk_delete_request(&store.descriptor())?;

    if !confirm("Delete every event matching these filters?", yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    let resp = mutation::bulk_delete_events(client, &mut store).await?;
    println!("Deleted {} event(s).", resp.deleted_count);
    Ok(())
}

pub async fn edit_summary(
    client: &ApiClient,
    id: i64,
    summary: String,
    user_input: String,
) -> Result<()> {
    let req = UpdateSummaryRequest {
        summary,
        user_input,
    };
    client
        .update_summary(id, &req)
        .await
        .with_context(|| format!("Failed to update summary {id}"))?;
    println!("Updated summary {id}.");
    Ok(())
}

pub async fn delete_summary(client: &ApiClient, id: i64) -> Result<()> {
    client
        .delete_summary(id)
        .await
        .with_context(|| format!("Failed to delete summary {id}"))?;
    println!("Deleted summary {id}.");
    Ok(())
}

pub async fn bulk_delete_summaries(
    client: &ApiClient,
    bot: &str,
    search: Option<String>,
    yes: bool,
) -> Result<()> {
    let bot = BotPubkey::parse(bot)?;
    let mut store = FilterStore::new(schemas::summaries());
    if let Some(search) = &search {
        store.set_search_text(search);
    }
    let prompt = match store.descriptor().search() {
        Some(term) => format!("Delete this bot's summaries matching \"{term}\"?"),
        None => "Delete ALL summaries of this bot?".to_string(),
    };
    if !confirm(&prompt, yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    let resp = mutation::bulk_delete_summaries(client, &bot, &mut store).await?;
    println!("Deleted {} summar(y/ies).", resp.deleted_count);
    Ok(())
}

pub async fn set_follower(
    client: &ApiClient,
    user: &str,
    bot: &str,
    following: bool,
) -> Result<()> {
    let req = UpdateFollowerCacheRequest {
        is_follower: following,
    };
    client
        .update_follower_cache(user, bot, &req)
        .await
        .context("Failed to update follower cache entry")?;
    println!("Updated.");
    Ok(())
}

pub async fn delete_follower(client: &ApiClient, user: &str, bot: &str) -> Result<()> {
    let resp = client
        .delete_follower_cache(user, bot)
        .await
        .context("Failed to delete follower cache entry")?;
    println!("Deleted {} entr(y/ies).", resp.deleted);
    Ok(())
}

pub async fn clear_follower_cache(client: &ApiClient, yes: bool) -> Result<()> {
    if !confirm("Clear the whole follower cache?", yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    let resp = client
        .clear_follower_cache()
        .await
        .context("Failed to clear follower cache")?;
    println!("Cleared {} entr(y/ies).", resp.deleted);
    Ok(())
}

pub async fn list_bots(client: &ApiClient, json: bool) -> Result<()> {
    let bots = client.list_bots().await.context("Failed to list bots")?;
    if json {
        return output::print_json(&bots);
    }
    output::print_table(&bots);
    Ok(())
}

pub async fn create_bot(
    client: &ApiClient,
    secretkey: Option<String>,
    generate_key: bool,
    fields: &BotFields,
) -> Result<()> {
    if !fields.unset.is_empty() {
        bail!("--unset only applies to `bots edit`");
    }
    let Some(prompt) = fields.prompt()? else {
        bail!("a new bot needs --prompt or --prompt-file");
    };
    let secretkey = match secretkey {
        Some(key) => key,
        None if generate_key => {
            client
                .generate_bot_key()
                .await
                .context("Failed to generate a secret key")?
                .secretkey
        }
        None => Password::new()
            .with_prompt("Bot secret key (nsec or hex)")
            .interact()
            .context("Secret key prompt failed (pass --secretkey or --generate-key)")?,
    };
    let req = BotRequest {
        secretkey,
        prompt,
        content: fields.content("")?,
        air_reply_single_ratio: fields.air_reply_ratio,
    };
    let bot = client.create_bot(&req).await.context("Failed to create bot")?;
    println!("Created bot {}.", bot.pubkey);
    output::print_table(std::slice::from_ref(&bot));
    Ok(())
}

/// Change the given fields of an existing bot and keep everything else.
pub async fn edit_bot(client: &ApiClient, pubkey: &str, fields: &BotFields) -> Result<()> {
    let key = BotPubkey::parse(pubkey)?;
    if fields.is_empty() {
        bail!("nothing to change: pass --prompt, --prompt-file, --field, --unset or --air-reply-ratio");
    }
    let bots = client.list_bots().await.context("Failed to list bots")?;
    let Some(existing) = bots.into_iter().find(|b| b.pubkey == key.as_str()) else {
        bail!("no bot with public key {key}");
    };
    let req = edit_request(&existing, fields)?;
    let updated = client
        .update_bot(key.as_str(), &req)
        .await
        .with_context(|| format!("Failed to update bot {key}"))?;
    println!("Updated bot {key}.");
    output::print_table(std::slice::from_ref(&updated));
    Ok(())
}

fn edit_request(existing: &BotData, fields: &BotFields) -> Result<BotRequest> {
    Ok(BotRequest {
        secretkey: existing.secretkey.clone(),
        prompt: fields.prompt()?.unwrap_or_else(|| existing.prompt.clone()),
        content: fields.content(&existing.content)?,
        air_reply_single_ratio: fields.air_reply_ratio.or(existing.air_reply_single_ratio),
    })
}

pub async fn toggle_bot(client: &ApiClient, pubkey: &str) -> Result<()> {
    let bot = BotPubkey::parse(pubkey)?;
    let updated = match client.toggle_bot(bot.as_str()).await {
        Err(e) if not_found(&e) => bail!("no bot with public key {bot}"),
        other => other.with_context(|| format!("Failed to toggle bot {bot}"))?,
    };
    output::print_table(std::slice::from_ref(&updated));
    Ok(())
}

pub async fn delete_bot(client: &ApiClient, pubkey: &str, yes: bool) -> Result<()> {
    let bot = BotPubkey::parse(pubkey)?;
    if !confirm(&format!("Delete bot {bot}?"), yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    client
        .delete_bot(bot.as_str())
        .await
        .with_context(|| format!("Failed to delete bot {bot}"))?;
    println!("Deleted bot {bot}.");
    Ok(())
}

pub async fn pause(client: &ApiClient, state: Option<PauseState>) -> Result<()> {
    let current = match state {
        None => client.global_pause().await,
        Some(state) => client.set_global_pause(state == PauseState::On).await,
    }
    .context("Failed to reach the global pause endpoint")?;
    println!(
        "Replies are {}.",
        if current.paused { "paused" } else { "running" }
    );
    Ok(())
}

pub async fn stats(client: &ApiClient, json: bool) -> Result<()> {
    let stats = client.stats().await.context("Failed to load stats")?;
    if json {
        return output::print_json(&stats);
    }
    let s = &stats;
    println!(
        "Bot:       {} (up {}s, {} relay(s))",
        if s.bot_status.online { "online" } else { "offline" },
        s.bot_status.uptime_seconds,
        s.bot_status.connected_relays.len()
    );
    println!(
        "Replies:   {} today, {} this week, {} this month, {} total",
        s.reply_stats.today, s.reply_stats.this_week, s.reply_stats.this_month, s.reply_stats.total
    );
    println!(
        "Users:     {} unique, {} rate limited",
        s.conversation_stats.unique_users, s.conversation_stats.rate_limited_users
    );
    println!(
        "RAG:       {}/{} vectorized, {} pending, {} searches, avg similarity {:.3}",
        s.rag_stats.vectorized_events,
        s.rag_stats.total_events,
        s.rag_stats.pending_vectorization,
        s.rag_stats.total_searches,
        s.rag_stats.average_similarity
    );
    if !s.error_log.is_empty() {
        println!();
        println!("Recent errors:");
        for e in &s.error_log {
            println!(
                "  {}  [{}] {}",
                output::format_ts(e.timestamp),
                e.error_type,
                output::truncate(&e.message)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(content: &str) -> BotData {
        BotData {
            pubkey: "ab".into(),
            secretkey: "secret".into(),
            prompt: "old prompt".into(),
            content: content.into(),
            status: 0,
            air_reply_single_ratio: Some(40),
        }
    }

    #[test]
    fn pairs_split_on_the_first_equals() {
        assert_eq!(
            parse_pair(" about =a=b").unwrap(),
            ("about".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("no-equals").is_err());
        assert!(parse_pair(" =x").is_err());
    }

    #[test]
    fn edit_keeps_what_was_not_given() {
        let fields = BotFields {
            fields: vec!["display_name=Kuro".into()],
            unset: vec!["picture".into()],
            ..Default::default()
        };
        let req = edit_request(&bot(r#"{"name":"kuro","picture":"p.png"}"#), &fields).unwrap();
        assert_eq!(req.secretkey, "secret");
        assert_eq!(req.prompt, "old prompt");
        assert_eq!(req.air_reply_single_ratio, Some(40));
        let profile: serde_json::Value = serde_json::from_str(&req.content).unwrap();
        assert_eq!(profile, serde_json::json!({ "name": "kuro", "display_name": "Kuro" }));
    }

    #[test]
    fn removing_every_field_leaves_empty_content() {
        let fields = BotFields {
            unset: vec!["name".into()],
            air_reply_ratio: Some(0),
            ..Default::default()
        };
        let req = edit_request(&bot(r#"{"name":"kuro"}"#), &fields).unwrap();
        assert_eq!(req.content, "");
        assert_eq!(req.air_reply_single_ratio, Some(0));
        assert!(BotFields::default().is_empty());
    }

    #[test]
    fn prompt_only_edit_leaves_content_untouched() {
        let fields = BotFields {
            prompt: Some("new prompt".into()),
            ..Default::default()
        };
        let req = edit_request(&bot("not json"), &fields).unwrap();
        assert_eq!(req.prompt, "new prompt");
        assert_eq!(req.content, "not json");

        let fields = BotFields {
            fields: vec!["name=x".into()],
            ..Default::default()
        };
        assert!(edit_request(&bot("not json"), &fields).is_err());
    }
}
