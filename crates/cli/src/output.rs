use anyhow::Result;
use chrono::{DateTime, Local};
use replydesk_api::{
    BotData, BotReply, FollowerCacheEntry, SummaryData, TokenDetail, VectorizedEvent,
};
use replydesk_list::{PageCache, Total};
use serde::Serialize;

const CELL_MAX: usize = 48;

/// A row the CLI can print as a table line.
pub trait Render: Serialize {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

/// Unix seconds as local time.
pub fn format_ts(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Single line, at most [`CELL_MAX`] characters.
pub fn truncate(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= CELL_MAX {
        return flat;
    }
    let mut out: String = flat.chars().take(CELL_MAX - 1).collect();
    out.push('…');
    out
}

pub fn short_key(key: &str) -> String {
    if key.chars().count() <= 12 {
        return key.to_string();
    }
    let head: String = key.chars().take(12).collect();
    format!("{head}…")
}

pub fn print_table<R: Render>(rows: &[R]) {
    if rows.is_empty() {
        println!("No rows.");
        return;
    }
    let headers = R::headers();
    let cells: Vec<Vec<String>> = rows.iter().map(Render::cells).collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };
    line(headers.to_vec());
    for row in &cells {
        line(row.iter().map(String::as_str).collect());
    }
}

pub fn footer<R>(cache: &PageCache<R>) -> String {
    let mut out = cache.range_label();
    if let Some(pages) = cache.page_count() {
        out.push_str(&format!("  (page {} of {})", cache.page_index() + 1, pages.max(1)));
    } else {
        out.push_str(&format!("  (page {})", cache.page_index() + 1));
    }
    if cache.has_more() {
        out.push_str("  more available");
    }
    out
}

pub fn print_json_page<R: Serialize>(cache: &PageCache<R>) -> Result<()> {
    let total = match cache.total() {
        Total::Exact(n) => serde_json::Value::from(n),
        Total::Unknown => serde_json::Value::Null,
    };
    let body = serde_json::json!({
        "rows": cache.rows(),
        "total": total,
        "page": cache.page_index() + 1,
        "page_size": cache.page_size(),
        "has_more": cache.has_more(),
        "range": cache.range_label(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Render for VectorizedEvent {
    fn headers() -> &'static [&'static str] {
        &["ID", "KIND", "CREATED", "TYPE", "EMB", "JA", "CONTENT"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.kind.to_string(),
            format_ts(self.created_at),
            self.event_type.clone().unwrap_or_else(|| "-".into()),
            yes_no(self.has_embedding),
            yes_no(self.is_japanese),
            truncate(&self.content),
        ]
    }
}

impl Render for SummaryData {
    fn headers() -> &'static [&'static str] {
        &["ID", "CREATED", "FROM", "TO", "USER INPUT", "SUMMARY"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format_ts(self.created_at),
            format_ts(self.from_timestamp),
            format_ts(self.to_timestamp),
            truncate(&self.user_input),
            truncate(&self.summary),
        ]
    }
}

impl Render for BotReply {
    fn headers() -> &'static [&'static str] {
        &["CREATED", "EVENT", "TO", "CONTENT"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format_ts(self.created_at),
            short_key(&self.event_id),
            self.reply_to_user
                .as_deref()
                .map(short_key)
                .unwrap_or_else(|| "-".into()),
            truncate(&self.content),
        ]
    }
}

impl Render for TokenDetail {
    fn headers() -> &'static [&'static str] {
        &["CREATED", "BOT", "CATEGORY", "PROMPT", "COMPLETION", "TOTAL"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format_ts(self.created_at),
            short_key(&self.bot_pubkey),
            self.category_display_name.clone(),
            self.prompt_tokens.to_string(),
            self.completion_tokens.to_string(),
            self.total_tokens.to_string(),
        ]
    }
}

impl Render for FollowerCacheEntry {
    fn headers() -> &'static [&'static str] {
        &["USER", "BOT", "FOLLOWS", "CACHED"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_name
                .clone()
                .unwrap_or_else(|| short_key(&self.user_pubkey)),
            self.bot_name
                .clone()
                .unwrap_or_else(|| short_key(&self.bot_pubkey)),
            yes_no(self.is_follower),
            format_ts(self.cached_at),
        ]
    }
}

impl Render for BotData {
    fn headers() -> &'static [&'static str] {
        &["PUBKEY", "NAME", "STATUS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.pubkey.clone(),
            self.display_name().unwrap_or_else(|| "-".into()),
            if self.is_active() { "active" } else { "paused" }.to_string(),
        ]
    }
}

fn yes_no(b: bool) -> String {
    if b { "yes" } else { "no" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use replydesk_list::PageResult;

    #[test]
    fn truncate_flattens_and_shortens() {
        assert_eq!(truncate("a\nb"), "a b");
        let long = "あ".repeat(60);
        let out = truncate(&long);
        assert_eq!(out.chars().count(), CELL_MAX);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn short_key_keeps_short_values() {
        assert_eq!(short_key("abc"), "abc");
        assert_eq!(short_key(&"f".repeat(64)), format!("{}…", "f".repeat(12)));
    }

    #[test]
    fn invalid_timestamp_renders_dash() {
        assert_eq!(format_ts(i64::MAX), "-");
    }

    #[test]
    fn footer_reports_range_and_pages() {
        let mut cache = PageCache::new();
        cache.replace(PageResult {
            rows: vec![1; 25],
            total: Total::Exact(120),
            page_index: 1,
            page_size: 25,
        });
        assert_eq!(footer(&cache), "26–50 of 120  (page 2 of 5)  more available");

        cache.replace(PageResult {
            rows: vec![1; 10],
            total: Total::Unknown,
            page_index: 0,
            page_size: 25,
        });
        assert_eq!(footer(&cache), "1–10  (page 1)");
    }
}
