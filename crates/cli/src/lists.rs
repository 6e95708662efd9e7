use anyhow::{Context, Result, bail};
use clap::Args;
use replydesk_api_client::ApiClient;
use replydesk_list::{
    BotPubkey, EventsSource, FilterStore, FollowerCacheSource, ListOptions, ListView, PageSource,
    RepliesSource, SortOrder, SummariesSource, TokenUsageSource, ViewState, schemas,
};
use replydesk_runtime_config::ListSettings;

use crate::output::{self, Render};

/// Search, sort and paging flags shared by the list commands.
#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Text search
    #[arg(long)]
    pub search: Option<String>,
    /// Sort field
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort order: asc or desc
    #[arg(long)]
    pub order: Option<SortOrder>,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (snapped to the sizes the list offers)
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EventFilterArgs {
    /// Only events with (true) or without (false) an embedding
    #[arg(long)]
    pub has_embedding: Option<bool>,
    /// Only Japanese (true) or non-Japanese (false) events
    #[arg(long)]
    pub japanese: Option<bool>,
    /// Only events of this type, e.g. `bot_reply`
    #[arg(long = "type")]
    pub event_type: Option<String>,
}

impl EventFilterArgs {
    pub fn apply(&self, store: &mut FilterStore) -> Result<()> {
        if let Some(v) = self.has_embedding {
            store.set_filter("has_embedding", v)?;
        }
        if let Some(v) = self.japanese {
            store.set_filter("is_japanese", v)?;
        }
        if let Some(t) = &self.event_type {
            store.set_filter("event_type", t.as_str())?;
        }
        Ok(())
    }
}

/// Apply the flags to a fresh store. The page is set last because every other
/// change resets it.
fn apply_page_args(store: &mut FilterStore, args: &PageArgs) {
    if let Some(search) = &args.search {
        store.set_search_text(search);
    }
    if args.sort.is_some() || args.order.is_some() {
        let field = args
            .sort
            .clone()
            .unwrap_or_else(|| store.descriptor().sort_by);
        let order = args.order.unwrap_or(store.descriptor().sort_order);
        store.set_sort(&field, order);
    }
    if let Some(size) = args.page_size {
        store.set_page_size(size);
    }
    store.set_page(args.page.saturating_sub(1));
}

/// Mount a view, wait for its first page, and tear it down.
async fn load_page<S>(
    store: &mut FilterStore,
    source: S,
    settings: &ListSettings,
) -> Result<ViewState<S::Row>>
where
    S: PageSource,
{
    let view = ListView::mount(store, source, ListOptions::from(settings));
    let state = view.settled_after(0).await;
    view.unmount().await;
    if let Some(notice) = &state.notice {
        bail!("{}", notice.message);
    }
    Ok(state)
}

fn print_state<R: Render>(state: &ViewState<R>, json: bool) -> Result<()> {
    if json {
        output::print_json_page(&state.cache)
    } else {
        output::print_table(state.cache.rows());
        println!();
        println!("{}", output::footer(&state.cache));
        Ok(())
    }
}

pub async fn list_events(
    client: &ApiClient,
    settings: &ListSettings,
    filters: &EventFilterArgs,
    args: &PageArgs,
) -> Result<()> {
    let mut store = FilterStore::new(schemas::events());
    filters.apply(&mut store)?;
    apply_page_args(&mut store, args);
    let state = load_page(&mut store, EventsSource::new(client.clone()), settings).await?;
    print_state(&state, args.json)
}

pub async fn list_summaries(
    client: &ApiClient,
    settings: &ListSettings,
    bot: &str,
    args: &PageArgs,
) -> Result<()> {
    let bot = BotPubkey::parse(bot)?;
    let mut store = FilterStore::new(schemas::summaries());
    apply_page_args(&mut store, args);
    let source = SummariesSource::new(client.clone(), bot);
    let state = load_page(&mut store, source, settings).await?;
    print_state(&state, args.json)
}

pub async fn list_token_usage(
    client: &ApiClient,
    settings: &ListSettings,
    args: &PageArgs,
) -> Result<()> {
    let mut store = FilterStore::new(schemas::token_usage());
    apply_page_args(&mut store, args);
    let state = load_page(&mut store, TokenUsageSource::new(client.clone()), settings).await?;
    print_state(&state, args.json)
}

pub async fn list_follower_cache(
    client: &ApiClient,
    settings: &ListSettings,
    bot: Option<String>,
    following: Option<bool>,
    args: &PageArgs,
) -> Result<()> {
    let mut store = FilterStore::new(schemas::follower_cache());
    if let Some(bot) = bot {
        store.set_filter("bot", bot)?;
    }
    if let Some(following) = following {
        store.set_filter("is_follower", following)?;
    }
    apply_page_args(&mut store, args);
    let source = FollowerCacheSource::new(client.clone(), settings.client_side_max_rows);
    let state = load_page(&mut store, source, settings).await?;
    print_state(&state, args.json)
}

/// Replies grow with "load more" instead of numbered pages.
pub async fn list_replies(
    client: &ApiClient,
    settings: &ListSettings,
    bot: &str,
    pages: usize,
    json: bool,
) -> Result<()> {
    let bot = BotPubkey::parse(bot)?;
    let mut store = FilterStore::new(schemas::replies());
    let view = ListView::mount(
        &mut store,
        RepliesSource::new(client.clone(), bot),
        ListOptions::from(settings),
    );

    let mut state = view.settled_after(0).await;
    for _ in 1..pages.max(1) {
        if state.notice.is_some() || !state.cache.has_more() {
            break;
        }
        store.load_more();
        state = view.settled_after(state.revision).await;
    }
    view.unmount().await;

    if let Some(notice) = &state.notice {
        bail!("{}", notice.message);
    }
    print_state(&state, json).context("Failed to print replies")
}
