mod config_cmd;
mod lists;
mod manage;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use replydesk_api_client::ApiClient;
use replydesk_runtime_config::ConsoleConfig;

use crate::lists::{EventFilterArgs, PageArgs};

#[derive(Parser)]
#[command(name = "replydesk", about = "Admin console for a reply bot server")]
struct Cli {
    /// Server URL for this invocation (overrides config and REPLYDESK_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and prune vectorized events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },

    /// Browse and edit a bot's conversation summaries
    Summaries {
        #[command(subcommand)]
        action: SummariesAction,
    },

    /// Show a bot's reply history, newest first
    Replies {
        /// Bot public key (hex)
        bot: String,
        /// Number of 50-row pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Per-call token usage
    TokenUsage {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Inspect and edit the follower cache
    FollowerCache {
        #[command(subcommand)]
        action: FollowerCacheAction,
    },

    /// Manage bots
    Bots {
        #[command(subcommand)]
        action: BotsAction,
    },

    /// Show or set the global reply pause
    Pause {
        #[arg(value_enum)]
        state: Option<manage::PauseState>,
    },

    /// Server statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Replies per bot per day over the last 30 days
    DailyReplies {
        /// Only this bot (public key, hex)
        #[arg(long)]
        bot: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Show or change one group of server settings
    Settings {
        #[arg(value_enum)]
        group: settings::Group,
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show or set configuration
    Config {
        /// Set the server URL
        #[arg(long = "set-server")]
        server_url: Option<String>,

        /// Set the request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Set the search debounce in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    /// List one page of events
    List {
        #[command(flatten)]
        filters: EventFilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete one event by row id
    Delete { id: i64 },
    /// Delete every event matching the filters
    BulkDelete {
        #[command(flatten)]
        filters: EventFilterArgs,
        #[arg(long)]
        search: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SummariesAction {
    /// List one page of a bot's summaries
    List {
        /// Bot public key (hex)
        bot: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Replace the text of one summary
    Edit {
        id: i64,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        user_input: String,
    },
    /// Delete one summary
    Delete { id: i64 },
    /// Delete a bot's summaries matching the search (all of them without one)
    BulkDelete {
        bot: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum FollowerCacheAction {
    /// List cached follow relations
    List {
        /// Only rows whose bot name or key contains this text
        #[arg(long)]
        bot: Option<String>,
        /// Only followers (true) or non-followers (false)
        #[arg(long)]
        following: Option<bool>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Overwrite the cached follow flag of one pair
    Set {
        user: String,
        bot: String,
        /// New value: true or false
        #[arg(long, action = clap::ArgAction::Set)]
        following: bool,
    },
    /// Forget one pair
    Delete { user: String, bot: String },
    /// Forget every cached pair
    Clear {
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current values (the default)
    Get {
        #[arg(long)]
        json: bool,
    },
    /// Change some values; the others keep what the server has
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        pairs: Vec<String>,
    },
}

#[derive(Subcommand)]
enum BotsAction {
    /// List bots
    List {
        #[arg(long)]
        json: bool,
    },
    /// Register a new bot
    Create {
        /// Secret key (nsec or hex); prompted for when omitted
        #[arg(long, conflicts_with = "generate_key")]
        secretkey: Option<String>,
        /// Let the server generate a fresh secret key
        #[arg(long)]
        generate_key: bool,
        #[command(flatten)]
        fields: manage::BotFields,
    },
    /// Change a bot's prompt, profile fields or air-reply ratio
    Edit {
        pubkey: String,
        #[command(flatten)]
        fields: manage::BotFields,
    },
    /// Flip a bot between active and paused
    Toggle { pubkey: String },
    /// Delete a bot
    Delete {
        pubkey: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli { server, command } = cli;
    if let Commands::Config {
        server_url,
        timeout_secs,
        debounce_ms,
    } = command
    {
        if server_url.is_none() && timeout_secs.is_none() && debounce_ms.is_none() {
            return config_cmd::show_config();
        }
        return config_cmd::set_config(server_url, timeout_secs, debounce_ms);
    }

    let mut config = replydesk_runtime_config::load().context("Failed to load config")?;
    if let Some(url) = server {
        config.server.url = url;
        replydesk_runtime_config::apply_compat_fallbacks(&mut config);
    }
    let client = connect(&config)?;
    let lists = &config.lists;

    match command {
        Commands::Events { action } => match action {
            EventsAction::List { filters, page } => {
                lists::list_events(&client, lists, &filters, &page).await
            }
            EventsAction::Delete { id } => manage::delete_event(&client, id).await,
            EventsAction::BulkDelete {
                filters,
                search,
                yes,
            } => manage::bulk_delete_events(&client, &filters, search, yes).await,
        },
        Commands::Summaries { action } => match action {
            SummariesAction::List { bot, page } => {
                lists::list_summaries(&client, lists, &bot, &page).await
            }
            SummariesAction::Edit {
                id,
                summary,
                user_input,
            } => manage::edit_summary(&client, id, summary, user_input).await,
            SummariesAction::Delete { id } => manage::delete_summary(&client, id).await,
            SummariesAction::BulkDelete { bot, search, yes } => {
                manage::bulk_delete_summaries(&client, &bot, search, yes).await
            }
        },
        Commands::Replies { bot, pages, json } => {
            lists::list_replies(&client, lists, &bot, pages, json).await
        }
        Commands::TokenUsage { page } => lists::list_token_usage(&client, lists, &page).await,
        Commands::FollowerCache { action } => match action {
            FollowerCacheAction::List {
                bot,
                following,
                page,
            } => lists::list_follower_cache(&client, lists, bot, following, &page).await,
            FollowerCacheAction::Set {
                user,
                bot,
                following,
            } => manage::set_follower(&client, &user, &bot, following).await,
            FollowerCacheAction::Delete { user, bot } => {
                manage::delete_follower(&client, &user, &bot).await
            }
            FollowerCacheAction::Clear { yes } => manage::clear_follower_cache(&client, yes).await,
        },
        Commands::Bots { action } => match action {
            BotsAction::List { json } => manage::list_bots(&client, json).await,
            BotsAction::Create {
                secretkey,
                generate_key,
                fields,
            } => manage::create_bot(&client, secretkey, generate_key, &fields).await,
            BotsAction::Edit { pubkey, fields } => {
                manage::edit_bot(&client, &pubkey, &fields).await
            }
            BotsAction::Toggle { pubkey } => manage::toggle_bot(&client, &pubkey).await,
            BotsAction::Delete { pubkey, yes } => manage::delete_bot(&client, &pubkey, yes).await,
        },
        Commands::Pause { state } => manage::pause(&client, state).await,
        Commands::Stats { json } => manage::stats(&client, json).await,
        Commands::DailyReplies { bot, json } => settings::daily_replies(&client, bot, json).await,
        Commands::Settings { group, action } => match action {
            None => settings::show(&client, group, false).await,
            Some(SettingsAction::Get { json }) => settings::show(&client, group, json).await,
            Some(SettingsAction::Set { pairs }) => settings::set(&client, group, &pairs).await,
        },
        Commands::Config { .. } => Ok(()),
    }
}

fn connect(config: &ConsoleConfig) -> Result<ApiClient> {
    ApiClient::new(&config.server.url, config.server.timeout())
        .with_context(|| format!("Failed to build a client for {}", config.server.url))
}
