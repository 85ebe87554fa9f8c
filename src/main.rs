use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use postfeed::config::Config;
use postfeed::feed::{FeedAggregator, PostCache};
use postfeed::resource::ResourceState;
use postfeed::storage::{Database, DatabaseError};
use postfeed::theme::{ThemePreference, ThemeVariant};
use postfeed::view::{self, RenderOptions};

/// Get the config directory path (~/.config/postfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("postfeed"))
}

fn ensure_config_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create config directory")?;
    }

    // User-only access on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "postfeed", about = "Read a blog feed from the terminal")]
struct Args {
    /// Config file (defaults to ~/.config/postfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the latest posts
    Posts {
        /// Print normalized posts as JSON
        #[arg(long)]
        json: bool,

        /// Shorter excerpts for narrow terminals
        #[arg(long)]
        compact: bool,

        /// Open the N-th post (1-based) in the browser
        #[arg(long, value_name = "N")]
        open: Option<usize>,
    },
    /// Show or change the theme preference
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between dark and light
    Toggle,
    /// Set the theme explicitly
    Set {
        /// dark or light
        variant: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match args.command.unwrap_or(Command::Posts {
        json: false,
        compact: false,
        open: None,
    }) {
        Command::Posts {
            json,
            compact,
            open,
        } => run_posts(&config, json, RenderOptions { compact }, open).await,
        Command::Theme { action } => {
            ensure_config_dir(&config_dir)?;
            run_theme(&config_dir, action.unwrap_or(ThemeAction::Show)).await
        }
    }
}

async fn run_posts(
    config: &Config,
    json: bool,
    opts: RenderOptions,
    open: Option<usize>,
) -> Result<()> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("postfeed/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("Failed to build HTTP client")?;

    let cache = Arc::new(PostCache::new(config.cache_policy(), config.cache_capacity));
    let aggregator = FeedAggregator::new(client, &config.feed_settings(), cache)
        .context("Invalid feed configuration")?;

    let resource = aggregator.resource();
    let (mut rx, handle) = resource.spawn_load();

    let state = loop {
        if rx.changed().await.is_err() {
            break resource.state();
        }
        let state = rx.borrow_and_update().clone();
        match state {
            ResourceState::Idle => continue,
            ResourceState::Loading => {
                if !json {
                    eprintln!("{}", view::LOADING_MESSAGE);
                }
            }
            settled => break settled,
        }
    };
    handle.await.context("Feed loader task failed")?;

    let posts = match &state {
        ResourceState::Success(posts) => Arc::clone(posts),
        ResourceState::Error(err) => {
            eprintln!("{}", view::render_state(&state, opts));
            anyhow::bail!("Feed unavailable ({:?})", err.kind());
        }
        ResourceState::Idle | ResourceState::Loading => {
            anyhow::bail!("Feed loader stopped before finishing")
        }
    };

    if json {
        let out = serde_json::to_string_pretty(posts.as_slice())
            .context("Failed to serialize posts")?;
        println!("{out}");
    } else {
        println!("{}", view::render_posts(&posts, opts));
    }

    if let Some(n) = open {
        let post = n
            .checked_sub(1)
            .and_then(|i| posts.get(i))
            .with_context(|| format!("No post number {n} (have {})", posts.len()))?;
        open::that(&post.link).with_context(|| format!("Failed to open {}", post.link))?;
    }

    Ok(())
}

async fn run_theme(config_dir: &Path, action: ThemeAction) -> Result<()> {
    let db_path = config_dir.join("prefs.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: Another instance of postfeed appears to be running. Please close it and try again.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let mut theme = ThemePreference::load(&db)
        .await
        .context("Failed to read theme preference")?;

    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            theme.toggle(&db).await.context("Failed to save theme")?;
        }
        ThemeAction::Set { variant } => {
            let variant = ThemeVariant::from_str_name(&variant)
                .with_context(|| format!("Unknown theme '{variant}' (expected dark or light)"))?;
            theme.set(&db, variant).await.context("Failed to save theme")?;
        }
    }

    println!("{}", theme.variant().name());
    Ok(())
}
