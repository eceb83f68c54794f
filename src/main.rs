use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clipmaster::clipboard::{self, ClipboardBackend, ClipboardWatcher};
use clipmaster::models::{ClipMeta, FavoriteOutcome};
use clipmaster::search::SemanticSearchClient;
use clipmaster::session::{Session, Tab};
use clipmaster::storage::{
    BincodeStateStorage, Config, ConfigStorage, TomlConfigStorage, ensure_directories,
    EXPORT_FILENAME,
};

#[derive(Parser)]
#[command(name = "clipmaster")]
#[command(about = "Clipboard history manager with favorites and semantic search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TabArg {
    Recent,
    Favorites,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Recent => Tab::Recent,
            TabArg::Favorites => Tab::Favorites,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProArg {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the clipboard and capture new text (run in the background)
    Watch,

    /// Capture TEXT directly, bypassing the clipboard poll
    Add {
        /// Text to capture; read from stdin when omitted
        text: Option<String>,

        /// URL of the page the text came from
        #[arg(long)]
        source_url: Option<String>,

        /// Title of the source page or document
        #[arg(long)]
        source_title: Option<String>,

        /// Name of the source application
        #[arg(long)]
        app_name: Option<String>,
    },

    /// Show clips from the recent or favorites list
    List {
        /// Which list to show
        #[arg(short, long, value_enum, default_value = "recent")]
        tab: TabArg,

        /// Number of entries to show (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Filter the list by this query
        #[arg(short, long)]
        query: Option<String>,

        /// Rank the query remotely instead of substring filtering (pro)
        #[arg(short, long, requires = "query")]
        semantic: bool,

        /// Keep the view open and refresh it as clips are captured
        #[arg(short, long, conflicts_with = "query")]
        follow: bool,
    },

    /// Copy the clip at INDEX back to the clipboard
    Copy {
        /// 1-based index into the list (as shown by `list`)
        index: usize,

        /// Which list to copy from
        #[arg(short, long, value_enum, default_value = "recent")]
        tab: TabArg,
    },

    /// Toggle the favorite star of the clip at INDEX
    Favorite {
        /// 1-based index into the list (as shown by `list`)
        index: usize,

        /// Which list the index refers to
        #[arg(short, long, value_enum, default_value = "recent")]
        tab: TabArg,
    },

    /// Show or change the list caps
    Settings {
        /// New recent-list cap
        #[arg(long)]
        max_clips: Option<usize>,

        /// New favorites cap
        #[arg(long)]
        max_favorites: Option<usize>,
    },

    /// Switch the account tier
    Pro {
        #[arg(value_enum)]
        state: ProArg,
    },

    /// Export the favorites list to a JSON file
    Export {
        /// Output path (default: clipmaster-favorites.json)
        path: Option<PathBuf>,
    },

    /// Import favorites from a JSON file, replacing the current list
    Import {
        path: PathBuf,
    },

    /// Show clip store statistics
    Stats,
}

/// Clipboard stand-in for commands that never touch the clipboard
struct NullBackend;

impl ClipboardBackend for NullBackend {
    fn read_text(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn write_text(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Null"
    }
}

/// Loaded configuration plus the state storage built from it
struct Env {
    config: Config,
    storage: BincodeStateStorage,
    data_dir: PathBuf,
}

fn load_env() -> Result<Env> {
    let (data_dir, config_dir) = ensure_directories()?;

    let config_storage = TomlConfigStorage::new(config_dir.join("clipmaster.toml"));
    let config = config_storage.load()?;

    let storage = BincodeStateStorage::new(
        data_dir.join("state.bin"),
        config.general.initial_settings(),
    );

    Ok(Env {
        config,
        storage,
        data_dir,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The watch daemon logs to a rolling file; everything else to stderr
    if matches!(&cli.command, Commands::Watch) {
        let env = load_env()?;
        let level = if env.config.general.debug_logging {
            "debug"
        } else {
            "info"
        };
        clipmaster::logging::init_file_logger(env.data_dir.join("clipmaster.log"), level)?;
        return cmd_watch(env);
    }

    env_logger::init();

    match cli.command {
        Commands::Watch => unreachable!("handled above"),
        Commands::Add {
            text,
            source_url,
            source_title,
            app_name,
        } => cmd_add(text, source_url, source_title, app_name),
        Commands::List {
            tab,
            limit,
            query,
            semantic,
            follow,
        } => cmd_list(tab.into(), limit, query, semantic, follow),
        Commands::Copy { index, tab } => cmd_copy(index, tab.into()),
        Commands::Favorite { index, tab } => cmd_favorite(index, tab.into()),
        Commands::Settings {
            max_clips,
            max_favorites,
        } => cmd_settings(max_clips, max_favorites),
        Commands::Pro { state } => cmd_pro(matches!(state, ProArg::On)),
        Commands::Export { path } => cmd_export(path),
        Commands::Import { path } => cmd_import(path),
        Commands::Stats => cmd_stats(),
    }
}

/// Run the clipboard poll loop in the foreground
fn cmd_watch(env: Env) -> Result<()> {
    let backend = clipboard::create_backend()?;
    let interval = Duration::from_millis(env.config.general.poll_interval_ms);
    let mut watcher = ClipboardWatcher::new(backend, Box::new(env.storage), interval);

    // Runs until the process is terminated
    let shutdown = AtomicBool::new(false);
    watcher.run(&shutdown);

    Ok(())
}

/// Feed text into the store without going through the clipboard, for copy
/// events observed by other tooling (editor plugins, shell pipelines)
fn cmd_add(
    text: Option<String>,
    source_url: Option<String>,
    source_title: Option<String>,
    app_name: Option<String>,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    let meta = ClipMeta {
        source_url,
        source_title,
        app_name,
    };

    let mut session = read_session(Tab::Recent)?;
    match session.capture(&text, meta)? {
        Some(clip) => println!("Captured: {}", clip.preview(60)),
        None => println!("Nothing to capture (empty text)."),
    }

    Ok(())
}

fn read_session(tab: Tab) -> Result<Session> {
    let env = load_env()?;
    let mut session = Session::open(Box::new(env.storage), Box::new(NullBackend))?;
    session.switch_tab(tab);
    Ok(session)
}

fn render_list(session: &Session, clips: &[clipmaster::Clip], limit: usize) {
    if clips.is_empty() {
        println!("(no clips)");
        return;
    }

    for (i, clip) in clips.iter().take(limit).enumerate() {
        let star = if session.is_favorite(&clip.text) {
            "*"
        } else {
            " "
        };
        println!("{:3}. [{}] {}", i + 1, star, clip.preview(60));
    }
}

fn cmd_list(
    tab: Tab,
    limit: usize,
    query: Option<String>,
    semantic: bool,
    follow: bool,
) -> Result<()> {
    let env = load_env()?;
    let search_config = env.config.search.clone();
    let follow_interval = Duration::from_millis(env.config.general.follow_interval_ms);

    let mut session = Session::open(Box::new(env.storage), Box::new(NullBackend))?;
    session.switch_tab(tab);

    if follow {
        // Pinned mode: pure-read refresh loop until the process is terminated
        let shutdown = AtomicBool::new(false);
        session.follow(follow_interval, &shutdown, |snapshot| {
            let clips = match tab {
                Tab::Recent => &snapshot.recent,
                Tab::Favorites => &snapshot.favorites,
            };
            // Clear screen between refreshes
            print!("\x1b[2J\x1b[H");
            for (i, clip) in clips.iter().take(limit).enumerate() {
                println!("{:3}. {}", i + 1, clip.preview(60));
            }
        });
        return Ok(());
    }

    match query {
        Some(query) if semantic => {
            if !session.snapshot().settings.is_pro {
                println!("Semantic search requires a pro account. Try `clipmaster pro on`.");
                return Ok(());
            }
            let client = SemanticSearchClient::from_config(&search_config)
                .context("Semantic search is not configured")?;
            let results = session.search(&query, Some(&client));
            render_list(&session, &results, limit);
        }
        Some(query) => {
            let results: Vec<clipmaster::Clip> =
                session.filter(&query).into_iter().cloned().collect();
            render_list(&session, &results, limit);
        }
        None => {
            let clips = session.visible().to_vec();
            render_list(&session, &clips, limit);
        }
    }

    Ok(())
}

fn cmd_copy(index: usize, tab: Tab) -> Result<()> {
    let env = load_env()?;
    let backend = clipboard::create_backend()?;
    let mut session = Session::open(Box::new(env.storage), backend)?;
    session.switch_tab(tab);

    let position = index.checked_sub(1).context("Index starts at 1")?;
    match session.activate(position)? {
        Some(clip) => println!("Copied: {}", clip.preview(60)),
        None => println!("No clip at index {}", index),
    }

    Ok(())
}

fn cmd_favorite(index: usize, tab: Tab) -> Result<()> {
    let mut session = read_session(tab)?;

    let position = index.checked_sub(1).context("Index starts at 1")?;
    match session.toggle_favorite(position)? {
        Some(FavoriteOutcome::Added) => println!("Added to favorites."),
        Some(FavoriteOutcome::Removed) => println!("Removed from favorites."),
        Some(FavoriteOutcome::LimitReached) => {
            let cap = session.snapshot().settings.max_favorites;
            println!(
                "Favorites limit reached ({cap}). Upgrade with `clipmaster pro on` for more."
            );
        }
        None => println!("No clip at index {}", index),
    }

    Ok(())
}

fn cmd_settings(max_clips: Option<usize>, max_favorites: Option<usize>) -> Result<()> {
    let mut session = read_session(Tab::Recent)?;

    let settings = if max_clips.is_some() || max_favorites.is_some() {
        let current = session.snapshot().settings.clone();
        session.apply_settings(
            max_clips.unwrap_or(current.max_clips),
            max_favorites.unwrap_or(current.max_favorites),
        )?
    } else {
        session.snapshot().settings.clone()
    };

    println!("max_clips: {}", settings.max_clips);
    println!("max_favorites: {}", settings.max_favorites);
    println!("tier: {}", if settings.is_pro { "pro" } else { "free" });

    Ok(())
}

fn cmd_pro(enabled: bool) -> Result<()> {
    let mut session = read_session(Tab::Recent)?;
    let settings = session.set_pro(enabled)?;

    if settings.is_pro {
        println!("Pro tier enabled (caps up to 1000, semantic search available).");
    } else {
        println!("Back on the free tier; caps re-clamped to the free ceilings.");
    }

    Ok(())
}

fn cmd_export(path: Option<PathBuf>) -> Result<()> {
    let session = read_session(Tab::Favorites)?;
    let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILENAME));

    session.export_favorites(&path)?;
    println!(
        "Exported {} favorites to {}",
        session.snapshot().favorites.len(),
        path.display()
    );

    Ok(())
}

fn cmd_import(path: PathBuf) -> Result<()> {
    let mut session = read_session(Tab::Favorites)?;

    match session.import_favorites(&path) {
        Ok(count) => println!("Imported {} favorites from {}", count, path.display()),
        Err(e) => {
            // Reject with a visible error; nothing was mutated
            eprintln!("Import failed: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn cmd_stats() -> Result<()> {
    let session = read_session(Tab::Recent)?;
    let snapshot = session.snapshot();

    println!("Clip Store Statistics");
    println!("=====================");
    println!(
        "Recent clips: {} (cap {})",
        snapshot.recent.len(),
        snapshot.settings.max_clips
    );
    println!(
        "Favorites: {} (cap {})",
        snapshot.favorites.len(),
        snapshot.settings.max_favorites
    );
    println!(
        "Tier: {}",
        if snapshot.settings.is_pro { "pro" } else { "free" }
    );

    Ok(())
}
