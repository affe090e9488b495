//! Binary entrypoint for the discussion CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and a small sample board
//! - `render --path <path> [--query <qs>] [--user <name>] [--caps <list>]` - run one
//!   request against the board and print the page HTML or the redirect target
//! - `check` - load the board and print a short summary
//! - `search <keywords>` - topics and replies containing the keywords
//! - `timeline [--from <time>] [--to <time>]` - board activity, newest first
//! - `link <target>` - render a `forum:`/`topic:`/`message:` wiki link
//!
//! See the library crate docs for module-level details: `discussion::`.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};

use discussion::acl::Capabilities;
use discussion::config::Config;
use discussion::dispatch::Component;
use discussion::handler::{handle, Request, Response, Session};
use discussion::render::format_datetime;
use discussion::render::links::resolve_link;
use discussion::storage::Board;

#[derive(Parser)]
#[command(name = "discussion")]
#[command(about = "Forum, topic and threaded message views for a discussion board")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and a sample board
    Init,
    /// Run one request and print the resulting page or redirect
    Render {
        /// Request path, e.g. /discussion/2/1
        #[arg(short, long)]
        path: String,
        /// Query string or urlencoded form body
        #[arg(short, long, default_value = "")]
        query: String,
        /// Authenticated user name
        #[arg(short, long, default_value = "anonymous")]
        user: String,
        /// Granted capabilities, e.g. "view,append,moderate"
        #[arg(long, default_value = "view")]
        caps: String,
        /// Serve the path through another component (core, admin, wiki)
        #[arg(long)]
        component: Option<String>,
        /// Thread layout (tree, flat-asc, flat-desc)
        #[arg(long)]
        display: Option<String>,
        /// Last visit of the topic (RFC 3339); later replies are marked new
        #[arg(long)]
        visited: Option<String>,
        /// Write the board back after a mutation
        #[arg(long)]
        save: bool,
    },
    /// Load the board and report what it holds
    Check,
    /// Search topic subjects and bodies and reply bodies
    Search {
        /// Keywords, matched as one phrase
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// List forums, topics and replies created in a time window
    Timeline {
        /// Window start (RFC 3339); defaults to 30 days before --to
        #[arg(long)]
        from: Option<String>,
        /// Window end (RFC 3339); defaults to now
        #[arg(long)]
        to: Option<String>,
    },
    /// Render a wiki link such as topic:5
    Link {
        target: String,
        /// Link text; defaults to the target
        #[arg(long)]
        label: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, everything else needs it up front
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new discussion configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let config = Config::load(&cli.config).await?;
            let board_path = Path::new(&config.storage.board_file);
            if tokio::fs::try_exists(board_path).await.unwrap_or(false) {
                warn!("Board {} already exists; leaving it untouched", board_path.display());
            } else {
                Board::sample(Utc::now())
                    .save(board_path)
                    .await
                    .with_context(|| format!("Failed to write sample board {}", board_path.display()))?;
                info!("Sample board written to {}", board_path.display());
            }
        }
        Commands::Render {
            path,
            query,
            user,
            caps,
            component,
            display,
            visited,
            save,
        } => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let board_path = Path::new(&config.storage.board_file);
            let mut board = open_board(board_path).await?;

            let mut session = Session::default();
            if let Some(display) = display {
                session.display = display.parse()?;
            }
            let request = Request {
                component: component.map(|c| c.parse::<Component>()).transpose()?,
                visited: visited.map(|v| parse_time(&v)).transpose()?,
                ..Request::new(&path, &query, &user, Capabilities::parse_list(&caps)?)
            };

            let before = board.clone();
            match handle(&mut board, &config.discussion, &mut session, &request)? {
                Response::Page(page) => {
                    info!("Rendered {} ({})", page.mode, page.title);
                    println!("{}", page.html);
                }
                Response::Redirect(href) => println!("Location: {}", href),
            }

            if board != before {
                if save {
                    board.save(board_path).await?;
                    info!("Board saved to {}", board_path.display());
                } else {
                    warn!("Board changed but --save was not given; changes discarded");
                }
            }
        }
        Commands::Check => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let board_path = Path::new(&config.storage.board_file);
            let board = open_board(board_path).await?;
            let (groups, forums, topics, replies) = board.counts();
            println!("{} ({})", config.discussion.title, board_path.display());
            println!("  groups:  {}", groups);
            println!("  forums:  {}", forums);
            println!("  topics:  {}", topics);
            println!("  replies: {}", replies);
            println!("  users:   {}", board.known_users().join(", "));
        }
        Commands::Search { keywords } => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let board = open_board(Path::new(&config.storage.board_file)).await?;
            let hits = board.search(&keywords.join(" "));
            if hits.is_empty() {
                println!("No matches");
            }
            for hit in hits {
                println!(
                    "{}  {}  {} ({})",
                    hit.href(&config.discussion.base_href),
                    hit.title,
                    hit.author,
                    format_datetime(hit.time)
                );
                println!("    {}", hit.excerpt.replace('\n', " "));
            }
        }
        Commands::Timeline { from, to } => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let board = open_board(Path::new(&config.storage.board_file)).await?;
            let stop = to.map(|t| parse_time(&t)).transpose()?.unwrap_or_else(Utc::now);
            let start = from
                .map(|t| parse_time(&t))
                .transpose()?
                .unwrap_or(stop - Duration::days(30));
            for event in board.timeline(start, stop) {
                println!(
                    "{}  {}  {}",
                    format_datetime(event.time),
                    event.title,
                    event.href(&config.discussion.base_href)
                );
            }
        }
        Commands::Link { target, label } => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let board = open_board(Path::new(&config.storage.board_file)).await?;
            println!(
                "{}",
                resolve_link(&board, &config.discussion.base_href, &target, label.as_deref())?
            );
        }
    }

    Ok(())
}

async fn open_board(path: &Path) -> Result<Board> {
    Board::load(path)
        .await
        .with_context(|| format!("Failed to load board {}", path.display()))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| anyhow!("Invalid time '{}': {}", value, e))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
