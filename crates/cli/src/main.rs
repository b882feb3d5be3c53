use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homespace_cli::{serve, session, watch};
use homespace_core::channel::{Command, Event, HomeSpace};
use homespace_core::config::{self, AppConfig};
use homespace_core::home;
use homespace_core::models::TagRecord;
use homespace_core::tag_index;
use std::path::PathBuf;
use storage::SettingsStore;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let root = cli.root.clone();
    let date = cli.date.clone();

    match cli.command {
        Commands::Init { dir } => run_init(cfg, dir).await,
        Commands::Home { json } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            run_home(space, json).await
        }
        Commands::Save { name, content } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            let val = match content {
                Some(c) => c,
                None => read_stdin().await?,
            };
            print_event(&space.handle(Command::NoteUpdate { name, val }).await?)
        }
        Commands::Rename {
            prev,
            new,
            layout_id,
        } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            let event = space
                .handle(Command::Rename {
                    prev_name: prev,
                    new_name: new,
                    layout_id,
                })
                .await?;
            print_event(&event)
        }
        Commands::Tag { tag, file } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            let event = space
                .handle(Command::CreateTag {
                    tag_name: tag,
                    file_name: file,
                    file_id: None,
                })
                .await?;
            print_event(&event)
        }
        Commands::Untag { tag, file } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            let event = space
                .handle(Command::RemoveFileTag {
                    tag_name: tag,
                    file_name: file,
                    file_id: None,
                    tag_id: None,
                })
                .await?;
            print_event(&event)
        }
        Commands::Tags { json } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            run_tags(space, json).await
        }
        Commands::Open { paths } => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            print_event(&space.handle(Command::Open { paths }).await?)
        }
        Commands::Serve => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve::serve_lines(space, stdin, tokio::io::stdout()).await
        }
        Commands::Watch => {
            let space = session::open(&cfg, root, date.as_deref()).await?;
            watch::watch_home(space, print_event).await
        }
    }
}

#[derive(Parser)]
#[command(name = "homespace")]
#[command(about = "Day-based markdown notes with hard-link tags", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Use this root instead of the stored default directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Today's date as YYYY-MM-DD (defaults to the current UTC date)
    #[arg(long, global = true)]
    date: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the home directory on first run and print it
    Init {
        /// Parent directory to hold `homespace/` when none is stored yet
        dir: Option<PathBuf>,
    },
    /// Print today's notes and all tags
    Home {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a note; content comes from --content or stdin
    Save {
        name: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Rename a note, creating it if it was never saved
    Rename {
        prev: String,
        new: String,
        /// UI layout entry to echo back
        #[arg(long)]
        layout_id: Option<String>,
    },
    /// Tag a note (hard link into the tag directory)
    Tag { tag: String, file: String },
    /// Remove a tag from a note
    Untag { tag: String, file: String },
    /// List tags with their identities and tagged file count
    Tags {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Open notes from anywhere, linking them into today
    Open {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer JSON-lines requests on stdin
    Serve,
    /// Print a fresh home listing whenever notes or tags change
    Watch,
}

async fn run_init(cfg: AppConfig, dir: Option<PathBuf>) -> Result<()> {
    let settings = storage::open_settings(&cfg.database.path)
        .await
        .with_context(|| format!("open settings db {}", cfg.database.path))?;
    let existing = settings.default_dir().await?;
    let root = home::resolve_root(&settings, &cfg, dir.clone()).await?;
    if existing.is_some() && dir.is_some_and(|d| home::root_in(&d) != root) {
        println!("home already set to {} (unchanged)", root.display());
    } else {
        println!("{}", root.display());
    }
    Ok(())
}

async fn run_home(space: HomeSpace, json: bool) -> Result<()> {
    let event = space.handle(Command::LoadHome).await?;
    if json {
        return print_event(&event);
    }
    if let Event::LoadHome { files, tags } = event {
        println!("{}", space.layout().today_dir().display());
        for file in &files {
            let names: Vec<&str> = file
                .tags
                .iter()
                .filter_map(|id| tags.iter().find(|t| t.id == *id))
                .map(|t| t.name.as_str())
                .collect();
            if names.is_empty() {
                println!("  {} [{}]", file.name, file.id);
            } else {
                println!("  {} [{}] #{}", file.name, file.id, names.join(" #"));
            }
        }
        println!("{} note(s), {} tag(s)", files.len(), tags.len());
    }
    Ok(())
}

async fn run_tags(space: HomeSpace, json: bool) -> Result<()> {
    let index = tag_index::build_tag_index(&space.layout().tags_dir()).await?;
    let count = |tag: &TagRecord| {
        index
            .file_tags
            .values()
            .filter(|tags| tags.contains(&tag.id))
            .count()
    };
    if json {
        let tags: Vec<serde_json::Value> = index
            .tags
            .iter()
            .map(|t| serde_json::json!({ "id": t.id, "name": t.name, "files": count(t) }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "tags": tags,
                "fileTags": index.file_tags,
            }))?
        );
    } else {
        for tag in &index.tags {
            println!("{}\t{}\t{} file(s)", tag.id, tag.name, count(tag));
        }
    }
    Ok(())
}

fn print_event(event: &Event) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

async fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf)
}
