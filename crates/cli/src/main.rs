//! `engram` — persistent memory for AI coding agents.
//!
//! One binary wires the front-ends together: the HTTP server, the MCP
//! stdio server, and the direct CLI commands (search, save, timeline,
//! context, stats, export/import, sync). All of them share the same
//! embedded store.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use engram_core::{
    truncate_chars, AddObservationParams, Config, ExportData, SearchOptions,
};
use engram_storage::Storage;
use engram_sync::Syncer;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 7437;

#[derive(Parser)]
#[command(name = "engram", version, about = "Persistent memory for AI coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the loopback HTTP API server
    Serve {
        /// Port to listen on (also: ENGRAM_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start the MCP server (stdio transport, for any AI agent)
    Mcp {
        /// Tool profiles or names: agent, admin, all, or a comma-separated mix
        #[arg(long)]
        tools: Option<String>,
    },
    /// Search memories
    Search {
        /// Search query
        query: Vec<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Save a memory
    Save {
        title: String,
        content: String,
        #[arg(long = "type", default_value = "manual")]
        kind: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value = "project")]
        scope: String,
        #[arg(long)]
        topic: Option<String>,
    },
    /// Show chronological context around an observation
    Timeline {
        observation_id: i64,
        #[arg(long)]
        before: Option<i64>,
        #[arg(long)]
        after: Option<i64>,
    },
    /// Show recent context from previous sessions
    Context {
        project: Option<String>,
    },
    /// Show memory system statistics
    Stats,
    /// Export all memories to JSON
    Export {
        /// Output file (default: engram-export.json)
        file: Option<PathBuf>,
    },
    /// Import memories from a JSON export file
    Import {
        file: PathBuf,
    },
    /// Export new memories as a compressed chunk to .engram/
    Sync {
        /// Import new chunks from .engram/ into the local database
        #[arg(long)]
        import: bool,
        /// Show sync status (local vs remote chunks)
        #[arg(long)]
        status: bool,
        /// Filter export to a specific project
        #[arg(long)]
        project: Option<String>,
        /// Export all projects (ignore the directory-based filter)
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::default();
    if let Ok(dir) = std::env::var("ENGRAM_DATA_DIR") {
        if !dir.is_empty() {
            cfg.data_dir = PathBuf::from(dir);
        }
    }

    let storage = Storage::open(cfg.clone()).context("open store")?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port
                .or_else(|| std::env::var("ENGRAM_PORT").ok().and_then(|p| p.parse().ok()))
                .unwrap_or(DEFAULT_PORT);
            engram_http::serve(storage, port).await.context("serve http")?;
        },
        Commands::Mcp { tools } => {
            let allowlist = engram_mcp::resolve_tools(tools.as_deref().unwrap_or(""));
            tokio::task::spawn_blocking(move || engram_mcp::run_mcp_server(&storage, allowlist))
                .await
                .context("mcp server")?;
        },
        Commands::Search { query, kind, project, scope, limit } => {
            cmd_search(&storage, &query.join(" "), kind, project, scope, limit)?;
        },
        Commands::Save { title, content, kind, project, scope, topic } => {
            cmd_save(&storage, title, content, kind, project, scope, topic)?;
        },
        Commands::Timeline { observation_id, before, after } => {
            cmd_timeline(&storage, observation_id, before, after)?;
        },
        Commands::Context { project } => {
            let context = storage.format_context(project.as_deref(), None)?;
            if context.is_empty() {
                println!("No previous session memories found.");
            } else {
                print!("{context}");
            }
        },
        Commands::Stats => cmd_stats(&storage, &cfg)?,
        Commands::Export { file } => cmd_export(&storage, file)?,
        Commands::Import { file } => cmd_import(&storage, &file)?,
        Commands::Sync { import, status, project, all } => {
            cmd_sync(&storage, import, status, project, all)?;
        },
    }

    Ok(())
}

fn cmd_search(
    storage: &Storage,
    query: &str,
    kind: Option<String>,
    project: Option<String>,
    scope: Option<String>,
    limit: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(!query.trim().is_empty(), "search query is required");

    let opts = SearchOptions { kind, project, scope, limit: Some(limit) };
    let results = storage.search(query, &opts)?;

    if results.is_empty() {
        println!("No memories found for: {query:?}");
        return Ok(());
    }

    println!("Found {} memories:\n", results.len());
    for (index, result) in results.iter().enumerate() {
        let obs = &result.observation;
        let project =
            obs.project.as_deref().map(|p| format!(" | project: {p}")).unwrap_or_default();
        println!(
            "[{}] #{} ({}) — {}\n    {}\n    {}{} | scope: {}\n",
            index + 1,
            obs.id,
            obs.kind,
            obs.title,
            truncate_chars(&obs.content, 300),
            obs.created_at,
            project,
            obs.scope,
        );
    }
    Ok(())
}

fn cmd_save(
    storage: &Storage,
    title: String,
    content: String,
    kind: String,
    project: Option<String>,
    scope: String,
    topic: Option<String>,
) -> anyhow::Result<()> {
    storage.create_session("manual-save", project.as_deref().unwrap_or(""), "")?;
    let id = storage.add_observation(&AddObservationParams {
        session_id: "manual-save".to_owned(),
        kind: kind.clone(),
        title: title.clone(),
        content,
        tool_name: None,
        project,
        scope: Some(scope),
        topic_key: topic,
    })?;

    println!("Memory saved: #{id} {title:?} ({kind})");
    Ok(())
}

fn cmd_timeline(
    storage: &Storage,
    observation_id: i64,
    before: Option<i64>,
    after: Option<i64>,
) -> anyhow::Result<()> {
    let result = storage.timeline(observation_id, before, after)?;

    if let Some(session) = &result.session_info {
        let summary = session
            .summary
            .as_deref()
            .map(|s| format!(" — {}", truncate_chars(s, 100)))
            .unwrap_or_default();
        println!("Session: {} ({}){summary}", session.project, session.started_at);
        println!("Total observations in session: {}\n", result.total_in_range);
    }

    if !result.before.is_empty() {
        println!("--- Before ---");
        for entry in &result.before {
            println!(
                "  #{} [{}] {} — {}",
                entry.id,
                entry.kind,
                entry.title,
                truncate_chars(&entry.content, 150)
            );
        }
        println!();
    }

    let focus = &result.focus;
    println!(">>> #{} [{}] {} <<<", focus.id, focus.kind, focus.title);
    println!("    {}", truncate_chars(&focus.content, 500));
    println!("    {}\n", focus.created_at);

    if !result.after.is_empty() {
        println!("--- After ---");
        for entry in &result.after {
            println!(
                "  #{} [{}] {} — {}",
                entry.id,
                entry.kind,
                entry.title,
                truncate_chars(&entry.content, 150)
            );
        }
    }
    Ok(())
}

fn cmd_stats(storage: &Storage, cfg: &Config) -> anyhow::Result<()> {
    let stats = storage.stats()?;
    let projects =
        if stats.projects.is_empty() { "none yet".to_owned() } else { stats.projects.join(", ") };

    println!("Engram Memory Stats");
    println!("  Sessions:     {}", stats.total_sessions);
    println!("  Observations: {}", stats.total_observations);
    println!("  Prompts:      {}", stats.total_prompts);
    println!("  Projects:     {projects}");
    println!("  Database:     {}", cfg.db_path().display());
    Ok(())
}

fn cmd_export(storage: &Storage, file: Option<PathBuf>) -> anyhow::Result<()> {
    let out_file = file.unwrap_or_else(|| PathBuf::from("engram-export.json"));
    let data = storage.export()?;
    let raw = serde_json::to_string_pretty(&data)?;
    std::fs::write(&out_file, raw).with_context(|| format!("write {}", out_file.display()))?;

    println!("Exported to {}", out_file.display());
    println!("  Sessions:     {}", data.sessions.len());
    println!("  Observations: {}", data.observations.len());
    println!("  Prompts:      {}", data.prompts.len());
    Ok(())
}

fn cmd_import(storage: &Storage, file: &PathBuf) -> anyhow::Result<()> {
    let raw =
        std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let data: ExportData =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", file.display()))?;

    let result = storage.import(&data)?;

    println!("Imported from {}", file.display());
    println!("  Sessions:     {}", result.sessions_imported);
    println!("  Observations: {}", result.observations_imported);
    println!("  Prompts:      {}", result.prompts_imported);
    Ok(())
}

fn cmd_sync(
    storage: &Storage,
    do_import: bool,
    do_status: bool,
    project: Option<String>,
    all: bool,
) -> anyhow::Result<()> {
    // Default the filter to the working directory's basename so sync only
    // exports this project's memories, not the whole global database.
    let project = if all {
        None
    } else {
        project.or_else(|| {
            std::env::current_dir().ok().and_then(|cwd| {
                cwd.file_name().map(|name| name.to_string_lossy().into_owned())
            })
        })
    };

    let syncer = Syncer::new(storage, ".engram");

    if do_status {
        let status = syncer.status()?;
        println!("Sync status:");
        println!("  Local chunks:    {}", status.local_chunks);
        println!("  Remote chunks:   {}", status.remote_chunks);
        println!("  Pending import:  {}", status.pending_import);
        return Ok(());
    }

    if do_import {
        let result = syncer.import()?;
        if result.chunks_imported == 0 {
            println!("Already up to date — no new chunks to import.");
            if result.chunks_skipped > 0 {
                println!("  ({} chunks already imported)", result.chunks_skipped);
            }
            return Ok(());
        }

        println!("Imported {} new chunk(s) from .engram/", result.chunks_imported);
        println!("  Sessions:     {}", result.sessions_imported);
        println!("  Observations: {}", result.observations_imported);
        println!("  Prompts:      {}", result.prompts_imported);
        if result.chunks_skipped > 0 {
            println!("  Skipped:      {} (already imported)", result.chunks_skipped);
        }
        return Ok(());
    }

    match &project {
        Some(project) => println!("Exporting memories for project {project:?}..."),
        None => println!("Exporting ALL memories (all projects)..."),
    }

    let result = syncer.export(&engram_sync::username(), project.as_deref())?;
    if result.is_empty {
        match &project {
            Some(project) => println!(
                "Nothing new to sync for project {project:?} — all memories already exported."
            ),
            None => println!("Nothing new to sync — all memories already exported."),
        }
        return Ok(());
    }

    println!("Created chunk {}", result.chunk_id);
    println!("  Sessions:     {}", result.sessions_exported);
    println!("  Observations: {}", result.observations_exported);
    println!("  Prompts:      {}", result.prompts_exported);
    println!();
    println!("Add to git:");
    println!("  git add .engram/ && git commit -m \"sync engram memories\"");
    Ok(())
}
