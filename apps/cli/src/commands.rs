//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use flowindex_analyzer::{CategoryMapper, GraphAnalyzer, ServiceCatalog};
use flowindex_core::{
    CorpusScanner, ExportConfig, Indexer, ProgressReporter, category_report, export_diagrams,
    find_orphans, find_unindexed, prune_orphans,
};
use flowindex_shared::{
    AppConfig, Complexity, IndexReport, IndexSettings, PageRequest, SearchFilters, TriggerType,
    init_config, load_config,
};
use flowindex_storage::IndexStore;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// flowindex: searchable catalog of automation workflow definitions.
#[derive(Parser)]
#[command(
    name = "flowindex",
    version,
    about = "Analyze workflow definitions into a searchable, incrementally updated index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory of workflow definition files (overrides config).
    #[arg(long, global = true, env = "FLOWINDEX_DIR")]
    pub dir: Option<PathBuf>,

    /// Index database path (overrides config).
    #[arg(long, global = true, env = "FLOWINDEX_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Index new and changed workflow files.
    Index {
        /// Re-analyze every file even when its fingerprint is unchanged.
        #[arg(long)]
        force: bool,
    },

    /// Search indexed workflows.
    Search {
        /// Free-text query; empty lists the most recently analyzed workflows.
        #[arg(default_value = "")]
        query: String,

        /// Trigger filter: all, manual, webhook, scheduled, complex.
        #[arg(long, default_value = "all")]
        trigger: String,

        /// Complexity filter: all, low, medium, high.
        #[arg(long, default_value = "all")]
        complexity: String,

        /// Only active workflows.
        #[arg(long)]
        active_only: bool,

        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Results per page (defaults to the configured page size).
        #[arg(long)]
        per_page: Option<usize>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show one workflow with its step narrative and diagram.
    Show {
        /// Definition file name, e.g. `0001_Slack_Alert.json`.
        filename: String,

        /// Print the Mermaid diagram.
        #[arg(long)]
        diagram: bool,

        /// Print the step narrative.
        #[arg(long)]
        steps: bool,

        #[arg(long)]
        json: bool,
    },

    /// Workflow counts per domain category.
    Categories {
        #[arg(long)]
        json: bool,
    },

    /// Remove records whose definition file no longer exists.
    Prune {
        /// Actually delete; without this only the orphans are listed.
        #[arg(long)]
        yes: bool,
    },

    /// Write each indexed workflow's diagram to `<stem>.mmd`.
    ExportDiagrams {
        /// Output directory.
        #[arg(long)]
        out: PathBuf,

        /// Replace existing diagram files.
        #[arg(long)]
        overwrite: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "flowindex=info",
        1 => "flowindex=debug",
        _ => "flowindex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        };
    }

    let ctx = Context::resolve(&cli)?;
    match cli.command {
        Command::Index { force } => cmd_index(&ctx, force).await,
        Command::Search {
            query,
            trigger,
            complexity,
            active_only,
            page,
            per_page,
            json,
        } => {
            let filters = SearchFilters {
                trigger: TriggerType::parse_filter(&trigger)?,
                complexity: Complexity::parse_filter(&complexity)?,
                active_only,
            };
            let page = PageRequest::new(page, per_page.unwrap_or(ctx.settings.page_size))?;
            cmd_search(&ctx, &query, &filters, page, json).await
        }
        Command::Stats { json } => cmd_stats(&ctx, json).await,
        Command::Show {
            filename,
            diagram,
            steps,
            json,
        } => cmd_show(&ctx, &filename, diagram, steps, json).await,
        Command::Categories { json } => cmd_categories(&ctx, json).await,
        Command::Prune { yes } => cmd_prune(&ctx, yes).await,
        Command::ExportDiagrams { out, overwrite } => {
            cmd_export(&ctx, ExportConfig { out_dir: out, overwrite }).await
        }
        Command::Config { .. } => Ok(()),
    }
}

/// Resolved configuration shared by the catalog commands.
struct Context {
    config: AppConfig,
    settings: IndexSettings,
}

impl Context {
    /// CLI flags > config file > built-in defaults.
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = load_config()?;
        let mut settings = IndexSettings::from(&config);
        if let Some(dir) = &cli.dir {
            settings.workflows_dir = dir.clone();
        }
        if let Some(db) = &cli.db {
            settings.db_path = db.clone();
        }
        Ok(Self { config, settings })
    }

    fn analyzer(&self) -> GraphAnalyzer {
        let catalog = ServiceCatalog::builtin().with_overrides(&self.config.services);
        GraphAnalyzer::new(Arc::new(catalog))
    }

    fn categories(&self) -> Result<CategoryMapper> {
        Ok(match &self.config.categories.definitions {
            Some(path) => CategoryMapper::from_definitions_file(Path::new(path))?,
            None => CategoryMapper::builtin(),
        })
    }

    fn scanner(&self) -> CorpusScanner {
        CorpusScanner::new(&self.settings.workflows_dir)
    }

    async fn indexer(&self) -> Result<Indexer> {
        let store = IndexStore::open(&self.settings.db_path).await?;
        Ok(Indexer::new(
            Arc::new(store),
            Arc::new(self.analyzer()),
            self.scanner(),
        ))
    }

    async fn reader(&self) -> Result<IndexStore> {
        Ok(IndexStore::open_readonly(&self.settings.db_path).await?)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_index(ctx: &Context, force: bool) -> Result<()> {
    info!(
        dir = %ctx.settings.workflows_dir.display(),
        db = %ctx.settings.db_path.display(),
        force,
        "indexing workflows"
    );

    let indexer = ctx.indexer().await?;
    let reporter = CliProgress::new()?;
    let result = indexer.run(force, &reporter).await;
    reporter.finish();
    let report = result?;

    println!();
    if report.corpus_unavailable {
        println!(
            "  Workflow directory {} not found; nothing indexed.",
            ctx.settings.workflows_dir.display()
        );
        println!();
        return Ok(());
    }
    println!("  Index updated!");
    println!("  Processed: {}", report.processed);
    println!("  Skipped:   {}", report.skipped);
    println!("  Errors:    {}", report.errors);
    for failure in &report.failures {
        println!("    {}: {}", failure.filename, failure.message);
    }
    println!();

    Ok(())
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    page: usize,
    per_page: usize,
    pages: usize,
    total: usize,
    records: &'a [flowindex_shared::WorkflowRecord],
}

async fn cmd_search(
    ctx: &Context,
    query: &str,
    filters: &SearchFilters,
    page: PageRequest,
    json: bool,
) -> Result<()> {
    let store = ctx.reader().await?;
    let result = store.search_page(query, filters, page).await?;
    let pages = page.page_count(result.total);

    if json {
        let output = SearchOutput {
            query,
            page: page.page,
            per_page: page.per_page,
            pages,
            total: result.total,
            records: &result.records,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if result.records.is_empty() {
        println!("No workflows found (total {}).", result.total);
        return Ok(());
    }

    println!(
        "{:<48} {:<10} {:<7} {:>5}  NAME",
        "FILENAME", "TRIGGER", "TIER", "NODES"
    );
    for record in &result.records {
        println!(
            "{:<48} {:<10} {:<7} {:>5}  {}",
            record.filename,
            record.trigger_type.as_str(),
            record.complexity.as_str(),
            record.node_count,
            record.name
        );
    }
    println!();
    println!("Page {} of {} ({} workflows)", page.page, pages.max(1), result.total);

    Ok(())
}

async fn cmd_stats(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.reader().await?;
    let stats = store.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  Workflows:    {}", stats.total);
    println!("  Active:       {}", stats.active);
    println!("  Inactive:     {}", stats.inactive);
    println!("  Total nodes:  {}", stats.total_nodes);
    println!("  Integrations: {}", stats.unique_integrations);
    println!();
    println!("  By trigger:");
    for (trigger, count) in &stats.triggers {
        println!("    {trigger:<10} {count:>6}");
    }
    println!("  By complexity:");
    for (tier, count) in &stats.complexity {
        println!("    {tier:<10} {count:>6}");
    }

    let top = store.integration_counts().await?;
    if !top.is_empty() {
        println!("  Top integrations:");
        for (name, count) in top.iter().take(10) {
            println!("    {name:<24} {count:>6}");
        }
    }

    if let Some(run) = store.last_run().await? {
        println!();
        println!(
            "  Last index run: {} (finished {})",
            run.started_at,
            run.finished_at.as_deref().unwrap_or("never")
        );
    }
    println!();

    Ok(())
}

async fn cmd_show(
    ctx: &Context,
    filename: &str,
    diagram: bool,
    steps: bool,
    json: bool,
) -> Result<()> {
    let indexer = Indexer::new(
        Arc::new(ctx.reader().await?),
        Arc::new(ctx.analyzer()),
        ctx.scanner(),
    );
    let detail = indexer.detail(filename)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let record = &detail.record;
    let indexed = indexer.store().fingerprint_of(filename).await?;
    let freshness = match indexed {
        Some(hash) if hash == record.file_hash => "up to date",
        Some(_) => "changed since last index",
        None => "not indexed",
    };

    println!();
    println!("  {}", record.name);
    println!("  File:         {} ({freshness})", record.filename);
    println!("  Active:       {}", record.active);
    println!("  Trigger:      {}", record.trigger_type);
    println!("  Complexity:   {} ({} nodes)", record.complexity, record.node_count);
    println!("  Integrations: {}", record.integrations.join(", "));
    if !record.tags.is_empty() {
        println!("  Tags:         {}", record.tags.join(", "));
    }
    println!();
    println!("  {}", record.description);

    if steps {
        println!();
        for (i, step) in detail.steps.iter().enumerate() {
            println!("  {}. {} ({}): {}", i + 1, step.name, step.node_type, step.note);
        }
    }
    if diagram {
        println!();
        println!("{}", detail.diagram);
    }
    println!();

    Ok(())
}

async fn cmd_categories(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.reader().await?;
    let mapper = ctx.categories()?;
    let rows = category_report(&store, &mapper).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (i, (category, count)) in rows.iter().enumerate() {
        println!("{:>3}. {category:<40} {count:>5} workflows", i + 1);
    }
    Ok(())
}

async fn cmd_prune(ctx: &Context, yes: bool) -> Result<()> {
    let scanner = ctx.scanner();

    if !yes {
        let store = ctx.reader().await?;
        let orphans = find_orphans(&store, &scanner).await?;
        let unindexed = find_unindexed(&store, &scanner).await?;
        println!("{} orphaned records:", orphans.len());
        for filename in &orphans {
            println!("  - {filename}");
        }
        println!("{} files not yet indexed:", unindexed.len());
        for filename in &unindexed {
            println!("  + {filename}");
        }
        if !orphans.is_empty() {
            println!();
            println!("Run `flowindex prune --yes` to delete the orphaned records.");
        }
        return Ok(());
    }

    let store = IndexStore::open(&ctx.settings.db_path).await?;
    let removed = prune_orphans(&store, &scanner).await?;
    println!("Removed {} orphaned records.", removed.len());
    Ok(())
}

async fn cmd_export(ctx: &Context, config: ExportConfig) -> Result<()> {
    let indexer = Indexer::new(
        Arc::new(ctx.reader().await?),
        Arc::new(ctx.analyzer()),
        ctx.scanner(),
    );
    let reporter = CliProgress::new()?;
    let result = export_diagrams(&indexer, &config, &reporter).await;
    reporter.finish();
    let report = result?;

    println!();
    println!("  Diagrams written: {}", report.written);
    println!("  Conflicts:        {}", report.conflicts);
    println!("  Errors:           {}", report.errors);
    for failure in &report.failures {
        println!("    {}: {}", failure.filename, failure.message);
    }
    if report.conflicts > 0 && !config.overwrite {
        println!("  (use --overwrite to replace existing files)");
    }
    println!();
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .map_err(|e| eyre!("invalid progress template: {e}"))?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_processed(&self, filename: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {filename}"));
    }

    fn done(&self, _report: &IndexReport) {
        self.finish();
    }
}
