//! DevInsight CLI - terminal client for a repository metrics service

// Global invariants enforced:
// - One-shot commands issue exactly one request and never retry
// - Config file values are overridden by CLI flags, never the reverse
// - The dashboard never writes logs to the terminal it draws on

mod logging;
mod tui;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use devinsight_core::analyze::REDIRECT_DELAY;
use devinsight_core::config::{self, ResolvedConfig};
use devinsight_core::{
    render_json, render_text, render_view, AnalyzeRequest, FilterState, HttpTransport,
    MetricKind, Orchestrator, PageLimit, ViewController, ViewState,
};
use indicatif::{ProgressBar, ProgressStyle};
use logging::LogTarget;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "devinsight")]
#[command(about = "Browse churn, complexity and hotspot metrics from a DevInsight service")]
#[command(version = env!("DEVINSIGHT_VERSION"))]
struct Cli {
    /// Metrics service address (overrides config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show files ranked as hotspots (frequently changed and complex)
    Hotspots(MetricArgs),
    /// Show per-file churn (commits, lines added and deleted)
    Churn(MetricArgs),
    /// Show per-file complexity
    Complexity(MetricArgs),
    /// Submit a repository for analysis
    Analyze {
        /// Repository path on the service host
        #[arg(long)]
        path: Option<String>,

        /// ZIP archive of the repository to upload
        #[arg(long)]
        zip: Option<PathBuf>,

        /// Open the dashboard once analysis succeeds
        #[arg(long)]
        open: bool,
    },
    /// Interactive metrics dashboard
    Dashboard,
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct MetricArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    page: u32,

    /// Rows per page: 10, 25, 50 or 100 (overrides config file)
    #[arg(long)]
    limit: Option<u32>,

    /// Comma-separated file extensions, e.g. "rs,py"
    #[arg(long)]
    ext: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without contacting the service
    Validate,
    /// Show the resolved configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let owns_terminal = matches!(
        cli.command,
        Commands::Dashboard | Commands::Analyze { open: true, .. }
    );
    logging::init(cli.verbose, &LogTarget::choose(cli.log_file.clone(), owns_terminal))?;

    match cli.command {
        Commands::Hotspots(ref args) => run_metrics(&cli, MetricKind::Hotspots, args).await,
        Commands::Churn(ref args) => run_metrics(&cli, MetricKind::Churn, args).await,
        Commands::Complexity(ref args) => run_metrics(&cli, MetricKind::Complexity, args).await,
        Commands::Analyze {
            ref path,
            ref zip,
            open,
        } => {
            let resolved = load_config(&cli)?;
            let request = AnalyzeRequest::from_inputs(path.as_deref(), zip.as_deref())?;
            let transport = connect(&resolved)?;

            let spinner = spinner(format!("Analyzing {} ...", request.source_label()));
            let outcome = transport.submit_analysis(&request).await;
            spinner.finish_and_clear();

            let response = outcome?;
            println!("{}", response.detail);

            if open {
                eprintln!(
                    "Opening dashboard in {} seconds...",
                    REDIRECT_DELAY.as_secs()
                );
                tokio::time::sleep(REDIRECT_DELAY).await;
                run_dashboard(resolved, transport).await
            } else {
                Ok(())
            }
        }
        Commands::Dashboard => {
            let resolved = load_config(&cli)?;
            let transport = connect(&resolved)?;
            run_dashboard(resolved, transport).await
        }
        Commands::Config { ref action } => match action {
            ConfigAction::Validate => {
                let cwd = std::env::current_dir()?;
                match config::load_and_resolve(&cwd, cli.config.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                        Ok(())
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show => {
                let resolved = load_config(&cli)?;
                print_config(&resolved);
                Ok(())
            }
        },
    }
}

/// Load config and apply global CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let cwd = std::env::current_dir()?;
    let mut resolved = config::load_and_resolve(&cwd, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(ref url) = cli.base_url {
        resolved.base_url = url.trim().to_string();
    }
    if let Some(ref p) = resolved.config_path {
        tracing::debug!(path = %p.display(), "using config");
    }
    Ok(resolved)
}

fn connect(resolved: &ResolvedConfig) -> anyhow::Result<HttpTransport> {
    HttpTransport::new(&resolved.base_url, resolved.timeout)
        .with_context(|| format!("cannot use service address {}", resolved.base_url))
}

/// Spinner on stderr while waiting on the service; hidden when stderr is not a terminal
fn spinner(message: String) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

async fn run_metrics(cli: &Cli, kind: MetricKind, args: &MetricArgs) -> anyhow::Result<()> {
    let resolved = load_config(cli)?;
    let limit = match args.limit {
        Some(limit) => PageLimit::try_from(limit).map_err(|e| anyhow::anyhow!("--limit: {}", e))?,
        None => resolved.limit,
    };
    if args.page == 0 {
        anyhow::bail!("--page must be at least 1");
    }

    let mut filter = FilterState::new(limit);
    if let Some(ref ext) = args.ext {
        filter.set_extensions(ext);
    }
    filter.set_page(args.page);

    let orchestrator = Orchestrator::new(connect(&resolved)?);
    let mut controller = ViewController::new(resolved.controller_settings());
    let pending = controller.mount_with(kind, filter);

    let spinner = spinner(format!("Loading {} from {} ...", kind.label(), resolved.base_url));
    let completion = pending.execute(&orchestrator).await;
    spinner.finish_and_clear();
    controller.complete(completion);

    let view = controller.view();
    if let ViewState::Failed(message) = view {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    match args.format {
        OutputFormat::Json => {
            let records = controller.dataset(kind).records();
            let json = records
                .map(render_json)
                .context("no records were loaded")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            match view {
                ViewState::Table(records) => print!("{}", render_text(records)),
                other => print!("{}", render_view(kind, &other)),
            }
            let filter = controller.filter();
            println!();
            println!("Page {} ({} per page)", filter.page(), filter.limit());
        }
    }
    Ok(())
}

async fn run_dashboard(resolved: ResolvedConfig, transport: HttpTransport) -> anyhow::Result<()> {
    if !io::stdout().is_terminal() {
        anyhow::bail!("the dashboard requires an interactive terminal");
    }
    let orchestrator = Orchestrator::new(transport);
    let app = tui::App::new(
        ViewController::new(resolved.controller_settings()),
        resolved.base_url.clone(),
    );
    tui::run(app, &orchestrator)
        .await
        .context("dashboard terminal error")
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Service:");
    println!("  base_url: {}", resolved.base_url);
    println!(
        "  timeout: {}",
        resolved
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!();
    println!("Dashboard:");
    println!("  page_size: {}", resolved.limit);
    println!("  debounce: {}ms", resolved.debounce.window().as_millis());
    println!();
    println!("Hotspots:");
    let h = &resolved.params.hotspots;
    println!("  churn_threshold: {}", h.churn_threshold);
    println!("  complexity_threshold: {}", h.complexity_threshold);
    println!("  top_n: {}", h.top_n);
}
