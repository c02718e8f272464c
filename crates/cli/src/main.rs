use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use depmap_ai::{AiConfig, FileToSummarize, SummaryClient};
use depmap_graph::ProjectModel;
use depmap_loader::SourceScanner;
use depmap_render::{FileSummaryDoc, HtmlGenerator};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

mod config;

use config::DepmapConfig;

#[derive(Parser)]
#[command(name = "depmap")]
#[command(about = "Interactive dependency documentation for Python projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = "depmap.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings and errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the project and generate the HTML documentation site
    Generate(GenerateArgs),

    /// Analyze the project and export the dependency graphs as JSON
    Export(ExportArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Project root to analyze (overrides the config file)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output directory (overrides the config file)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Generate per-file AI documentation (requires OPENAI_API_KEY)
    #[arg(long)]
    enable_ai: bool,

    /// Maximum number of files to document with AI
    #[arg(long)]
    max_ai_files: Option<usize>,
}

#[derive(Args)]
struct ExportArgs {
    /// Project root to analyze (overrides the config file)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output file for the graph JSON
    #[arg(long, default_value = "depmap-graph.json")]
    output: PathBuf,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    builder.target(env_logger::Target::Stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = DepmapConfig::load(&cli.config)?;

    match cli.command {
        Commands::Generate(args) => generate(&config, args).await,
        Commands::Export(args) => export(&config, args),
    }
}

/// Scan, parse and build the project model; diagnostics are logged but
/// never fatal
fn analyze_project(config: &DepmapConfig, root_override: Option<&Path>) -> Result<ProjectModel> {
    let root = root_override.unwrap_or(&config.project.root);

    let scanner = SourceScanner::new(root, &config.project.ignore)?;
    let inputs = scanner.scan().context("failed to scan project root")?;
    let model = depmap_graph::analyze(&inputs).context("analysis failed")?;

    for diagnostic in model.diagnostics() {
        log::warn!("{diagnostic}");
    }

    Ok(model)
}

async fn generate(config: &DepmapConfig, args: GenerateArgs) -> Result<()> {
    let root = args
        .root
        .clone()
        .unwrap_or_else(|| config.project.root.clone());
    let model = analyze_project(config, Some(&root))?;

    log::info!(
        "Found {} files and {} classes",
        model.stats().files,
        model.stats().classes
    );

    let mut summaries = BTreeMap::new();
    if args.enable_ai || config.ai.enabled {
        match AiConfig::from_env() {
            Ok(ai_config) => {
                let client = SummaryClient::new(ai_config)?;
                let files: Vec<FileToSummarize> = model
                    .files()
                    .iter()
                    .map(|entry| FileToSummarize {
                        path: entry.source.path.clone(),
                        source: entry.source.text.clone(),
                    })
                    .collect();
                let max_files = args.max_ai_files.or(config.ai.max_files);

                for summary in client.summarize_all(&files, max_files).await {
                    if summary.error.is_none() {
                        summaries.insert(
                            summary.path.clone(),
                            FileSummaryDoc {
                                summary: summary.summary,
                                purpose: summary.purpose,
                                markdown: summary.markdown,
                            },
                        );
                    }
                }
                log::info!("AI documentation generated for {} files", summaries.len());
            }
            Err(e) => log::warn!("AI documentation disabled: {e}"),
        }
    }

    let output = args
        .output
        .unwrap_or_else(|| config.project.output.clone());
    let generator = HtmlGenerator::new(config.project_name(&root));
    generator
        .generate(&model, &summaries, &output)
        .context("failed to write documentation site")?;

    println!("Documentation generated in {}", output.display());
    println!("Open {}/index.html in your browser", output.display());
    Ok(())
}

fn export(config: &DepmapConfig, args: ExportArgs) -> Result<()> {
    let model = analyze_project(config, args.root.as_deref())?;

    let graphs = depmap_render::export(&model);
    let json = if args.pretty {
        graphs.to_json_pretty()?
    } else {
        graphs.to_json()?
    };
    fs::write(&args.output, json)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("Graph data written to {}", args.output.display());
    Ok(())
}
