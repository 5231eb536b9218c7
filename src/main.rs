use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weavedoc::OutputFormat;
use weavedoc::cli::commands::generate::GenerateOptions;
use weavedoc::cli::commands::plugins::ReportFormat;

/// Parse output format from string
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

/// Parse plugin report format from string
fn parse_report_format(s: &str) -> Result<ReportFormat, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "weavedoc")]
#[command(version, about = "Plugin-composed documentation generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation from source set files
    Generate {
        #[arg(required = true, help = "Source set files or glob patterns (JSON or YAML)")]
        inputs: Vec<String>,
        #[arg(long, short, value_parser = parse_output_format, help = "Output format: html, markdown")]
        format: Option<OutputFormat>,
        #[arg(long, short, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(long, short, help = "Module name")]
        module: Option<String>,
        #[arg(long, help = "Document private and internal declarations")]
        include_private: bool,
        #[arg(long, help = "Render into memory and list files without writing")]
        dry_run: bool,
    },

    /// Show loaded plugins and how every extension point resolves
    Plugins {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_report_format,
            help = "Output format: text, json"
        )]
        format: ReportFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mWeaveDoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            inputs,
            format,
            output,
            module,
            include_private,
            dry_run,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(weavedoc::cli::commands::generate::run(GenerateOptions {
                inputs,
                format,
                output,
                module_name: module,
                include_private,
                dry_run,
            }))?;
        }
        Commands::Plugins { format } => {
            weavedoc::cli::commands::plugins::run(format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                weavedoc::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                weavedoc::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    weavedoc::cli::commands::config::init_global(force)?;
                } else {
                    weavedoc::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
