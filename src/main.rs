use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use satprep::cli::{self, AnalyzeOptions};
use satprep::config::SatPrepConfig;
use satprep::error::SatPrepError;
use satprep::log_error;
use satprep::logging::{self, LoggingConfig};

#[derive(Parser)]
#[command(name = "satprep")]
#[command(about = "AI-powered SAT preparation: PDF extraction, study-material chunking and performance analysis")]
#[command(version)]
struct Cli {
    /// Config file (TOML). Defaults plus SATPREP_* environment overrides when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write rotating log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write log files as JSON lines (with --log-dir)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of a PDF
    Extract {
        /// Input PDF
        pdf: PathBuf,

        /// Output text file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract and chunk study materials
    Chunk {
        /// Study material PDFs, in the order they should be joined
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Maximum chunk length in characters
        #[arg(long)]
        size: Option<usize>,

        /// Characters shared by consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze SAT test performance and produce a study plan
    Analyze {
        /// Test questions PDF
        #[arg(long)]
        questions: PathBuf,

        /// Correct answers PDF
        #[arg(long)]
        answers: PathBuf,

        /// Your responses PDF
        #[arg(long)]
        responses: PathBuf,

        /// Optional study material PDFs
        #[arg(long = "materials", num_args = 1..)]
        materials: Vec<PathBuf>,

        /// Report path (defaults to output.report_filename, usually sat_report.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the report as JSON with model and timestamp
        #[arg(long)]
        json: bool,

        /// Only print the report
        #[arg(long)]
        no_save: bool,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Wrap width for the printed report
        #[arg(long, default_value = "100")]
        width: usize,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        #[arg(default_value = "satprep.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective config
    Show,
}

fn load_config(path: Option<&PathBuf>) -> Result<SatPrepConfig> {
    let config = match path {
        Some(path) => {
            let mut config = SatPrepConfig::load_from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => SatPrepConfig::load_from_env(),
    };
    config.validate()?;
    Ok(config)
}

async fn run(args: Cli) -> Result<()> {
    match args.command {
        Commands::Extract { pdf, output } => cli::extract_command(pdf, output).await,
        Commands::Chunk {
            pdfs,
            size,
            overlap,
            json,
        } => {
            let config = load_config(args.config.as_ref())?;
            cli::chunk_command(pdfs, size, overlap, json, config).await
        }
        Commands::Analyze {
            questions,
            answers,
            responses,
            materials,
            output,
            json,
            no_save,
            model,
            width,
        } => {
            let mut config = load_config(args.config.as_ref())?;
            if let Some(model) = model {
                config.llm.model = model;
            }
            let options = AnalyzeOptions {
                questions,
                answers,
                responses,
                materials,
                output,
                json,
                save: !no_save,
                wrap_width: width,
            };
            cli::analyze_command(options, config).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => cli::config_init_command(path, force).await,
            ConfigAction::Show => {
                let config = load_config(args.config.as_ref())?;
                cli::config_show_command(&config).await
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let logging_config = LoggingConfig {
        level: if args.verbose { "debug" } else { "info" }.to_string(),
        enable_file_logging: args.log_dir.is_some(),
        log_dir: args.log_dir.clone().unwrap_or_else(|| PathBuf::from("logs")),
        enable_json_format: args.log_json,
    };
    let guard = logging::init_logging(&logging_config)?;
    if args.verbose {
        logging::log_system_info();
    }

    if let Err(err) = run(args).await {
        match err.downcast_ref::<SatPrepError>() {
            Some(sat_err) => {
                log_error!(sat_err, "command failed");
                eprintln!("{}", sat_err.user_message());
            }
            None => eprintln!("❌ {:#}", err),
        }
        // exit() skips destructors; flush file logs first
        drop(guard);
        std::process::exit(1);
    }

    Ok(())
}
