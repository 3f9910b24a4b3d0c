//! hpcparse CLI - Process numeric rows with the native engine or the reference fallback
//!
//! # Commands
//!
//! ```bash
//! hpcparse process data.txt          # Run the pipeline on a file
//! hpcparse process --text "1 2 3"    # Run it on literal text
//! hpcparse process                   # Run it on the sample input
//! hpcparse serve                     # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! hpcparse parse data.txt            # Parse only, print the flat series
//! hpcparse check-name input.txt      # Run the filename validator
//! hpcparse sample                    # Print the sample input
//! hpcparse info                      # Engine information
//! ```

use clap::{Parser, Subcommand};
use hpcparse::{
    parse_bytes_auto, run_pipeline, run_pipeline_bytes, validate_filename, Config, EngineOutcome,
    PipelineResult, StagingMode, PREVIEW_LEN, SAMPLE_INPUT,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hpcparse")]
#[command(about = "Square-plus-offset numeric pipeline with native engine delegation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: stage → native engine → reference fallback
    Process {
        /// Input text file (sample input if omitted)
        input: Option<PathBuf>,

        /// Literal input text instead of a file
        #[arg(short, long, conflicts_with = "input")]
        text: Option<String>,

        /// Print every (index, original, processed) triple
        #[arg(long)]
        table: bool,

        /// Use unique staging files and remove them afterwards
        #[arg(long)]
        per_request: bool,

        /// Output file for the JSON result (default: none)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a file and print the flat series as JSON
    Parse {
        /// Input text file
        input: PathBuf,
    },

    /// Check a staging file name
    CheckName {
        name: String,
    },

    /// Print the sample input
    Sample,

    /// Show engine information
    Info,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: HPCPARSE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Process {
            input,
            text,
            table,
            per_request,
            output,
        } => {
            cmd_process(
                &config,
                input.as_deref(),
                text.as_deref(),
                table,
                per_request,
                output.as_deref(),
            )
            .await
        }
        Commands::Parse { input } => cmd_parse(&input),
        Commands::CheckName { name } => cmd_check_name(&name),
        Commands::Sample => {
            println!("{}", SAMPLE_INPUT);
            Ok(())
        }
        Commands::Info => cmd_info(&config),
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            hpcparse::server::start_server(config).await
        }
    }
}

async fn cmd_process(
    config: &Config,
    input: Option<&Path>,
    text: Option<&str>,
    table: bool,
    per_request: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if per_request {
        StagingMode::PerRequest
    } else {
        StagingMode::Fixed
    };
    let options = config.pipeline_options(mode);

    let result = match (input, text) {
        (Some(path), _) => {
            eprintln!("📄 Processing: {}", path.display());
            let bytes = fs::read(path)?;
            run_pipeline_bytes(&bytes, &options).await?
        }
        (None, Some(text)) => run_pipeline(text, &options).await?,
        (None, None) => {
            eprintln!("📄 Processing sample input");
            run_pipeline(SAMPLE_INPUT, &options).await?
        }
    };

    print_summary(&result);

    if table {
        if let Some(ref series) = result.series {
            println!("\n{:>6}  {:>16}  {:>16}", "index", "original", "processed");
            for (i, x, y) in series.points() {
                println!("{:>6}  {:>16}  {:>16}", i, x, y);
            }
        }
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&hpcparse::ProcessResponse::from(result))?;
        fs::write(path, json)?;
        eprintln!("💾 Output written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(result: &PipelineResult) {
    let icon = match result.outcome() {
        EngineOutcome::Succeeded => "✅",
        EngineOutcome::NotFound => "ℹ️ ",
        EngineOutcome::Failed => "⚠️ ",
        EngineOutcome::TimedOut => "⏱️ ",
    };
    eprintln!("\n{} {} ({})", icon, result.notice(), result.outcome());

    match result.series {
        Some(ref series) => {
            eprintln!("   Values: {}", series.len());
            println!("Sample output (first {} values):", PREVIEW_LEN);
            println!("{:?}", result.preview(PREVIEW_LEN));
        }
        None => match result.engine_artifact() {
            Some(path) => eprintln!("   Result produced by the native engine at {}", path.display()),
            None => eprintln!(
                "   No native engine output kept at {} (per-request staging removes it)",
                result.paths.output.display()
            ),
        },
    }
}

fn cmd_parse(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let parsed = parse_bytes_auto(&fs::read(input)?)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Lines: {}", parsed.line_count());
    eprintln!("✅ Parsed {} values", parsed.value_count());

    println!("{}", serde_json::to_string_pretty(&parsed.flat())?);
    Ok(())
}

fn cmd_check_name(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let name = validate_filename(name)?;
    println!("✅ {} is a safe file name", name);
    Ok(())
}

fn cmd_info(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let engine = config.engine();
    println!("Engine Information");
    println!("  Operation:  {}", hpcparse::transform::reference::operation_description());
    println!(
        "  Native:     {} ({})",
        engine.binary().display(),
        if engine.is_available() { "found" } else { "not found" }
    );
    println!("  Fallback:   in-process reference implementation");
    println!("  Timeout:    {:?}", engine.timeout());
    println!("  Staging:    {}", config.data_dir.display());
    println!("  Safeguards: staging name validation, absolute engine paths, no shell, timeout");
    Ok(())
}
