use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use osr_codec::{LzmaCodec, ModFlags, ReplayCodec, ReplayRecord, RoundTrip};

#[derive(Parser)]
#[command(name = "osr-codec")]
#[command(about = "Inspect, verify and rebuild .osr replay files")]
#[command(version)]
struct Cli {
    /// Log parse/build details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// liblzma preset used when recompressing frames
    #[arg(long, global = true, default_value_t = osr_codec::compression::DEFAULT_LZMA_PRESET)]
    preset: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a replay as JSON
    Inspect {
        input: PathBuf,

        /// Include every input frame in the output
        #[arg(long)]
        frames: bool,
    },

    /// Parse and rebuild a replay, reporting the first differing byte
    Verify { input: PathBuf },

    /// Parse a replay and write it back out
    Rebuild {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert between mod codes (e.g. HDDT) and the numeric bitset
    Mods { value: String },
}

#[derive(Serialize)]
struct Inspection<'a> {
    mods_display: String,
    frame_count: usize,
    seed: Option<i32>,
    #[serde(flatten)]
    record: &'a ReplayRecord,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let codec = ReplayCodec::new(LzmaCodec::with_preset(cli.preset));

    match cli.command {
        Commands::Inspect { input, frames } => {
            let data = read(&input)?;
            let mut record = codec
                .parse(&data)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            let frame_count = record.frames.len();
            let seed = record.seed();
            if !frames {
                record.frames.clear();
            }
            let inspection = Inspection {
                mods_display: record.mods_display(),
                frame_count,
                seed,
                record: &record,
            };
            println!("{}", serde_json::to_string_pretty(&inspection)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { input } => {
            let data = read(&input)?;
            let outcome = codec
                .verify_round_trip(&data)
                .with_context(|| format!("failed to round-trip {}", input.display()))?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(match outcome {
                RoundTrip::Identical => ExitCode::SUCCESS,
                RoundTrip::Mismatch { .. } => ExitCode::from(2),
            })
        }
        Commands::Rebuild { input, output } => {
            let data = read(&input)?;
            let record = codec
                .parse(&data)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            let rebuilt = codec.build(&record).context("failed to rebuild replay")?;
            fs::write(&output, &rebuilt)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                bytes = rebuilt.len(),
                "rebuilt replay"
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Mods { value } => {
            let mods = match value.trim().parse::<i32>() {
                Ok(raw) => ModFlags::from_wire(raw),
                Err(_) => ModFlags::from_codes(&value),
            };
            println!("{} {}", mods.to_wire(), mods.to_display_string());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}
