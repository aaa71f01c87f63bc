use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use seai::config::{self, DEFAULT_MIN_CAPACITY_BYTES, MASTER_KEY_ENV};
use seai::{pipeline, raster, SealConfig, Sealer};

/// seai: hide and verify an authenticated "AI-generated" seal in image pixels.
#[derive(Parser)]
#[command(name = "seai", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a seal into an image (output is always PNG)
    Embed {
        /// Input image path (PNG, JPEG or BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path (.png)
        #[arg(short, long)]
        output: PathBuf,

        /// Master secret (falls back to the development default)
        #[arg(short, long, env = MASTER_KEY_ENV, hide_env_values = true)]
        secret: Option<String>,

        /// Do not attach timestamp/filename metadata
        #[arg(long)]
        no_metadata: bool,

        /// Reject images with less capacity than this many bytes (default: 100)
        #[arg(long, default_value_t = DEFAULT_MIN_CAPACITY_BYTES)]
        min_capacity: usize,
    },

    /// Check an image for a valid seal
    Verify {
        /// Image path to verify
        #[arg(short, long)]
        input: PathBuf,

        /// Master secret (must match the one used to embed)
        #[arg(short, long, env = MASTER_KEY_ENV, hide_env_values = true)]
        secret: Option<String>,
    },

    /// Print how many payload bytes an image can carry
    Capacity {
        /// Image path
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn sealer_from(secret: Option<String>) -> Sealer {
    let secret = secret.unwrap_or_else(|| {
        warn!(
            "no master secret configured; set {} or pass --secret. Using the development default",
            MASTER_KEY_ENV
        );
        config::DEFAULT_MASTER_KEY.to_string()
    });
    if !config::secret_is_strong(&secret) {
        warn!("master secret is weak: use at least 32 characters mixing upper, lower case and digits");
    }

    // moved, not copied: the sealer zeroes the only copy on drop
    let sealer = Sealer::new(secret);
    info!("master secret fingerprint: {}", sealer.fingerprint());
    sealer
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Embed {
            input,
            output,
            secret,
            no_metadata,
            min_capacity,
        } => {
            let cfg = SealConfig {
                min_capacity_bytes: min_capacity,
                include_metadata: !no_metadata,
            };
            let sealer = sealer_from(secret);
            pipeline::embed::embed_file(&sealer, &input, &output, &cfg)?;
            println!("SeAl tag successfully embedded: {}", output.display());
        }

        Commands::Verify { input, secret } => {
            let sealer = sealer_from(secret);
            let result = pipeline::verify::verify_file(&sealer, &input);
            println!("{}", result.message());
            println!("{}", result.details());
            if let Some(metadata) = &result.metadata {
                for (key, value) in metadata.entries() {
                    println!("  {key}: {value}");
                }
            }
            if !result.verified {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Capacity { input } => {
            println!("{}", raster::capacity_of_file(&input));
        }
    }

    Ok(ExitCode::SUCCESS)
}
