use clap::Parser;
use std::path::{Path, PathBuf};
use watermark_me::config::Config;
use watermark_me::error::AppError;
use watermark_me::logging::{init_subscriber, LogFormat};
use watermark_me::optimizer::{CompressionQuota, OptimizeError, Optimizer, TinifyClient};
use watermark_me::stats::BatchStats;
use watermark_me::watermark::{apply_watermarks, WatermarkRequest};

/// Watermark pictures in batch, optionally compressing the results
#[derive(Parser, Debug)]
#[command(name = "watermark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Pictures and/or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Path to configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text watermark (empty string for none)
    #[arg(short, long)]
    text: Option<String>,

    /// Picture watermark
    #[arg(short, long)]
    picture: Option<PathBuf>,

    /// Watermark opacity, from 0.0 to 1.0
    #[arg(short, long)]
    opacity: Option<f32>,

    /// Text colour, #RGB or #RRGGBB
    #[arg(long)]
    color: Option<String>,

    /// Compress watermarked pictures with the remote service
    #[arg(long)]
    optimize: bool,

    /// API key of the compression service
    #[arg(long, env = "TINIFY_KEY", hide_env_values = true)]
    tinify_key: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(text) = &self.text {
            config.text = text.clone();
        }
        if let Some(picture) = &self.picture {
            config.picture = picture.clone();
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
        if let Some(color) = &self.color {
            config.color = color.clone();
        }
        if self.optimize {
            config.optimize = true;
        }
        if let Some(key) = &self.tinify_key {
            config.tinify_key = key.clone();
        }
    }
}

type RemoteOptimizer = Optimizer<TinifyClient>;

/// Build the optimizer, or `None` when the key is not accepted.
async fn build_optimizer(config: &Config) -> Result<Option<RemoteOptimizer>, AppError> {
    let quota = CompressionQuota::default();
    let client = TinifyClient::new(config.tinify_key.clone(), &config.optimizer, quota.clone())?;
    let optimizer = Optimizer::new(client, quota, config.optimizer.to_retry_policy());

    if !optimizer.validate_key(&config.tinify_key).await {
        tracing::warn!("Compression key is missing or invalid, optimization disabled");
        return Ok(None);
    }

    tracing::info!(
        compression_count = optimizer.quota().used(),
        "Compression service ready"
    );
    Ok(Some(optimizer))
}

/// Optimize one watermarked file and return the final output. The
/// optimizer is dropped when the account is rejected.
async fn optimize_one(
    slot: &mut Option<RemoteOptimizer>,
    original: &Path,
    watermarked: PathBuf,
) -> Result<PathBuf, AppError> {
    let Some(optimizer) = slot.as_ref() else {
        return Ok(watermarked);
    };

    match optimizer.optimize(&watermarked).await {
        Ok(Some(optimized)) => {
            if watermarked != original {
                std::fs::remove_file(&watermarked).map_err(|source| AppError::Cleanup {
                    path: watermarked.clone(),
                    source,
                })?;
            }
            Ok(optimized)
        }
        Ok(None) => Ok(watermarked),
        Err(e @ OptimizeError::Io(_)) => Err(e.into()),
        Err(e @ OptimizeError::Account { .. }) => {
            tracing::warn!(error = %e, "Compression account rejected, optimization disabled");
            *slot = None;
            Ok(watermarked)
        }
        Err(e) => {
            tracing::warn!(path = %watermarked.display(), error = %e, "Optimization failed");
            Ok(watermarked)
        }
    }
}

/// Load the configuration, then watermark (and optimize) every input.
async fn run(args: &Args) -> Result<BatchStats, AppError> {
    // Load configuration, then let the command line override it
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.normalize();
    config.validate()?;

    tracing::info!(
        inputs = args.paths.len(),
        extensions = ?config.extensions,
        font = %config.font.display(),
        opacity = config.opacity,
        optimize = config.optimize,
        "Configuration loaded successfully"
    );

    let request = WatermarkRequest::from_config(&config, args.paths.clone())?;

    let mut optimizer = if config.optimize {
        build_optimizer(&config).await?
    } else {
        None
    };

    let mut stats = BatchStats::new();
    for result in apply_watermarks(&request) {
        let result = result?;
        let Some(watermarked) = result.output else {
            tracing::warn!(path = %result.original.display(), "No output produced");
            continue;
        };
        tracing::info!(
            path = %result.original.display(),
            output = %watermarked.display(),
            "Watermarked"
        );

        let output = optimize_one(&mut optimizer, &result.original, watermarked).await?;
        stats.record(&result.original, &output);
    }

    Ok(stats)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging subsystem
    init_subscriber(args.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    match run(&args).await {
        Ok(stats) => {
            println!("{}", stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Watermarking stopped");
            Err(e.into())
        }
    }
}
