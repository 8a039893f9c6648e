//! Command-line configuration.
//!
//! ```text
//! Cli
//! ├── path, --prefix            # what to delete
//! ├── store: StoreConfig        # backend, container, credentials
//! ├── delete: BatchDeleteConfig # page limit, versioned mode
//! └── --log-format, --print-details
//! ```
//!
//! Every option can also be set through its environment variable.

use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use sweep_engine::{BatchDeleteConfig, DeleteTarget};
use sweep_store::StoreConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "sweep")]
#[command(about = "Delete every object under a folder or prefix of an object store")]
#[command(version)]
pub struct Cli {
    /// Folder to delete; must end in `/` unless `--prefix` is set.
    pub path: String,

    /// Treat PATH as a raw key prefix.
    #[arg(long)]
    #[serde(default)]
    pub prefix: bool,

    /// Print the final progress as JSON on stdout.
    #[arg(long)]
    #[serde(default)]
    pub print_details: bool,

    /// Log output format.
    #[arg(long, env = "SWEEP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Object store connection.
    #[clap(flatten)]
    pub store: StoreConfig,

    /// Batch delete behavior.
    #[clap(flatten)]
    pub delete: BatchDeleteConfig,
}

impl Cli {
    /// Loads `.env` (if enabled) and parses the command line.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Installs the tracing subscriber. Logs go to stderr so that stdout only
    /// carries the progress report.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Pretty => registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
        }
        .context("failed to initialize tracing")?;

        Self::log_build_info();
        Ok(())
    }

    /// Validates every configuration group.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.store
            .validate()
            .context("invalid store configuration")?;
        self.delete
            .validate()
            .context("invalid batch delete configuration")?;
        // No backend reachable from the command line lists object versions.
        if self.delete.versioned {
            anyhow::bail!(
                "versioned deletion is not supported by the {:?} backend",
                self.store.backend
            );
        }
        Ok(())
    }

    /// Returns the deletion target described by the arguments.
    pub fn target(&self) -> DeleteTarget {
        let container = self.store.container.as_str();
        if self.prefix {
            DeleteTarget::prefix(container, self.path.as_str())
        } else {
            DeleteTarget::from_path(container, self.path.as_str())
        }
    }

    /// Logs the effective configuration (no credentials).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.store.backend,
            container = %self.store.container,
            path = %self.path,
            prefix = self.prefix,
            page_limit = self.delete.page_limit,
            versioned = self.delete.versioned,
            "Sweep configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "s3").then_some("s3"),
            cfg!(feature = "dotenv").then_some("dotenv"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
