//! Process settings.
//!
//! Settings are layered, later sources winning:
//! 1. built-in defaults,
//! 2. an optional config file (`mindy.toml` in the working directory, or the
//!    path given with `--config`),
//! 3. `MINDY_*` environment variables (`MINDY_CONCURRENCY=8`,
//!    `MINDY_PILOSA=host1:10101,host2:10101`),
//! 4. command line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{MindyError, Result};
use crate::limiter::DEFAULT_CONCURRENCY;

/// mindy is a Multi INDex proxY for Pilosa.
#[derive(Parser, Debug, Default)]
#[command(name = "mindy")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Comma separated list of pilosa hosts/ports
    #[arg(long, value_delimiter = ',')]
    pub pilosa: Option<Vec<String>>,
    /// Host/port to bind to
    #[arg(long)]
    pub bind: Option<String>,
    /// Maximum number of simultaneous Pilosa requests
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Query every slice of an index separately
    #[arg(long)]
    pub shard_fanout: bool,
    /// Serve from an empty in-memory engine instead of Pilosa
    #[arg(long)]
    pub memory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub pilosa: Vec<String>,
    pub bind: String,
    pub concurrency: usize,
    pub shard_fanout: bool,
    pub engine_timeout_ms: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pilosa: vec!["localhost:10101".into()],
            bind: ":10001".into(),
            concurrency: DEFAULT_CONCURRENCY,
            shard_fanout: false,
            engine_timeout_ms: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Loads the layered settings described in the module docs.
    pub fn load(args: &Args) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("pilosa", defaults.pilosa.clone())?
            .set_default("bind", defaults.bind.clone())?
            .set_default("concurrency", defaults.concurrency as u64)?
            .set_default("shard_fanout", defaults.shard_fanout)?
            .set_default("log_filter", defaults.log_filter.clone())?;
        builder = match &args.config {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::with_name("mindy").required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix("MINDY")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("pilosa"),
        );
        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if let Some(pilosa) = &args.pilosa {
            settings.pilosa = pilosa.clone();
        }
        if let Some(bind) = &args.bind {
            settings.bind = bind.clone();
        }
        if let Some(concurrency) = args.concurrency {
            settings.concurrency = concurrency;
        }
        settings.shard_fanout |= args.shard_fanout;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(MindyError::Config("concurrency must be at least 1".into()));
        }
        if self.pilosa.is_empty() {
            return Err(MindyError::Config("at least one pilosa host is required".into()));
        }
        Ok(())
    }

    /// The address to listen on. A bare `:port` listens on every interface.
    pub fn bind_addr(&self) -> String {
        if self.bind.is_empty() {
            "0.0.0.0:80".into()
        } else if self.bind.starts_with(':') {
            format!("0.0.0.0{}", self.bind)
        } else {
            self.bind.clone()
        }
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_ms.map(Duration::from_millis)
    }
}
