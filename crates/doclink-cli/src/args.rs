//! Command-line arguments

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use doclink_connection::{LinkConfigFile, LinkOptions};
use doclink_driver_mongodb::MongoUriBuilder;

use crate::logging::LogFormat;

/// Run operations against a document store over a resilient link
#[derive(Parser, Debug)]
#[command(name = "doclink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Report link lifecycle events
    #[arg(short, long, global = true, env = "DOCLINK_VERBOSE")]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Where to connect and how hard to try
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// TOML link configuration; flags below override its values
    #[arg(long, env = "DOCLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Full connection string
    #[arg(long, env = "DOCLINK_URI", hide_env_values = true, conflicts_with = "host")]
    pub uri: Option<String>,

    #[arg(long, env = "DOCLINK_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "DOCLINK_PORT")]
    pub port: Option<u16>,

    /// Database named in the connection string
    #[arg(long, env = "DOCLINK_DEFAULT_DB")]
    pub default_db: Option<String>,

    #[arg(long, env = "DOCLINK_USER")]
    pub user: Option<String>,

    #[arg(long, env = "DOCLINK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env = "DOCLINK_AUTH_SOURCE")]
    pub auth_source: Option<String>,

    #[arg(long, env = "DOCLINK_REPLICA_SET")]
    pub replica_set: Option<String>,

    #[arg(long, env = "DOCLINK_TLS")]
    pub tls: bool,

    /// Name reported to the server
    #[arg(long, env = "DOCLINK_APP_NAME")]
    pub app_name: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, env = "DOCLINK_CONNECT_TIMEOUT")]
    pub connect_timeout: Option<u64>,

    /// Per-operation timeout in seconds
    #[arg(long, env = "DOCLINK_OPERATION_TIMEOUT")]
    pub operation_timeout: Option<u64>,

    /// Keep retrying the connect when no other limit is set
    #[arg(long, env = "DOCLINK_RETRY_FOREVER")]
    pub retry_forever: bool,

    /// Seconds between connect attempts
    #[arg(long, env = "DOCLINK_RETRY_INTERVAL")]
    pub retry_interval: Option<u64>,

    /// Connect attempts before giving up (0 = no limit)
    #[arg(long, env = "DOCLINK_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Minutes after the last success during which retries are allowed
    #[arg(long, env = "DOCLINK_RETRY_WINDOW")]
    pub retry_window: Option<u64>,
}

impl ConnectionArgs {
    fn has_discrete_target(&self) -> bool {
        self.host.is_some()
            || self.port.is_some()
            || self.default_db.is_some()
            || self.user.is_some()
            || self.replica_set.is_some()
            || self.tls
    }

    fn uri_builder(&self) -> MongoUriBuilder {
        let mut builder = MongoUriBuilder::new(self.host.clone().unwrap_or_default());
        if let Some(port) = self.port {
            builder = builder.with_port(port);
        }
        if let Some(db) = &self.default_db {
            builder = builder.with_database(db);
        }
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            builder = builder.with_credentials(user, password);
        }
        if let Some(auth_source) = &self.auth_source {
            builder = builder.with_auth_source(auth_source);
        }
        if let Some(rs) = &self.replica_set {
            builder = builder.with_replica_set(rs);
        }
        builder.with_tls(self.tls)
    }

    /// Connection target given on the command line, if any
    pub fn target_override(&self) -> Option<String> {
        if let Some(uri) = &self.uri {
            return Some(uri.clone());
        }
        self.has_discrete_target()
            .then(|| self.uri_builder().build())
    }

    /// Layer the flags over the configuration file (or defaults) and build
    pub fn resolve(&self, verbose: bool) -> anyhow::Result<LinkOptions> {
        let file = match &self.config {
            Some(path) => LinkConfigFile::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => LinkConfigFile::default(),
        };
        let file_has_target = file.connection_target.is_some();
        let file_verbose = file.verbose_logging;

        let mut builder = file.into_builder();
        match self.target_override() {
            Some(target) => builder = builder.with_connection_target(target),
            None if !file_has_target => {
                builder = builder.with_connection_target(self.uri_builder().build())
            }
            None => {}
        }
        if let Some(name) = &self.app_name {
            builder = builder.with_application_name(name);
        }
        if let Some(secs) = self.connect_timeout {
            builder = builder.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.operation_timeout {
            builder = builder.with_operation_timeout(Duration::from_secs(secs));
        }
        if self.retry_forever {
            builder = builder.with_retry_forever(true);
        }
        if let Some(secs) = self.retry_interval {
            builder = builder.with_retry_interval(Duration::from_secs(secs));
        }
        if let Some(attempts) = self.max_attempts {
            builder = builder.with_max_attempts(attempts);
        }
        if let Some(minutes) = self.retry_window {
            builder = builder.with_max_retry_window(Duration::from_secs(minutes.saturating_mul(60)));
        }

        builder
            .with_verbose_logging(verbose || file_verbose)
            .build()
            .context("Invalid link options")
    }
}

/// A database/collection pair given as two positional arguments
#[derive(Args, Debug, Clone)]
pub struct Target {
    pub database: String,
    pub collection: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect, ping the primary and report the round trip
    Ping,

    /// Check the link and report whether it is healthy, degraded or down
    Health {
        /// Ping latency (ms) above which the link counts as degraded
        #[arg(long, default_value_t = 100)]
        slow_ms: u64,
    },

    /// Count documents matching a filter
    Count {
        #[command(flatten)]
        target: Target,
        /// Extended JSON filter
        #[arg(default_value = "{}")]
        filter: String,
    },

    /// Print every document matching a filter
    Find {
        #[command(flatten)]
        target: Target,
        #[arg(default_value = "{}")]
        filter: String,
    },

    /// Print the first document matching a filter
    FindOne {
        #[command(flatten)]
        target: Target,
        #[arg(default_value = "{}")]
        filter: String,
    },

    /// Insert a document, or an array of documents
    Insert {
        #[command(flatten)]
        target: Target,
        document: String,
    },

    /// Apply an update to matching documents
    Update {
        #[command(flatten)]
        target: Target,
        filter: String,
        update: String,
        /// Update every match instead of the first
        #[arg(long)]
        many: bool,
    },

    /// Delete matching documents
    Delete {
        #[command(flatten)]
        target: Target,
        filter: String,
        /// Delete every match instead of the first
        #[arg(long)]
        many: bool,
    },
}
