//! CLI module for the API guard
//!
//! - `serve`: run the guarded HTTP server
//! - `check-config`: validate configuration and policies without serving

pub mod check_config;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// API Guard - key authentication, levels and rate limits for HTTP APIs
#[derive(Parser)]
#[command(name = "api-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of config/default + config/local
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the guarded API server
    Serve,

    /// Validate configuration and report policy warnings
    CheckConfig,
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::load()?,
        };
        Ok(config)
    }
}
