// src/cli.rs

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{
    DEFAULT_ENUM_THREADS, DEFAULT_ENUM_TIMEOUT_SECS, DEFAULT_SCAN_THREADS, DEFAULT_SCAN_TIMEOUT_SECS,
};

#[derive(Parser, Debug)]
#[command(name = "reconx")]
#[command(version, about = "Reconnaissance toolkit: subdomain enumeration, port scanning and web fingerprinting.")]
pub struct CommandLine {
    /// Console log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for the log file (defaults to the per-user data directory)
    #[arg(long, global = true, env = "RECONX_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enumerate subdomains of a domain
    Enum {
        domain: String,
        /// Wordlist file, one label per line (built-in list when omitted)
        #[arg(short, long)]
        wordlist: Option<PathBuf>,
        /// Concurrent DNS lookups
        #[arg(short, long, default_value_t = DEFAULT_ENUM_THREADS, env = "RECONX_THREADS")]
        threads: usize,
        /// Per-lookup timeout in seconds
        #[arg(long, default_value_t = DEFAULT_ENUM_TIMEOUT_SECS, env = "RECONX_TIMEOUT")]
        timeout: f64,
        /// Save results to this file (format from the extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the HTTP liveness check
        #[arg(long)]
        no_http: bool,
    },
    /// TCP connect scan of a host
    Scan {
        target: String,
        /// Ports to scan, e.g. "22,80,8000-8100"
        #[arg(short, long)]
        ports: Option<String>,
        /// Scan the first N common ports when no port list is given
        #[arg(long, default_value_t = 100)]
        top_ports: usize,
        /// Concurrent connection attempts
        #[arg(short, long, default_value_t = DEFAULT_SCAN_THREADS, env = "RECONX_THREADS")]
        threads: usize,
        /// Per-connection timeout in seconds
        #[arg(long, default_value_t = DEFAULT_SCAN_TIMEOUT_SECS, env = "RECONX_TIMEOUT")]
        timeout: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Identify the server and technologies behind a URL
    Fingerprint {
        url: String,
        /// Include page title and meta tags
        #[arg(short, long)]
        detailed: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grade the HTTP security headers of a URL
    Headers {
        url: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run several stages against a domain and save a combined report
    Run {
        domain: String,
        /// Comma-separated stages: enum, scan, fingerprint, headers
        #[arg(short, long, default_value = "enum,scan,fingerprint")]
        pipeline: String,
        #[arg(short, long, default_value = "reconx_report.json")]
        output: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_ENUM_THREADS, env = "RECONX_THREADS")]
        threads: usize,
    },
    /// Convert a saved JSON report to another format
    Export {
        /// JSON file produced by another command
        data: PathBuf,
        output: PathBuf,
        /// json, csv, txt, html or auto
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
