// src/ui/mod.rs

//! Console rendering: the banner, result listings, the run summary and
//! progress bars. Everything here writes to the terminal; logs go through
//! `tracing` instead.

mod widgets;

pub use widgets::disclaimer::print_banner;
pub use widgets::progress::{create_progressbar, create_spinner, progress_hook};
pub use widgets::results::{print_fingerprint, print_headers, print_ports, print_subdomains};
pub use widgets::summary::print_pipeline_summary;

use colored::*;

/// One-line status message, prefixed like the rest of the console output.
pub fn print_status(msg: &str) {
    println!("{} {}", ">".bright_black(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg.red());
}
