// src/ui/widgets/progress.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::core::engine::ProgressHook;

pub fn create_progressbar(len: u64, prefix: String) -> ProgressBar {
    let progress_bar = ProgressBar::new(len);
    progress_bar.set_prefix(prefix);
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    let style = ProgressStyle::with_template("[{prefix}] {elapsed_precise} {bar:36.cyan/blue} {pos:>5}/{len:5} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("■■□");
    progress_bar.set_style(style);
    progress_bar
}

/// Counter for runs whose probe total is not known up front.
pub fn create_spinner(prefix: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_prefix(prefix);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let style = ProgressStyle::with_template("{spinner:.blue} [{prefix}] {elapsed_precise} {pos} probes {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner
}

/// Scheduler hook that advances `bar` once per settled probe.
pub fn progress_hook(bar: &ProgressBar) -> ProgressHook {
    let bar = bar.clone();
    Arc::new(move || bar.inc(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_advances_the_bar() {
        let bar = ProgressBar::hidden();
        bar.set_length(3);
        let hook = progress_hook(&bar);
        hook();
        hook();
        assert_eq!(bar.position(), 2);
    }
}
