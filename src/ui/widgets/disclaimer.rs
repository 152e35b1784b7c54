// src/ui/widgets/disclaimer.rs

use colored::*;

const BANNER: &str = r#"
   ____                      __  __
  |  _ \ ___  ___ ___  _ __  \ \/ /
  | |_) / _ \/ __/ _ \| '_ \  \  /
  |  _ <  __/ (_| (_) | | | | /  \
  |_| \_\___|\___\___/|_| |_|/_/\_\
"#;

const DISCLAIMER: &str = "Only scan systems you own or are explicitly authorised to test.";

/// Prints the banner, version and authorised-use notice to stderr so that
/// redirected stdout stays clean.
pub fn print_banner() {
    eprintln!("{}", BANNER.bright_cyan());
    eprintln!(
        "  {} {}",
        "reconx".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    eprintln!("  {}\n", DISCLAIMER.yellow());
}
