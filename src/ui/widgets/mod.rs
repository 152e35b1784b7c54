// src/ui/widgets/mod.rs

pub mod disclaimer; // Banner and authorised-use notice.
pub mod progress;   // Progress bars driven by the probe scheduler.
pub mod results;    // Per-command result listings.
pub mod summary;    // Pipeline summary and header score.
