// src/core/mod.rs

// The `core` module holds everything that does not touch the terminal:
// the probing engine, the scanners built on it, input handling and export.

/// Static port-to-service table and the default port list.
pub mod catalog;

/// Defaults and the validated `ScanConfiguration`.
pub mod config;

/// Bounded concurrent probing: admission control, scheduling and aggregation.
pub mod engine;

pub mod error;

/// Writes reports as JSON, CSV, plain text or HTML.
pub mod exporter;

/// Parsing and validation of user-supplied domains, targets, ports and wordlists.
pub mod input;

/// Guidance text for the HTTP security-header checks.
pub mod knowledge_base;

/// Data structures shared by the scanners, the pipeline and the exporter.
pub mod models;

/// DNS, TCP, HTTP liveness, fingerprint and header scanners.
pub mod scanner;

/// Producers of probe candidates.
pub mod sources;
