// src/ui/widgets/results.rs

use colored::*;

use crate::core::knowledge_base;
use crate::core::models::{FingerprintReport, HeaderReport, PortMap, SecurityStatus, SubdomainReport};

fn heading(text: &str) -> String {
    format!("{}", text.bold().underline())
}

fn status_marker(status: SecurityStatus) -> ColoredString {
    match status {
        SecurityStatus::Secure => "✓".green(),
        SecurityStatus::Insecure => "✗".red().bold(),
        SecurityStatus::Warning => "!".yellow(),
    }
}

pub fn print_subdomains(report: &SubdomainReport) {
    for line in build_subdomain_lines(report) {
        println!("{line}");
    }
}

fn build_subdomain_lines(report: &SubdomainReport) -> Vec<String> {
    let mut lines = vec![heading(&format!("Subdomains of {}", report.domain))];
    for name in report.subdomains.iter() {
        let marker = if report.live.contains(name) { "live".green() } else { "".normal() };
        lines.push(format!("  {} {name} {marker}", "•".cyan()));
    }
    lines.push(format!(
        "{} subdomains found, {} answering HTTP",
        report.subdomains.len().to_string().bold(),
        report.live.len().to_string().bold()
    ));
    lines
}

pub fn print_ports(target: &str, open: &PortMap) {
    for line in build_port_lines(target, open) {
        println!("{line}");
    }
}

fn build_port_lines(target: &str, open: &PortMap) -> Vec<String> {
    let mut lines = vec![heading(&format!("Open ports on {target}"))];
    if open.is_empty() {
        lines.push(format!("  {}", "No open ports found.".yellow()));
        return lines;
    }
    lines.push(format!("  {:<8} {}", "PORT".bright_black(), "SERVICE".bright_black()));
    for (port, service) in open {
        lines.push(format!("  {:<8} {}", format!("{port}/tcp").green(), service));
    }
    lines
}

pub fn print_fingerprint(report: &FingerprintReport) {
    for line in build_fingerprint_lines(report) {
        println!("{line}");
    }
}

fn build_fingerprint_lines(report: &FingerprintReport) -> Vec<String> {
    let mut lines = vec![heading(&format!("Fingerprint of {}", report.url))];
    if let Some(error) = &report.error {
        lines.push(format!("  {}", error.red()));
        return lines;
    }

    if let Some(status) = report.status_code {
        lines.push(format!("  Status:        {status}"));
    }
    for (key, value) in &report.server_info {
        lines.push(format!("  {:<14} {}", format!("{key}:"), value.cyan()));
    }

    lines.push("  Technologies:".to_string());
    if report.technologies.is_empty() {
        lines.push(format!("    {}", "none detected".bright_black()));
    }
    for tech in &report.technologies {
        let version = tech.version.as_deref().map(|v| format!(" {v}")).unwrap_or_default();
        lines.push(format!("    {}{} {}", tech.name.green(), version, format!("({})", tech.category).bright_black()));
    }

    lines.push("  Security headers present:".to_string());
    if report.security_headers.is_empty() {
        lines.push(format!("    {}", "none".red()));
    }
    for name in report.security_headers.keys() {
        lines.push(format!("    {} {name}", "✓".green()));
    }

    if let Some(page) = &report.page_info {
        if let Some(title) = &page.title {
            lines.push(format!("  Title:         {title}"));
        }
        for (name, content) in &page.meta_tags {
            lines.push(format!("    meta {name} = {content}"));
        }
    }
    lines
}

pub fn print_headers(report: &HeaderReport) {
    for line in build_header_lines(report) {
        println!("{line}");
    }
}

fn build_header_lines(report: &HeaderReport) -> Vec<String> {
    let mut lines = vec![heading(&format!("Security headers of {}", report.url))];
    if let Some(error) = &report.error {
        lines.push(format!("  {}", error.red()));
        return lines;
    }

    for guidance in knowledge_base::all_guidance() {
        let Some(check) = report.security_analysis.get(guidance.key) else {
            continue;
        };
        let mut line = format!("  {} {:<26} {}", status_marker(check.status), guidance.title, check.recommendation);
        if let Some(value) = &check.value {
            line.push_str(&format!(" {}", format!("[{value}]").bright_black()));
        }
        lines.push(line);
    }
    lines.push(format!("  {} response headers collected", report.headers.len()));
    lines
}
