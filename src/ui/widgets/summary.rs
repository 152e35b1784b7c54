// src/ui/widgets/summary.rs

use colored::*;
use std::collections::BTreeSet;
use std::path::Path;

use crate::app::PipelineReport;
use crate::core::models::{HeaderReport, SecurityStatus};

/// Score out of 100 for one header analysis: each insecure check costs 15
/// points, each warning 5.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HeaderScore {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
}

pub fn header_score(report: &HeaderReport) -> HeaderScore {
    let checks = report.security_analysis.values();
    let criticals = checks.clone().filter(|c| c.status == SecurityStatus::Insecure).count();
    let warnings = checks.filter(|c| c.status == SecurityStatus::Warning).count();

    let penalty = criticals.saturating_mul(15).saturating_add(warnings.saturating_mul(5));
    HeaderScore {
        score: 100usize.saturating_sub(penalty) as u8,
        critical_issues: criticals,
        warning_issues: warnings,
    }
}

fn rating(score: u8) -> ColoredString {
    match score {
        90..=100 => "Excellent".green(),
        75..=89 => "Good".cyan(),
        50..=74 => "Needs Improvement".yellow(),
        _ => "Poor".red(),
    }
}

pub fn print_pipeline_summary(report: &PipelineReport, saved_to: Option<&Path>) {
    for line in build_summary_lines(report, saved_to) {
        println!("{line}");
    }
}

fn build_summary_lines(report: &PipelineReport, saved_to: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!("{}", format!("Summary for {}", report.domain).bold().underline())];

    if let Some(subdomains) = &report.subdomains {
        lines.push(format!(
            "  Subdomains:    {} ({} live)",
            subdomains.subdomains.len().to_string().bold(),
            subdomains.live.len()
        ));
    }

    if !report.ports.is_empty() {
        let open: usize = report.ports.values().map(|p| p.len()).sum();
        lines.push(format!(
            "  Open ports:    {} across {} host(s)",
            open.to_string().bold(),
            report.ports.len()
        ));
    }

    let techs: BTreeSet<&str> = report
        .fingerprints
        .values()
        .flat_map(|f| f.technologies.iter().map(|t| t.name.as_str()))
        .collect();
    if !report.fingerprints.is_empty() {
        let listed = if techs.is_empty() {
            "Not identified.".to_string()
        } else {
            techs.into_iter().collect::<Vec<_>>().join(", ")
        };
        lines.push(format!("  Technologies:  {}", listed.cyan()));
    }

    for (host, headers) in &report.headers {
        if headers.error.is_some() {
            continue;
        }
        let score = header_score(headers);
        lines.push(format!(
            "  Headers score: {}/100 ({}) for {host}: {} critical, {} warnings",
            score.score,
            rating(score.score),
            score.critical_issues.to_string().red(),
            score.warning_issues.to_string().yellow()
        ));
    }

    if !report.errors.is_empty() {
        lines.push(format!("  {} stage error(s):", report.errors.len().to_string().red()));
        for error in &report.errors {
            let target = error.target.as_deref().map(|t| format!(" {t}")).unwrap_or_default();
            lines.push(format!("    [{}]{target}: {}", error.stage, error.message));
        }
    }

    if let Some(path) = saved_to {
        lines.push(format!("  Report saved to {}", path.display().to_string().green()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SecurityCheck;
    use std::collections::BTreeMap;

    fn check(status: SecurityStatus) -> SecurityCheck {
        SecurityCheck { status, value: None, recommendation: String::new() }
    }

    #[test]
    fn score_deducts_per_issue() {
        let mut analysis = BTreeMap::new();
        analysis.insert("csp".to_string(), check(SecurityStatus::Insecure));
        analysis.insert("hsts".to_string(), check(SecurityStatus::Insecure));
        analysis.insert("xss_protection".to_string(), check(SecurityStatus::Warning));
        analysis.insert("referrer_policy".to_string(), check(SecurityStatus::Secure));
        let report = HeaderReport { security_analysis: analysis, ..Default::default() };

        assert_eq!(
            header_score(&report),
            HeaderScore { score: 65, critical_issues: 2, warning_issues: 1 }
        );
    }

    #[test]
    fn score_never_underflows() {
        let analysis = (0..10)
            .map(|i| (format!("check{i}"), check(SecurityStatus::Insecure)))
            .collect();
        let report = HeaderReport { security_analysis: analysis, ..Default::default() };
        assert_eq!(header_score(&report).score, 0);
    }
}
