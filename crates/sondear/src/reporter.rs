//! Accessibility report rendering.
//!
//! Turns a [`ScanResult`] into a standalone HTML document: a summary of
//! rule counts, every violation with its cited nodes, and a sample of
//! passed rules. Rendering is pure; [`write_report`] handles the disk
//! side.

use std::path::{Path, PathBuf};

use crate::accessibility::{ScanResult, Severity, Violation};
use crate::artifacts;
use crate::result::SondearResult;

/// How many passed rules the report lists
const PASS_SAMPLE_SIZE: usize = 10;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn severity_class(violation: &Violation) -> &'static str {
    violation.impact.as_ref().map_or("minor", Severity::as_str)
}

/// Render a scan result as a standalone HTML document
#[must_use]
pub fn render_html(result: &ScanResult) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Accessibility Report</title>\n<style>\n");
    html.push_str(
        "body { font-family: sans-serif; margin: 2em; }\n\
         .summary { display: flex; gap: 2em; margin-bottom: 2em; }\n\
         .summary div { padding: 1em; border-radius: 4px; background: #f0f0f0; }\n\
         .violation { border-left: 4px solid #ccc; padding: 0.5em 1em; margin: 1em 0; }\n\
         .violation.critical { border-color: #c0392b; }\n\
         .violation.serious { border-color: #e67e22; }\n\
         .violation.moderate { border-color: #f1c40f; }\n\
         .violation.minor { border-color: #95a5a6; }\n\
         .node { background: #fafafa; padding: 0.5em; margin: 0.5em 0; font-family: monospace; }\n\
         .pass { color: #27ae60; }\n",
    );
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str("<h1>Accessibility Report</h1>\n");
    html.push_str(&format!("<p>Scanned URL: {}</p>\n", escape(&result.url)));
    html.push_str(&format!(
        "<p>Generated: {}</p>\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    html.push_str("<div class=\"summary\">\n");
    html.push_str(&format!(
        "<div><strong>{}</strong> violations</div>\n",
        result.violations.len()
    ));
    html.push_str(&format!(
        "<div><strong>{}</strong> passes</div>\n",
        result.passes.len()
    ));
    html.push_str(&format!(
        "<div><strong>{}</strong> incomplete</div>\n",
        result.incomplete.len()
    ));
    html.push_str(&format!(
        "<div><strong>{}</strong> inapplicable</div>\n",
        result.inapplicable.len()
    ));
    html.push_str("</div>\n");

    html.push_str("<h2>Violations</h2>\n");
    if result.violations.is_empty() {
        html.push_str("<p class=\"pass\">No violations found.</p>\n");
    }
    for violation in &result.violations {
        html.push_str(&format!(
            "<div class=\"violation {}\">\n",
            severity_class(violation)
        ));
        html.push_str(&format!(
            "<h3>{} ({})</h3>\n",
            escape(&violation.id),
            severity_class(violation)
        ));
        html.push_str(&format!("<p>{}</p>\n", escape(&violation.help)));
        if !violation.description.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", escape(&violation.description)));
        }
        if !violation.help_url.is_empty() {
            html.push_str(&format!(
                "<p><a href=\"{0}\">{0}</a></p>\n",
                escape(&violation.help_url)
            ));
        }
        for node in &violation.nodes {
            html.push_str(&format!(
                "<div class=\"node\">{}<br>{}</div>\n",
                escape(&node.target.join(", ")),
                escape(&node.html)
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str("<h2>Passed Rules</h2>\n<ul>\n");
    for pass in result.passes.iter().take(PASS_SAMPLE_SIZE) {
        html.push_str(&format!(
            "<li class=\"pass\">{}: {}</li>\n",
            escape(&pass.id),
            escape(&pass.help)
        ));
    }
    html.push_str("</ul>\n");
    if result.passes.len() > PASS_SAMPLE_SIZE {
        html.push_str(&format!(
            "<p>... and {} more passed rules</p>\n",
            result.passes.len() - PASS_SAMPLE_SIZE
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render a scan result and write it as a timestamped report file under
/// `dir`. Returns the path written.
pub async fn write_report(result: &ScanResult, dir: impl AsRef<Path>) -> SondearResult<PathBuf> {
    let html = render_html(result);
    let file_name = format!("accessibility-report-{}.html", artifacts::timestamp());
    artifacts::write_artifact(dir, &file_name, html.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessibility::{RuleOutcome, ViolationNode};

    fn sample_result() -> ScanResult {
        let mut result = ScanResult::empty("http://localhost:5000/form");
        result.violations.push(Violation {
            id: "color-contrast".to_string(),
            help: "Elements must have sufficient color contrast".to_string(),
            impact: Some(Severity::Serious),
            help_url: "https://dequeuniversity.com/rules/axe/color-contrast".to_string(),
            description: String::new(),
            nodes: vec![ViolationNode {
                html: "<p class=\"dim\">low contrast & unreadable</p>".to_string(),
                target: vec!["p.dim".to_string()],
            }],
        });
        for i in 0..12 {
            result.passes.push(RuleOutcome {
                id: format!("rule-{i}"),
                help: format!("help {i}"),
                description: String::new(),
            });
        }
        result
    }

    #[test]
    fn test_report_contains_summary_and_violation() {
        let html = render_html(&sample_result());
        assert!(html.contains("<strong>1</strong> violations"));
        assert!(html.contains("<strong>12</strong> passes"));
        assert!(html.contains("color-contrast"));
        assert!(html.contains("class=\"violation serious\""));
        assert!(html.contains("http://localhost:5000/form"));
    }

    #[test]
    fn test_report_escapes_node_html() {
        let html = render_html(&sample_result());
        assert!(html.contains("&lt;p class=&quot;dim&quot;&gt;"));
        assert!(html.contains("&amp; unreadable"));
        assert!(!html.contains("<p class=\"dim\">"));
    }

    #[test]
    fn test_report_samples_first_ten_passes() {
        let html = render_html(&sample_result());
        assert!(html.contains("rule-0"));
        assert!(html.contains("rule-9"));
        assert!(!html.contains("<li class=\"pass\">rule-10"));
        assert!(html.contains("2 more passed rules"));
    }

    #[test]
    fn test_ungraded_violation_renders_as_minor() {
        let mut result = ScanResult::empty("http://localhost/");
        result.violations.push(Violation {
            id: "region".to_string(),
            help: "All page content should be contained by landmarks".to_string(),
            impact: None,
            help_url: String::new(),
            description: String::new(),
            nodes: vec![],
        });
        let html = render_html(&result);
        assert!(html.contains("class=\"violation minor\""));
        assert!(html.contains("region (minor)"));
    }

    #[test]
    fn test_clean_report() {
        let html = render_html(&ScanResult::empty("http://localhost/"));
        assert!(html.contains("No violations found."));
        assert!(html.contains("<strong>0</strong> violations"));
    }

    #[tokio::test]
    async fn test_write_report_creates_timestamped_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(&sample_result(), tmp.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("accessibility-report-"));
        assert!(name.ends_with(".html"));
        let body = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(body.contains("color-contrast"));
    }
}
