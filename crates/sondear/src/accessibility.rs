//! Accessibility scanning.
//!
//! Drives an axe-core scan against a live page and reduces the result to a
//! [`ScanResult`]. Scans are read-only: they never mutate the page. The
//! allow-list check in [`AxeScanner::is_accessible`] treats a rule id as
//! permanently waived, so unlisted violations are the only ones that count.

use serde::{Deserialize, Serialize};

use crate::browser::Page;
use crate::locator::ElementQuery;
use crate::result::SondearResult;

/// Violation impact levels, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks access for some users entirely
    Critical,
    /// Serious barrier
    Serious,
    /// Moderate barrier
    Moderate,
    /// Minor annoyance
    Minor,
}

impl Severity {
    /// Lowercase name as used by the axe engine and report styling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Serious => "serious",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A DOM node cited by a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationNode {
    /// HTML snippet of the offending node
    #[serde(default)]
    pub html: String,
    /// CSS selectors locating the node
    #[serde(default)]
    pub target: Vec<String>,
}

/// A single failed accessibility rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule id, e.g. "color-contrast"
    pub id: String,
    /// Short help text
    #[serde(default)]
    pub help: String,
    /// Impact level; absent when the engine could not grade it
    #[serde(default)]
    pub impact: Option<Severity>,
    /// Link to the rule documentation
    #[serde(default, rename = "helpUrl")]
    pub help_url: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Offending nodes
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,
}

/// A rule that passed, was incomplete, or did not apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Rule id
    pub id: String,
    /// Short help text
    #[serde(default)]
    pub help: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
}

/// Outcome of one accessibility scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// URL the scan ran against
    #[serde(default)]
    pub url: String,
    /// Failed rules
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Passed rules
    #[serde(default)]
    pub passes: Vec<RuleOutcome>,
    /// Rules the engine could not complete
    #[serde(default)]
    pub incomplete: Vec<RuleOutcome>,
    /// Rules with nothing to check on this page
    #[serde(default)]
    pub inapplicable: Vec<RuleOutcome>,
}

impl ScanResult {
    /// A clean result for `url` with no findings
    #[must_use]
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            violations: Vec::new(),
            passes: Vec::new(),
            incomplete: Vec::new(),
            inapplicable: Vec::new(),
        }
    }

    /// Number of failed rules
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

/// Violations whose rule id is not in the allow-list
#[must_use]
pub fn uncounted_violations<'a>(
    result: &'a ScanResult,
    allowed_ids: &[&str],
) -> Vec<&'a Violation> {
    result
        .violations
        .iter()
        .filter(|v| !allowed_ids.contains(&v.id.as_str()))
        .collect()
}

/// Whether a scan is clean after discounting allow-listed rule ids
#[must_use]
pub fn is_accessible_result(result: &ScanResult, allowed_ids: &[&str]) -> bool {
    uncounted_violations(result, allowed_ids).is_empty()
}

/// Runs axe-core scans against a page
#[derive(Debug)]
pub struct AxeScanner<'p> {
    page: &'p Page,
}

impl<'p> AxeScanner<'p> {
    /// Create a scanner bound to a page
    #[must_use]
    pub const fn new(page: &'p Page) -> Self {
        Self { page }
    }

    /// Scan the whole page
    pub async fn run_full_scan(&self) -> SondearResult<ScanResult> {
        tracing::info!(url = %self.page.current_url().await, "running full accessibility scan");
        let result = self.page.audit(None).await?;
        tracing::info!(
            violations = result.violation_count(),
            passes = result.passes.len(),
            "accessibility scan complete"
        );
        Ok(result)
    }

    /// Scan the subtree rooted at `query`.
    ///
    /// When the element cannot be isolated for scanning this degrades to a
    /// full-page scan rather than failing, which widens the result set; the
    /// degradation is logged at warn level.
    pub async fn run_element_scan(&self, query: &ElementQuery) -> SondearResult<ScanResult> {
        tracing::info!(target = %query, "running element accessibility scan");
        match self.page.audit(Some(query)).await {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::warn!(
                    target = %query,
                    error = %err,
                    "element scan unavailable, falling back to full-page scan"
                );
                self.run_full_scan().await
            }
        }
    }

    /// Full scan, then pass/fail against an allow-list of waived rule ids
    pub async fn is_accessible(&self, allowed_ids: &[&str]) -> SondearResult<bool> {
        let result = self.run_full_scan().await?;
        let remaining = uncounted_violations(&result, allowed_ids);
        if remaining.is_empty() {
            Ok(true)
        } else {
            for v in &remaining {
                tracing::warn!(rule = %v.id, help = %v.help, "accessibility violation");
            }
            Ok(false)
        }
    }
}
