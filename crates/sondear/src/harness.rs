//! Scenario lifecycle harness.
//!
//! [`ScenarioHarness`] runs one scenario against a freshly launched
//! browser: launch, open a page, hand it to the scenario, then tear
//! everything down on every exit path. A failing scenario gets a failure
//! screenshot (when enabled in settings) before its page closes, and the
//! scenario's own result is what the caller sees even when teardown also
//! complains.

use std::future::Future;
use std::sync::Arc;

use crate::artifacts;
use crate::browser::{Browser, BrowserConfig, Page};
use crate::config::TestSettings;
use crate::dom::MockDom;
use crate::result::SondearResult;

/// Runs scenarios with per-scenario browser lifecycle
#[derive(Debug)]
pub struct ScenarioHarness {
    settings: TestSettings,
}

impl ScenarioHarness {
    /// A harness using the given settings for every scenario
    #[must_use]
    pub const fn new(settings: TestSettings) -> Self {
        Self { settings }
    }

    /// The settings scenarios run with
    #[must_use]
    pub const fn settings(&self) -> &TestSettings {
        &self.settings
    }

    /// Run a scenario against a page with an empty document
    pub async fn run<F, Fut>(&self, name: &str, scenario: F) -> SondearResult<()>
    where
        F: FnOnce(Arc<Page>) -> Fut,
        Fut: Future<Output = SondearResult<()>>,
    {
        self.run_with_dom(name, MockDom::new(), scenario).await
    }

    /// Run a scenario against a page seeded with the given document.
    ///
    /// The document seed only applies to the in-memory backend; a CDP
    /// session always starts from a blank tab.
    pub async fn run_with_dom<F, Fut>(
        &self,
        name: &str,
        dom: MockDom,
        scenario: F,
    ) -> SondearResult<()>
    where
        F: FnOnce(Arc<Page>) -> Fut,
        Fut: Future<Output = SondearResult<()>>,
    {
        tracing::info!(scenario = name, "starting scenario");
        let browser = Browser::launch(BrowserConfig::from_settings(&self.settings)).await?;
        if self.settings.trace {
            // Capture itself is backend-dependent; the directory is always
            // prepared so trace writers have somewhere to land.
            tokio::fs::create_dir_all(artifacts::TRACE_DIR).await?;
        }

        let page = match browser.new_page_with(dom).await {
            Ok(page) => Arc::new(page),
            Err(err) => {
                let _ = browser.close().await;
                return Err(err);
            }
        };

        let outcome = scenario(Arc::clone(&page)).await;

        match &outcome {
            Ok(()) => tracing::info!(scenario = name, "scenario passed"),
            Err(err) => {
                tracing::error!(scenario = name, error = %err, "scenario failed");
                if self.settings.screenshot {
                    self.capture_failure_screenshot(name, &page).await;
                }
            }
        }

        if let Err(err) = page.close().await {
            tracing::warn!(scenario = name, error = %err, "page close failed");
        }
        if let Err(err) = browser.close().await {
            tracing::warn!(scenario = name, error = %err, "browser close failed");
        }
        outcome
    }

    async fn capture_failure_screenshot(&self, name: &str, page: &Page) {
        let capture = async {
            let bytes = page.screenshot().await?;
            let file_name = format!(
                "failure-{}-{}.png",
                sanitize_name(name),
                artifacts::timestamp()
            );
            artifacts::write_artifact(artifacts::SCREENSHOT_DIR, &file_name, &bytes).await
        };
        match capture.await {
            Ok(path) => tracing::info!(scenario = name, path = %path.display(), "failure screenshot"),
            Err(err) => tracing::warn!(scenario = name, error = %err, "failure screenshot failed"),
        }
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ElementQuery;
    use crate::result::SondearError;
    use std::sync::Mutex;

    fn quiet_settings() -> TestSettings {
        TestSettings {
            screenshot: false,
            trace: false,
            timeout: 2_000,
            ..TestSettings::default()
        }
    }

    #[tokio::test]
    async fn test_passing_scenario_closes_page() {
        let harness = ScenarioHarness::new(quiet_settings());
        let seen: Arc<Mutex<Option<Arc<Page>>>> = Arc::new(Mutex::new(None));
        let stash = Arc::clone(&seen);
        harness
            .run_with_dom("registration", MockDom::sample_form(), |page| async move {
                *stash.lock().unwrap() = Some(Arc::clone(&page));
                page.fill(&ElementQuery::textbox_by_id("firstName"), "John", false)
                    .await
            })
            .await
            .unwrap();
        let page = seen.lock().unwrap().take().unwrap();
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_failing_scenario_still_closes_and_reports_its_error() {
        let harness = ScenarioHarness::new(quiet_settings());
        let seen: Arc<Mutex<Option<Arc<Page>>>> = Arc::new(Mutex::new(None));
        let stash = Arc::clone(&seen);
        let err = harness
            .run("broken", |page| async move {
                *stash.lock().unwrap() = Some(Arc::clone(&page));
                Err(SondearError::Validation {
                    message: "intentional".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SondearError::Validation { .. }));
        let page = seen.lock().unwrap().take().unwrap();
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_scenario_can_close_its_own_page() {
        let harness = ScenarioHarness::new(quiet_settings());
        harness
            .run("self closing", |page| async move { page.close().await })
            .await
            .unwrap();
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("user logs in / happy path"), "user-logs-in---happy-path");
    }
}
