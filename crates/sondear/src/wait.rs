//! Explicit wait engine.
//!
//! All waits poll: a condition is checked immediately, then re-checked at
//! the poll interval until it holds or the budget runs out. A condition
//! that is already true returns at once, and a wait that exhausts its
//! budget fails with a `Timeout` error carrying the budget and a
//! description of what was awaited. A timeout of `0` means "use the
//! configured default", never "no waiting".

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::browser::Page;
use crate::config::TestSettings;
use crate::locator::ElementQuery;
use crate::result::{SondearError, SondearResult};

/// Interval between condition checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Settle delay after an element becomes visible
pub const SETTLE_DELAY_MS: u64 = 100;

/// Document load milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The load event has fired
    Load,
    /// The DOM is parsed, subresources may still be loading
    DomContentLoaded,
    /// No network activity for a quiet period
    NetworkIdle,
}

impl LoadState {
    /// Name for logs and timeout messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

/// URL match conditions for navigation waits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// The whole URL equals the given string
    Exact(String),
    /// The URL starts with the given string
    Prefix(String),
    /// The URL contains the given string
    Contains(String),
}

impl UrlPattern {
    /// Whether a URL satisfies the pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(s) => url == s,
            Self::Prefix(s) => url.starts_with(s),
            Self::Contains(s) => url.contains(s),
        }
    }

    /// Description for timeout messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Exact(s) => format!("url '{s}'"),
            Self::Prefix(s) => format!("url starting with '{s}'"),
            Self::Contains(s) => format!("url containing '{s}'"),
        }
    }
}

/// Per-wait overrides
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Budget in milliseconds; 0 uses the waiter's default
    pub timeout_ms: u64,
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl WaitOptions {
    /// Defaults: inherit the waiter's timeout, poll at the standard interval
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout_ms: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Override the budget
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Override the poll interval
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls page conditions within a configured default budget
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    default_timeout_ms: u64,
}

impl Waiter {
    /// A waiter whose default budget comes from the loaded settings
    #[must_use]
    pub const fn new(settings: &TestSettings) -> Self {
        Self {
            default_timeout_ms: settings.timeout,
        }
    }

    /// A waiter with an explicit default budget
    #[must_use]
    pub const fn with_default_timeout_ms(default_timeout_ms: u64) -> Self {
        Self { default_timeout_ms }
    }

    /// The default budget in milliseconds
    #[must_use]
    pub const fn default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
    }

    /// Poll an arbitrary condition until it holds.
    ///
    /// The condition is checked before any sleeping, so an
    /// already-satisfied wait costs one check. Errors from the check
    /// abort the wait immediately; only a condition that stays false for
    /// the whole budget produces a `Timeout`.
    pub async fn wait_for_condition<F, Fut>(
        &self,
        condition: &str,
        options: WaitOptions,
        mut check: F,
    ) -> SondearResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SondearResult<bool>>,
    {
        let timeout_ms = if options.timeout_ms == 0 {
            self.default_timeout_ms
        } else {
            options.timeout_ms
        };
        let poll_ms = options.poll_interval_ms.max(1);
        let start = Instant::now();
        tracing::debug!(%condition, timeout_ms, "waiting");
        loop {
            if check().await? {
                tracing::debug!(
                    %condition,
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "condition satisfied"
                );
                return Ok(());
            }
            let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if elapsed >= timeout_ms {
                tracing::warn!(%condition, timeout_ms, "wait timed out");
                return Err(SondearError::Timeout {
                    ms: timeout_ms,
                    condition: condition.to_string(),
                });
            }
            let remaining = timeout_ms - elapsed;
            tokio::time::sleep(Duration::from_millis(poll_ms.min(remaining))).await;
        }
    }

    /// Wait until at least one element matches
    pub async fn wait_for_attached(
        &self,
        page: &Page,
        query: &ElementQuery,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{query} attached");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(page.count(query).await? > 0)
        })
        .await
    }

    /// Wait until no element matches
    pub async fn wait_for_detached(
        &self,
        page: &Page,
        query: &ElementQuery,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{query} detached");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(page.count(query).await? == 0)
        })
        .await
    }

    /// Wait until the first match is visible
    pub async fn wait_for_visible(
        &self,
        page: &Page,
        query: &ElementQuery,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{query} visible");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(page.state(query).await?.is_some_and(|s| s.visible))
        })
        .await
    }

    /// Wait until no match is visible (hidden or absent both qualify)
    pub async fn wait_for_hidden(
        &self,
        page: &Page,
        query: &ElementQuery,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{query} hidden");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(!page.state(query).await?.is_some_and(|s| s.visible))
        })
        .await
    }

    /// Wait for a document load milestone
    pub async fn wait_for_load(
        &self,
        page: &Page,
        state: LoadState,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("load state '{}'", state.as_str());
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            page.load_reached(state).await
        })
        .await
    }

    /// Wait until the DOM is parsed
    pub async fn wait_for_dom_content_loaded(
        &self,
        page: &Page,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        self.wait_for_load(page, LoadState::DomContentLoaded, timeout_ms).await
    }

    /// Wait until network activity has settled
    pub async fn wait_for_network_idle(&self, page: &Page, timeout_ms: u64) -> SondearResult<()> {
        self.wait_for_load(page, LoadState::NetworkIdle, timeout_ms).await
    }

    /// Wait until the page URL satisfies a pattern
    pub async fn wait_for_url(
        &self,
        page: &Page,
        pattern: &UrlPattern,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = pattern.describe();
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(pattern.matches(&page.current_url().await))
        })
        .await
    }

    /// Wait until the first match's text contains the expected fragment
    pub async fn wait_for_text(
        &self,
        page: &Page,
        query: &ElementQuery,
        expected: &str,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{query} containing text '{expected}'");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(page
                .try_text(query)
                .await?
                .is_some_and(|t| t.contains(expected)))
        })
        .await
    }

    /// Wait until exactly `expected` elements match
    pub async fn wait_for_count(
        &self,
        page: &Page,
        query: &ElementQuery,
        expected: usize,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        let condition = format!("{expected} matches of {query}");
        let options = WaitOptions::new().with_timeout_ms(timeout_ms);
        self.wait_for_condition(&condition, options, || async {
            Ok(page.count(query).await? == expected)
        })
        .await
    }

    /// Attachment, then visibility, then a short settle delay.
    ///
    /// The staged checks give precise timeout messages when an element
    /// exists but never renders, and the settle delay absorbs enter
    /// animations before the caller interacts.
    pub async fn smart_wait(
        &self,
        page: &Page,
        query: &ElementQuery,
        timeout_ms: u64,
    ) -> SondearResult<()> {
        self.wait_for_attached(page, query, timeout_ms).await?;
        self.wait_for_visible(page, query, timeout_ms).await?;
        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;
        Ok(())
    }
}
