//! Browser session and page control.
//!
//! [`Browser`] owns a browsing session, [`Page`] a single tab. Every page
//! carries the in-memory document from [`crate::dom`]; with the `browser`
//! feature enabled and a real session launched, an attached CDP page takes
//! over and the operations are executed against live chromium instead.
//!
//! All page operations check the closed flag first and report interaction
//! with a closed page as a `Resolution` error.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::accessibility::ScanResult;
use crate::config::{BrowserKind, TestSettings};
use crate::dom::{ElementState, MockDom, SelectBy};
use crate::locator::ElementQuery;
#[cfg(feature = "browser")]
use crate::locator::{By, ElementKind};
use crate::result::{SondearError, SondearResult};
use crate::wait::LoadState;

/// Launch parameters for a browsing session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Engine to launch
    pub kind: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Delay before each interaction, in milliseconds
    pub slow_mo_ms: u64,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Default operation timeout in milliseconds
    pub default_timeout_ms: u64,
}

impl BrowserConfig {
    /// Build launch parameters from loaded settings
    #[must_use]
    pub const fn from_settings(settings: &TestSettings) -> Self {
        Self {
            kind: settings.browser,
            headless: settings.headless,
            slow_mo_ms: settings.slow_mo,
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
            default_timeout_ms: settings.timeout,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from_settings(&TestSettings::default())
    }
}

/// A browsing session
#[derive(Debug)]
pub struct Browser {
    config: BrowserConfig,
    closed: AtomicBool,
    #[cfg(feature = "browser")]
    inner: Option<std::sync::Arc<Mutex<chromiumoxide::Browser>>>,
    #[cfg(feature = "browser")]
    handler_task: Option<tokio::task::JoinHandle<()>>,
}

impl Browser {
    /// Launch a session per the config.
    ///
    /// With the `browser` feature this starts real chromium over CDP and
    /// fails with `BrowserLaunch` when the binary cannot be started. Without
    /// it the in-memory backend is used and launch cannot fail.
    pub async fn launch(config: BrowserConfig) -> SondearResult<Self> {
        tracing::info!(
            browser = config.kind.as_str(),
            headless = config.headless,
            "launching browser"
        );
        #[cfg(feature = "browser")]
        {
            return Self::launch_cdp(config).await;
        }
        #[cfg(not(feature = "browser"))]
        {
            Ok(Self::mock(config))
        }
    }

    /// An in-memory session, regardless of enabled features
    #[must_use]
    pub fn mock(config: BrowserConfig) -> Self {
        Self {
            config,
            closed: AtomicBool::new(false),
            #[cfg(feature = "browser")]
            inner: None,
            #[cfg(feature = "browser")]
            handler_task: None,
        }
    }

    #[cfg(feature = "browser")]
    async fn launch_cdp(config: BrowserConfig) -> SondearResult<Self> {
        use futures::StreamExt;

        if config.kind != BrowserKind::Chromium {
            tracing::warn!(
                requested = config.kind.as_str(),
                "only chromium is driveable over CDP, launching chromium"
            );
        }
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder.build().map_err(|message| SondearError::BrowserLaunch { message })?;
        let (browser, mut handler) = chromiumoxide::Browser::launch(cdp_config)
            .await
            .map_err(|e| SondearError::BrowserLaunch { message: e.to_string() })?;
        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "cdp handler event error");
                }
            }
        });
        Ok(Self {
            config,
            closed: AtomicBool::new(false),
            inner: Some(std::sync::Arc::new(Mutex::new(browser))),
            handler_task: Some(handler_task),
        })
    }

    /// The launch config this session was created with
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Whether the session has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Open a new page with an empty document
    pub async fn new_page(&self) -> SondearResult<Page> {
        self.new_page_with(MockDom::new()).await
    }

    /// Open a new page seeded with a mock document. On a CDP session the
    /// document seed is ignored and a real blank tab is opened.
    pub async fn new_page_with(&self, dom: MockDom) -> SondearResult<Page> {
        if self.is_closed() {
            return Err(SondearError::BrowserLaunch {
                message: "browser session is closed".to_string(),
            });
        }
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            let guard = inner.lock().await;
            let cdp_page = guard
                .new_page("about:blank")
                .await
                .map_err(|e| SondearError::BrowserLaunch { message: e.to_string() })?;
            return Ok(Page::from_cdp(cdp_page, self.config.slow_mo_ms));
        }
        Ok(Page::with_dom(dom))
    }

    /// Close the session. Idempotent.
    pub async fn close(&self) -> SondearResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing browser");
        #[cfg(feature = "browser")]
        {
            if let Some(inner) = &self.inner {
                let mut guard = inner.lock().await;
                guard
                    .close()
                    .await
                    .map_err(|e| SondearError::ActionFailure {
                        action: "close browser".to_string(),
                        message: e.to_string(),
                    })?;
            }
            if let Some(task) = &self.handler_task {
                task.abort();
            }
        }
        Ok(())
    }
}

/// Placeholder screenshot payload for the in-memory backend: the PNG magic
/// number, enough for callers that only route bytes to disk.
const MOCK_PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// A single page (tab)
#[derive(Debug)]
pub struct Page {
    dom: Mutex<MockDom>,
    url: Mutex<String>,
    title: Mutex<String>,
    loaded: AtomicBool,
    closed: AtomicBool,
    audit_fixture: Mutex<Option<ScanResult>>,
    slow_mo_ms: u64,
    #[cfg(feature = "browser")]
    inner: Option<std::sync::Arc<Mutex<chromiumoxide::Page>>>,
}

impl Page {
    /// A page backed by the given in-memory document
    #[must_use]
    pub fn with_dom(dom: MockDom) -> Self {
        Self {
            dom: Mutex::new(dom),
            url: Mutex::new("about:blank".to_string()),
            title: Mutex::new(String::new()),
            loaded: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            audit_fixture: Mutex::new(None),
            slow_mo_ms: 0,
            #[cfg(feature = "browser")]
            inner: None,
        }
    }

    #[cfg(feature = "browser")]
    fn from_cdp(cdp: chromiumoxide::Page, slow_mo_ms: u64) -> Self {
        let mut page = Self::with_dom(MockDom::new());
        page.slow_mo_ms = slow_mo_ms;
        page.inner = Some(std::sync::Arc::new(Mutex::new(cdp)));
        page
    }

    fn ensure_open(&self, what: &str) -> SondearResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SondearError::Resolution {
                query: what.to_string(),
                message: "page is closed".to_string(),
            });
        }
        Ok(())
    }

    async fn pace(&self) {
        if self.slow_mo_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.slow_mo_ms)).await;
        }
    }

    /// Whether the page has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the page. Idempotent; further operations fail with
    /// a `Resolution` error.
    pub async fn close(&self) -> SondearResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("closing page");
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            let guard = inner.lock().await;
            guard
                .clone()
                .close()
                .await
                .map_err(|e| SondearError::ActionFailure {
                    action: "close page".to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Navigate to a URL and wait for the document to load
    pub async fn goto(&self, url: &str) -> SondearResult<()> {
        self.ensure_open("page")?;
        tracing::info!(%url, "navigating");
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            let guard = inner.lock().await;
            guard
                .goto(url)
                .await
                .map_err(|e| SondearError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            guard
                .wait_for_navigation()
                .await
                .map_err(|e| SondearError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.loaded.store(true, Ordering::SeqCst);
            *self.url.lock().await = url.to_string();
            return Ok(());
        }
        *self.url.lock().await = url.to_string();
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// The page's current URL
    pub async fn current_url(&self) -> String {
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            let guard = inner.lock().await;
            if let Ok(Some(url)) = guard.url().await {
                return url;
            }
        }
        self.url.lock().await.clone()
    }

    /// The document title
    pub async fn title(&self) -> SondearResult<String> {
        self.ensure_open("page")?;
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            let guard = inner.lock().await;
            let title = guard
                .get_title()
                .await
                .map_err(|e| SondearError::ActionFailure {
                    action: "read title".to_string(),
                    message: e.to_string(),
                })?;
            return Ok(title.unwrap_or_default());
        }
        Ok(self.title.lock().await.clone())
    }

    /// Set the document title on the in-memory backend
    pub async fn set_title(&self, title: &str) {
        *self.title.lock().await = title.to_string();
    }

    /// Whether the given load state has been reached
    pub async fn load_reached(&self, state: LoadState) -> SondearResult<bool> {
        self.ensure_open("page")?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let ready: String = self.cdp_eval("document.readyState").await?;
            return Ok(match state {
                LoadState::DomContentLoaded => ready != "loading",
                // NetworkIdle is approximated by document completion
                LoadState::Load | LoadState::NetworkIdle => ready == "complete",
            });
        }
        let _ = state;
        Ok(self.loaded.load(Ordering::SeqCst))
    }

    /// Number of elements currently matching the query
    pub async fn count(&self, query: &ElementQuery) -> SondearResult<usize> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!("{}.length", js_find_all(query));
            let n: u64 = self.cdp_eval(&js).await?;
            return Ok(usize::try_from(n).unwrap_or(usize::MAX));
        }
        Ok(self.dom.lock().await.count(query))
    }

    /// Observable state of the first match, or None when nothing matches
    pub async fn state(&self, query: &ElementQuery) -> SondearResult<Option<ElementState>> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    if (!el) return null;
                    const style = window.getComputedStyle(el);
                    const rect = el.getBoundingClientRect();
                    return {{
                        visible: style.display !== 'none'
                            && style.visibility !== 'hidden'
                            && rect.width > 0 && rect.height > 0,
                        enabled: !el.disabled,
                        checked: typeof el.checked === 'boolean' ? el.checked : null
                    }};
                }})()",
                js_first(query)
            );
            #[derive(serde::Deserialize)]
            struct RawState {
                visible: bool,
                enabled: bool,
                checked: Option<bool>,
            }
            let raw: Option<RawState> = self.cdp_eval(&js).await?;
            return Ok(raw.map(|r| ElementState {
                attached: true,
                visible: r.visible,
                enabled: r.enabled,
                checked: r.checked,
            }));
        }
        Ok(self.dom.lock().await.state(query))
    }

    /// Text content of the first match, or None when nothing matches
    pub async fn try_text(&self, query: &ElementQuery) -> SondearResult<Option<String>> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    return el ? (el.textContent ?? el.value ?? '') : null;
                }})()",
                js_first(query)
            );
            return self.cdp_eval(&js).await;
        }
        Ok(self.dom.lock().await.text(query))
    }

    /// Current value of the first match
    pub async fn read_value(&self, query: &ElementQuery) -> SondearResult<String> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    return el ? (el.value ?? '') : null;
                }})()",
                js_first(query)
            );
            let value: Option<String> = self.cdp_eval(&js).await?;
            return value.ok_or_else(|| no_match(query));
        }
        self.dom.lock().await.value(query).ok_or_else(|| no_match(query))
    }

    /// Set (or append to) the value of the first match
    pub async fn fill(&self, query: &ElementQuery, text: &str, append: bool) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {first};
                    if (!el) return false;
                    el.focus();
                    el.value = {append} ? el.value + {text} : {text};
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }})()",
                first = js_first(query),
                text = js_string(text),
                append = append,
            );
            let done: bool = self.cdp_eval(&js).await?;
            return if done { Ok(()) } else { Err(no_match(query)) };
        }
        if self.dom.lock().await.set_value(query, text, append) {
            Ok(())
        } else {
            Err(no_match(query))
        }
    }

    /// Checked state of the first match
    pub async fn is_checked(&self, query: &ElementQuery) -> SondearResult<bool> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    return el ? el.checked === true : null;
                }})()",
                js_first(query)
            );
            let checked: Option<bool> = self.cdp_eval(&js).await?;
            return checked.ok_or_else(|| no_match(query));
        }
        self.dom.lock().await.is_checked(query).ok_or_else(|| no_match(query))
    }

    /// Force the checked state of the first match
    pub async fn set_checked(&self, query: &ElementQuery, checked: bool) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {first};
                    if (!el) return false;
                    if (el.checked !== {checked}) el.click();
                    return true;
                }})()",
                first = js_first(query),
                checked = checked,
            );
            let done: bool = self.cdp_eval(&js).await?;
            return if done { Ok(()) } else { Err(no_match(query)) };
        }
        if self.dom.lock().await.set_checked(query, checked) {
            Ok(())
        } else {
            Err(no_match(query))
        }
    }

    /// Select an option on a select element
    pub async fn select_option(
        &self,
        query: &ElementQuery,
        by: SelectBy,
        needle: &str,
    ) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let field = match by {
                SelectBy::Label => "label",
                SelectBy::Value => "value",
            };
            let js = format!(
                r"(() => {{
                    const el = {first};
                    if (!el) return 'missing';
                    const opt = Array.from(el.options).find(o => o.{field} === {needle});
                    if (!opt) return 'no-option';
                    el.value = opt.value;
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return 'ok';
                }})()",
                first = js_first(query),
                field = field,
                needle = js_string(needle),
            );
            let outcome: String = self.cdp_eval(&js).await?;
            return match outcome.as_str() {
                "ok" => Ok(()),
                "missing" => Err(no_match(query)),
                _ => Err(SondearError::ActionFailure {
                    action: format!("select option on {query}"),
                    message: format!("no option matching '{needle}'"),
                }),
            };
        }
        match self.dom.lock().await.select_option(query, by, needle) {
            Some(true) => Ok(()),
            Some(false) => Err(SondearError::ActionFailure {
                action: format!("select option on {query}"),
                message: format!("no option matching '{needle}'"),
            }),
            None => Err(no_match(query)),
        }
    }

    /// Label of the currently selected option
    pub async fn selected_text(&self, query: &ElementQuery) -> SondearResult<String> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    if (!el) return null;
                    const opt = Array.from(el.options ?? []).find(o => o.value === el.value);
                    return opt ? opt.label : el.value;
                }})()",
                js_first(query)
            );
            let text: Option<String> = self.cdp_eval(&js).await?;
            return text.ok_or_else(|| no_match(query));
        }
        self.dom
            .lock()
            .await
            .selected_text(query)
            .ok_or_else(|| no_match(query))
    }

    /// Deliver a key press to the first match
    pub async fn press(&self, query: &ElementQuery, key: &str) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {first};
                    if (!el) return false;
                    el.focus();
                    el.dispatchEvent(new KeyboardEvent('keydown', {{ key: {key}, bubbles: true }}));
                    el.dispatchEvent(new KeyboardEvent('keyup', {{ key: {key}, bubbles: true }}));
                    return true;
                }})()",
                first = js_first(query),
                key = js_string(key),
            );
            let done: bool = self.cdp_eval(&js).await?;
            return if done { Ok(()) } else { Err(no_match(query)) };
        }
        if self.dom.lock().await.press(query, key) {
            Ok(())
        } else {
            Err(no_match(query))
        }
    }

    /// Attach file paths to a file input. Paths are assumed validated by the
    /// caller.
    pub async fn set_input_files(
        &self,
        query: &ElementQuery,
        paths: &[String],
    ) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;

            const MARK: &str = "data-upload-target";

            // Tag the resolved element so the wire-level node lookup can use
            // a plain attribute selector.
            let mark_js = format!(
                r"(() => {{
                    const el = {first};
                    if (!el) return false;
                    el.setAttribute('{MARK}', '1');
                    return true;
                }})()",
                first = js_first(query),
            );
            let marked: bool = self.cdp_eval(&mark_js).await?;
            if !marked {
                return Err(no_match(query));
            }
            let outcome = {
                let guard = inner.lock().await;
                match guard.find_element(format!("[{MARK}]")).await {
                    Ok(element) => {
                        let params = SetFileInputFilesParams::builder()
                            .files(paths.to_vec())
                            .backend_node_id(element.backend_node_id)
                            .build()
                            .map_err(|message| SondearError::ActionFailure {
                                action: format!("set files on {query}"),
                                message,
                            })?;
                        guard.execute(params).await.map(|_| ()).map_err(|e| {
                            SondearError::ActionFailure {
                                action: format!("set files on {query}"),
                                message: e.to_string(),
                            }
                        })
                    }
                    Err(_) => Err(no_match(query)),
                }
            };
            let unmark_js = format!(
                "document.querySelectorAll('[{MARK}]')\
                 .forEach(el => el.removeAttribute('{MARK}'))"
            );
            let _: Option<serde_json::Value> = self.cdp_eval(&unmark_js).await.ok().flatten();
            return outcome;
        }
        if self.dom.lock().await.set_files(query, paths) {
            Ok(())
        } else {
            Err(no_match(query))
        }
    }

    /// Paths currently attached to a file input
    pub async fn input_files(&self, query: &ElementQuery) -> SondearResult<Vec<String>> {
        self.ensure_open(&query.describe())?;
        #[cfg(feature = "browser")]
        if self.inner.is_some() {
            // File lists are write-only over the wire
            return Ok(Vec::new());
        }
        self.dom.lock().await.files(query).ok_or_else(|| no_match(query))
    }

    /// Click the first match
    pub async fn click(&self, query: &ElementQuery) -> SondearResult<()> {
        self.ensure_open(&query.describe())?;
        self.pace().await;
        #[cfg(feature = "browser")]
        if let Some(_inner) = &self.inner {
            let js = format!(
                r"(() => {{
                    const el = {};
                    if (!el) return false;
                    el.click();
                    return true;
                }})()",
                js_first(query)
            );
            let done: bool = self.cdp_eval(&js).await?;
            return if done { Ok(()) } else { Err(no_match(query)) };
        }
        if self.dom.lock().await.click(query) {
            Ok(())
        } else {
            Err(no_match(query))
        }
    }

    /// Run an accessibility audit. With a scope query the scan is restricted
    /// to that element's subtree; a scope that cannot be resolved is a
    /// `Resolution` error.
    ///
    /// On the in-memory backend the audit returns the injected fixture (see
    /// [`Page::set_audit_result`]) or an empty result.
    pub async fn audit(&self, scope: Option<&ElementQuery>) -> SondearResult<ScanResult> {
        self.ensure_open("page")?;
        #[cfg(feature = "browser")]
        if self.inner.is_some() {
            return self.cdp_audit(scope).await;
        }
        if let Some(query) = scope {
            if self.dom.lock().await.find(query).is_none() {
                return Err(no_match(query));
            }
        }
        let fixture = self.audit_fixture.lock().await.clone();
        match fixture {
            Some(result) => Ok(result),
            None => Ok(ScanResult::empty(self.current_url().await)),
        }
    }

    /// Inject the result the next audits on the in-memory backend will return
    pub async fn set_audit_result(&self, result: ScanResult) {
        *self.audit_fixture.lock().await = Some(result);
    }

    /// Capture a screenshot as PNG bytes
    pub async fn screenshot(&self) -> SondearResult<Vec<u8>> {
        self.ensure_open("page")?;
        #[cfg(feature = "browser")]
        if let Some(inner) = &self.inner {
            use base64::Engine as _;
            use chromiumoxide::cdp::browser_protocol::page::{
                CaptureScreenshotFormat, CaptureScreenshotParams,
            };

            let guard = inner.lock().await;
            let response = guard
                .execute(
                    CaptureScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .build(),
                )
                .await
                .map_err(|e| SondearError::ActionFailure {
                    action: "screenshot".to_string(),
                    message: e.to_string(),
                })?;
            return base64::engine::general_purpose::STANDARD
                .decode(&response.data)
                .map_err(|e| SondearError::ActionFailure {
                    action: "screenshot".to_string(),
                    message: e.to_string(),
                });
        }
        Ok(MOCK_PNG.to_vec())
    }
}

#[cfg(feature = "browser")]
impl Page {
    async fn cdp_eval<T: serde::de::DeserializeOwned>(&self, js: &str) -> SondearResult<T> {
        let Some(inner) = &self.inner else {
            return Err(SondearError::ActionFailure {
                action: "evaluate".to_string(),
                message: "no cdp session attached".to_string(),
            });
        };
        let guard = inner.lock().await;
        let result = guard
            .evaluate(js.to_string())
            .await
            .map_err(|e| SondearError::ActionFailure {
                action: "evaluate".to_string(),
                message: e.to_string(),
            })?;
        result.into_value::<T>().map_err(|e| SondearError::ActionFailure {
            action: "evaluate".to_string(),
            message: e.to_string(),
        })
    }

    async fn cdp_audit(&self, scope: Option<&ElementQuery>) -> SondearResult<ScanResult> {
        const AXE_CDN: &str = "https://cdn.jsdelivr.net/npm/axe-core@4.10.2/axe.min.js";

        let has_axe: bool = self.cdp_eval("typeof window.axe !== 'undefined'").await?;
        if !has_axe {
            let loader = format!(
                "fetch({url}).then(r => r.text()).then(src => {{ \
                 (0, eval)(src); return typeof window.axe !== 'undefined'; }})",
                url = js_string(AXE_CDN),
            );
            let loaded: bool = self.cdp_eval(&loader).await?;
            if !loaded {
                return Err(SondearError::ExternalTool {
                    tool: "axe-core".to_string(),
                    message: "engine injection failed".to_string(),
                });
            }
        }
        let context = match scope {
            Some(query) => {
                let first = js_first(query);
                let exists: bool = self.cdp_eval(&format!("{first} !== null")).await?;
                if !exists {
                    return Err(no_match(query));
                }
                first
            }
            None => "document".to_string(),
        };
        let run = format!("axe.run({context}).then(r => JSON.stringify(r))");
        let raw: String = self.cdp_eval(&run).await?;
        let mut result: ScanResult =
            serde_json::from_str(&raw).map_err(|e| SondearError::ExternalTool {
                tool: "axe-core".to_string(),
                message: format!("unparseable result: {e}"),
            })?;
        if result.url.is_empty() {
            result.url = self.current_url().await;
        }
        Ok(result)
    }
}

#[cfg(feature = "browser")]
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// Standard-CSS candidate set for a category, used when the discriminator
/// needs script-side filtering.
#[cfg(feature = "browser")]
const fn kind_candidates(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Textbox => {
            "input[type='text'], input[type='password'], input[type='email'], \
             input[type='number'], textarea"
        }
        ElementKind::Radio => "input[type='radio']",
        ElementKind::Checkbox => "input[type='checkbox']",
        ElementKind::Dropdown => "select",
        ElementKind::Combobox => "input[type='text'][list]",
        ElementKind::FileInput => "input[type='file']",
        ElementKind::Button => "button, input[type='button'], input[type='submit']",
        ElementKind::Link => "a",
        ElementKind::Generic => "*",
    }
}

/// JS expression evaluating to an Array of elements matching the query.
///
/// Native `querySelectorAll` only understands standard CSS, so label, text,
/// and XPath discriminators cannot be expressed as selectors: labels are
/// resolved through `for`/containment/adjacency against the category's
/// candidate set, text discriminators filter candidates by `textContent`
/// (or `value` for button inputs), and XPath goes through
/// `document.evaluate`. Selector errors are caught and come back as an
/// empty match set, which callers report as a resolution failure.
#[cfg(feature = "browser")]
fn js_find_all(query: &ElementQuery) -> String {
    let body = match (&query.kind, &query.by) {
        (_, By::XPath(xpath)) => format!(
            "(() => {{ const out = []; \
             const it = document.evaluate({x}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             for (let i = 0; i < it.snapshotLength; i += 1) out.push(it.snapshotItem(i)); \
             return out; }})()",
            x = js_string(xpath),
        ),
        (kind, By::Label(label)) => format!(
            "(() => {{ const wanted = {label}; const out = []; \
             for (const lab of document.querySelectorAll('label')) {{ \
             if (lab.textContent.trim() !== wanted) continue; \
             let el = lab.htmlFor ? document.getElementById(lab.htmlFor) : null; \
             if (!el) el = lab.querySelector({cands}); \
             if (!el && lab.nextElementSibling && lab.nextElementSibling.matches({cands})) \
             el = lab.nextElementSibling; \
             if (el && el.matches({cands}) && !out.includes(el)) out.push(el); \
             }} return out; }})()",
            label = js_string(label),
            cands = js_string(kind_candidates(*kind)),
        ),
        (ElementKind::Button, By::Text(text)) => format!(
            "Array.from(document.querySelectorAll({cands})).filter(el => \
             el.tagName === 'BUTTON' ? el.textContent.trim() === {t} : el.value === {t})",
            cands = js_string(kind_candidates(ElementKind::Button)),
            t = js_string(text),
        ),
        (kind, By::Text(text)) => format!(
            "Array.from(document.querySelectorAll({cands}))\
             .filter(el => el.textContent.includes({t}))",
            cands = js_string(kind_candidates(*kind)),
            t = js_string(text),
        ),
        _ => format!(
            "Array.from(document.querySelectorAll({}))",
            js_string(&query.to_css())
        ),
    };
    format!("(() => {{ try {{ return {body}; }} catch (e) {{ return []; }} }})()")
}

/// JS expression evaluating to the first match or null
#[cfg(feature = "browser")]
fn js_first(query: &ElementQuery) -> String {
    format!("({}[0] ?? null)", js_find_all(query))
}

fn no_match(query: &ElementQuery) -> SondearError {
    SondearError::Resolution {
        query: query.describe(),
        message: "no matching element".to_string(),
    }
}
