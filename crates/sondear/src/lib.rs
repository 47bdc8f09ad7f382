//! Sondear: browser end-to-end testing toolkit
//!
//! Sondear (Spanish: "to probe/sound out") drives web applications the way
//! a tester does: page objects model the screens, semantic locators name
//! elements by what they are rather than how they are wired, every
//! interaction waits for its target, and accessibility scans turn axe-core
//! findings into pass/fail answers and HTML reports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Page Objects │──►│ Interactions │──►│ Page         │
//! │ (intent)     │   │ + Waits      │   │ (mock / CDP) │
//! └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Without the `browser` feature every page runs on an in-memory document,
//! which is also what the crate's own tests exercise. Enabling `browser`
//! drives real chromium over CDP.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod accessibility;
mod artifacts;
mod browser;
#[allow(clippy::struct_excessive_bools)]
mod config;
#[allow(clippy::struct_excessive_bools)]
mod dom;
mod harness;
mod interactions;
mod locator;
mod page_object;
#[allow(clippy::format_push_string)]
mod reporter;
mod result;
mod wait;

pub use accessibility::{
    is_accessible_result, uncounted_violations, AxeScanner, RuleOutcome, ScanResult, Severity,
    Violation, ViolationNode,
};
pub use artifacts::{timestamp, write_artifact, REPORT_DIR, SCREENSHOT_DIR, TRACE_DIR};
pub use browser::{Browser, BrowserConfig, Page};
pub use config::{
    init_tracing, BrowserKind, Config, LoggingSettings, TestSettings, DEFAULT_SETTINGS_FILE,
};
pub use dom::{ElementState, MockDom, MockElement, SelectBy};
pub use harness::ScenarioHarness;
pub use interactions::{Interactions, Presence};
pub use locator::{By, ElementKind, ElementQuery};
pub use page_object::{PageObject, SampleFormPage};
pub use reporter::{render_html, write_report};
pub use result::{SondearError, SondearResult};
pub use wait::{
    LoadState, UrlPattern, WaitOptions, Waiter, DEFAULT_POLL_INTERVAL_MS, SETTLE_DELAY_MS,
};
