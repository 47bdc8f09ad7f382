//! Layered test configuration and tracing setup.
//!
//! Settings come from a JSON file (`test-settings.json` by default) with
//! `SONDEAR_*` environment variables layered on top. The loaded
//! [`TestSettings`] value is immutable and passed to constructors explicitly;
//! there is no hidden global.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::result::{SondearError, SondearResult};

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "test-settings.json";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SONDEAR_";

/// Which browser engine to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Chromium (the primary engine)
    #[default]
    Chromium,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
}

impl BrowserKind {
    /// Parse a browser name. Unrecognized names fall back to Chromium,
    /// matching how the `Browser` setting has always behaved.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "firefox" => Self::Firefox,
            "webkit" => Self::Webkit,
            _ => Self::Chromium,
        }
    }

    /// Engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Test settings, immutable after load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TestSettings {
    /// Base URL the page objects navigate relative to
    pub base_url: String,
    /// Browser engine to launch
    pub browser: BrowserKind,
    /// Run the browser headless
    pub headless: bool,
    /// Default timeout for waits, in milliseconds
    pub timeout: u64,
    /// Slow-motion delay between browser operations, in milliseconds
    pub slow_mo: u64,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Capture a screenshot when a scenario fails
    pub screenshot: bool,
    /// Record video of scenarios
    pub video: bool,
    /// Capture traces of scenarios
    pub trace: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            browser: BrowserKind::Chromium,
            headless: false,
            timeout: 30_000,
            slow_mo: 100,
            viewport_width: 1920,
            viewport_height: 1080,
            screenshot: true,
            video: false,
            trace: true,
        }
    }
}

impl TestSettings {
    /// Validate numeric invariants: timeout and viewport must be positive.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if any invariant is violated.
    pub fn validate(&self) -> SondearResult<()> {
        if self.timeout == 0 {
            return Err(SondearError::Configuration {
                message: "Timeout must be a positive number of milliseconds".to_string(),
            });
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(SondearError::Configuration {
                message: format!(
                    "Viewport dimensions must be positive, got {}x{}",
                    self.viewport_width, self.viewport_height
                ),
            });
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LoggingSettings {
    /// Minimum level: trace, debug, info, warn, error
    pub level: String,
    /// Also write log events to a file
    pub log_to_file: bool,
    /// Log file path; `{date}` expands to the current date
    pub log_path: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
            log_path: "logs/sondear-{date}.log".to_string(),
        }
    }
}

/// The full settings document as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    #[serde(rename = "TestSettings")]
    test_settings: TestSettings,
    #[serde(rename = "Logging")]
    logging: LoggingSettings,
}

/// Loaded configuration: test settings plus logging settings
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Test settings
    pub test: TestSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from the default settings file, then layer
    /// environment overrides on top.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file is missing, malformed, or fails
    /// validation.
    pub fn load() -> SondearResult<Self> {
        Self::load_from(DEFAULT_SETTINGS_FILE)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file is missing, malformed, or fails
    /// validation.
    pub fn load_from(path: impl AsRef<Path>) -> SondearResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SondearError::Configuration {
            message: format!("cannot read settings file {}: {e}", path.display()),
        })?;
        let file: SettingsFile =
            serde_json::from_str(&raw).map_err(|e| SondearError::Configuration {
                message: format!("malformed settings file {}: {e}", path.display()),
            })?;

        let mut config = Self {
            test: file.test_settings,
            logging: file.logging,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.test.validate()?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Layer environment overrides onto the current values. `lookup` is the
    /// environment accessor, injectable for tests.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when an override value cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> SondearResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(&format!("{ENV_PREFIX}BASE_URL")) {
            self.test.base_url = v;
        }
        if let Some(v) = lookup(&format!("{ENV_PREFIX}BROWSER")) {
            self.test.browser = BrowserKind::parse(&v);
        }
        self.test.headless = parse_override(&lookup, "HEADLESS", self.test.headless)?;
        self.test.timeout = parse_override(&lookup, "TIMEOUT", self.test.timeout)?;
        self.test.slow_mo = parse_override(&lookup, "SLOW_MO", self.test.slow_mo)?;
        self.test.viewport_width =
            parse_override(&lookup, "VIEWPORT_WIDTH", self.test.viewport_width)?;
        self.test.viewport_height =
            parse_override(&lookup, "VIEWPORT_HEIGHT", self.test.viewport_height)?;
        self.test.screenshot = parse_override(&lookup, "SCREENSHOT", self.test.screenshot)?;
        self.test.video = parse_override(&lookup, "VIDEO", self.test.video)?;
        self.test.trace = parse_override(&lookup, "TRACE", self.test.trace)?;
        Ok(())
    }
}

/// Parse a typed override from the environment, keeping the current value
/// when the variable is unset.
fn parse_override<T, F>(lookup: &F, key: &str, current: T) -> SondearResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(&format!("{ENV_PREFIX}{key}")) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SondearError::Configuration {
                message: format!("invalid {ENV_PREFIX}{key} value '{raw}': {e}"),
            }),
        None => Ok(current),
    }
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber from logging settings.
///
/// Safe to call from concurrently running scenarios: initialization happens
/// at most once, later calls are no-ops. When the configured log file cannot
/// be created, logging falls back to console only.
pub fn init_tracing(settings: &LoggingSettings) {
    let settings = settings.clone();
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

        let console = tracing_subscriber::fmt::layer().with_target(false);

        let file_layer = if settings.log_to_file {
            open_log_file(&settings.log_path).map(|file| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
            })
        } else {
            None
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init();
    });
}

/// Open the log file, expanding `{date}` and creating parent directories.
fn open_log_file(path_template: &str) -> Option<std::fs::File> {
    let date = chrono::Local::now().format("%Y%m%d").to_string();
    let path = path_template.replace("{date}", &date);
    let path = Path::new(&path);
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return None;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod browser_kind_tests {
        use super::*;

        #[test]
        fn test_parse_known() {
            assert_eq!(BrowserKind::parse("firefox"), BrowserKind::Firefox);
            assert_eq!(BrowserKind::parse("Webkit"), BrowserKind::Webkit);
            assert_eq!(BrowserKind::parse("chromium"), BrowserKind::Chromium);
        }

        #[test]
        fn test_parse_unknown_falls_back_to_chromium() {
            assert_eq!(BrowserKind::parse("edge"), BrowserKind::Chromium);
            assert_eq!(BrowserKind::parse(""), BrowserKind::Chromium);
        }

        #[test]
        fn test_display() {
            assert_eq!(BrowserKind::Firefox.to_string(), "firefox");
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let s = TestSettings::default();
            assert_eq!(s.base_url, "http://localhost:5000");
            assert_eq!(s.browser, BrowserKind::Chromium);
            assert_eq!(s.timeout, 30_000);
            assert_eq!(s.viewport_width, 1920);
            assert_eq!(s.viewport_height, 1080);
            assert!(s.screenshot);
            assert!(!s.video);
        }

        #[test]
        fn test_validate_rejects_zero_timeout() {
            let s = TestSettings {
                timeout: 0,
                ..TestSettings::default()
            };
            assert!(matches!(
                s.validate(),
                Err(SondearError::Configuration { .. })
            ));
        }

        #[test]
        fn test_validate_rejects_zero_viewport() {
            let s = TestSettings {
                viewport_width: 0,
                ..TestSettings::default()
            };
            assert!(s.validate().is_err());
        }

        #[test]
        fn test_deserialize_pascal_case_keys() {
            let json = r#"{
                "BaseUrl": "http://example.test",
                "Browser": "firefox",
                "Headless": true,
                "Timeout": 5000
            }"#;
            let s: TestSettings = serde_json::from_str(json).unwrap();
            assert_eq!(s.base_url, "http://example.test");
            assert_eq!(s.browser, BrowserKind::Firefox);
            assert!(s.headless);
            assert_eq!(s.timeout, 5000);
            // Unspecified keys keep their defaults
            assert_eq!(s.slow_mo, 100);
        }
    }

    mod config_tests {
        use super::*;

        fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        }

        #[test]
        fn test_load_missing_file_is_configuration_error() {
            let err = Config::load_from("/nonexistent/test-settings.json").unwrap_err();
            assert!(matches!(err, SondearError::Configuration { .. }));
        }

        #[test]
        fn test_load_malformed_file_is_configuration_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("test-settings.json");
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "not json").unwrap();
            let err = Config::load_from(&path).unwrap_err();
            assert!(matches!(err, SondearError::Configuration { .. }));
        }

        #[test]
        fn test_load_file_with_env_override() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("test-settings.json");
            std::fs::write(
                &path,
                r#"{"TestSettings": {"BaseUrl": "http://from-file", "Timeout": 1000}}"#,
            )
            .unwrap();
            // load_from reads the real process environment; override layering
            // is exercised through apply_env with an injected lookup below
            let config = Config::load_from(&path).unwrap();
            assert_eq!(config.test.timeout, 1000);
        }

        #[test]
        fn test_apply_env_overrides() {
            let vars = env(&[
                ("SONDEAR_BASE_URL", "http://from-env"),
                ("SONDEAR_BROWSER", "webkit"),
                ("SONDEAR_HEADLESS", "true"),
                ("SONDEAR_TIMEOUT", "9000"),
            ]);
            let mut config = Config::default();
            config.apply_env(|k| vars.get(k).cloned()).unwrap();
            assert_eq!(config.test.base_url, "http://from-env");
            assert_eq!(config.test.browser, BrowserKind::Webkit);
            assert!(config.test.headless);
            assert_eq!(config.test.timeout, 9000);
        }

        #[test]
        fn test_apply_env_rejects_malformed_value() {
            let vars = env(&[("SONDEAR_TIMEOUT", "soon")]);
            let mut config = Config::default();
            let err = config.apply_env(|k| vars.get(k).cloned()).unwrap_err();
            assert!(matches!(err, SondearError::Configuration { .. }));
        }

        #[test]
        fn test_apply_env_without_vars_keeps_values() {
            let mut config = Config::default();
            config.apply_env(|_| None).unwrap();
            assert_eq!(config.test.timeout, 30_000);
        }
    }

    mod logging_tests {
        use super::*;

        #[test]
        fn test_logging_defaults() {
            let l = LoggingSettings::default();
            assert_eq!(l.level, "info");
            assert!(l.log_to_file);
            assert!(l.log_path.contains("{date}"));
        }

        #[test]
        fn test_init_tracing_is_idempotent() {
            let settings = LoggingSettings {
                log_to_file: false,
                ..LoggingSettings::default()
            };
            init_tracing(&settings);
            init_tracing(&settings);
        }
    }
}
