//! Element interaction layer.
//!
//! [`Interactions`] wraps a page with action-level semantics: every action
//! smart-waits for its target before touching it, logs what it is doing,
//! and reports failures with the failing query's description. State setters
//! for checkboxes are idempotent; `toggle` issues exactly one corrective
//! action based on the observed state.

use std::path::Path;

use crate::browser::Page;
use crate::dom::SelectBy;
use crate::locator::ElementQuery;
use crate::result::{SondearError, SondearResult};
use crate::wait::Waiter;

/// Non-exceptional presence probe outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// The element is present and visible
    Found(ElementQuery),
    /// Nothing visible matched
    NotFound,
}

impl Presence {
    /// Whether the probe found a visible element
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Action-level interface over a page
#[derive(Debug)]
pub struct Interactions<'p> {
    page: &'p Page,
    waiter: Waiter,
}

impl<'p> Interactions<'p> {
    /// Bind interactions to a page with the given waiter
    #[must_use]
    pub const fn new(page: &'p Page, waiter: Waiter) -> Self {
        Self { page, waiter }
    }

    /// The underlying page
    #[must_use]
    pub const fn page(&self) -> &Page {
        self.page
    }

    async fn ready(&self, query: &ElementQuery) -> SondearResult<()> {
        self.waiter.smart_wait(self.page, query, 0).await
    }

    fn failed(action: &str, query: &ElementQuery, err: &SondearError) {
        tracing::error!(target_query = %query, error = %err, "{action} failed");
    }

    /// Clear the target and type the given text
    pub async fn fill(&self, query: &ElementQuery, text: &str) -> SondearResult<()> {
        tracing::info!(target_query = %query, "filling");
        self.ready(query).await?;
        self.page.fill(query, text, false).await.inspect_err(|e| {
            Self::failed("fill", query, e);
        })
    }

    /// Type text after the target's existing value
    pub async fn fill_no_clear(&self, query: &ElementQuery, text: &str) -> SondearResult<()> {
        tracing::info!(target_query = %query, "appending text");
        self.ready(query).await?;
        self.page.fill(query, text, true).await.inspect_err(|e| {
            Self::failed("append", query, e);
        })
    }

    /// Read the target's current value
    pub async fn read_value(&self, query: &ElementQuery) -> SondearResult<String> {
        self.ready(query).await?;
        self.page.read_value(query).await.inspect_err(|e| {
            Self::failed("read value", query, e);
        })
    }

    /// Read the target's text content
    pub async fn read_text(&self, query: &ElementQuery) -> SondearResult<String> {
        self.ready(query).await?;
        let text = self.page.try_text(query).await?;
        text.ok_or_else(|| SondearError::Resolution {
            query: query.describe(),
            message: "no matching element".to_string(),
        })
    }

    /// Ensure a checkbox or radio is checked. Already-checked targets are
    /// left untouched.
    pub async fn check(&self, query: &ElementQuery) -> SondearResult<()> {
        tracing::info!(target_query = %query, "checking");
        self.ready(query).await?;
        self.page.set_checked(query, true).await.inspect_err(|e| {
            Self::failed("check", query, e);
        })
    }

    /// Ensure a checkbox is unchecked. Already-unchecked targets are left
    /// untouched.
    pub async fn uncheck(&self, query: &ElementQuery) -> SondearResult<()> {
        tracing::info!(target_query = %query, "unchecking");
        self.ready(query).await?;
        self.page.set_checked(query, false).await.inspect_err(|e| {
            Self::failed("uncheck", query, e);
        })
    }

    /// Flip a checkbox once and return the state it ended in
    pub async fn toggle(&self, query: &ElementQuery) -> SondearResult<bool> {
        tracing::info!(target_query = %query, "toggling");
        self.ready(query).await?;
        let current = self.page.is_checked(query).await?;
        self.page
            .set_checked(query, !current)
            .await
            .inspect_err(|e| {
                Self::failed("toggle", query, e);
            })?;
        Ok(!current)
    }

    /// Current checked state of a checkbox or radio
    pub async fn is_checked(&self, query: &ElementQuery) -> SondearResult<bool> {
        self.ready(query).await?;
        self.page.is_checked(query).await
    }

    /// Select the option with the given visible label
    pub async fn select_by_text(&self, query: &ElementQuery, label: &str) -> SondearResult<()> {
        tracing::info!(target_query = %query, option = label, "selecting by label");
        self.ready(query).await?;
        self.page
            .select_option(query, SelectBy::Label, label)
            .await
            .inspect_err(|e| {
                Self::failed("select", query, e);
            })
    }

    /// Select the option with the given value attribute
    pub async fn select_by_value(&self, query: &ElementQuery, value: &str) -> SondearResult<()> {
        tracing::info!(target_query = %query, option = value, "selecting by value");
        self.ready(query).await?;
        self.page
            .select_option(query, SelectBy::Value, value)
            .await
            .inspect_err(|e| {
                Self::failed("select", query, e);
            })
    }

    /// Visible label of the currently selected option
    pub async fn selected_text(&self, query: &ElementQuery) -> SondearResult<String> {
        self.ready(query).await?;
        self.page.selected_text(query).await
    }

    /// Type free text into a datalist-backed input
    pub async fn fill_combobox(&self, query: &ElementQuery, text: &str) -> SondearResult<()> {
        self.fill(query, text).await
    }

    /// Type a prefix into a datalist-backed input and commit the first
    /// suggestion
    pub async fn select_combobox_option(
        &self,
        query: &ElementQuery,
        text: &str,
    ) -> SondearResult<()> {
        tracing::info!(target_query = %query, option = text, "selecting combobox option");
        self.ready(query).await?;
        self.page.fill(query, text, false).await?;
        self.page.press(query, "ArrowDown").await?;
        self.page.press(query, "Enter").await.inspect_err(|e| {
            Self::failed("select combobox option", query, e);
        })
    }

    /// Click the target
    pub async fn click(&self, query: &ElementQuery) -> SondearResult<()> {
        tracing::info!(target_query = %query, "clicking");
        self.ready(query).await?;
        self.page.click(query).await.inspect_err(|e| {
            Self::failed("click", query, e);
        })
    }

    /// Deliver a key press to the target
    pub async fn press(&self, query: &ElementQuery, key: &str) -> SondearResult<()> {
        self.ready(query).await?;
        self.page.press(query, key).await
    }

    /// Attach a single file to a file input
    pub async fn upload(&self, query: &ElementQuery, path: &str) -> SondearResult<()> {
        self.upload_many(query, &[path.to_string()]).await
    }

    /// Attach files to a file input.
    ///
    /// All paths are validated before the page is touched; a missing path
    /// fails the whole upload with a `Validation` error naming it, and no
    /// partial file list is ever set.
    pub async fn upload_many(&self, query: &ElementQuery, paths: &[String]) -> SondearResult<()> {
        for path in paths {
            if !Path::new(path).exists() {
                return Err(SondearError::Validation {
                    message: format!("upload file not found: {path}"),
                });
            }
        }
        tracing::info!(target_query = %query, files = paths.len(), "uploading");
        self.ready(query).await?;
        self.page.set_input_files(query, paths).await.inspect_err(|e| {
            Self::failed("upload", query, e);
        })
    }

    /// Probe for a visible element without waiting.
    ///
    /// Absence is an answer, not an error: resolution failures (including
    /// nothing matching) come back as [`Presence::NotFound`].
    pub async fn is_present(&self, query: &ElementQuery) -> SondearResult<Presence> {
        match self.page.state(query).await {
            Ok(Some(state)) if state.visible => Ok(Presence::Found(query.clone())),
            Ok(_) => Ok(Presence::NotFound),
            Err(err) if err.is_resolution() => {
                tracing::debug!(target_query = %query, error = %err, "presence probe found nothing");
                Ok(Presence::NotFound)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MockDom;

    fn page() -> Page {
        Page::with_dom(MockDom::sample_form())
    }

    fn fixture(page: &Page) -> Interactions<'_> {
        Interactions::new(page, Waiter::with_default_timeout_ms(2_000))
    }

    mod fill_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_round_trip() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::textbox_by_id("firstName");
            ix.fill(&q, "John").await.unwrap();
            assert_eq!(ix.read_value(&q).await.unwrap(), "John");
        }

        #[tokio::test]
        async fn test_fill_empty_string_clears() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::textbox_by_id("firstName");
            ix.fill(&q, "John").await.unwrap();
            ix.fill(&q, "").await.unwrap();
            assert_eq!(ix.read_value(&q).await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_fill_no_clear_appends() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::textbox_by_name("lastName");
            ix.fill(&q, "Do").await.unwrap();
            ix.fill_no_clear(&q, "e").await.unwrap();
            assert_eq!(ix.read_value(&q).await.unwrap(), "Doe");
        }

        #[tokio::test]
        async fn test_fill_missing_element_times_out() {
            let page = page();
            let ix = Interactions::new(&page, Waiter::with_default_timeout_ms(30));
            let q = ElementQuery::textbox_by_id("nope");
            let err = ix.fill(&q, "x").await.unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod checkbox_tests {
        use super::*;

        #[tokio::test]
        async fn test_check_is_idempotent() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::checkbox_by_id("sports");
            ix.check(&q).await.unwrap();
            assert!(ix.is_checked(&q).await.unwrap());
            ix.check(&q).await.unwrap();
            assert!(ix.is_checked(&q).await.unwrap());
        }

        #[tokio::test]
        async fn test_toggle_flips_exactly_once() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::checkbox_by_id("music");
            assert!(ix.toggle(&q).await.unwrap());
            assert!(ix.is_checked(&q).await.unwrap());
            assert!(!ix.toggle(&q).await.unwrap());
            assert!(!ix.is_checked(&q).await.unwrap());
        }

        #[tokio::test]
        async fn test_radio_check_by_label() {
            let page = page();
            let ix = fixture(&page);
            ix.check(&ElementQuery::radio_by_label("Female")).await.unwrap();
            assert!(ix
                .is_checked(&ElementQuery::radio_by_value("female"))
                .await
                .unwrap());
            assert!(!ix
                .is_checked(&ElementQuery::radio_by_value("male"))
                .await
                .unwrap());
        }
    }

    mod select_tests {
        use super::*;

        #[tokio::test]
        async fn test_select_by_text_and_value() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::dropdown_by_id("country");
            ix.select_by_text(&q, "United Kingdom").await.unwrap();
            assert_eq!(ix.selected_text(&q).await.unwrap(), "United Kingdom");
            ix.select_by_value(&q, "us").await.unwrap();
            assert_eq!(ix.selected_text(&q).await.unwrap(), "United States");
        }

        #[tokio::test]
        async fn test_select_unknown_option_is_action_failure() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::dropdown_by_id("country");
            let err = ix.select_by_text(&q, "Atlantis").await.unwrap_err();
            assert!(matches!(err, SondearError::ActionFailure { .. }));
        }

        #[tokio::test]
        async fn test_combobox_selection_commits_suggestion() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::combobox_by_id("city");
            ix.select_combobox_option(&q, "ber").await.unwrap();
            assert_eq!(ix.read_value(&q).await.unwrap(), "Berlin");
        }

        #[tokio::test]
        async fn test_combobox_free_text() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::combobox_by_id("city");
            ix.fill_combobox(&q, "Smallville").await.unwrap();
            assert_eq!(ix.read_value(&q).await.unwrap(), "Smallville");
        }
    }

    mod upload_tests {
        use super::*;
        use std::io::Write as _;

        #[tokio::test]
        async fn test_upload_existing_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"fake image").unwrap();
            let path = file.path().to_string_lossy().to_string();

            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::file_input_by_id("profilePicture");
            ix.upload(&q, &path).await.unwrap();
            assert_eq!(page.input_files(&q).await.unwrap(), vec![path]);
        }

        #[tokio::test]
        async fn test_upload_missing_file_is_validation_error() {
            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::file_input_by_id("profilePicture");
            let err = ix.upload(&q, "/nonexistent/missing.png").await.unwrap_err();
            assert!(matches!(err, SondearError::Validation { .. }));
            assert!(err.to_string().contains("/nonexistent/missing.png"));
        }

        #[tokio::test]
        async fn test_upload_many_is_all_or_nothing() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"fake image").unwrap();
            let good = file.path().to_string_lossy().to_string();

            let page = page();
            let ix = fixture(&page);
            let q = ElementQuery::file_input_by_id("profilePicture");
            let paths = vec![good, "/nonexistent/missing.png".to_string()];
            let err = ix.upload_many(&q, &paths).await.unwrap_err();
            assert!(matches!(err, SondearError::Validation { .. }));
            // The failed upload set no partial file list
            assert!(page.input_files(&q).await.unwrap().is_empty());
        }
    }

    mod presence_tests {
        use super::*;

        #[tokio::test]
        async fn test_presence_found_and_not_found() {
            let page = page();
            let ix = fixture(&page);
            let present = ix
                .is_present(&ElementQuery::textbox_by_id("firstName"))
                .await
                .unwrap();
            assert!(present.is_found());
            let absent = ix
                .is_present(&ElementQuery::by_selector("#successMessage"))
                .await
                .unwrap();
            assert_eq!(absent, Presence::NotFound);
        }

        #[tokio::test]
        async fn test_presence_becomes_found_after_submit() {
            let page = page();
            let ix = fixture(&page);
            ix.click(&ElementQuery::button_by_id("submitBtn")).await.unwrap();
            let probe = ix
                .is_present(&ElementQuery::by_selector("#successMessage"))
                .await
                .unwrap();
            assert!(probe.is_found());
        }
    }
}
