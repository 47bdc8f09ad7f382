//! Page object layer.
//!
//! A page object names one page of the application under test, owns its
//! URL, and exposes intent-level operations built on the interaction
//! layer. [`SampleFormPage`] models the registration form that the
//! bundled sample document (see [`MockDom::sample_form`]) mirrors.

use std::path::PathBuf;
use std::sync::Arc;

use crate::artifacts;
use crate::browser::Page;
use crate::config::TestSettings;
use crate::dom::MockDom;
use crate::interactions::{Interactions, Presence};
use crate::locator::ElementQuery;
use crate::result::SondearResult;
use crate::wait::{LoadState, UrlPattern, Waiter};

/// A modeled page of the application under test
pub trait PageObject {
    /// Short page name for logs
    fn name(&self) -> &str;

    /// Absolute URL of the page
    fn url(&self) -> String;

    /// Pattern the live URL must satisfy once the page is current
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Prefix(self.url())
    }

    /// The underlying page handle
    fn page(&self) -> &Page;

    /// The waiter used for this page's waits
    fn waiter(&self) -> Waiter;

    /// Budget for the post-navigation load wait; 0 uses the waiter default
    fn load_timeout_ms(&self) -> u64 {
        0
    }

    /// Navigate to the page and wait for the document to load
    #[allow(async_fn_in_trait)]
    async fn navigate(&self) -> SondearResult<()> {
        tracing::info!(page = self.name(), url = %self.url(), "opening page");
        self.page().goto(&self.url()).await?;
        self.waiter()
            .wait_for_load(self.page(), LoadState::Load, self.load_timeout_ms())
            .await
    }

    /// Whether the page is loaded and its URL matches
    #[allow(async_fn_in_trait)]
    async fn is_loaded(&self) -> SondearResult<bool> {
        let loaded = self.page().load_reached(LoadState::Load).await?;
        Ok(loaded && self.url_pattern().matches(&self.page().current_url().await))
    }

    /// The live document title
    #[allow(async_fn_in_trait)]
    async fn title(&self) -> SondearResult<String> {
        self.page().title().await
    }

    /// Capture a screenshot into the screenshot directory
    #[allow(async_fn_in_trait)]
    async fn take_screenshot(&self) -> SondearResult<PathBuf> {
        let bytes = self.page().screenshot().await?;
        let file_name = format!("screenshot-{}.png", artifacts::timestamp());
        artifacts::write_artifact(artifacts::SCREENSHOT_DIR, &file_name, &bytes).await
    }
}

/// How long the success message is awaited after submitting
const SUBMIT_CONFIRM_TIMEOUT_MS: u64 = 10_000;

/// Page object for the registration form sample page
#[derive(Debug)]
pub struct SampleFormPage {
    page: Arc<Page>,
    waiter: Waiter,
    base_url: String,
}

impl SampleFormPage {
    /// Bind the page object to a live page using the loaded settings
    #[must_use]
    pub fn new(page: Arc<Page>, settings: &TestSettings) -> Self {
        Self {
            page,
            waiter: Waiter::new(settings),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// A page object over a fresh in-memory copy of the sample document
    #[must_use]
    pub fn mock(settings: &TestSettings) -> Self {
        Self::new(Arc::new(Page::with_dom(MockDom::sample_form())), settings)
    }

    fn ix(&self) -> Interactions<'_> {
        Interactions::new(&self.page, self.waiter)
    }

    fn success_query() -> ElementQuery {
        ElementQuery::by_selector("#successMessage")
    }

    /// Fill the name, email, and password fields
    pub async fn fill_registration_form(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> SondearResult<()> {
        let ix = self.ix();
        ix.fill(&ElementQuery::textbox_by_id("firstName"), first_name).await?;
        ix.fill(&ElementQuery::textbox_by_id("lastName"), last_name).await?;
        ix.fill(&ElementQuery::textbox_by_id("email"), email).await?;
        ix.fill(&ElementQuery::textbox_by_id("password"), password).await
    }

    /// Pick a gender radio by its value, case-insensitively
    pub async fn select_gender(&self, gender: &str) -> SondearResult<()> {
        self.ix()
            .check(&ElementQuery::radio_by_value(gender.to_lowercase()))
            .await
    }

    /// Pick a gender radio by its visible label
    pub async fn select_gender_by_label(&self, label: &str) -> SondearResult<()> {
        self.ix().check(&ElementQuery::radio_by_label(label)).await
    }

    /// Tick the interest checkboxes named by the given labels
    pub async fn select_interests(&self, interests: &[&str]) -> SondearResult<()> {
        let ix = self.ix();
        for interest in interests {
            ix.check(&ElementQuery::checkbox_by_id(interest.to_lowercase()))
                .await?;
        }
        Ok(())
    }

    /// Choose a country by its visible option label
    pub async fn select_country(&self, country: &str) -> SondearResult<()> {
        self.ix()
            .select_by_text(&ElementQuery::dropdown_by_id("country"), country)
            .await
    }

    /// Type a city into the city combobox as free text
    pub async fn enter_city(&self, city: &str) -> SondearResult<()> {
        self.ix()
            .fill_combobox(&ElementQuery::combobox_by_id("city"), city)
            .await
    }

    /// Type a city prefix and commit the first suggestion
    pub async fn pick_city_suggestion(&self, prefix: &str) -> SondearResult<()> {
        self.ix()
            .select_combobox_option(&ElementQuery::combobox_by_id("city"), prefix)
            .await
    }

    /// Attach a profile picture to the upload field
    pub async fn upload_profile_picture(&self, path: &str) -> SondearResult<()> {
        self.ix()
            .upload(&ElementQuery::file_input_by_id("profilePicture"), path)
            .await
    }

    /// Submit the form
    pub async fn submit(&self) -> SondearResult<()> {
        self.ix().click(&ElementQuery::button_by_id("submitBtn")).await
    }

    /// Wait for the success message within the standard confirmation budget
    pub async fn is_submitted_successfully(&self) -> SondearResult<bool> {
        self.is_submitted_within(SUBMIT_CONFIRM_TIMEOUT_MS).await
    }

    /// Wait for the success message within an explicit budget.
    ///
    /// A message that never shows is an answer, not a failure: the timeout
    /// maps to `Ok(false)`. Other errors propagate.
    pub async fn is_submitted_within(&self, timeout_ms: u64) -> SondearResult<bool> {
        match self
            .waiter
            .wait_for_visible(&self.page, &Self::success_query(), timeout_ms)
            .await
        {
            Ok(()) => Ok(true),
            Err(err) if err.is_timeout() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Text of the success message, once visible
    pub async fn success_message(&self) -> SondearResult<String> {
        self.ix().read_text(&Self::success_query()).await
    }

    /// Probe for the success message without waiting
    pub async fn success_presence(&self) -> SondearResult<Presence> {
        self.ix().is_present(&Self::success_query()).await
    }
}

impl PageObject for SampleFormPage {
    fn name(&self) -> &str {
        "sample form"
    }

    fn url(&self) -> String {
        format!("{}/TestData/sample-form.html", self.base_url)
    }

    fn page(&self) -> &Page {
        &self.page
    }

    fn waiter(&self) -> Waiter {
        self.waiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn settings() -> TestSettings {
        TestSettings {
            timeout: 2_000,
            ..TestSettings::default()
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_loads_page_url() {
            let form = SampleFormPage::mock(&settings());
            form.navigate().await.unwrap();
            assert!(form.is_loaded().await.unwrap());
            assert_eq!(
                form.page().current_url().await,
                "http://localhost:5000/TestData/sample-form.html"
            );
        }

        #[tokio::test]
        async fn test_title_reflects_document() {
            let form = SampleFormPage::mock(&settings());
            form.navigate().await.unwrap();
            form.page().set_title("Sample Test Page").await;
            assert_eq!(form.title().await.unwrap(), "Sample Test Page");
        }

        #[test]
        fn test_base_url_trailing_slash_is_normalized() {
            let mut s = settings();
            s.base_url = "http://localhost:5000/".to_string();
            let form = SampleFormPage::mock(&s);
            assert_eq!(form.url(), "http://localhost:5000/TestData/sample-form.html");
        }
    }

    mod registration_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_registration_scenario() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"fake image").unwrap();
            let picture = file.path().to_string_lossy().to_string();

            let form = SampleFormPage::mock(&settings());
            form.navigate().await.unwrap();
            form.fill_registration_form("John", "Doe", "john.doe@example.com", "Secret#1")
                .await
                .unwrap();
            let ix = form.ix();
            assert_eq!(
                ix.read_value(&ElementQuery::textbox_by_id("firstName")).await.unwrap(),
                "John"
            );
            assert_eq!(
                ix.read_value(&ElementQuery::textbox_by_id("lastName")).await.unwrap(),
                "Doe"
            );
            form.select_gender("Male").await.unwrap();
            form.select_interests(&["Sports", "Reading"]).await.unwrap();
            form.select_country("Germany").await.unwrap();
            form.pick_city_suggestion("ber").await.unwrap();
            form.upload_profile_picture(&picture).await.unwrap();
            form.submit().await.unwrap();

            assert!(form.is_submitted_successfully().await.unwrap());
            assert_eq!(
                form.success_message().await.unwrap(),
                "Form submitted successfully!"
            );
        }

        #[tokio::test]
        async fn test_gender_by_label_scenario() {
            let form = SampleFormPage::mock(&settings());
            form.navigate().await.unwrap();
            form.fill_registration_form("Jane", "Doe", "jane@example.com", "Secret#2")
                .await
                .unwrap();
            form.select_gender_by_label("Female").await.unwrap();
            form.enter_city("London").await.unwrap();
            form.submit().await.unwrap();
            assert!(form.is_submitted_within(1_000).await.unwrap());
        }

        #[tokio::test]
        async fn test_unsubmitted_form_reports_false_not_error() {
            let form = SampleFormPage::mock(&settings());
            form.navigate().await.unwrap();
            assert!(!form.is_submitted_within(50).await.unwrap());
            assert_eq!(form.success_presence().await.unwrap(), Presence::NotFound);
        }
    }
}
