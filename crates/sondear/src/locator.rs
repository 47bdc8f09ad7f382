//! Semantic element locators.
//!
//! An [`ElementQuery`] is an immutable value describing *how* to find an
//! element — a semantic category plus a discriminator. Nothing is resolved at
//! construction time; resolution happens at the point of use against a live
//! page and is never cached, so a query stays valid across navigations until
//! its page closes. Malformed discriminators surface later as `Resolution`
//! errors, not at the factory call.
//!
//! Ambiguous queries (label-based ones can match several elements) resolve
//! deterministically to the first match; callers needing a specific one of
//! several identical matches must use a more specific discriminator.

use serde::{Deserialize, Serialize};

/// Semantic element categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Text entry: text/password/email/number inputs and textarea
    Textbox,
    /// Radio button
    Radio,
    /// Checkbox
    Checkbox,
    /// Native select element
    Dropdown,
    /// Text input backed by a datalist
    Combobox,
    /// File input
    FileInput,
    /// Button element or button/submit input
    Button,
    /// Anchor
    Link,
    /// Anything reachable by a raw selector
    Generic,
}

impl ElementKind {
    /// Category name for logging and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Textbox => "textbox",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Dropdown => "dropdown",
            Self::Combobox => "combobox",
            Self::FileInput => "file input",
            Self::Button => "button",
            Self::Link => "link",
            Self::Generic => "element",
        }
    }
}

/// How a query discriminates between elements of its category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum By {
    /// `id` attribute
    Id(String),
    /// `name` attribute
    Name(String),
    /// `placeholder` attribute
    Placeholder(String),
    /// Text of the associated label
    Label(String),
    /// `value` attribute
    Value(String),
    /// `name` and `value` attributes together (radio groups)
    NameAndValue(String, String),
    /// Visible text content
    Text(String),
    /// `href` attribute
    Href(String),
    /// Raw CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
}

impl By {
    /// Discriminator description for logging
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Id(v) => format!("id '{v}'"),
            Self::Name(v) => format!("name '{v}'"),
            Self::Placeholder(v) => format!("placeholder '{v}'"),
            Self::Label(v) => format!("label '{v}'"),
            Self::Value(v) => format!("value '{v}'"),
            Self::NameAndValue(n, v) => format!("name '{n}' and value '{v}'"),
            Self::Text(v) => format!("text '{v}'"),
            Self::Href(v) => format!("href '{v}'"),
            Self::Css(v) => format!("selector '{v}'"),
            Self::XPath(v) => format!("xpath '{v}'"),
        }
    }
}

/// A lazily-resolved element query: category + discriminator.
///
/// Cheap to clone, hashable, and independent of any page snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementQuery {
    /// Semantic category
    pub kind: ElementKind,
    /// Discriminator within the category
    pub by: By,
}

impl ElementQuery {
    /// Create a query from parts
    #[must_use]
    pub fn new(kind: ElementKind, by: By) -> Self {
        tracing::debug!(kind = kind.as_str(), by = %by.describe(), "locating element");
        Self { kind, by }
    }

    // ---- Textbox ----

    /// Textbox by id
    #[must_use]
    pub fn textbox_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::Textbox, By::Id(id.into()))
    }

    /// Textbox by name attribute
    #[must_use]
    pub fn textbox_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Textbox, By::Name(name.into()))
    }

    /// Textbox by placeholder text
    #[must_use]
    pub fn textbox_by_placeholder(placeholder: impl Into<String>) -> Self {
        Self::new(ElementKind::Textbox, By::Placeholder(placeholder.into()))
    }

    /// Textbox by label text
    #[must_use]
    pub fn textbox_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Textbox, By::Label(label.into()))
    }

    // ---- Radio ----

    /// Radio button by value
    #[must_use]
    pub fn radio_by_value(value: impl Into<String>) -> Self {
        Self::new(ElementKind::Radio, By::Value(value.into()))
    }

    /// Radio button by name and value
    #[must_use]
    pub fn radio_by_name_and_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ElementKind::Radio, By::NameAndValue(name.into(), value.into()))
    }

    /// Radio button by label text (first match)
    #[must_use]
    pub fn radio_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Radio, By::Label(label.into()))
    }

    // ---- Checkbox ----

    /// Checkbox by id
    #[must_use]
    pub fn checkbox_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::Checkbox, By::Id(id.into()))
    }

    /// Checkbox by name
    #[must_use]
    pub fn checkbox_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Checkbox, By::Name(name.into()))
    }

    /// Checkbox by label text (first match)
    #[must_use]
    pub fn checkbox_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Checkbox, By::Label(label.into()))
    }

    /// Checkbox by value
    #[must_use]
    pub fn checkbox_by_value(value: impl Into<String>) -> Self {
        Self::new(ElementKind::Checkbox, By::Value(value.into()))
    }

    // ---- Dropdown ----

    /// Dropdown (select) by id
    #[must_use]
    pub fn dropdown_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::Dropdown, By::Id(id.into()))
    }

    /// Dropdown by name
    #[must_use]
    pub fn dropdown_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Dropdown, By::Name(name.into()))
    }

    /// Dropdown by label text
    #[must_use]
    pub fn dropdown_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Dropdown, By::Label(label.into()))
    }

    // ---- Combobox ----

    /// Combobox (input with datalist) by id
    #[must_use]
    pub fn combobox_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::Combobox, By::Id(id.into()))
    }

    /// Combobox by name
    #[must_use]
    pub fn combobox_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Combobox, By::Name(name.into()))
    }

    /// Combobox by label text
    #[must_use]
    pub fn combobox_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Combobox, By::Label(label.into()))
    }

    // ---- File input ----

    /// File input by id
    #[must_use]
    pub fn file_input_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::FileInput, By::Id(id.into()))
    }

    /// File input by name
    #[must_use]
    pub fn file_input_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::FileInput, By::Name(name.into()))
    }

    /// File input by label text
    #[must_use]
    pub fn file_input_by_label(label: impl Into<String>) -> Self {
        Self::new(ElementKind::FileInput, By::Label(label.into()))
    }

    // ---- Button ----

    /// Button by visible text (button element or button/submit input value)
    #[must_use]
    pub fn button_by_text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Button, By::Text(text.into()))
    }

    /// Button by id
    #[must_use]
    pub fn button_by_id(id: impl Into<String>) -> Self {
        Self::new(ElementKind::Button, By::Id(id.into()))
    }

    /// Button by name
    #[must_use]
    pub fn button_by_name(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Button, By::Name(name.into()))
    }

    // ---- Link ----

    /// Link by text content
    #[must_use]
    pub fn link_by_text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Link, By::Text(text.into()))
    }

    /// Link by href
    #[must_use]
    pub fn link_by_href(href: impl Into<String>) -> Self {
        Self::new(ElementKind::Link, By::Href(href.into()))
    }

    // ---- Generic ----

    /// Element by raw CSS selector
    #[must_use]
    pub fn by_selector(selector: impl Into<String>) -> Self {
        Self::new(ElementKind::Generic, By::Css(selector.into()))
    }

    /// Element by XPath
    #[must_use]
    pub fn by_xpath(xpath: impl Into<String>) -> Self {
        Self::new(ElementKind::Generic, By::XPath(xpath.into()))
    }

    /// Element by text content
    #[must_use]
    pub fn by_text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Generic, By::Text(text.into()))
    }

    /// Human-readable description for logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} by {}", self.kind.as_str(), self.by.describe())
    }

    /// Render the query as CSS for selector-based backends.
    ///
    /// Each category expands to the logical OR of its recognized HTML
    /// representations: a textbox is any of the text-like inputs or a
    /// textarea, a button is a `button` element or a button/submit input,
    /// and so on.
    ///
    /// Label, text, and XPath discriminators render in extended forms
    /// (`:has-text()`, `text=`, `xpath=`) that no native selector engine
    /// accepts; backends must lower those queries themselves. The CDP
    /// backend resolves them in script, filtering category candidates by
    /// label association or text content and routing XPath through
    /// `document.evaluate`. The in-memory document matches them directly.
    #[must_use]
    pub fn to_css(&self) -> String {
        match (&self.kind, &self.by) {
            (ElementKind::Textbox, By::Id(id)) => format!(
                "input[type='text']#{id}, input[type='password']#{id}, \
                 input[type='email']#{id}, input[type='number']#{id}, textarea#{id}"
            ),
            (ElementKind::Textbox, By::Name(name)) => format!(
                "input[type='text'][name='{name}'], input[type='password'][name='{name}'], \
                 input[type='email'][name='{name}'], input[type='number'][name='{name}'], \
                 textarea[name='{name}']"
            ),
            (ElementKind::Textbox, By::Placeholder(p)) => {
                format!("input[placeholder='{p}'], textarea[placeholder='{p}']")
            }
            (ElementKind::Textbox, By::Label(l)) => {
                format!("label:has-text('{l}') + input, label:has-text('{l}') + textarea")
            }
            (ElementKind::Radio, By::Value(v)) => format!("input[type='radio'][value='{v}']"),
            (ElementKind::Radio, By::NameAndValue(n, v)) => {
                format!("input[type='radio'][name='{n}'][value='{v}']")
            }
            (ElementKind::Radio, By::Label(l)) => format!(
                "label:has-text('{l}') input[type='radio'], \
                 input[type='radio'] + label:has-text('{l}')"
            ),
            (ElementKind::Checkbox, By::Id(id)) => format!("input[type='checkbox']#{id}"),
            (ElementKind::Checkbox, By::Name(n)) => format!("input[type='checkbox'][name='{n}']"),
            (ElementKind::Checkbox, By::Label(l)) => format!(
                "label:has-text('{l}') input[type='checkbox'], \
                 input[type='checkbox'] + label:has-text('{l}')"
            ),
            (ElementKind::Checkbox, By::Value(v)) => format!("input[type='checkbox'][value='{v}']"),
            (ElementKind::Dropdown, By::Id(id)) => format!("select#{id}"),
            (ElementKind::Dropdown, By::Name(n)) => format!("select[name='{n}']"),
            (ElementKind::Dropdown, By::Label(l)) => format!("label:has-text('{l}') + select"),
            (ElementKind::Combobox, By::Id(id)) => format!("input[type='text'][list]#{id}"),
            (ElementKind::Combobox, By::Name(n)) => {
                format!("input[type='text'][list][name='{n}']")
            }
            (ElementKind::Combobox, By::Label(l)) => {
                format!("label:has-text('{l}') + input[type='text'][list]")
            }
            (ElementKind::FileInput, By::Id(id)) => format!("input[type='file']#{id}"),
            (ElementKind::FileInput, By::Name(n)) => format!("input[type='file'][name='{n}']"),
            (ElementKind::FileInput, By::Label(l)) => {
                format!("label:has-text('{l}') + input[type='file']")
            }
            (ElementKind::Button, By::Text(t)) => format!(
                "button:has-text('{t}'), input[type='button'][value='{t}'], \
                 input[type='submit'][value='{t}']"
            ),
            (ElementKind::Button, By::Id(id)) => {
                format!("button#{id}, input[type='button']#{id}, input[type='submit']#{id}")
            }
            (ElementKind::Button, By::Name(n)) => format!(
                "button[name='{n}'], input[type='button'][name='{n}'], \
                 input[type='submit'][name='{n}']"
            ),
            (ElementKind::Link, By::Text(t)) => format!("a:has-text('{t}')"),
            (ElementKind::Link, By::Href(h)) => format!("a[href='{h}']"),
            (ElementKind::Generic, By::Css(s)) => s.clone(),
            (ElementKind::Generic, By::XPath(x)) => format!("xpath={x}"),
            (ElementKind::Generic, By::Text(t)) => format!("text={t}"),
            // Combinations not produced by the factory methods: render a
            // plain attribute selector so resolution fails cleanly later
            // instead of panicking here.
            (_, by) => format!("*:is({})", by.describe()),
        }
    }
}

impl std::fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod textbox_tests {
        use super::*;

        #[test]
        fn test_textbox_by_id_covers_all_representations() {
            let css = ElementQuery::textbox_by_id("x").to_css();
            assert!(css.contains("input[type='text']#x"));
            assert!(css.contains("input[type='password']#x"));
            assert!(css.contains("input[type='email']#x"));
            assert!(css.contains("input[type='number']#x"));
            assert!(css.contains("textarea#x"));
            // No checkbox/radio representations leak in
            assert!(!css.contains("checkbox"));
            assert!(!css.contains("radio"));
        }

        #[test]
        fn test_textbox_by_name() {
            let css = ElementQuery::textbox_by_name("email").to_css();
            assert!(css.contains("input[type='text'][name='email']"));
            assert!(css.contains("textarea[name='email']"));
        }

        #[test]
        fn test_textbox_by_placeholder() {
            let css = ElementQuery::textbox_by_placeholder("Enter name").to_css();
            assert!(css.contains("input[placeholder='Enter name']"));
            assert!(css.contains("textarea[placeholder='Enter name']"));
        }

        #[test]
        fn test_textbox_by_label() {
            let css = ElementQuery::textbox_by_label("First Name").to_css();
            assert!(css.contains("label:has-text('First Name') + input"));
        }
    }

    mod radio_and_checkbox_tests {
        use super::*;

        #[test]
        fn test_radio_by_value() {
            let css = ElementQuery::radio_by_value("female").to_css();
            assert_eq!(css, "input[type='radio'][value='female']");
        }

        #[test]
        fn test_radio_by_name_and_value() {
            let css = ElementQuery::radio_by_name_and_value("gender", "male").to_css();
            assert_eq!(css, "input[type='radio'][name='gender'][value='male']");
        }

        #[test]
        fn test_checkbox_by_id() {
            let css = ElementQuery::checkbox_by_id("sports").to_css();
            assert_eq!(css, "input[type='checkbox']#sports");
        }

        #[test]
        fn test_checkbox_by_label_covers_both_markup_orders() {
            let css = ElementQuery::checkbox_by_label("Reading").to_css();
            assert!(css.contains("label:has-text('Reading') input[type='checkbox']"));
            assert!(css.contains("input[type='checkbox'] + label:has-text('Reading')"));
        }
    }

    mod other_category_tests {
        use super::*;

        #[test]
        fn test_dropdown_by_id() {
            assert_eq!(ElementQuery::dropdown_by_id("country").to_css(), "select#country");
        }

        #[test]
        fn test_combobox_requires_datalist() {
            let css = ElementQuery::combobox_by_id("city").to_css();
            assert_eq!(css, "input[type='text'][list]#city");
        }

        #[test]
        fn test_file_input_by_name() {
            assert_eq!(
                ElementQuery::file_input_by_name("avatar").to_css(),
                "input[type='file'][name='avatar']"
            );
        }

        #[test]
        fn test_button_by_text_covers_inputs() {
            let css = ElementQuery::button_by_text("Submit").to_css();
            assert!(css.contains("button:has-text('Submit')"));
            assert!(css.contains("input[type='submit'][value='Submit']"));
            assert!(css.contains("input[type='button'][value='Submit']"));
        }

        #[test]
        fn test_link_locators() {
            assert_eq!(ElementQuery::link_by_text("Home").to_css(), "a:has-text('Home')");
            assert_eq!(ElementQuery::link_by_href("/about").to_css(), "a[href='/about']");
        }

        #[test]
        fn test_generic_passthrough() {
            assert_eq!(ElementQuery::by_selector("#successMessage").to_css(), "#successMessage");
            assert_eq!(ElementQuery::by_xpath("//div[@id='x']").to_css(), "xpath=//div[@id='x']");
            assert_eq!(ElementQuery::by_text("Welcome").to_css(), "text=Welcome");
        }
    }

    mod description_tests {
        use super::*;

        #[test]
        fn test_describe() {
            let q = ElementQuery::textbox_by_id("firstName");
            assert_eq!(q.describe(), "textbox by id 'firstName'");
            assert_eq!(q.to_string(), q.describe());
        }

        #[test]
        fn test_describe_name_and_value() {
            let q = ElementQuery::radio_by_name_and_value("gender", "female");
            assert!(q.describe().contains("name 'gender'"));
            assert!(q.describe().contains("value 'female'"));
        }

        #[test]
        fn test_query_is_a_value_type() {
            let a = ElementQuery::checkbox_by_id("music");
            let b = a.clone();
            assert_eq!(a, b);
        }
    }
}
