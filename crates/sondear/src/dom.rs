//! In-memory DOM backend.
//!
//! A small structural document model that [`crate::browser::Page`] drives
//! when no real browser is attached. Elements are matched directly against
//! [`ElementQuery`] categories rather than through a CSS engine, with a
//! minimal `tag#id.class` selector subset for generic queries. Ambiguous
//! queries resolve to the first matching element in document order.

use crate::locator::{By, ElementKind, ElementQuery};

/// Observable state of a resolved element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementState {
    /// Present in the document
    pub attached: bool,
    /// Rendered and visible
    pub visible: bool,
    /// Accepts interaction
    pub enabled: bool,
    /// Checked state for radios and checkboxes
    pub checked: Option<bool>,
}

/// One element in the mock document
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Tag name, lowercase ("input", "select", "button", ...)
    pub tag: String,
    /// `type` attribute for inputs
    pub input_type: Option<String>,
    /// `id` attribute
    pub id: Option<String>,
    /// `name` attribute
    pub name: Option<String>,
    /// `placeholder` attribute
    pub placeholder: Option<String>,
    /// Text of the associated label
    pub label: Option<String>,
    /// Current value
    pub value: String,
    /// Visible text content
    pub text: String,
    /// `href` for anchors
    pub href: Option<String>,
    /// Checked state for radios and checkboxes
    pub checked: bool,
    /// Present in the document
    pub attached: bool,
    /// Rendered and visible
    pub visible: bool,
    /// Accepts interaction
    pub enabled: bool,
    /// Class list
    pub classes: Vec<String>,
    /// Input is backed by a datalist
    pub has_list: bool,
    /// (value, label) pairs for selects and datalists
    pub options: Vec<(String, String)>,
    /// Paths set on a file input
    pub files: Vec<String>,
    /// Id of an element made visible when this one is clicked
    pub reveals: Option<String>,
}

impl MockElement {
    /// A visible, enabled, attached element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attached: true,
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// An input with the given `type`
    #[must_use]
    pub fn input(input_type: impl Into<String>) -> Self {
        let mut el = Self::new("input");
        el.input_type = Some(input_type.into());
        el
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the name attribute
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the label text
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the placeholder
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the value attribute
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set select/datalist options as (value, label) pairs
    #[must_use]
    pub fn with_options(mut self, options: Vec<(&str, &str)>) -> Self {
        self.options = options
            .into_iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect();
        self
    }

    fn is_text_input(&self) -> bool {
        if self.tag == "textarea" {
            return true;
        }
        self.tag == "input"
            && matches!(
                self.input_type.as_deref(),
                Some("text" | "password" | "email" | "number")
            )
    }

    fn is_input_of(&self, ty: &str) -> bool {
        self.tag == "input" && self.input_type.as_deref() == Some(ty)
    }

    fn matches_kind(&self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::Textbox => self.is_text_input() && !self.has_list,
            ElementKind::Radio => self.is_input_of("radio"),
            ElementKind::Checkbox => self.is_input_of("checkbox"),
            ElementKind::Dropdown => self.tag == "select",
            ElementKind::Combobox => self.is_input_of("text") && self.has_list,
            ElementKind::FileInput => self.is_input_of("file"),
            ElementKind::Button => {
                self.tag == "button" || self.is_input_of("button") || self.is_input_of("submit")
            }
            ElementKind::Link => self.tag == "a",
            ElementKind::Generic => true,
        }
    }

    fn matches_by(&self, kind: ElementKind, by: &By) -> bool {
        match by {
            By::Id(id) => self.id.as_deref() == Some(id),
            By::Name(name) => self.name.as_deref() == Some(name),
            By::Placeholder(p) => self.placeholder.as_deref() == Some(p),
            By::Label(l) => self.label.as_deref() == Some(l),
            By::Value(v) => self.value == *v,
            By::NameAndValue(n, v) => self.name.as_deref() == Some(n) && self.value == *v,
            By::Text(t) => {
                // Button inputs carry their caption in `value`
                if kind == ElementKind::Button && self.tag == "input" {
                    self.value == *t
                } else {
                    self.text.contains(t)
                }
            }
            By::Href(h) => self.href.as_deref() == Some(h),
            By::Css(selector) => self.matches_simple_css(selector),
            By::XPath(_) => false,
        }
    }

    /// Match a single compound selector of the form `tag#id.class.class`
    fn matches_simple_css(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        enum Part {
            Tag,
            Id,
            Class,
        }
        let mut tag = String::new();
        let mut id = None;
        let mut classes = Vec::new();
        let mut buf = String::new();
        let mut part = Part::Tag;
        let mut flush = |part: &Part, buf: &mut String| {
            if buf.is_empty() {
                return;
            }
            match part {
                Part::Tag => tag = std::mem::take(buf),
                Part::Id => id = Some(std::mem::take(buf)),
                Part::Class => classes.push(std::mem::take(buf)),
            }
        };
        for ch in selector.chars() {
            match ch {
                '#' => {
                    flush(&part, &mut buf);
                    part = Part::Id;
                }
                '.' => {
                    flush(&part, &mut buf);
                    part = Part::Class;
                }
                _ => buf.push(ch),
            }
        }
        flush(&part, &mut buf);
        drop(flush);

        if !tag.is_empty() && tag != "*" && self.tag != tag {
            return false;
        }
        if let Some(id) = id {
            if self.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        classes.iter().all(|c| self.classes.contains(c))
    }

    fn matches(&self, query: &ElementQuery) -> bool {
        self.attached && self.matches_kind(query.kind) && self.matches_by(query.kind, &query.by)
    }
}

/// Selection discriminator for select elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectBy {
    /// Match the option's visible label
    Label,
    /// Match the option's value attribute
    Value,
}

/// The mock document
#[derive(Debug, Clone, Default)]
pub struct MockDom {
    elements: Vec<MockElement>,
}

impl MockDom {
    /// An empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    pub fn push(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Number of attached elements matching the query
    #[must_use]
    pub fn count(&self, query: &ElementQuery) -> usize {
        self.elements.iter().filter(|e| e.matches(query)).count()
    }

    fn find_index(&self, query: &ElementQuery) -> Option<usize> {
        self.elements.iter().position(|e| e.matches(query))
    }

    /// First matching element
    #[must_use]
    pub fn find(&self, query: &ElementQuery) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.matches(query))
    }

    /// Observable state of the first match
    #[must_use]
    pub fn state(&self, query: &ElementQuery) -> Option<ElementState> {
        self.find(query).map(|e| ElementState {
            attached: e.attached,
            visible: e.visible,
            enabled: e.enabled,
            checked: if e.is_input_of("radio") || e.is_input_of("checkbox") {
                Some(e.checked)
            } else {
                None
            },
        })
    }

    /// Current value of the first match
    #[must_use]
    pub fn value(&self, query: &ElementQuery) -> Option<String> {
        self.find(query).map(|e| e.value.clone())
    }

    /// Text content of the first match (falls back to value for inputs)
    #[must_use]
    pub fn text(&self, query: &ElementQuery) -> Option<String> {
        self.find(query).map(|e| {
            if e.text.is_empty() {
                e.value.clone()
            } else {
                e.text.clone()
            }
        })
    }

    /// Set (or append to) the value of the first match. Returns false when
    /// nothing matched.
    pub fn set_value(&mut self, query: &ElementQuery, text: &str, append: bool) -> bool {
        let Some(idx) = self.find_index(query) else {
            return false;
        };
        let el = &mut self.elements[idx];
        if append {
            el.value.push_str(text);
        } else {
            el.value = text.to_string();
        }
        true
    }

    /// Checked state of the first match
    #[must_use]
    pub fn is_checked(&self, query: &ElementQuery) -> Option<bool> {
        self.find(query).map(|e| e.checked)
    }

    /// Force the checked state of the first match. Checking a radio clears
    /// the rest of its name group. Returns false when nothing matched.
    pub fn set_checked(&mut self, query: &ElementQuery, checked: bool) -> bool {
        let Some(idx) = self.find_index(query) else {
            return false;
        };
        if checked && self.elements[idx].is_input_of("radio") {
            if let Some(group) = self.elements[idx].name.clone() {
                for el in &mut self.elements {
                    if el.is_input_of("radio") && el.name.as_deref() == Some(group.as_str()) {
                        el.checked = false;
                    }
                }
            }
        }
        self.elements[idx].checked = checked;
        true
    }

    /// Select an option on a select element. Returns None when the element
    /// was not found, Some(false) when no option matched.
    pub fn select_option(&mut self, query: &ElementQuery, by: SelectBy, needle: &str) -> Option<bool> {
        let idx = self.find_index(query)?;
        let el = &mut self.elements[idx];
        let found = el.options.iter().find(|(value, label)| match by {
            SelectBy::Label => label == needle,
            SelectBy::Value => value == needle,
        });
        match found {
            Some((value, _)) => {
                el.value = value.clone();
                Some(true)
            }
            None => Some(false),
        }
    }

    /// Label of the option whose value is the element's current value
    #[must_use]
    pub fn selected_text(&self, query: &ElementQuery) -> Option<String> {
        let el = self.find(query)?;
        el.options
            .iter()
            .find(|(value, _)| *value == el.value)
            .map(|(_, label)| label.clone())
            .or_else(|| Some(el.value.clone()))
    }

    /// Deliver a key press to the first match.
    ///
    /// ArrowDown on a datalist-backed input completes the value to the first
    /// option whose label starts with the typed prefix, case-insensitively.
    /// Other keys are accepted without effect.
    pub fn press(&mut self, query: &ElementQuery, key: &str) -> bool {
        let Some(idx) = self.find_index(query) else {
            return false;
        };
        let el = &mut self.elements[idx];
        if key == "ArrowDown" && el.has_list {
            let prefix = el.value.to_lowercase();
            let completion = el
                .options
                .iter()
                .find(|(_, label)| label.to_lowercase().starts_with(&prefix))
                .map(|(_, label)| label.clone());
            if let Some(label) = completion {
                el.value = label;
            }
        }
        true
    }

    /// Set the file list of the first match. Returns false when nothing
    /// matched.
    pub fn set_files(&mut self, query: &ElementQuery, paths: &[String]) -> bool {
        let Some(idx) = self.find_index(query) else {
            return false;
        };
        self.elements[idx].files = paths.to_vec();
        true
    }

    /// File list of the first match
    #[must_use]
    pub fn files(&self, query: &ElementQuery) -> Option<Vec<String>> {
        self.find(query).map(|e| e.files.clone())
    }

    /// Click the first match. Radios become checked, checkboxes toggle, and
    /// an element with a reveal target makes that target visible. Returns
    /// false when nothing matched.
    pub fn click(&mut self, query: &ElementQuery) -> bool {
        let Some(idx) = self.find_index(query) else {
            return false;
        };
        let reveals = self.elements[idx].reveals.clone();
        if self.elements[idx].is_input_of("radio") {
            self.set_checked(query, true);
        } else if self.elements[idx].is_input_of("checkbox") {
            let next = !self.elements[idx].checked;
            self.elements[idx].checked = next;
        }
        if let Some(target) = reveals {
            self.reveal(&target);
        }
        true
    }

    /// Attach and show the element with the given id
    pub fn reveal(&mut self, id: &str) {
        for el in &mut self.elements {
            if el.id.as_deref() == Some(id) {
                el.attached = true;
                el.visible = true;
            }
        }
    }

    /// A registration form document used by the bundled page object and the
    /// crate's own tests: name/email/password fields, a gender radio group,
    /// interest checkboxes, a country select, a city combobox, a profile
    /// picture upload, and a submit button that reveals a success message.
    #[must_use]
    pub fn sample_form() -> Self {
        let mut dom = Self::new();
        dom.push(
            MockElement::input("text")
                .with_id("firstName")
                .with_name("firstName")
                .with_label("First Name")
                .with_placeholder("Enter first name"),
        );
        dom.push(
            MockElement::input("text")
                .with_id("lastName")
                .with_name("lastName")
                .with_label("Last Name")
                .with_placeholder("Enter last name"),
        );
        dom.push(
            MockElement::input("email")
                .with_id("email")
                .with_name("email")
                .with_label("Email"),
        );
        dom.push(
            MockElement::input("password")
                .with_id("password")
                .with_name("password")
                .with_label("Password"),
        );
        dom.push(
            MockElement::input("radio")
                .with_id("genderMale")
                .with_name("gender")
                .with_value("male")
                .with_label("Male"),
        );
        dom.push(
            MockElement::input("radio")
                .with_id("genderFemale")
                .with_name("gender")
                .with_value("female")
                .with_label("Female"),
        );
        for (id, label) in [("sports", "Sports"), ("music", "Music"), ("reading", "Reading")] {
            dom.push(
                MockElement::input("checkbox")
                    .with_id(id)
                    .with_name("interests")
                    .with_value(id)
                    .with_label(label),
            );
        }
        dom.push(
            MockElement::new("select")
                .with_id("country")
                .with_name("country")
                .with_label("Country")
                .with_options(vec![
                    ("", "Select a country"),
                    ("us", "United States"),
                    ("uk", "United Kingdom"),
                    ("de", "Germany"),
                    ("in", "India"),
                ]),
        );
        let mut city = MockElement::input("text")
            .with_id("city")
            .with_name("city")
            .with_label("City")
            .with_options(vec![
                ("new-york", "New York"),
                ("london", "London"),
                ("berlin", "Berlin"),
                ("mumbai", "Mumbai"),
            ]);
        city.has_list = true;
        dom.push(city);
        dom.push(
            MockElement::input("file")
                .with_id("profilePicture")
                .with_name("profilePicture")
                .with_label("Profile Picture"),
        );
        let mut submit = MockElement::new("button")
            .with_id("submitBtn")
            .with_text("Submit");
        submit.reveals = Some("successMessage".to_string());
        dom.push(submit);
        let mut success = MockElement::new("div")
            .with_id("successMessage")
            .with_text("Form submitted successfully!");
        success.attached = false;
        success.visible = false;
        dom.push(success);
        dom
    }
}
