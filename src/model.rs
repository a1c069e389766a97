use crate::error::SearchError;

const QUERY_PLACEHOLDER: &str = "{{query}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Short label shown before the accessory, e.g. a language name.
    pub tag: Option<String>,
    pub accessory: Option<String>,
    pub url: String,
}

impl ResultItem {
    pub fn titled(title: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: title.clone(),
            title,
            subtitle: None,
            tag: None,
            accessory: None,
            url: url.into(),
        }
    }
}

/// Snapshot published to the front-end. Replaced as a whole on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub items: Vec<ResultItem>,
    pub is_loading: bool,
    pub error: Option<SearchError>,
}

impl SearchState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> Self {
        Self {
            items: self.items.clone(),
            is_loading: true,
            error: self.error.clone(),
        }
    }

    pub fn resolved(items: Vec<ResultItem>) -> Self {
        Self {
            items,
            is_loading: false,
            error: None,
        }
    }

    pub fn failed(&self, error: SearchError) -> Self {
        Self {
            items: self.items.clone(),
            is_loading: false,
            error: Some(error),
        }
    }
}

/// URL with a `{{query}}` placeholder that receives the URL-encoded term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, term: &str) -> String {
        let encoded = urlencoding::encode(term);
        if self.0.contains(QUERY_PLACEHOLDER) {
            self.0.replace(QUERY_PLACEHOLDER, &encoded)
        } else {
            format!("{}{encoded}", self.0)
        }
    }
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}
