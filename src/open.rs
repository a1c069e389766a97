use crate::config::OpenConfig;
use crate::model::ResultItem;
use crate::source::HttpSource;

/// What the user chose to open: a raw search term or a concrete result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    SearchTerm(String),
    Item(ResultItem),
}

impl OpenTarget {
    pub fn url(&self, source: &HttpSource) -> String {
        match self {
            Self::SearchTerm(term) => source.results_url(term),
            Self::Item(item) => item.url.clone(),
        }
    }
}

/// Hands URLs to an external application without waiting on it.
#[derive(Debug, Clone, Default)]
pub struct Opener {
    application: Option<String>,
}

impl Opener {
    pub fn new(config: &OpenConfig) -> Self {
        Self {
            application: config
                .application
                .as_deref()
                .map(str::trim)
                .filter(|app| !app.is_empty())
                .map(ToString::to_string),
        }
    }

    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    pub fn open(&self, url: &str) {
        let result = match &self.application {
            Some(app) => open::with_detached(url, app.clone()),
            None => open::that_detached(url),
        };

        match result {
            Ok(()) => tracing::info!(
                url,
                application = self.application().unwrap_or("system default"),
                "opened target"
            ),
            Err(err) => tracing::warn!(url, error = %err, "failed to open target"),
        }
    }
}
