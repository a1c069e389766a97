use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};

use crate::config::{Config, GithubSourceConfig, HttpConfig, YoutubeSourceConfig};
use crate::decode::{RepositoryDecoder, ResponseDecoder, SuggestionDecoder};
use crate::error::SearchError;
use crate::model::{ResultItem, UrlTemplate};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Youtube,
    Github,
}

impl SourceKind {
    pub fn build(self, config: &Config, client: Client) -> HttpSource {
        match self {
            Self::Youtube => HttpSource::youtube(&config.sources.youtube, client),
            Self::Github => HttpSource::github(&config.sources.github, client),
        }
    }

    pub fn debounce(self, config: &Config) -> Duration {
        let millis = match self {
            Self::Youtube => config.sources.youtube.debounce_ms,
            Self::Github => config.sources.github.debounce_ms,
        };
        Duration::from_millis(millis)
    }
}

/// A remote endpoint the executor can query.
#[async_trait]
pub trait SearchSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<ResultItem>, SearchError>;
}

/// One HTTP GET endpoint with fixed query parameters and a body decoder.
pub struct HttpSource {
    name: &'static str,
    label: &'static str,
    endpoint: String,
    params: Vec<(&'static str, String)>,
    accept: Option<&'static str>,
    results_url: UrlTemplate,
    decoder: Box<dyn ResponseDecoder>,
    client: Client,
}

impl HttpSource {
    pub fn github(config: &GithubSourceConfig, client: Client) -> Self {
        Self {
            name: "github",
            label: "GitHub search",
            endpoint: config.endpoint.clone(),
            params: vec![("per_page", config.per_page.to_string())],
            accept: Some(GITHUB_ACCEPT),
            results_url: UrlTemplate::new(config.results_url.clone()),
            decoder: Box::new(RepositoryDecoder),
            client,
        }
    }

    pub fn youtube(config: &YoutubeSourceConfig, client: Client) -> Self {
        let results_url = UrlTemplate::new(config.results_url.clone());
        Self {
            name: "youtube",
            label: "Suggestion request",
            endpoint: config.endpoint.clone(),
            params: vec![("client", config.client.clone()), ("ds", config.ds.clone())],
            accept: None,
            results_url: results_url.clone(),
            decoder: Box::new(SuggestionDecoder::new(results_url)),
            client,
        }
    }

    /// Results page for a raw term, used by the "search directly" action.
    pub fn results_url(&self, term: &str) -> String {
        self.results_url.render(term)
    }
}

#[async_trait]
impl SearchSource for HttpSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<ResultItem>, SearchError> {
        let mut params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        params.push(("q", query));

        let mut request = self.client.get(&self.endpoint).query(&params);
        if let Some(accept) = self.accept {
            request = request.header(ACCEPT, HeaderValue::from_static(accept));
        }

        tracing::debug!(source = self.name, query, "sending search request");
        let response = request
            .send()
            .await
            .map_err(|err| SearchError::transport(self.label, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::status(self.label, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SearchError::transport(self.label, &err))?;
        self.decoder.decode(&body)
    }
}

pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::{Matcher, Server};

    use super::*;
    use crate::executor::QueryExecutor;

    fn client() -> Client {
        build_client(&HttpConfig::default()).unwrap()
    }

    fn github_config(endpoint: String) -> GithubSourceConfig {
        GithubSourceConfig {
            endpoint,
            ..GithubSourceConfig::default()
        }
    }

    fn youtube_config(endpoint: String) -> YoutubeSourceConfig {
        YoutubeSourceConfig {
            endpoint,
            ..YoutubeSourceConfig::default()
        }
    }

    #[tokio::test]
    async fn github_source_sends_paged_query_and_decodes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "10".into()),
                Matcher::UrlEncoded("q".into(), "rust lang".into()),
            ]))
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("user-agent", Matcher::Regex("^flow/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[{"id":9,"full_name":"rust-lang/rust","stargazers_count":100000,"language":"Rust","html_url":"https://github.com/rust-lang/rust","description":"Empowering everyone"}]}"#,
            )
            .create_async()
            .await;

        let source = HttpSource::github(
            &github_config(format!("{}/search/repositories", server.url())),
            client(),
        );
        let items = source.search("rust lang").await.unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "rust-lang/rust");
        assert_eq!(items[0].accessory.as_deref(), Some("★ 100,000"));
        assert_eq!(items[0].subtitle.as_deref(), Some("Empowering everyone"));
    }

    #[tokio::test]
    async fn github_source_reports_status_code() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = HttpSource::github(
            &github_config(format!("{}/search/repositories", server.url())),
            client(),
        );
        let err = source.search("tokio").await.unwrap_err();

        assert_eq!(err.to_string(), "GitHub search failed with status 503");
        assert_eq!(err.status_code(), Some(503));
    }

    #[tokio::test]
    async fn youtube_source_decodes_padded_suggestions() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/complete/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client".into(), "youtube".into()),
                Matcher::UrlEncoded("ds".into(), "yt".into()),
                Matcher::UrlEncoded("q".into(), "lofi".into()),
            ]))
            .with_status(200)
            .with_body(r#"window.google.ac.h(["lofi",[["lofi hip hop",0,[512]],["lofi girl",0]],{"k":1}])"#)
            .create_async()
            .await;

        let source = HttpSource::youtube(
            &youtube_config(format!("{}/complete/search", server.url())),
            client(),
        );
        let items = source.search("lofi").await.unwrap();

        mock.assert_async().await;
        let titles: Vec<_> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["lofi hip hop", "lofi girl"]);
        assert_eq!(
            items[1].url,
            "https://www.youtube.com/results?search_query=lofi%20girl"
        );
    }

    #[tokio::test]
    async fn youtube_source_surfaces_decode_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/complete/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>captcha</html>")
            .create_async()
            .await;

        let source = HttpSource::youtube(
            &youtube_config(format!("{}/complete/search", server.url())),
            client(),
        );
        let err = source.search("lofi").await.unwrap_err();
        assert_eq!(
            err,
            SearchError::decode("Unexpected suggestion response format")
        );
    }

    #[tokio::test]
    async fn youtube_source_reports_status_code() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/complete/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let source = HttpSource::youtube(
            &youtube_config(format!("{}/complete/search", server.url())),
            client(),
        );
        let err = source.search("lofi").await.unwrap_err();
        assert_eq!(err.to_string(), "Suggestion request failed with status 429");
    }

    fn unreachable_url(path: &str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}{path}")
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_without_status() {
        let source = HttpSource::github(
            &github_config(unreachable_url("/search/repositories")),
            client(),
        );
        let err = source.search("tokio").await.unwrap_err();

        assert!(
            matches!(err, SearchError::Network { status: None, .. }),
            "unexpected error: {err:?}"
        );
        assert!(err.to_string().starts_with("GitHub search failed: "));
    }

    #[tokio::test]
    async fn executor_records_unreachable_endpoint() {
        let source = Arc::new(HttpSource::github(
            &github_config(unreachable_url("/search/repositories")),
            client(),
        ));
        let executor = QueryExecutor::new(source);

        let state = executor.resolve("tokio").await;
        assert!(!state.is_loading);
        assert!(state.items.is_empty());
        let err = state.error.expect("transport failure should be recorded");
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn source_kind_picks_configured_debounce() {
        let config = Config::default();
        assert_eq!(
            SourceKind::Youtube.debounce(&config),
            Duration::from_millis(250)
        );
        assert_eq!(
            SourceKind::Github.debounce(&config),
            Duration::from_millis(300)
        );
        assert_eq!(SourceKind::Github.build(&config, client()).name(), "github");
    }

    #[test]
    fn results_url_uses_configured_template() {
        let source = HttpSource::youtube(&YoutubeSourceConfig::default(), client());
        assert_eq!(
            source.results_url("cat videos"),
            "https://www.youtube.com/results?search_query=cat%20videos"
        );
    }
}
