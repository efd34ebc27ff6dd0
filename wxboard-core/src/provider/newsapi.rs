use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{
        Article, AuxiliaryKey, AuxiliaryRecord, CountryCode, Fetched, HeaderSnapshot, NewsDigest,
    },
    provider::{USER_AGENT, get_json, trim_base_url},
};

use super::AuxiliarySource;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const API: &str = "newsapi";
const PAGE_SIZE: &str = "5";

/// NewsAPI top-headlines client, keyed by country.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    async fn top_headlines(&self, country: &CountryCode) -> Fetched<AuxiliaryRecord> {
        let url = format!("{}/top-headlines", self.base_url);
        tracing::debug!("GET {url} country={}", country.as_lower());

        let request = self
            .http
            .get(&url)
            // NewsAPI rejects requests without a User-Agent.
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[
                ("country", country.as_lower().as_str()),
                ("apiKey", self.api_key.as_str()),
                ("pageSize", PAGE_SIZE),
            ]);

        let (parsed, headers) = get_json::<NaResponse>(request, API).await;

        let digest = parsed.map(|parsed| {
            let articles: Vec<Article> =
                parsed.articles.into_iter().filter_map(to_article).collect();
            tracing::info!("Fetched {} headlines for {}", articles.len(), country);
            AuxiliaryRecord::News(NewsDigest {
                headline: format!("Top Headlines in {country}"),
                articles,
            })
        });

        Fetched::new(digest.into(), headers)
    }
}

#[derive(Debug, Deserialize)]
struct NaSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaArticle {
    title: Option<String>,
    url: Option<String>,
    source: Option<NaSource>,
}

#[derive(Debug, Deserialize)]
struct NaResponse {
    #[serde(default)]
    articles: Vec<NaArticle>,
}

fn to_article(raw: NaArticle) -> Option<Article> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let url = raw.url.filter(|u| !u.trim().is_empty())?;
    let source_name = raw.source.and_then(|s| s.name).unwrap_or_default();

    Some(Article { title, url, source_name })
}

#[async_trait]
impl AuxiliarySource for NewsApiClient {
    fn name(&self) -> &'static str {
        API
    }

    async fn fetch(&self, key: &AuxiliaryKey) -> Fetched<AuxiliaryRecord> {
        match key {
            AuxiliaryKey::Country(code) => self.top_headlines(code).await,
            AuxiliaryKey::Coordinate(_) => Fetched::new(
                Err(FetchError::UnsupportedKey { client: API, key: "coordinate" }).into(),
                HeaderSnapshot::empty(API),
            ),
        }
    }
}
