//! Encyclopedia gateway backed by the public MediaWiki action API.
//! Uses browser `fetch()` via gloo-net; CORS is handled with `origin=*`.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde_json::Value;

use assistant_core::ports::EncyclopediaPort;
use assistant_types::{
    AssistantError, Result,
    message::{GroundingSource, SearchResult},
};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SEARCH_LIMIT: u32 = 3;
pub const RESULTS_FOUND: &str = "Here is what I found. Which one would you like to know more about?";

pub struct WikipediaGateway {
    api_url: String,
    article_base: String,
}

impl WikipediaGateway {
    /// `language` is the wiki subdomain, e.g. `en` or `es`
    pub fn new(language: &str) -> Self {
        let language = match language.trim() {
            "" => DEFAULT_LANGUAGE,
            other => other,
        };
        Self {
            api_url: format!("https://{}.wikipedia.org/w/api.php", language),
            article_base: format!("https://{}.wikipedia.org/wiki/", language),
        }
    }

    pub fn search_url(&self, term: &str) -> String {
        format!(
            "{}?action=query&list=search&srsearch={}&format=json&origin=*&srlimit={}",
            self.api_url,
            urlencoding::encode(term),
            SEARCH_LIMIT
        )
    }

    pub fn summary_url(&self, title: &str) -> String {
        format!(
            "{}?action=query&prop=extracts&exintro=true&explaintext=true&redirects=1&format=json&origin=*&titles={}",
            self.api_url,
            urlencoding::encode(title)
        )
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = Request::get(url).send().await.map_err(|e| {
            log::error!("Wikipedia request failed: {}", e);
            AssistantError::Gateway("Could not reach Wikipedia. Check your internet connection.".to_string())
        })?;

        if !response.ok() {
            return Err(AssistantError::Gateway(format!(
                "Wikipedia responded with status {}",
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AssistantError::Gateway(format!("Unreadable Wikipedia response: {}", e)))
    }
}

impl Default for WikipediaGateway {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

#[async_trait(?Send)]
impl EncyclopediaPort for WikipediaGateway {
    async fn search(&self, term: &str) -> Result<SearchResult> {
        let body = self.fetch_json(&self.search_url(term)).await?;
        parse_search(term, &self.article_base, &body)
    }

    async fn summary(&self, title: &str) -> Result<String> {
        let body = self.fetch_json(&self.summary_url(title)).await.map_err(|e| {
            log::error!("Summary of {} failed: {}", title, e);
            AssistantError::Gateway("Could not fetch the article summary.".to_string())
        })?;
        Ok(parse_summary(title, &body))
    }
}

/// Article URL for `title`, spaces as underscores
pub fn article_url(article_base: &str, title: &str) -> String {
    format!("{}{}", article_base, urlencoding::encode(&title.replace(' ', "_")))
}

pub fn parse_search(term: &str, article_base: &str, body: &Value) -> Result<SearchResult> {
    if let Some(info) = body["error"]["info"].as_str() {
        return Err(AssistantError::Gateway(format!("Wikipedia API error: {}", info)));
    }

    let sources: Vec<GroundingSource> = body["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str())
                .map(|title| GroundingSource::new(title, article_url(article_base, title)))
                .collect()
        })
        .unwrap_or_default();

    if sources.is_empty() {
        return Ok(SearchResult {
            content: format!("No Wikipedia results found for \"{}\".", term),
            sources,
        });
    }
    Ok(SearchResult {
        content: RESULTS_FOUND.to_string(),
        sources,
    })
}

/// Intro extract of the first page, or placeholder text when there is none
pub fn parse_summary(title: &str, body: &Value) -> String {
    let extract = body["query"]["pages"]
        .as_object()
        .and_then(|pages| pages.iter().next())
        .filter(|(id, _)| id.as_str() != "-1")
        .and_then(|(_, page)| page["extract"].as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty());

    match extract {
        Some(text) => text.to_string(),
        None => format!("Could not find a summary for \"{}\".", title),
    }
}
