//! Jackett torrent search.

use std::time::Duration;

use reqwest::header::LOCATION;
use seedbot_core::human_readable_size;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SearchError};
use crate::table::{wrap, Align, TextTable};

/// Results above this size (about 113 GiB) are never offered.
pub const MAX_RESULT_SIZE: u64 = 121_474_836_480;

/// Rows shown in a results table.
const SHOWN_RESULTS: usize = 10;

/// Title column width.
const TITLE_WIDTH: usize = 18;

/// Redirects followed when fetching a .torrent file.
const MAX_REDIRECTS: usize = 5;

/// One indexer hit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub seeders: Option<u64>,
    #[serde(default)]
    pub magnet_uri: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl SearchResult {
    /// Magnet URI if present, otherwise the download link.
    pub fn download_link(&self) -> Option<&str> {
        self.magnet_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.link.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct JackettResponse {
    #[serde(rename = "Results", default)]
    results: Vec<SearchResult>,
}

/// Search hits ordered by seeders, oversized results removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    results: Vec<SearchResult>,
}

impl SearchResults {
    pub fn new(mut results: Vec<SearchResult>) -> Self {
        results.retain(|r| r.size.map_or(true, |size| size <= MAX_RESULT_SIZE));
        // Stable sort keeps indexer order among equal seed counts.
        results.sort_by(|a, b| b.seeders.unwrap_or(0).cmp(&a.seeders.unwrap_or(0)));
        Self { results }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }

    /// Download link of the result at a zero-based position.
    pub fn torrent_link(&self, index: usize) -> Result<&str> {
        self.results
            .get(index)
            .ok_or(SearchError::InvalidIndex(index + 1))?
            .download_link()
            .ok_or(SearchError::NoLink(index + 1))
    }

    /// Fixed-width table of the top results, numbered from 1.
    pub fn format_results(&self) -> String {
        let mut table = TextTable::new(&[
            ("No.", Align::Right),
            ("Title", Align::Left),
            ("Size", Align::Right),
            ("Seeds", Align::Right),
        ]);

        for (i, result) in self.results.iter().take(SHOWN_RESULTS).enumerate() {
            let size = match result.size {
                Some(size) if size > 0 => human_readable_size(size),
                _ => "Unknown".to_string(),
            };
            table.add_row(vec![
                vec![(i + 1).to_string()],
                wrap(&result.title, TITLE_WIDTH),
                vec![size],
                vec![result.seeders.unwrap_or(0).to_string()],
            ]);
        }

        table.render()
    }
}

/// What a torrent link resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Contents of a .torrent file.
    Metainfo(Vec<u8>),
    /// The indexer redirected to a magnet link.
    Magnet(String),
}

/// Client for the Jackett aggregate search endpoint.
pub struct JackettClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl JackettClient {
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// URL of the all-indexers search for `query`.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let token = self
            .token
            .as_deref()
            .ok_or(SearchError::NotConfigured("JACKETT_TOKEN"))?;
        let endpoint = format!(
            "{}/api/v2.0/indexers/all/results",
            self.base_url.as_str().trim_end_matches('/')
        );
        Ok(Url::parse_with_params(
            &endpoint,
            &[("apikey", token), ("Query", query)],
        )?)
    }

    /// Search every indexer.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let url = self.search_url(query)?;
        info!(query = %query, "querying Jackett");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: JackettResponse = response.json().await?;
        let results = SearchResults::new(body.results);

        debug!(query = %query, results = results.len(), "Jackett search done");
        Ok(results)
    }

    /// Fetch a .torrent file, following http redirects by hand so a
    /// redirect to a magnet link can be returned instead.
    pub async fn download_torrent_file(&self, url: &str) -> Result<Fetched> {
        let mut current = Url::parse(url)?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.http.get(current.clone()).send().await?;

            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| SearchError::Redirect("missing location".to_string()))?;

                if location.starts_with("magnet:") {
                    debug!("torrent link redirected to magnet");
                    return Ok(Fetched::Magnet(location.to_string()));
                }
                current = current.join(location)?;
                continue;
            }

            let bytes = response.error_for_status()?.bytes().await?;
            return Ok(Fetched::Metainfo(bytes.to_vec()));
        }

        Err(SearchError::Redirect(format!(
            "more than {} redirects",
            MAX_REDIRECTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(title: &str, size: Option<u64>, seeders: u64) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            size,
            seeders: Some(seeders),
            magnet_uri: None,
            link: Some(format!("http://jackett/dl/{}", seeders)),
        }
    }

    #[test]
    fn test_parse_jackett_response() {
        let body = json!({
            "Results": [{
                "Title": "Ubuntu 24.04 Desktop",
                "Size": 6_114_656_256u64,
                "Seeders": 321,
                "MagnetUri": "magnet:?xt=urn:btih:abc",
                "Link": "http://jackett/dl/1",
                "Tracker": "ignored"
            }, {
                "Title": "No seeders field",
                "Size": null,
                "MagnetUri": null,
                "Link": null
            }]
        });

        let parsed: JackettResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].seeders, Some(321));
        assert_eq!(parsed.results[1].download_link(), None);
    }

    #[test]
    fn test_sorted_by_seeders_and_filtered_by_size() {
        let results = SearchResults::new(vec![
            hit("small", Some(1024), 5),
            hit("huge", Some(MAX_RESULT_SIZE + 1), 1000),
            hit("limit", Some(MAX_RESULT_SIZE), 50),
            hit("unknown size", None, 20),
        ]);

        let titles: Vec<&str> = (0..results.len())
            .map(|i| results.get(i).unwrap().title.as_str())
            .collect();
        assert_eq!(titles, vec!["limit", "unknown size", "small"]);
    }

    #[test]
    fn test_torrent_link_prefers_magnet() {
        let mut with_magnet = hit("a", Some(1), 10);
        with_magnet.magnet_uri = Some("magnet:?xt=urn:btih:abc".to_string());
        let results = SearchResults::new(vec![with_magnet, hit("b", Some(1), 5)]);

        assert_eq!(results.torrent_link(0).unwrap(), "magnet:?xt=urn:btih:abc");
        assert_eq!(results.torrent_link(1).unwrap(), "http://jackett/dl/5");
        assert!(matches!(results.torrent_link(2), Err(SearchError::InvalidIndex(3))));
    }

    #[test]
    fn test_format_results_top_ten() {
        let hits = (0..15)
            .map(|i| hit(&format!("Result number {} with a long title", i), Some(1536), i))
            .collect();
        let table = SearchResults::new(hits).format_results();
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("No.") && lines[0].contains("Seeds"));
        assert!(table.contains("Result number 14"));
        assert!(!table.contains("Result number 4 "));
        assert!(table.contains("1.50 KB"));
        // Ten rows of two wrapped lines each, plus the header.
        assert_eq!(lines.len(), 21);
    }

    #[test]
    fn test_format_results_unknown_size() {
        let table = SearchResults::new(vec![hit("x", None, 1), hit("y", Some(0), 1)]).format_results();
        assert_eq!(table.matches("Unknown").count(), 2);
    }

    #[test]
    fn test_search_url() {
        let client = JackettClient::new(
            Url::parse("http://jackett:9117/").unwrap(),
            Some("key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let url = client.search_url("The Matrix 1999").unwrap();
        assert_eq!(url.path(), "/api/v2.0/indexers/all/results");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apikey".to_string(), "key".to_string()),
                ("Query".to_string(), "The Matrix 1999".to_string())
            ]
        );
    }

    #[test]
    fn test_search_requires_token() {
        let client = JackettClient::new(
            Url::parse("http://jackett:9117").unwrap(),
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(matches!(
            client.search_url("x"),
            Err(SearchError::NotConfigured("JACKETT_TOKEN"))
        ));
    }
}
