//! OMDb title lookups for IMDb links.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Result, SearchError};

const OMDB_URL: &str = "http://www.omdbapi.com/";

/// Last non-empty path segment of an IMDb URL, percent-decoded.
///
/// `https://www.imdb.com/title/tt0133093/` yields `tt0133093`.
pub fn extract_imdb_id(imdb_url: &str) -> Result<String> {
    let url = Url::parse(imdb_url)?;
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| SearchError::InvalidUrl("couldn't find the IMDb ID in the URL".to_string()))?;

    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SearchError::InvalidUrl(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OmdbResponse {
    fn into_query(self) -> Result<String> {
        if self.response == "True" {
            let title = self.title.unwrap_or_default();
            Ok(match self.year {
                Some(year) => format!("{} {}", title, year),
                None => title,
            })
        } else {
            Err(SearchError::Lookup(
                self.error.unwrap_or_else(|| "Unknown OMDb error".to_string()),
            ))
        }
    }
}

/// Client for the OMDb API.
pub struct OmdbClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl OmdbClient {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// `"Title Year"` for an IMDb link, ready to use as a search query.
    ///
    /// OMDb's own error text comes back as [`SearchError::Lookup`].
    pub async fn title_for(&self, imdb_url: &str) -> Result<String> {
        let imdb_id = extract_imdb_id(imdb_url)?;
        let token = self
            .token
            .as_deref()
            .ok_or(SearchError::NotConfigured("OMDB_TOKEN"))?;
        let url = Url::parse_with_params(OMDB_URL, &[("apikey", token), ("i", imdb_id.as_str())])?;

        let body: OmdbResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let query = body.into_query()?;
        debug!(imdb_id = %imdb_id, query = %query, "resolved IMDb title");
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_imdb_id() {
        assert_eq!(
            extract_imdb_id("https://www.imdb.com/title/tt0133093/").unwrap(),
            "tt0133093"
        );
        assert_eq!(
            extract_imdb_id("https://m.imdb.com/title/tt0133093?ref_=nv").unwrap(),
            "tt0133093"
        );
        assert_eq!(
            extract_imdb_id("https://www.imdb.com/title/tt%30133093").unwrap(),
            "tt0133093"
        );
    }

    #[test]
    fn test_extract_imdb_id_rejects_bare_hosts() {
        assert!(extract_imdb_id("https://www.imdb.com/").is_err());
        assert!(extract_imdb_id("not a url").is_err());
    }

    #[test]
    fn test_response_into_query() {
        let found: OmdbResponse =
            serde_json::from_value(json!({"Response": "True", "Title": "The Matrix", "Year": "1999"}))
                .unwrap();
        assert_eq!(found.into_query().unwrap(), "The Matrix 1999");

        let missing: OmdbResponse =
            serde_json::from_value(json!({"Response": "False", "Error": "Incorrect IMDb ID."}))
                .unwrap();
        match missing.into_query() {
            Err(SearchError::Lookup(msg)) => assert_eq!(msg, "Incorrect IMDb ID."),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_title_for_requires_token() {
        let client = OmdbClient::new(None, Duration::from_secs(1)).unwrap();
        let err = client
            .title_for("https://www.imdb.com/title/tt0133093/")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured("OMDB_TOKEN")));
    }
}
