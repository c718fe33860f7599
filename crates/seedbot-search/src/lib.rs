//! Torrent search and title lookups for Seedbot.
//!
//! - [`JackettClient`] queries every configured Jackett indexer and keeps
//!   the best-seeded results
//! - [`OmdbClient`] turns an IMDb link into a `"Title Year"` query

pub mod error;
pub mod jackett;
pub mod omdb;
pub mod table;

pub use error::{Result, SearchError};
pub use jackett::{Fetched, JackettClient, SearchResult, SearchResults, MAX_RESULT_SIZE};
pub use omdb::{extract_imdb_id, OmdbClient};
