//! Wire types for the Transmission JSON-RPC protocol.

use chrono::{DateTime, TimeZone, Utc};
use seedbot_models::{Eta, Torrent, TorrentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TransmissionError};

/// Header carrying the CSRF session token.
pub const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Fields requested for every torrent.
pub const TORRENT_FIELDS: &[&str] = &[
    "id",
    "name",
    "percentDone",
    "eta",
    "totalSize",
    "addedDate",
    "status",
    "rateDownload",
];

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RpcResponse {
    /// Arguments of a successful call, or the daemon's error string.
    pub fn into_arguments(self) -> Result<Value> {
        if self.result == "success" {
            Ok(self.arguments)
        } else {
            Err(TransmissionError::Rpc(self.result))
        }
    }
}

/// A torrent as `torrent-get` reports it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTorrent {
    pub id: i64,
    pub name: String,
    pub percent_done: f64,
    #[serde(default = "unknown_eta")]
    pub eta: i64,
    #[serde(default)]
    pub total_size: i64,
    /// Unix seconds.
    #[serde(default)]
    pub added_date: i64,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub rate_download: i64,
}

fn unknown_eta() -> i64 {
    -2
}

impl From<RawTorrent> for Torrent {
    fn from(raw: RawTorrent) -> Self {
        let added_date: DateTime<Utc> = Utc
            .timestamp_opt(raw.added_date, 0)
            .single()
            .unwrap_or_default();

        Torrent {
            id: raw.id,
            name: raw.name,
            percent_done: raw.percent_done,
            eta: Eta::from(raw.eta),
            total_size: raw.total_size.max(0) as u64,
            added_date,
            status: TorrentStatus::from_code(raw.status),
            rate_download: raw.rate_download.max(0) as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TorrentList {
    #[serde(default)]
    torrents: Vec<RawTorrent>,
}

/// Parse the arguments of a `torrent-get` response.
pub fn parse_torrents(arguments: Value) -> Result<Vec<Torrent>> {
    let list: TorrentList = serde_json::from_value(arguments)?;
    Ok(list.torrents.into_iter().map(Torrent::from).collect())
}

/// Summary of a newly added torrent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAdded {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub hash_string: String,
}

#[derive(Debug, Deserialize)]
struct AddArguments {
    #[serde(rename = "torrent-added")]
    added: Option<RawAdded>,
    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<RawAdded>,
}

/// Parse the arguments of a `torrent-add` response.
///
/// Returns the torrent and whether the daemon already had it.
pub fn parse_added(arguments: Value) -> Result<(RawAdded, bool)> {
    let args: AddArguments = serde_json::from_value(arguments)?;
    match (args.added, args.duplicate) {
        (Some(added), _) => Ok((added, false)),
        (None, Some(duplicate)) => Ok((duplicate, true)),
        (None, None) => Err(TransmissionError::InvalidResponse(
            "torrent-add returned neither torrent-added nor torrent-duplicate".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct FreeSpace {
    #[serde(rename = "size-bytes")]
    size_bytes: i64,
}

/// Parse the arguments of a `free-space` response.
pub fn parse_free_space(arguments: Value) -> Result<u64> {
    let free: FreeSpace = serde_json::from_value(arguments)?;
    Ok(free.size_bytes.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_torrents() {
        let args = json!({
            "torrents": [{
                "id": 3,
                "name": "debian-12.iso",
                "percentDone": 0.4213,
                "eta": 3725,
                "totalSize": 658505728,
                "addedDate": 1709604300,
                "status": 4,
                "rateDownload": 1048576
            }]
        });

        let torrents = parse_torrents(args).unwrap();
        assert_eq!(torrents.len(), 1);
        let t = &torrents[0];
        assert_eq!(t.id, 3);
        assert_eq!(t.name, "debian-12.iso");
        assert!((t.progress() - 42.13).abs() < 1e-9);
        assert_eq!(t.eta, Eta::Seconds(3725));
        assert_eq!(t.total_size, 658505728);
        assert_eq!(t.added_date.timestamp(), 1709604300);
        assert_eq!(t.status, TorrentStatus::Downloading);
        assert_eq!(t.rate_download, 1048576);
    }

    #[test]
    fn test_parse_torrents_sparse_fields() {
        let args = json!({"torrents": [{"id": 1, "name": "x", "percentDone": 1.0, "eta": -1}]});

        let t = &parse_torrents(args).unwrap()[0];
        assert!(t.is_complete());
        assert_eq!(t.eta, Eta::NotAvailable);
        assert_eq!(t.status, TorrentStatus::Stopped);
    }

    #[test]
    fn test_parse_torrents_empty() {
        assert!(parse_torrents(json!({"torrents": []})).unwrap().is_empty());
        assert!(parse_torrents(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_rpc_failure_result() {
        let response: RpcResponse =
            serde_json::from_value(json!({"result": "invalid or corrupt torrent file"})).unwrap();

        match response.into_arguments() {
            Err(TransmissionError::Rpc(msg)) => assert_eq!(msg, "invalid or corrupt torrent file"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_added_and_duplicate() {
        let (added, duplicate) = parse_added(json!({
            "torrent-added": {"id": 9, "name": "Movie", "hashString": "abc"}
        }))
        .unwrap();
        assert_eq!(added.id, 9);
        assert_eq!(added.hash_string, "abc");
        assert!(!duplicate);

        let (existing, duplicate) = parse_added(json!({
            "torrent-duplicate": {"id": 4, "name": "Old", "hashString": "def"}
        }))
        .unwrap();
        assert_eq!(existing.id, 4);
        assert!(duplicate);

        assert!(matches!(
            parse_added(json!({})),
            Err(TransmissionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_free_space() {
        let args = json!({"path": "/data", "size-bytes": 5368709120i64});
        assert_eq!(parse_free_space(args).unwrap(), 5368709120);
    }

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest {
            method: "torrent-get",
            arguments: json!({"ids": [1], "fields": TORRENT_FIELDS}),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["method"], "torrent-get");
        assert_eq!(body["arguments"]["fields"][2], "percentDone");
    }
}
