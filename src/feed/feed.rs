use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Coordinate, CoordinateSet};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("coordinate feed reported failure: {0}")]
    Upstream(String),
    #[error("coordinate feed request failed: {0}")]
    Transport(String),
    #[error("invalid coordinate payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Body of one coordinate feed response.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, Coordinate>,
}

impl FeedResponse {
    pub fn from_json(bytes: &[u8]) -> Result<Self, FeedError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Validates the response and keeps every entry with a well-formed
    /// timestamp. Dropped entries fall back like any missing body.
    pub fn into_coordinate_set(self, requested: &str) -> Result<CoordinateSet, FeedError> {
        if !self.success {
            let message = self
                .error
                .unwrap_or_else(|| "no error message".to_string());
            return Err(FeedError::Upstream(message));
        }
        let coordinates = self
            .data
            .into_iter()
            .filter(|(id, c)| {
                let ok = is_iso8601(&c.timestamp);
                if !ok {
                    warn!("Dropping coordinate for {id}: bad timestamp {:?}", c.timestamp);
                }
                ok
            })
            .collect();
        Ok(CoordinateSet {
            timestamp: requested.to_string(),
            coordinates,
        })
    }
}

/// Accepts RFC 3339 and zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps.
pub fn is_iso8601(timestamp: &str) -> bool {
    DateTime::parse_from_rfc3339(timestamp).is_ok()
        || NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

pub fn validate_timestamp(timestamp: &str) -> Result<(), FeedError> {
    if is_iso8601(timestamp) {
        Ok(())
    } else {
        Err(FeedError::InvalidTimestamp(timestamp.to_string()))
    }
}

/// Source of coordinate sets. Implementations may block; callers on the
/// frame thread should run them on a worker and post the result back through
/// a [`crate::feed::sequencer::RefreshSender`].
pub trait CoordinateFeed {
    fn fetch(&self, timestamp: &str) -> Result<CoordinateSet, FeedError>;
}

/// Feed backed by an in-memory set, used by offline bundles and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticFeed {
    pub set: CoordinateSet,
}

impl CoordinateFeed for StaticFeed {
    fn fetch(&self, timestamp: &str) -> Result<CoordinateSet, FeedError> {
        validate_timestamp(timestamp)?;
        Ok(CoordinateSet {
            timestamp: timestamp.to_string(),
            coordinates: self.set.coordinates.clone(),
        })
    }
}

#[cfg(feature = "http-feed")]
pub use http::HttpCoordinateFeed;

#[cfg(feature = "http-feed")]
mod http {
    use reqwest::blocking::Client;

    use super::{validate_timestamp, CoordinateFeed, FeedError, FeedResponse};
    use crate::CoordinateSet;

    /// Fetches `{base_url}?timestamp=<ts>` and decodes a [`FeedResponse`].
    pub struct HttpCoordinateFeed {
        client: Client,
        base_url: String,
    }

    impl HttpCoordinateFeed {
        pub fn new(base_url: impl Into<String>) -> Result<Self, FeedError> {
            let client = Client::builder()
                .user_agent("orrery-engine/0.1")
                .build()
                .map_err(|e| FeedError::Transport(e.to_string()))?;
            Ok(HttpCoordinateFeed {
                client,
                base_url: base_url.into(),
            })
        }
    }

    impl CoordinateFeed for HttpCoordinateFeed {
        fn fetch(&self, timestamp: &str) -> Result<CoordinateSet, FeedError> {
            validate_timestamp(timestamp)?;
            let bytes = self
                .client
                .get(&self.base_url)
                .query(&[("timestamp", timestamp)])
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes())
                .map_err(|e| FeedError::Transport(e.to_string()))?;
            FeedResponse::from_json(&bytes)?.into_coordinate_set(timestamp)
        }
    }
}
