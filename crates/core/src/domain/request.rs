// Queued Request Domain Model

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request ID (UUID v4 unless the caller supplies one)
pub type RequestId = String;

/// HTTP verb of a buffered mutation
///
/// Written uppercase; read through `FromStr`, so stored lists with
/// lowercase or padded verbs still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(DomainError::UnknownMethod(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Dedup identity: at most one queued request per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: HttpMethod,
    pub endpoint: String,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

/// A pending mutation awaiting network delivery.
///
/// `D` is the request body and `C` the transport configuration (headers and
/// the like). Both are opaque to the queue and only need to round-trip
/// through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest<D = serde_json::Value, C = serde_json::Value> {
    pub id: RequestId,
    pub method: HttpMethod,
    pub endpoint: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<C>,

    pub timestamp: i64, // epoch ms
}

impl<D, C> QueuedRequest<D, C> {
    pub fn new(
        id: impl Into<RequestId>,
        method: HttpMethod,
        endpoint: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            method,
            endpoint: endpoint.into(),
            data: None,
            config: None,
            timestamp,
        }
    }

    pub fn with_data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_config(mut self, config: C) -> Self {
        self.config = Some(config);
        self
    }

    pub fn key(&self) -> RequestKey {
        RequestKey {
            method: self.method,
            endpoint: self.endpoint.clone(),
        }
    }

    /// True when this request shares the dedup key of `other`
    pub fn same_key(&self, other: &Self) -> bool {
        self.method == other.method && self.endpoint == other.endpoint
    }

    pub fn age_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }

    /// Strictly older than `max_age_ms`; an entry exactly `max_age_ms` old is kept
    pub fn is_expired(&self, now: i64, max_age_ms: i64) -> bool {
        self.age_ms(now) > max_age_ms
    }
}

/// Enqueue request: everything but the ID and timestamp, which the service assigns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest<D = serde_json::Value, C = serde_json::Value> {
    pub method: HttpMethod,
    pub endpoint: String,

    pub data: Option<D>,
    pub config: Option<C>,
}

impl<D, C> EnqueueRequest<D, C> {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            data: None,
            config: None,
        }
    }

    pub fn with_data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_config(mut self, config: C) -> Self {
        self.config = Some(config);
        self
    }

    pub(crate) fn into_queued(self, id: RequestId, timestamp: i64) -> QueuedRequest<D, C> {
        QueuedRequest {
            id,
            method: self.method,
            endpoint: self.endpoint,
            data: self.data,
            config: self.config,
            timestamp,
        }
    }
}
