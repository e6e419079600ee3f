//! Remote quote source
//!
//! Talks plain JSON over HTTP: `GET <endpoint>` returns an array of items,
//! `POST <endpoint>` accepts one item. Items are translated to and from
//! quotes through a configurable [`FieldMapping`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::Quote;

/// Key used for the category in pushed items when the category is fixed
const PUSHED_CATEGORY_KEY: &str = "category";

/// Failures talking to the remote
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("No remote endpoint is configured")]
    NotConfigured,

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Remote {url} sent an unusable response: {details}")]
    Malformed { url: String, details: String },
}

impl NetworkError {
    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_decode() {
            NetworkError::Malformed {
                url: url.to_string(),
                details: error.to_string(),
            }
        } else {
            NetworkError::Transport {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Where a remote item's category comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySource {
    /// Every remote quote gets this category
    Fixed(String),
    /// Read the category from this field of each item
    Field(String),
}

/// Translation between remote items and quotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub text_field: String,
    pub category: CategorySource,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            text_field: "title".to_string(),
            category: CategorySource::Fixed("Remote".to_string()),
        }
    }
}

impl FieldMapping {
    /// Map a whole response body; one bad item rejects the lot
    pub fn snapshot_from(&self, body: &Value) -> Result<Vec<Quote>, String> {
        let items = body
            .as_array()
            .ok_or_else(|| format!("expected a JSON array, got {}", value_kind(body)))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.quote_from(item)
                    .map_err(|details| format!("item {}: {}", index, details))
            })
            .collect()
    }

    /// Map one remote item to a quote
    pub fn quote_from(&self, item: &Value) -> Result<Quote, String> {
        let object = item
            .as_object()
            .ok_or_else(|| format!("expected an object, got {}", value_kind(item)))?;

        let text = match object.get(&self.text_field) {
            Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
            Some(Value::String(_)) => return Err(format!("'{}' is empty", self.text_field)),
            Some(other) => {
                return Err(format!(
                    "'{}' should be a string, got {}",
                    self.text_field,
                    value_kind(other)
                ))
            }
            None => return Err(format!("missing field '{}'", self.text_field)),
        };

        let category = match self.category {
            CategorySource::Fixed(ref category) => category.clone(),
            CategorySource::Field(ref field) => match object.get(field) {
                Some(Value::String(category)) if !category.trim().is_empty() => category.clone(),
                // Numeric ids make usable category labels
                Some(Value::Number(n)) => n.to_string(),
                Some(other) => {
                    return Err(format!(
                        "'{}' is not a usable category ({})",
                        field,
                        value_kind(other)
                    ))
                }
                None => return Err(format!("missing field '{}'", field)),
            },
        };

        Ok(Quote { text, category })
    }

    /// The JSON body sent when pushing a quote
    pub fn item_from(&self, quote: &Quote) -> Value {
        let mut object = Map::new();
        object.insert(self.text_field.clone(), Value::String(quote.text.clone()));
        let category_key = match self.category {
            CategorySource::Field(ref field) => field.clone(),
            CategorySource::Fixed(_) => PUSHED_CATEGORY_KEY.to_string(),
        };
        object.insert(category_key, Value::String(quote.category.clone()));
        Value::Object(object)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The authoritative remote collection
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Human-readable location, used in logs and errors
    fn endpoint(&self) -> &str;

    /// Fetch the full remote snapshot
    async fn fetch_remote(&self) -> Result<Vec<Quote>, NetworkError>;

    /// Send one newly created quote; the response body is not interpreted
    async fn push_record(&self, quote: &Quote) -> Result<(), NetworkError>;
}

/// `RemoteSource` over HTTP/JSON
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
    mapping: FieldMapping,
}

impl HttpRemote {
    /// Create a client with the given request timeout
    pub fn new(
        endpoint: impl Into<String>,
        mapping: FieldMapping,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::from_reqwest(&endpoint, e))?;
        Ok(Self::with_client(client, endpoint, mapping))
    }

    /// Use a preconfigured client
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        mapping: FieldMapping,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            mapping,
        }
    }

    /// Build from configuration; fails if no endpoint is set
    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let Some(ref url) = config.remote_url else {
            return Err(NetworkError::NotConfigured);
        };
        Self::new(
            url.clone(),
            config.mapping.to_field_mapping(),
            config.request_timeout(),
        )
    }

    fn check_status(&self, response: &reqwest::Response) -> Result<(), NetworkError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NetworkError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_remote(&self) -> Result<Vec<Quote>, NetworkError> {
        debug!("Fetching remote snapshot from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(&self.endpoint, e))?;
        self.check_status(&response)?;

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::from_reqwest(&self.endpoint, e))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| NetworkError::Malformed {
            url: self.endpoint.clone(),
            details: e.to_string(),
        })?;

        let quotes = self
            .mapping
            .snapshot_from(&value)
            .map_err(|details| NetworkError::Malformed {
                url: self.endpoint.clone(),
                details,
            })?;

        info!("Fetched {} remote quotes", quotes.len());
        Ok(quotes)
    }

    async fn push_record(&self, quote: &Quote) -> Result<(), NetworkError> {
        debug!("Pushing quote to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.mapping.item_from(quote))
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(&self.endpoint, e))?;
        self.check_status(&response)
    }
}
