//! REST gateway over the inventory backend using reqwest.
//!
//! # Security Note - Logging
//!
//! The bearer token is held in a `SecretBox` and only exposed while building
//! the request header. `HttpGateway`'s `Debug` output never includes it.

use std::fmt;
use std::time::Duration;

use reqwest::header;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{InventoryError, Result};
use crate::query::QueryState;
use crate::types::{InventoryItem, ItemId, Page};

use super::InventoryGateway;
use super::error::{ApiError, Operation, transport_error};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway speaking the backend's REST contract
pub struct HttpGateway {
    client: Client,
    /// Collection endpoint, e.g. `http://host/api/inventory`
    collection_url: Url,
    token: Option<SecretBox<String>>,
}

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("collection_url", &self.collection_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpGateway {
    /// Create a gateway from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url(), config.api_token(), config.timeout())
    }

    /// Create a gateway for the given base URL (the path the `inventory` collection lives under)
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let collection_url = collection_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| InventoryError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            collection_url,
            token: token.map(|t| SecretBox::new(Box::new(t))),
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: ItemId) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::new(operation, status, body);
        tracing::warn!("inventory API {error}");
        Err(error.into())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(operation, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            InventoryError::Server(format!("{operation} returned a malformed response: {e}"))
        })
    }
}

/// Join `inventory` onto the configured base URL.
pub fn collection_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())
        .map_err(|e| InventoryError::Config(format!("invalid base URL '{base_url}': {e}")))?;

    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            InventoryError::Config(format!("base URL '{base_url}' cannot hold a path"))
        })?;
        segments.pop_if_empty().push("inventory");
    }

    Ok(url)
}

impl InventoryGateway for HttpGateway {
    async fn list(&self, query: &QueryState) -> Result<Page> {
        let request = self
            .client
            .get(self.collection_url.clone())
            .query(&query.to_query_params());
        tracing::debug!("GET {} {:?}", self.collection_url, query.to_query_params());
        self.send_json(Operation::List, request).await
    }

    async fn get(&self, id: ItemId) -> Result<InventoryItem> {
        let request = self.client.get(self.item_url(id));
        self.send_json(Operation::Get(id), request).await
    }

    async fn create(&self, item: &InventoryItem) -> Result<InventoryItem> {
        let request = self
            .client
            .post(self.collection_url.clone())
            .json(&item.without_id());
        self.send_json(Operation::Create, request).await
    }

    async fn update(&self, id: ItemId, item: &InventoryItem) -> Result<InventoryItem> {
        let body = item.clone().with_id(id);
        let request = self.client.put(self.item_url(id)).json(&body);
        self.send_json(Operation::Update(id), request).await
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let request = self.client.delete(self.item_url(id));
        self.send(Operation::Delete(id), request).await?;
        Ok(())
    }
}
