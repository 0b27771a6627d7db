use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DocListQuery, NotificationApi, NotificationLogs};
use crate::config::CoreConfig;
use crate::constants::methods;
use crate::error::SyncError;
use crate::models::NotificationRecord;

/// `/api/method/...` responses wrap their payload in `message`
#[derive(Debug, Deserialize)]
struct MethodResponse<T> {
    message: T,
}

/// `/api/resource/...` list responses wrap their rows in `data`
#[derive(Debug, Deserialize)]
struct ResourceResponse<T> {
    data: T,
}

/// REST/RPC client for a framework site
pub struct FrappeClient {
    base_url: Url,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl FrappeClient {
    pub fn new(site_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self, SyncError> {
        let base_url = Url::parse(site_url).map_err(|e| SyncError::InvalidUrl(format!("{}: {}", site_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(site_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            auth_token,
            client,
        })
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self, SyncError> {
        Self::new(
            &config.site_url,
            config.auth_token(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn method_url(&self, method: &str) -> Result<Url, SyncError> {
        self.endpoint(&["api", "method", method])
    }

    fn resource_url(&self, doctype: &str) -> Result<Url, SyncError> {
        self.endpoint(&["api", "resource", doctype])
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.auth_token {
            Some(token) => request.header("Authorization", token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_method(&self, method: &str, body: serde_json::Value) -> Result<(), SyncError> {
        let response = self
            .authorize(self.client.post(self.method_url(method)?))
            .json(&body)
            .send()
            .await?;

        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for FrappeClient {
    async fn get_notification_logs(&self, limit: usize) -> Result<NotificationLogs, SyncError> {
        let response = self
            .authorize(self.client.get(self.method_url(methods::GET_NOTIFICATION_LOGS)?))
            .query(&[("limit", limit)])
            .send()
            .await?;

        let decoded: MethodResponse<NotificationLogs> = Self::decode(response).await?;
        tracing::debug!(
            count = decoded.message.notification_logs.len(),
            "Fetched recent notifications"
        );
        Ok(decoded.message)
    }

    async fn get_doc_list(&self, query: &DocListQuery) -> Result<Vec<NotificationRecord>, SyncError> {
        let params = [
            ("fields", serde_json::to_string(&query.fields)?),
            ("filters", serde_json::to_string(&query.filters)?),
            ("limit_page_length", query.limit.to_string()),
            ("limit_start", query.start.to_string()),
            ("order_by", query.order_by_clause()),
        ];

        let response = self
            .authorize(self.client.get(self.resource_url(query.doctype)?))
            .query(&params)
            .send()
            .await?;

        let decoded: ResourceResponse<Vec<NotificationRecord>> = Self::decode(response).await?;
        tracing::debug!(
            count = decoded.data.len(),
            start = query.start,
            "Fetched notification page"
        );
        Ok(decoded.data)
    }

    async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
        self.post_method(methods::MARK_AS_READ, serde_json::json!({ "docname": id }))
            .await
    }

    async fn mark_all_as_read(&self) -> Result<(), SyncError> {
        self.post_method(methods::MARK_ALL_AS_READ, serde_json::json!({}))
            .await
    }
}

/// Best human-readable message from an error body.
///
/// `_server_messages` is a JSON-encoded list of JSON-encoded `{message}` objects.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(messages) = value.get("_server_messages").and_then(|m| m.as_str()) {
        let decoded: Vec<String> = serde_json::from_str::<Vec<String>>(messages)
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| {
                serde_json::from_str::<serde_json::Value>(raw)
                    .ok()
                    .and_then(|m| m.get("message").and_then(|s| s.as_str()).map(str::to_string))
            })
            .collect();
        if !decoded.is_empty() {
            return decoded.join("; ");
        }
    }

    for key in ["exception", "message", "exc_type"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return text.to_string();
        }
    }

    body.trim().to_string()
}
