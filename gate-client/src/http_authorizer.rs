use crate::error::AuthorizeError;
use crate::verdict::Verdict;
use crate::Authorizer;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const AUTHORIZE_ENDPOINT: &str = "transactions/authorize.json";

/// Error envelope returned by the service on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    code: String,
    message: String,
}

/// HTTP client for the hosted authorization service.
///
/// Performs a single authorize call per request; retry and backoff policy
/// is deliberately left to the operator of the service endpoint.
#[derive(Clone, Debug)]
pub struct HttpAuthorizer {
    client: Client,
    base_url: Url,
    provider_key: String,
}

impl HttpAuthorizer {
    pub fn new(
        base_url: &str,
        provider_key: &str,
        query_timeout: u64,
    ) -> Result<Self, AuthorizeError> {
        let base_url = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(query_timeout))
            .connect_timeout(Duration::from_secs(2))
            .default_headers(headers)
            // Keep a small pool of warm connections to the service
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| AuthorizeError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            provider_key: provider_key.to_string(),
        })
    }
}

#[async_trait]
impl Authorizer for HttpAuthorizer {
    async fn authorize(
        &self,
        app_id: &str,
        app_key: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<Verdict, AuthorizeError> {
        let mut url = self.base_url.join(AUTHORIZE_ENDPOINT)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("provider_key", &self.provider_key);
            query.append_pair("app_id", app_id);
            if let Some(app_key) = app_key {
                query.append_pair("app_key", app_key);
            }
            if let Some(referrer) = referrer {
                query.append_pair("referrer", referrer);
            }
        }

        debug!("authorize call for app_id: {app_id}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // The service reports failures in a code/message envelope; fall
            // back to a generic code when the body is not parseable.
            return Err(match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(envelope) => AuthorizeError::Response {
                    status: status.as_u16(),
                    code: envelope.code,
                    message: envelope.message,
                },
                Err(_) => AuthorizeError::Response {
                    status: status.as_u16(),
                    code: "authorize_failed".to_string(),
                    message: format!("authorize request failed with status {status}"),
                },
            });
        }

        serde_json::from_slice(&body).map_err(|e| AuthorizeError::Deserialization(e.to_string()))
    }
}
