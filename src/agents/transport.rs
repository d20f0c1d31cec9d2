//! HTTP transport to remote agent runtimes.
//!
//! Each invocation is one POST of `{"prompt": ...}` to
//! `<base_url>/runtimes/<endpoint_id>/invocations?qualifier=<qualifier>`.
//! The endpoint id is percent-encoded as a single path segment, so ARNs with
//! `/` and `:` survive intact.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::auth::{ClientCredentials, TokenCache};
use crate::config::RuntimeConfig;
use crate::error::{Result, SwitchboardError};
use crate::normalize::{Chunk, RawResponse, ResponseBody};
use crate::utils::string::preview;

use super::{AgentTarget, AgentTransport, InvocationRequest};

/// Header carrying the per-call runtime session id.
pub const SESSION_ID_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// Reqwest-backed [`AgentTransport`].
pub struct HttpAgentTransport {
    client: Client,
    base_url: String,
    qualifier: String,
    auth: Option<(ClientCredentials, Arc<TokenCache>)>,
}

impl HttpAgentTransport {
    /// Create a transport with no bearer authentication.
    pub fn new(client: Client, base_url: &str, qualifier: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            qualifier: qualifier.to_string(),
            auth: None,
        }
    }

    /// Attach client credentials; every call then carries a bearer token
    /// from `tokens`.
    pub fn with_auth(mut self, credentials: ClientCredentials, tokens: Arc<TokenCache>) -> Self {
        self.auth = Some((credentials, tokens));
        self
    }

    /// Build from the `runtime` config section, sharing `tokens`.
    pub fn from_config(config: &RuntimeConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let transport = Self::new(client, &config.base_url, &config.qualifier);
        Ok(match &config.auth {
            Some(creds) => transport.with_auth(creds.clone(), tokens),
            None => transport,
        })
    }

    /// Invocation URL for `endpoint_id`.
    pub fn invocation_url(&self, endpoint_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            SwitchboardError::Config(format!("invalid runtime base_url '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SwitchboardError::Config(format!(
                    "runtime base_url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["runtimes", endpoint_id, "invocations"]);
        url.query_pairs_mut()
            .append_pair("qualifier", &self.qualifier);
        Ok(url)
    }
}

#[async_trait]
impl AgentTransport for HttpAgentTransport {
    async fn invoke(
        &self,
        target: &AgentTarget,
        request: &InvocationRequest,
    ) -> Result<RawResponse> {
        let url = self.invocation_url(&target.endpoint_id)?;

        let mut builder = self
            .client
            .post(url)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(SESSION_ID_HEADER, request.session_id.to_string())
            .json(&json!({ "prompt": request.prompt }));

        if let Some((creds, tokens)) = &self.auth {
            let token = tokens.get_token(creds).await?;
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            SwitchboardError::RemoteInvocation(format!("{}: {}", target.name, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::RemoteInvocation(format!(
                "{} returned {}: {}",
                target.name,
                status,
                preview(&body, 200)
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut chunks = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| {
                SwitchboardError::RemoteInvocation(format!("{}: body stream failed: {}", target.name, e))
            })?;
            chunks.push(Chunk::Bytes(bytes.to_vec()));
        }

        debug!(
            agent = %target.name,
            content_type = content_type.as_deref().unwrap_or("none"),
            chunks = chunks.len(),
            "Agent response received"
        );

        Ok(RawResponse {
            content_type,
            body: ResponseBody::Chunks(chunks),
        })
    }
}
