//! reqwest-backed implementation of the Session API.

use reqwest::{Client, Method, Response};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ChatError, ChatResult};

use super::api::{ApiFuture, SessionApi};
use super::types::{Conversation, Message};
use super::wire::{
    self, ErrorBody, MessagesBody, PostMessageRequest, SessionBody, SessionListBody,
};

/// HTTP client for the remote Session API.
#[derive(Clone, Debug)]
pub struct HttpSessionApi {
    client: Client,
    base: Url,
}

impl HttpSessionApi {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> ChatResult<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base: config.api_url.clone(),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> ChatResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ChatError::Config(format!("API URL cannot be a base: {}", self.base))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&PostMessageRequest>,
    ) -> ChatResult<String> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        read_body(response).await.inspect_err(|e| {
            warn!("{} {} failed: {}", method, url, e);
        })
    }
}

/// Turn a response into its body text, or a [`ChatError::Status`] carrying
/// the server's message on non-success statuses.
async fn read_body(response: Response) -> ChatResult<String> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return Ok(text);
    }

    let message = wire::decode::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ChatError::Status {
        status: status.as_u16(),
        message,
    })
}

impl SessionApi for HttpSessionApi {
    fn list_sessions(&self) -> ApiFuture<'_, ChatResult<Vec<Conversation>>> {
        Box::pin(async move {
            let text = self.call(Method::GET, &["sessions"], None).await?;
            let sessions = wire::decode::<SessionListBody>(&text)?.validate()?;
            debug!("Fetched {} sessions", sessions.len());
            Ok(sessions)
        })
    }

    fn create_session(&self) -> ApiFuture<'_, ChatResult<Conversation>> {
        Box::pin(async move {
            let text = self.call(Method::POST, &["sessions"], None).await?;
            Ok(wire::decode::<SessionBody>(&text)?.validate()?)
        })
    }

    fn delete_session<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ChatResult<()>> {
        Box::pin(async move {
            self.call(Method::DELETE, &["sessions", id], None).await?;
            Ok(())
        })
    }

    fn post_message<'a>(
        &'a self,
        id: &'a str,
        text: &'a str,
    ) -> ApiFuture<'a, ChatResult<Vec<Message>>> {
        Box::pin(async move {
            let body = PostMessageRequest {
                message: text.to_string(),
            };
            let raw = self
                .call(Method::POST, &["sessions", id, "messages"], Some(&body))
                .await?;
            Ok(wire::decode::<MessagesBody>(&raw)?.validate()?)
        })
    }
}
