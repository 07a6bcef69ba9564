use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    codec::{DecodeBody, EncodeBody},
    endpoint::{AuthRequirement, Endpoint},
    error::DispatchError,
    error_mapper::{map_error_response, retry_after_from_header},
    registry::PayloadRegistry,
    transport::{HttpRequest, HttpResponse, Transport},
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Executes typed endpoints against a homeserver through a [`Transport`].
///
/// A dispatcher holds no per-call state: concurrent dispatches share the
/// transport and the read-only registry.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    base_url: String,
    transport: T,
    registry: Arc<PayloadRegistry>,
    access_token: Option<String>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(base_url: impl Into<String>, transport: T, registry: Arc<PayloadRegistry>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            registry,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Replace or clear the bearer token used for authenticated endpoints.
    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn registry(&self) -> &Arc<PayloadRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the wire request for `endpoint` without sending it.
    pub fn build_request<E: Endpoint>(&self, endpoint: &E) -> Result<HttpRequest, DispatchError> {
        let descriptor = endpoint.descriptor()?;
        let url = descriptor.resolve_url(&self.base_url)?;

        let mut headers = Vec::new();
        if E::AUTH == AuthRequirement::AccessToken {
            let token = self
                .access_token
                .as_deref()
                .ok_or(DispatchError::MissingAccessToken { endpoint: E::NAME })?;
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }

        let body = <E::RequestFormat as EncodeBody<E::Request>>::encode(
            &self.registry,
            endpoint.body(),
        )
        .map_err(DispatchError::Encoding)?;
        if body.is_some() {
            headers.push(("Content-Type".to_owned(), JSON_CONTENT_TYPE.to_owned()));
        }

        Ok(HttpRequest {
            method: descriptor.method(),
            url,
            headers,
            body,
        })
    }

    /// Build, send and resolve one call.
    pub async fn dispatch<E: Endpoint>(&self, endpoint: &E) -> Result<E::Response, DispatchError> {
        let request = self.build_request(endpoint)?;
        debug!(
            endpoint = E::NAME,
            method = %request.method,
            url = %request.url,
            has_body = request.body.is_some(),
            "dispatching request"
        );

        let response = self.transport.send(request).await.map_err(|err| {
            warn!(endpoint = E::NAME, error = %err, "transport failed");
            DispatchError::Transport(err)
        })?;

        self.resolve::<E>(response)
    }

    /// Like [`Self::dispatch`], but gives up with [`DispatchError::Cancelled`]
    /// as soon as `cancel` fires. The in-flight transport future is dropped.
    pub async fn dispatch_until_cancelled<E: Endpoint>(
        &self,
        endpoint: &E,
        cancel: &CancellationToken,
    ) -> Result<E::Response, DispatchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(endpoint = E::NAME, "request cancelled");
                Err(DispatchError::Cancelled)
            }
            result = self.dispatch(endpoint) => result,
        }
    }

    /// Turn a transport response into the endpoint's typed result.
    pub fn resolve<E: Endpoint>(&self, response: HttpResponse) -> Result<E::Response, DispatchError> {
        if response.is_success() {
            return <E::ResponseFormat as DecodeBody<E::Response>>::decode(
                &self.registry,
                &response.body,
            )
            .map_err(|err| {
                warn!(endpoint = E::NAME, error = %err, "failed to decode response body");
                DispatchError::Decoding(err)
            });
        }

        let mut error = map_error_response(response.status, &response.body);
        if error.retry_after().is_none()
            && let Some(delay) = response.header("Retry-After").and_then(retry_after_from_header)
        {
            error = error.with_retry_after(delay);
        }
        warn!(
            endpoint = E::NAME,
            status = error.status(),
            code = %error.code(),
            "homeserver rejected request"
        );
        Err(DispatchError::Protocol(error))
    }
}
