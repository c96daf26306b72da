use crate::error::TransportError;
use crate::options::HandlerContext;
use async_trait::async_trait;
use std::sync::Arc;

/// HTTP client used to deliver formatted records.
///
/// Implementations post `body` to `url` with the given `Content-Type` and
/// return the response status code. Interpreting the status is left to
/// the handler; retries, if any, belong here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// **Returns**
    /// - `Ok(status)` once a response was received, whatever its status.
    /// - `Err(..)` if no response was received (connection refused,
    ///   timeout, TLS failure, etc).
    async fn post(
        &self,
        cx: &HandlerContext,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<u16, TransportError>;
}

/// Transport used when the options do not name one.
pub(crate) fn default_transport() -> Option<Arc<dyn Transport>> {
    #[cfg(feature = "http")]
    {
        Some(Arc::new(ReqwestTransport::new()) as Arc<dyn Transport>)
    }

    #[cfg(not(feature = "http"))]
    {
        None
    }
}

#[cfg(feature = "http")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_transport {
    use super::Transport;
    use crate::error::TransportError;
    use crate::options::HandlerContext;
    use async_trait::async_trait;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Client;

    /// [`Transport`] backed by a shared `reqwest::Client`.
    #[derive(Clone, Default)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self { client: Client::new() }
        }

        /// Use a preconfigured client (proxies, TLS roots, default headers).
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn post(
            &self,
            cx: &HandlerContext,
            url: &str,
            content_type: &str,
            body: Vec<u8>,
        ) -> Result<u16, TransportError> {
            let mut request = self
                .client
                .post(url)
                .header(CONTENT_TYPE, content_type)
                .body(body);
            if let Some(timeout) = cx.timeout() {
                request = request.timeout(timeout);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| TransportError::with_source(format!("POST {} failed", url), e))?;
            Ok(resp.status().as_u16())
        }
    }
}
