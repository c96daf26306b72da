use crate::error::TransportError;
use crate::options::HandlerContext;
use crate::transport::Transport;
use async_trait::async_trait;

/// A transport that accepts every body without any I/O.
///
/// Useful for measuring the overhead of the handler itself and for tests
/// that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn post(
        &self,
        _cx: &HandlerContext,
        _url: &str,
        _content_type: &str,
        _body: Vec<u8>,
    ) -> Result<u16, TransportError> {
        Ok(200)
    }
}
