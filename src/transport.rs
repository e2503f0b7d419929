//! Transport seam between the poll coordinator and the directions provider.
//!
//! The coordinator only sees the `(error, status, body)` triad as a
//! [`TransportOutcome`]; classification into predictions happens in the
//! resolver. Tests substitute a scripted implementation of [`Transport`].

use std::future::Future;

/// Raw result of one provider request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportOutcome {
    /// Request never produced an HTTP response (DNS, connect, read failure)
    Failure(String),

    /// Response arrived with a non-200 status
    HttpError(u16),

    /// 200 response body, unparsed
    Body(String),
}

/// Asynchronous GET against the provider.
///
/// Futures must be `Send`: the coordinator runs one fetch per destination as
/// a spawned task with no concurrency bound.
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = TransportOutcome> + Send;
}

/// Production transport backed by a shared reqwest client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> TransportOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return TransportOutcome::Failure(e.to_string()),
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return TransportOutcome::HttpError(status.as_u16());
        }

        match response.text().await {
            Ok(body) => TransportOutcome::Body(body),
            Err(e) => TransportOutcome::Failure(e.to_string()),
        }
    }
}
