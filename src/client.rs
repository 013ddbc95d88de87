//! Client for a running mindy proxy.

use crate::error::{MindyError, Result};
use crate::request::Request;
use crate::results::Results;

#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    http: reqwest::Client,
}

impl Client {
    /// `addr` is a host/port such as `localhost:10001`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), http: reqwest::Client::new() }
    }

    pub async fn post(&self, request: &Request) -> Result<Results> {
        let resp = self
            .http
            .post(format!("http://{}/mindy", self.addr))
            .json(request)
            .send()
            .await
            .map_err(|e| MindyError::Client(format!("making request: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MindyError::Client(format!(
                "unexpected response status code: {}. body: {}",
                status.as_u16(),
                body
            )));
        }
        resp.json()
            .await
            .map_err(|e| MindyError::Client(format!("decoding response: {e}")))
    }
}
