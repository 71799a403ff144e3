//! Shared HTTP client using reqwest

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::CrossrefError;

pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub(crate) struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Build a client; `mailto` joins Crossref's polite pool
    pub fn new(mailto: Option<&str>) -> Result<Self, CrossrefError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let mut user_agent = format!("tidybib/{}", env!("CARGO_PKG_VERSION"));
        if let Some(mailto) = mailto {
            user_agent.push_str(&format!(" (mailto:{})", mailto));
        }

        Ok(Self { client, user_agent })
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, CrossrefError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CrossrefError::RateLimited);
        }

        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
