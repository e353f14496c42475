use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{ConfigPacket, Configuration, CONFIG_ENDPOINT};
use url::Url;

/// Backend exchange for the configuration document.
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    async fn fetch(&self) -> Result<Configuration>;
    async fn save(&self, packet: &ConfigPacket) -> Result<()>;
}

/// `GET`/`POST` of the configuration on `<server_url>/api/data`.
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str, request_timeout: Duration) -> Result<Self> {
        let endpoint = config_endpoint(server_url)?;
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConfigTransport for HttpTransport {
    async fn fetch(&self) -> Result<Configuration> {
        let configuration: Configuration = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?
            .error_for_status()?
            .json()
            .await
            .context("configuration body is not JSON")?;
        Ok(configuration)
    }

    async fn save(&self, packet: &ConfigPacket) -> Result<()> {
        self.http
            .post(self.endpoint.clone())
            .json(packet)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?
            .error_for_status()?;
        Ok(())
    }
}

/// Resolves the endpoint below `server_url`, treating the URL as a directory.
pub fn config_endpoint(server_url: &str) -> Result<Url> {
    let mut base = Url::parse(server_url.trim())
        .with_context(|| format!("invalid server url '{server_url}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(CONFIG_ENDPOINT)
        .with_context(|| format!("cannot resolve {CONFIG_ENDPOINT} below '{server_url}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_resolved_below_server_root() {
        assert_eq!(
            config_endpoint("http://127.0.0.1:1200").expect("url").as_str(),
            "http://127.0.0.1:1200/api/data"
        );
        assert_eq!(
            config_endpoint("http://host/editor").expect("url").as_str(),
            "http://host/editor/api/data"
        );
        assert_eq!(
            config_endpoint("http://host/editor/").expect("url").as_str(),
            "http://host/editor/api/data"
        );
    }

    #[test]
    fn rejects_relative_server_url() {
        assert!(config_endpoint("not a url").is_err());
        assert!(config_endpoint("/api").is_err());
    }
}
