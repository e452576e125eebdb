use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::GeoError;

/// Country fields of a geolocation answer. Hosted lookups return much
/// more; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoInfo {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Seam for the IP-geolocation dependency, so the gate can be exercised
/// against scripted lookups.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Resolve a visitor's country. `None` asks the service to use the
    /// caller's own address.
    async fn country_of(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoError>;
}

/// Client for an ipapi.co-shaped JSON endpoint.
pub struct IpapiClient {
    base_url: String,
    client: reqwest::Client,
}

impl IpapiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("verdantpack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    fn url_for(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => format!("{}/{}/json/", self.base_url, ip),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl GeoLookup for IpapiClient {
    async fn country_of(&self, ip: Option<IpAddr>) -> Result<GeoInfo, GeoError> {
        let response = self.client.get(self.url_for(ip)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status(status.as_u16()));
        }

        let info: GeoInfo = response
            .json()
            .await
            .map_err(|_| GeoError::MalformedResponse)?;
        if info.country_code.is_none() && info.country.is_none() {
            return Err(GeoError::MalformedResponse);
        }
        Ok(info)
    }
}
