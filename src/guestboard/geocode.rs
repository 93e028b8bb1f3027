//! Visitor location and reverse geocoding.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::store::ensure_success;

/// Latitude/longitude in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Best-effort source of the visitor's position.
pub trait Locator: Send + Sync {
    /// `None` when the position is unknown or was refused.
    fn locate(&self) -> Option<Coordinates>;
}

/// Locator backed by the `location` entry of the config file.
#[derive(Clone, Copy, Debug)]
pub struct ConfiguredLocator(pub Option<Coordinates>);

impl Locator for ConfiguredLocator {
    fn locate(&self) -> Option<Coordinates> {
        self.0
    }
}

/// Maps coordinates to a city name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn city_for(&self, at: Coordinates) -> Result<Option<String>>;
}

/// Nominatim `reverse` endpoint client.
#[derive(Clone, Debug)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Subset of the reverse geocoding response.
#[derive(Debug, Default, Deserialize)]
struct ReverseResp {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

/// Most specific settlement name in the response.
fn settlement(resp: ReverseResp) -> Option<String> {
    let address = resp.address?;
    let named = |v: Option<String>| v.filter(|c| !c.trim().is_empty());
    named(address.city)
        .or_else(|| named(address.town))
        .or_else(|| named(address.village))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn city_for(&self, at: Coordinates) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let resp = self
            .http
            .get(url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let body = resp.json::<ReverseResp>().await?;
        Ok(settlement(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<String> {
        settlement(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn prefers_city_then_town_then_village() {
        assert_eq!(
            parse(r#"{"address":{"city":"Berkeley","town":"x","village":"y"}}"#),
            Some("Berkeley".into())
        );
        assert_eq!(
            parse(r#"{"address":{"town":"Davis","village":"y"}}"#),
            Some("Davis".into())
        );
        assert_eq!(
            parse(r#"{"address":{"village":"Bolinas"}}"#),
            Some("Bolinas".into())
        );
    }

    #[test]
    fn missing_address_yields_none() {
        assert_eq!(parse(r#"{"error":"Unable to geocode"}"#), None);
        assert_eq!(parse(r#"{"address":{"country":"US"}}"#), None);
        assert_eq!(parse(r#"{"address":{"city":"  "}}"#), None);
    }

    #[test]
    fn blank_city_falls_through_to_town() {
        assert_eq!(
            parse(r#"{"address":{"city":"","town":"Davis","village":"y"}}"#),
            Some("Davis".into())
        );
        assert_eq!(
            parse(r#"{"address":{"city":" ","town":"","village":"Bolinas"}}"#),
            Some("Bolinas".into())
        );
    }

    #[test]
    fn configured_locator_reports_config() {
        assert_eq!(ConfiguredLocator(None).locate(), None);
        let here = Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        };
        assert_eq!(ConfiguredLocator(Some(here)).locate(), Some(here));
    }
}
