use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ResqError, Result};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = "ResQTrack/1.0 (Animal Rescue Coordination Platform)";

/// A hospital found by the geocoder. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalMatch {
    pub name: String,
    pub address: String,
    pub lat: String,
    pub lon: String,
    pub boundingbox: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
    #[serde(default)]
    boundingbox: Vec<String>,
}

impl From<Place> for HospitalMatch {
    fn from(place: Place) -> Self {
        let name = place
            .display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .to_string();
        HospitalMatch {
            name,
            address: place.display_name,
            lat: place.lat,
            lon: place.lon,
            boundingbox: place.boundingbox,
        }
    }
}

/// Client for a Nominatim-compatible search endpoint.
pub struct GeocodingClient {
    client: Client,
    base_url: Url,
}

impl GeocodingClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ResqError::Validation(format!("Invalid geocoder URL '{base_url}': {e}")))?;
        // `join` replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn search_url(&self, city: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| ResqError::Validation(format!("Invalid geocoder URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", &format!("hospital in {city}"));
        Ok(url)
    }

    /// Hospitals the geocoder knows of in `city`.
    pub async fn search_hospitals(&self, city: &str) -> Result<Vec<HospitalMatch>> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ResqError::Validation("City parameter is required".into()));
        }

        let url = self.search_url(city)?;
        log::debug!("Geocoding search: {url}");

        let places: Vec<Place> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(places.into_iter().map(HospitalMatch::from).collect())
    }
}
