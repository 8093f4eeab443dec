pub mod config;
pub mod handlers;

use resqtrack::geocoding::GeocodingClient;
use resqtrack::media::MediaStore;
use resqtrack::Records;

/// Shared application state
pub struct AppState {
    pub records: Records,
    pub media: MediaStore,
    pub geocoder: GeocodingClient,
}
