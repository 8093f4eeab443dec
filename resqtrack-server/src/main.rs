use actix_web::{web, App, HttpServer};
use resqtrack::geocoding::GeocodingClient;
use resqtrack::media::{MediaStore, UPLOAD_URL_PREFIX};
use resqtrack::{Records, TabularStore};
use resqtrack_server::config::ServerConfig;
use resqtrack_server::{handlers, AppState};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();
    log::info!("Starting ResQTrack server");

    let config = ServerConfig::from_env();

    log::info!("Opening tables at: {}", config.data_dir.display());
    let records = Records::new(TabularStore::open(&config.data_dir));
    records
        .ensure_all()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let geocoder = GeocodingClient::new(&config.geocoder_url)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    std::fs::create_dir_all(&config.upload_dir)?;
    let upload_dir = config.upload_dir.clone();
    let state = web::Data::new(AppState {
        records,
        media: MediaStore::new(&config.upload_dir),
        geocoder,
    });

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
            .service(actix_files::Files::new(UPLOAD_URL_PREFIX, &upload_dir))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
