use actix_multipart::Multipart;
use actix_web::http::{header, StatusCode};
use actix_web::{error, web, FromRequest, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use resqtrack::records::{self, CaseStatusUpdate, NewCase, NewDonation, NewHospital};
use resqtrack::timestamp::system_clock;
use resqtrack::{Collection, ResqError, Row};
use serde::Deserialize;
use std::collections::HashMap;

use crate::AppState;

/// Uploads larger than this are rejected.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "success": false, "message": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .route("/health", web::get().to(health))
    // Cases
    .route("/cases/report", web::post().to(report_case))
    .route("/cases/all", web::get().to(list_cases))
    .route("/cases/update-status", web::post().to(update_case_status))
    // Donations
    .route("/donations/add", web::post().to(add_donation))
    .route("/donations/all", web::get().to(list_donations))
    // Hospitals
    .route("/hospitals/search", web::get().to(search_hospitals))
    .route("/hospitals/add", web::post().to(add_hospital))
    .route("/hospitals/all", web::get().to(list_hospitals))
    // Admin
    .route("/admin/table/{table}", web::get().to(admin_table))
    .route("/admin/api/{table}", web::get().to(admin_list))
    .route("/admin/api/{table}", web::post().to(admin_action))
    .route("/admin/stats", web::get().to(admin_stats));
}

// ── Helpers ─────────────────────────────────────────────────────────

fn ok_json(value: serde_json::Value) -> HttpResponse {
    HttpResponse::Ok().json(value)
}

fn fail(status: StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "message": message
    }))
}

/// Map a record error to its status code. `context` prefixes messages of
/// internal failures, whose details only go to the log.
fn err_response(e: ResqError, context: &str) -> HttpResponse {
    match &e {
        ResqError::Validation(_) | ResqError::Unsupported(_) => {
            fail(StatusCode::BAD_REQUEST, e.to_string())
        }
        ResqError::UnknownCollection(_) => {
            fail(StatusCode::BAD_REQUEST, "Invalid table name".to_string())
        }
        ResqError::NotFound { collection, .. } if collection == "cases" => {
            fail(StatusCode::NOT_FOUND, "Case not found".to_string())
        }
        ResqError::NotFound { .. } => fail(StatusCode::NOT_FOUND, e.to_string()),
        ResqError::Upstream(_) => {
            log::warn!("{context}: {e}");
            fail(StatusCode::BAD_GATEWAY, format!("{context}: {e}"))
        }
        _ => {
            log::error!("{context}: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

/// Run blocking table work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ResqError>
where
    F: FnOnce() -> Result<T, ResqError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(|e| {
        ResqError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?
}

async fn list_response(
    state: web::Data<AppState>,
    collection: &'static str,
    context: &str,
) -> HttpResponse {
    match blocking(move || state.records.list_all(collection)).await {
        Ok(rows) => ok_json(serde_json::json!({ "success": true, "data": rows })),
        Err(e) => err_response(e, context),
    }
}

fn parse_table(table: &str) -> Result<Collection, ResqError> {
    table.parse()
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> HttpResponse {
    ok_json(serde_json::json!({
        "status": "healthy",
        "message": "ResQTrack is running properly"
    }))
}

// ── Cases ───────────────────────────────────────────────────────────

/// Text fields and the optional `media` file of a multipart case report.
async fn read_case_upload(
    mut payload: Multipart,
) -> Result<(Row, Option<(String, Vec<u8>)>), ResqError> {
    let bad = |e: actix_multipart::MultipartError| ResqError::Validation(e.to_string());

    let mut fields = Row::new();
    let mut media = None;
    while let Some(mut field) = payload.try_next().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ResqError::Validation(format!(
                    "Upload exceeds {MAX_UPLOAD_BYTES} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let is_media = name == "media";
        match filename {
            Some(filename) if is_media => {
                if !filename.is_empty() {
                    media = Some((filename, bytes));
                }
            }
            Some(_) => {}
            None => {
                let value = String::from_utf8(bytes).map_err(|_| {
                    ResqError::Validation(format!("Field '{name}' is not valid UTF-8"))
                })?;
                fields.insert(name, value);
            }
        }
    }
    Ok((fields, media))
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Accepts a urlencoded form or a multipart form with an optional `media`
/// file. Multipart bodies are streamed, so only `MAX_UPLOAD_BYTES` bounds
/// them.
async fn report_case(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> HttpResponse {
    const CONTEXT: &str = "Error reporting case";

    let case = if is_multipart(&req) {
        let upload = read_case_upload(Multipart::new(req.headers(), payload)).await;
        let (fields, media) = match upload {
            Ok(parts) => parts,
            Err(e) => return err_response(e, CONTEXT),
        };
        let mut case: NewCase = match records::from_fields(&fields) {
            Ok(case) => case,
            Err(e) => return err_response(e, CONTEXT),
        };
        case.media_url = String::new();
        if let Some((filename, bytes)) = media {
            let saver = state.clone();
            let saved =
                blocking(move || saver.media.save(system_clock(), &filename, &bytes)).await;
            match saved {
                Ok(url) => case.media_url = url,
                Err(e) => return err_response(e, CONTEXT),
            }
        }
        case
    } else {
        let mut payload = payload.into_inner();
        match web::Form::<NewCase>::from_request(&req, &mut payload).await {
            Ok(form) => {
                let mut case = form.into_inner();
                case.media_url.clear();
                case
            }
            Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
        }
    };

    let media_url = case.media_url.clone();
    let reporter = state.clone();
    match blocking(move || reporter.records.report_case(case)).await {
        Ok(case_id) => ok_json(serde_json::json!({
            "success": true,
            "message": format!("Case reported successfully! Case ID: {case_id}"),
            "case_id": case_id
        })),
        Err(e) => {
            if !media_url.is_empty() {
                let discarded = blocking(move || state.media.discard(&media_url)).await;
                if let Err(cleanup) = discarded {
                    log::warn!("Failed to discard upload of unreported case: {cleanup}");
                }
            }
            err_response(e, CONTEXT)
        }
    }
}

async fn list_cases(state: web::Data<AppState>) -> HttpResponse {
    list_response(state, "cases", "Error fetching cases").await
}

async fn update_case_status(
    state: web::Data<AppState>,
    form: web::Form<CaseStatusUpdate>,
) -> HttpResponse {
    let update = form.into_inner();
    match blocking(move || state.records.update_case_status(update)).await {
        Ok(()) => ok_json(serde_json::json!({
            "success": true,
            "message": "Case status updated successfully"
        })),
        Err(e) => err_response(e, "Error updating case status"),
    }
}

// ── Donations ───────────────────────────────────────────────────────

async fn add_donation(state: web::Data<AppState>, form: web::Form<NewDonation>) -> HttpResponse {
    let donation = form.into_inner();
    match blocking(move || state.records.add_donation(donation)).await {
        Ok(_) => ok_json(serde_json::json!({
            "success": true,
            "message": "Donation recorded successfully!"
        })),
        Err(e) => err_response(e, "Error recording donation"),
    }
}

async fn list_donations(state: web::Data<AppState>) -> HttpResponse {
    list_response(state, "donations", "Error fetching donations").await
}

// ── Hospitals ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    city: Option<String>,
}

async fn search_hospitals(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let city = query.into_inner().city.unwrap_or_default();
    match state.geocoder.search_hospitals(&city).await {
        Ok(found) => ok_json(serde_json::json!({ "success": true, "data": found })),
        Err(e) => err_response(e, "Error searching hospitals"),
    }
}

async fn add_hospital(state: web::Data<AppState>, form: web::Form<NewHospital>) -> HttpResponse {
    let hospital = form.into_inner();
    match blocking(move || state.records.add_hospital(hospital)).await {
        Ok(_) => ok_json(serde_json::json!({
            "success": true,
            "message": "Hospital added successfully!"
        })),
        Err(e) => err_response(e, "Error adding hospital"),
    }
}

async fn list_hospitals(state: web::Data<AppState>) -> HttpResponse {
    list_response(state, "hospitals", "Error fetching hospitals").await
}

// ── Admin ───────────────────────────────────────────────────────────

async fn admin_table(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    const CONTEXT: &str = "Error fetching table data";

    let collection = match parse_table(&path) {
        Ok(c) => c,
        Err(e) => return err_response(e, CONTEXT),
    };
    match blocking(move || state.records.list_all(collection.as_str())).await {
        Ok(rows) => ok_json(serde_json::json!({
            "success": true,
            "data": rows,
            "table": collection.as_str()
        })),
        Err(e) => err_response(e, CONTEXT),
    }
}

async fn admin_list(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match parse_table(&path) {
        Ok(collection) => {
            list_response(state, collection.as_str(), "Error processing request").await
        }
        Err(e) => err_response(e, "Error processing request"),
    }
}

async fn admin_action(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    const CONTEXT: &str = "Error processing request";

    let collection = match parse_table(&path) {
        Ok(c) => c,
        Err(e) => return err_response(e, CONTEXT),
    };
    let mut fields: Row = form.into_inner().into_iter().collect();
    let action = fields.remove("action").unwrap_or_default();

    match action.as_str() {
        "delete" => {
            let id = fields.remove("id").unwrap_or_default();
            match blocking(move || state.records.delete_record(collection, &id)).await {
                Ok(()) => ok_json(serde_json::json!({
                    "success": true,
                    "message": "Record deleted successfully"
                })),
                Err(e) => err_response(e, CONTEXT),
            }
        }
        "add" => match blocking(move || state.records.add_record(collection, fields)).await {
            Ok(Some(case_id)) => ok_json(serde_json::json!({
                "success": true,
                "message": "Record added successfully",
                "case_id": case_id
            })),
            Ok(None) => ok_json(serde_json::json!({
                "success": true,
                "message": "Record added successfully"
            })),
            Err(e) => err_response(e, CONTEXT),
        },
        _ => err_response(ResqError::Validation("Invalid action".into()), CONTEXT),
    }
}

async fn admin_stats(state: web::Data<AppState>) -> HttpResponse {
    match blocking(move || state.records.stats()).await {
        Ok(stats) => ok_json(serde_json::json!({ "success": true, "data": stats })),
        Err(e) => err_response(e, "Error fetching statistics"),
    }
}
