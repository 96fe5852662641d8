use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use scrivano_core::SanitizedConfig;

use crate::cli::{split_args, RequestCommand};
use crate::state::AppState;

/// Header carrying CLI-style request arguments.
const ARGS_HEADER: &str = "X-Islandora-Args";
/// Header referencing the source image or markup file.
const RESOURCE_HEADER: &str = "Apix-Ldp-Resource";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Recognize or extract text for one referenced file, per the header args.
pub async fn recognize(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let args = headers
        .get(ARGS_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let Some(resource) = headers.get(RESOURCE_HEADER).and_then(|v| v.to_str().ok()) else {
        return bad_request(format!("Missing {} header", RESOURCE_HEADER));
    };

    let command = match RequestCommand::try_parse_from(split_args(args)) {
        Ok(command) => command,
        Err(e) => return bad_request(format!("Unparseable {} header: {}", ARGS_HEADER, e)),
    };

    let file = match state.fetch_resource(resource).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to fetch {}: {}", resource, e);
            return bad_request(format!("Failed to fetch referenced resource: {}", e));
        }
    };
    let file_name = resource_file_name(resource);

    let run = state.create_run();
    info!(run_id = %run.run_id(), resource, "Handling recognition request");

    match command {
        RequestCommand::Page(page_args) => {
            let Some(htr_id) = page_args
                .htr_id
                .or(state.config().htr.default_model)
            else {
                return bad_request("No recognition model given and none configured".to_string());
            };

            match run
                .process_single_page(
                    &file_name,
                    &file,
                    &scrivano_core::SinglePageOptions { htr_id },
                )
                .await
            {
                Ok(markup) => ([(header::CONTENT_TYPE, "application/xml")], markup).into_response(),
                Err(e) => server_error(e),
            }
        }
        RequestCommand::Ocr => match run.extract_single_page_text(&file_name, &file).await {
            Ok(text) => ([(header::CONTENT_TYPE, "text/plain")], text).into_response(),
            Err(e) => server_error(e),
        },
    }
}

fn resource_file_name(uri: &str) -> String {
    uri.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("page")
        .to_string()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

fn server_error(e: scrivano_core::PipelineError) -> Response {
    warn!("Request pipeline failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_file_name() {
        assert_eq!(
            resource_file_name("https://repo.example/files/scan_JP2.jp2"),
            "scan_JP2.jp2"
        );
        assert_eq!(resource_file_name("https://repo.example/files/"), "page");
        assert_eq!(resource_file_name("scan.jp2"), "scan.jp2");
    }
}
