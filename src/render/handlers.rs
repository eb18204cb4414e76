use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{debug, error, info};
use serde_json::Value;

use super::models::{RenderQuery, RenderRequest};
use super::request_parser::{RenderFields, RequestParser};
use super::{fill_pdf_form, RenderError, DOWNLOAD_FILENAME};
use crate::{AppState, ErrorResponse};

async fn render_response(state: &AppState, template_id: &str, data: Option<Value>) -> HttpResponse {
    let payload = match RequestParser::payload_object(data) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Rejected payload for template '{}': {}", template_id, e);
            return e.payload_response(template_id);
        }
    };

    debug!(
        "Filling template '{}' with {} field(s)",
        template_id,
        payload.len()
    );

    let rendered = match fill_pdf_form(state, template_id, payload).await {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Failed to fill template '{}': {}", template_id, e);
            return e.error_response();
        }
    };

    let bytes = match web::block(move || rendered.into_bytes()).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            error!("Failed to read rendered PDF for '{}': {}", template_id, e);
            return e.error_response();
        }
        Err(e) => {
            error!("Blocking task failed for '{}': {}", template_id, e);
            return RenderError::Blocking(e.to_string()).error_response();
        }
    };

    info!(
        "Filled template '{}' ({} bytes)",
        template_id,
        bytes.len()
    );

    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(DOWNLOAD_FILENAME.to_string())],
        })
        .body(bytes)
}

#[utoipa::path(
    context_path = "/api",
    tag = "PDF Render",
    post,
    path = "/pdf/{template_id}",
    params(
        ("template_id" = String, Path, description = "Identifier of the stored template")
    ),
    request_body(content = RenderRequest, description = "Field values; form and multipart bodies with a `data` field are accepted too"),
    responses(
        (status = 200, description = "Filled PDF offered as response.pdf", content_type = "application/pdf"),
        (status = 400, description = "Unknown template, unreadable file, or missing payload key", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn get_filled_pdf(
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> HttpResponse {
    let template_id = path.into_inner();
    info!("Executing get_filled_pdf handler for template: {}", &template_id);

    let template_id = match RequestParser::template_id(Some(template_id)) {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    let fields = match RequestParser::parse_body(&req, payload, state.render.max_payload_bytes).await {
        Ok(fields) => fields,
        Err(e) => {
            error!("Failed to parse request body: {}", e);
            return e.error_response();
        }
    };

    render_response(&state, &template_id, fields.data).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "PDF Render",
    post,
    path = "/method/pdfrender.api.pdfrender.get_filled_pdf",
    params(RenderQuery),
    request_body(content = RenderRequest, description = "Optional when both values are in the query string"),
    responses(
        (status = 200, description = "Filled PDF offered as response.pdf", content_type = "application/pdf"),
        (status = 400, description = "Unknown template, unreadable file, or missing payload key", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn get_filled_pdf_method(
    req: HttpRequest,
    query: web::Query<RenderQuery>,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> HttpResponse {
    let query = query.into_inner();
    let from_query = RenderFields {
        template_id: query.template_id,
        data: query.data.map(Value::String),
    };

    let fields = match RequestParser::parse_body(&req, payload, state.render.max_payload_bytes).await {
        Ok(fields) => fields.or(from_query),
        Err(e) => {
            error!("Failed to parse request body: {}", e);
            return e.error_response();
        }
    };

    let template_id = match RequestParser::template_id(fields.template_id) {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };
    info!("Executing get_filled_pdf_method handler for template: {}", &template_id);

    render_response(&state, &template_id, fields.data).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/pdf/{template_id}").route(web::post().to(get_filled_pdf)))
        .service(
            web::resource("/method/pdfrender.api.pdfrender.get_filled_pdf")
                .route(web::get().to(get_filled_pdf_method))
                .route(web::post().to(get_filled_pdf_method)),
        );
}
