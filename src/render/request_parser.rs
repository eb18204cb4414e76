use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use futures::StreamExt;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum RequestParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("Request body error: {0}")]
    PayloadError(String),
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Invalid UTF-8 data: {0}")]
    Utf8Error(String),
    #[error("Invalid form body: {0}")]
    FormError(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),
    #[error("data must be a JSON object")]
    NotAnObject,
}

impl ResponseError for RequestParseError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::from_message(&self.to_string()))
    }
}

impl RequestParseError {
    /// Response for a `data` value rejected while filling `template_id`.
    pub fn payload_response(&self, template_id: &str) -> HttpResponse {
        let body = ErrorResponse::from_message(&self.to_string());
        let body = match self {
            RequestParseError::InvalidJson(_) | RequestParseError::NotAnObject => {
                body.with_template_id(template_id)
            }
            _ => body,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Raw `template_id` / `data` values read from a request body.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFields {
    pub template_id: Option<String>,
    pub data: Option<Value>,
}

impl RenderFields {
    /// Fill fields missing here from `fallback` (query-string values).
    pub fn or(self, fallback: RenderFields) -> RenderFields {
        RenderFields {
            template_id: self.template_id.or(fallback.template_id),
            data: self.data.or(fallback.data),
        }
    }
}

pub struct RequestParser;

impl RequestParser {
    /// Read `template_id` and `data` from a JSON, urlencoded or multipart body.
    pub async fn parse_body(
        req: &HttpRequest,
        payload: web::Payload,
        limit: usize,
    ) -> Result<RenderFields, RequestParseError> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type == "multipart/form-data" {
            let multipart = Multipart::new(req.headers(), payload);
            return Self::parse_multipart(multipart, limit).await;
        }

        let body = Self::read_body(payload, limit).await?;
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(RenderFields::default());
        }

        if content_type == "application/x-www-form-urlencoded" {
            let text = std::str::from_utf8(&body)
                .map_err(|e| RequestParseError::Utf8Error(e.to_string()))?;
            Self::parse_form(text)
        } else {
            Self::parse_json(&body)
        }
    }

    async fn read_body(
        mut payload: web::Payload,
        limit: usize,
    ) -> Result<web::BytesMut, RequestParseError> {
        let mut body = web::BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(|e| RequestParseError::PayloadError(e.to_string()))?;
            if body.len() + chunk.len() > limit {
                return Err(RequestParseError::PayloadTooLarge(limit));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    pub fn parse_json(body: &[u8]) -> Result<RenderFields, RequestParseError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RequestParseError::InvalidJson(e.to_string()))?;

        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(RequestParseError::NotAnObject),
        };

        let template_id = match object.remove("template_id") {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };

        Ok(RenderFields {
            template_id,
            data: object.remove("data"),
        })
    }

    pub fn parse_form(text: &str) -> Result<RenderFields, RequestParseError> {
        let mut form = web::Query::<HashMap<String, String>>::from_query(text)
            .map_err(|e| RequestParseError::FormError(e.to_string()))?
            .into_inner();

        Ok(RenderFields {
            template_id: form.remove("template_id"),
            data: form.remove("data").map(Value::String),
        })
    }

    async fn parse_multipart(
        mut multipart: Multipart,
        limit: usize,
    ) -> Result<RenderFields, RequestParseError> {
        let mut fields = RenderFields::default();
        let mut total = 0usize;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| RequestParseError::FieldError(e.to_string()))?;
            let content_disposition = field
                .content_disposition()
                .ok_or_else(|| RequestParseError::FieldError("Content disposition not found".to_string()))?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| RequestParseError::FieldError("Field name not found".to_string()))?
                .to_string();

            let mut buffer = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| RequestParseError::FieldError(e.to_string()))?;
                total += chunk.len();
                if total > limit {
                    return Err(RequestParseError::PayloadTooLarge(limit));
                }
                buffer.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "data" | "template_id" => {
                    let value = String::from_utf8(buffer)
                        .map_err(|e| RequestParseError::Utf8Error(e.to_string()))?;
                    if name == "data" {
                        fields.data = Some(Value::String(value));
                    } else {
                        fields.template_id = Some(value);
                    }
                }
                _ => continue,
            }
        }

        Ok(fields)
    }

    /// Turn a raw `data` value into the payload object.
    ///
    /// A string is parsed as JSON first, matching form-field submissions.
    pub fn payload_object(data: Option<Value>) -> Result<Map<String, Value>, RequestParseError> {
        match data.ok_or(RequestParseError::MissingField("data"))? {
            Value::Object(object) => Ok(object),
            Value::String(raw) => match serde_json::from_str(&raw) {
                Ok(Value::Object(object)) => Ok(object),
                Ok(_) => Err(RequestParseError::NotAnObject),
                Err(e) => Err(RequestParseError::InvalidJson(e.to_string())),
            },
            _ => Err(RequestParseError::NotAnObject),
        }
    }

    pub fn template_id(template_id: Option<String>) -> Result<String, RequestParseError> {
        template_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(RequestParseError::MissingField("template_id"))
    }
}
