#[cfg(test)]
mod error_handling_tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;
    use pdfrender::overlay::OverlayError;
    use pdfrender::render::request_parser::RequestParseError;
    use pdfrender::render::RenderError;
    use pdfrender::template::StoreError;
    use pdfrender::ErrorResponse;

    #[test]
    fn test_error_response_struct() {
        let error_response = ErrorResponse::new("TestError", "Test message");
        assert_eq!(error_response.error, "TestError");
        assert_eq!(error_response.message, "Test message");
        assert!(!error_response.timestamp.is_empty());
        assert!(error_response.key.is_none());
        assert!(error_response.template_id.is_none());
    }

    #[test]
    fn test_optional_fields_skipped_when_absent() {
        let json = serde_json::to_value(ErrorResponse::from_message("Invalid JSON")).unwrap();
        assert_eq!(json["error"], "Invalid JSON");
        assert_eq!(json["message"], "Invalid JSON");
        assert!(json.get("key").is_none());
        assert!(json.get("template_id").is_none());

        let json = serde_json::to_value(
            ErrorResponse::new("Key not found ", "Key not found: total").with_key("total"),
        )
        .unwrap();
        assert_eq!(json["key"], "total");
    }

    #[test]
    fn test_render_error_messages() {
        assert_eq!(
            RenderError::TemplateNotFound("T-9".to_string()).to_string(),
            "Could not find data for template ID: T-9"
        );
        assert_eq!(
            RenderError::FileNotFound("/private/files/a.pdf".to_string()).to_string(),
            "File not found: /private/files/a.pdf"
        );
        assert_eq!(
            RenderError::KeyNotFound("total".to_string()).to_string(),
            "Key not found "
        );
    }

    #[test]
    fn test_render_error_status_codes() {
        let bad_request = [
            RenderError::TemplateNotFound("T".to_string()),
            RenderError::FontNotFound {
                template_id: "T".to_string(),
                font: "Sans".to_string(),
            },
            RenderError::InvalidConfiguration {
                template_id: "T".to_string(),
                message: "bad".to_string(),
            },
            RenderError::FileNotFound("x".to_string()),
            RenderError::KeyNotFound("k".to_string()),
        ];
        for error in &bad_request {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST, "{}", error);
        }

        let internal = [
            RenderError::Overlay(OverlayError::Font("broken".to_string())),
            RenderError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)),
            RenderError::Output(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
            RenderError::Blocking("canceled".to_string()),
        ];
        for error in &internal {
            assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{}", error);
        }
    }

    #[test]
    fn test_request_parse_errors_are_bad_requests() {
        let errors = [
            RequestParseError::FieldError("field".to_string()),
            RequestParseError::PayloadTooLarge(1024),
            RequestParseError::InvalidJson("eof".to_string()),
            RequestParseError::MissingField("data"),
            RequestParseError::NotAnObject,
        ];
        for error in &errors {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            RequestParseError::MissingField("template_id").to_string(),
            "Missing required parameter: template_id"
        );
    }
}
