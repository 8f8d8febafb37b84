use std::fs;
use std::path::Path;
use thiserror::Error;

mod entities;

pub use entities::{CapturedError, ExceptionInfo, RecordId, RequestContext, StoredRecord};

/// Errors raised while reading a captured error document
#[derive(Debug, Error)]
pub enum CaptureLoadError {
    #[error("Failed to read captured error '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse captured error '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a captured error from a JSON document
pub fn load_captured_error(path: &Path) -> Result<CapturedError, CaptureLoadError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| CaptureLoadError::Read {
        path: path_display.clone(),
        source,
    })?;

    parse_captured_error(&raw).map_err(|source| CaptureLoadError::Parse {
        path: path_display,
        source,
    })
}

pub fn parse_captured_error(raw: &str) -> Result<CapturedError, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document_uses_defaults() {
        let err = parse_captured_error(
            r#"{"exception": {"type_name": "TimeoutError", "message": "upstream timed out"}}"#,
        )
        .unwrap();
        assert_eq!(err.type_name(), "TimeoutError");
        assert!(err.request.is_none());
        assert_eq!(err.effective_status_code(), 0);
        assert_eq!(err.host, "");
    }

    #[test]
    fn test_parse_with_request() {
        let err = parse_captured_error(
            r#"{
                "exception": {"type_name": "NotFound", "message": "no route", "http_status": 404},
                "request": {"method": "GET", "path": "/missing", "headers": {"User-Agent": "curl"}},
                "timestamp": "2025-03-01T10:00:00Z",
                "host": "web-1"
            }"#,
        )
        .unwrap();
        let request = err.request.as_ref().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers["User-Agent"], "curl");
        assert_eq!(err.effective_status_code(), 404);
    }
}
