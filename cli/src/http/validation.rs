//! Request field validation

use talkhead_core::api::is_valid_task_id;

use super::models::HttpServerError;

/// Unknown and malformed ids look the same to the caller.
pub fn validate_task_id(task_id: &str) -> Result<(), HttpServerError> {
    if is_valid_task_id(task_id) {
        Ok(())
    } else {
        Err(HttpServerError::NotFound)
    }
}

pub fn parse_fps(raw: &str) -> Result<u32, HttpServerError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(HttpServerError::InvalidRequest(format!(
            "fps must be a positive integer, got '{}'",
            raw.trim()
        ))),
    }
}

pub fn parse_bbox_shift(raw: &str) -> Result<i32, HttpServerError> {
    raw.trim().parse::<i32>().map_err(|_| {
        HttpServerError::InvalidRequest(format!(
            "bbox_shift must be an integer, got '{}'",
            raw.trim()
        ))
    })
}

/// Form booleans as browsers and HTML forms send them.
pub fn parse_bool(field: &str, raw: &str) -> Result<bool, HttpServerError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(HttpServerError::InvalidRequest(format!(
            "{field} must be a boolean, got '{other}'"
        ))),
    }
}

pub fn validate_upload(field: &str, data: &[u8]) -> Result<(), HttpServerError> {
    if data.is_empty() {
        return Err(HttpServerError::InvalidRequest(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}
