use uuid::Uuid;

/// 128-bit random task id in canonical hyphenated form.
pub fn generate_task_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Accepts only ids this module could have produced; anything else (including
/// `..` or path separators) is rejected before it reaches a path join.
pub fn is_valid_task_id(id: &str) -> bool {
    Uuid::try_parse(id)
        .map(|u| u.hyphenated().to_string() == id)
        .unwrap_or(false)
}
