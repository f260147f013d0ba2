use anyhow::{Result, anyhow};
use std::path::{Component, Path};

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Strips parameters and lower-cases a declared content type (`Image/PNG; q=1` -> `image/png`)
pub fn normalize_mime_type(content_type: &str) -> String {
    match content_type.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase(),
    }
}

/// Validates a declared MIME type against the allowlist
pub fn validate_mime_type(content_type: &str, allowed: &[String]) -> Result<()> {
    let normalized = normalize_mime_type(content_type);

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&normalized)) {
        return Ok(());
    }

    Err(anyhow!(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!(
            "MIME type '{}' is not allowed. Only JPEG, PNG, GIF and MP4 are accepted.",
            content_type
        ),
    }))
}

/// Reduces a client-supplied filename to a safe, single-segment name.
///
/// Only the last path component is kept, then every whitespace run becomes one `_` and
/// other control characters become `_`. The result is capped at 200 bytes.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");

    let name = if name.is_empty() || name == "." || name == ".." {
        "unnamed"
    } else {
        name
    };

    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
        } else if c.is_control() {
            in_whitespace = false;
            sanitized.push('_');
        } else {
            in_whitespace = false;
            sanitized.push(c);
        }
    }

    // Limit length safely for UTF-8
    if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
    }

    sanitized
}

/// Trims a caller-supplied path segment (tenant id, media type) and checks it stays a single
/// directory level. Returns `None` for blank input.
pub fn normalize_segment(value: &str, field: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(anyhow!(ValidationError {
            code: "INVALID_PATH_SEGMENT",
            message: format!("Invalid {}: '{}'", field, trimmed),
        }));
    }

    Ok(Some(trimmed.to_string()))
}

/// Checks a relative path only walks downwards (no `..`, no root or drive prefix)
pub fn is_contained_relative(path: &Path) -> bool {
    path.components().count() > 0
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
