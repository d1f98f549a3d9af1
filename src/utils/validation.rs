/// Fallback used when a multipart part carries no usable filename.
pub const FALLBACK_FILENAME: &str = "upload";

/// Longest sanitized name kept, leaving room for the staging timestamp prefix
/// within the usual 255-byte filesystem limit.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Reduces a client-supplied filename to a single safe path component.
///
/// Directory parts (either separator) are dropped, reserved and control
/// characters become `_`, leading dots are stripped and the result is cut to
/// [`MAX_FILENAME_BYTES`] on a char boundary, shortening the stem so a short
/// extension survives. Never fails; an unusable name becomes
/// [`FALLBACK_FILENAME`].
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if name != filename {
        tracing::warn!("Path components stripped from upload filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim().trim_start_matches('.');

    let sanitized = if sanitized.len() > MAX_FILENAME_BYTES {
        truncate_keeping_extension(sanitized)
    } else {
        sanitized.to_string()
    };

    if sanitized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Extensions longer than this are treated as part of the stem.
const MAX_EXTENSION_BYTES: usize = 16;

fn truncate_keeping_extension(name: &str) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };

    let mut end = MAX_FILENAME_BYTES - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], extension)
}
