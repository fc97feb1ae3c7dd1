//! Key and folder path handling
//!
//! The bucket is a flat namespace; folders exist only as a `/` naming
//! convention. These helpers turn caller input into safe key components.

use crate::error::{Error, Result};

/// Separator used to emulate folders inside keys
pub const SEPARATOR: char = '/';

/// Normalize a caller-supplied folder path by stripping surrounding
/// whitespace and separators
///
/// Returns an empty string when no folder was given.
pub fn normalize_folder(path: &str) -> &str {
    path.trim().trim_matches(SEPARATOR)
}

/// Key of the marker object for a folder: the normalized path with exactly
/// one trailing separator
pub fn folder_key(path: &str) -> Result<String> {
    let folder = normalize_folder(path);
    if folder.is_empty() {
        return Err(Error::InvalidFolderPath(
            "No folder path provided".to_string(),
        ));
    }
    Ok(format!("{folder}{SEPARATOR}"))
}

/// Compose an object key from an optional folder and a file name
pub fn join_key(folder: &str, filename: &str) -> String {
    let folder = normalize_folder(folder);
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{folder}{SEPARATOR}{filename}")
    }
}

/// Reduce an uploaded file name to a single safe key component
///
/// Path separators are treated as whitespace, whitespace runs become `_`,
/// anything outside `[A-Za-z0-9._-]` is dropped and leading or trailing
/// dots and underscores are trimmed. This keeps names like `../../etc` from
/// escaping the target folder.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = filtered.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Filename '{name}' contains no usable characters"
        )));
    }

    Ok(cleaned.to_string())
}
