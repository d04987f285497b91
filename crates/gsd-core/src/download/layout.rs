//! On-disk naming for items and their assets.

use std::path::Path;

/// Linux filename limit; directory names derived from scraped display names
/// must stay under it.
const NAME_MAX: usize = 255;

/// Filesystem-safe directory name for an item: lowercased, whitespace
/// collapsed to single hyphens, anything outside `[a-z0-9._-]` dropped.
/// Hyphens never sit next to other separators, so `Jane Q. Doe` comes out
/// as `jane-q.doe`, not `jane-q.-doe`.
pub fn item_dir_name(display_name: &str) -> String {
    let mut out = String::with_capacity(display_name.len());
    for c in display_name.trim().chars() {
        let mapped = if c.is_whitespace() { '-' } else { c };
        for lower in mapped.to_lowercase() {
            if lower == '-' {
                if !matches!(out.chars().last(), None | Some('-') | Some('.') | Some('_')) {
                    out.push('-');
                }
            } else if lower == '.' || lower == '_' || lower.is_alphanumeric() {
                if (lower == '.' || lower == '_') && out.ends_with('-') {
                    out.pop();
                }
                out.push(lower);
            }
        }
    }
    let trimmed = out.trim_matches(['-', '.']).to_string();
    let mut name = if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed
    };
    if name.len() > NAME_MAX {
        let mut end = NAME_MAX;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

/// `image_001.jpg`, `image_002.png`, ... Index is 1-based.
pub fn asset_filename(prefix: &str, index: usize, url: &str) -> String {
    format!("{}_{:03}{}", prefix, index, extension_for_url(url))
}

/// File extension inferred from the URL path, `.jpg` when unrecognizable.
pub fn extension_for_url(url: &str) -> &'static str {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_lowercase();
    for ext in [".jpg", ".jpeg", ".png", ".gif", ".webp"] {
        if path.ends_with(ext) {
            return ext;
        }
    }
    ".jpg"
}

/// Whether `dir` already holds at least one downloaded asset, i.e. a file
/// named `<prefix>_...`. Used by skip-existing.
pub fn dir_has_assets(dir: &Path, prefix: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    let marker = format!("{}_", prefix);
    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_string_lossy()
            .starts_with(marker.as_str())
            && !entry.file_name().to_string_lossy().ends_with(".part")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names_are_safe_and_lowercase() {
        assert_eq!(item_dir_name("Jane Q. Doe"), "jane-q.doe");
        assert_eq!(item_dir_name("  spaced   out  "), "spaced-out");
        assert_eq!(item_dir_name("Ünïcode / Slash"), "ünïcode-slash");
        assert_eq!(item_dir_name("!!!"), "item");
    }

    #[test]
    fn separators_never_stack() {
        assert_eq!(item_dir_name("a . b"), "a.b");
        assert_eq!(item_dir_name("a - _ b"), "a_b");
        assert_eq!(item_dir_name("dot . end ."), "dot.end");
    }

    #[test]
    fn dir_names_respect_name_max() {
        let long = "x".repeat(1000);
        assert_eq!(item_dir_name(&long).len(), 255);
    }

    #[test]
    fn asset_filenames_are_zero_padded() {
        assert_eq!(
            asset_filename("image", 1, "https://c/x/a.png"),
            "image_001.png"
        );
        assert_eq!(
            asset_filename("image", 42, "https://c/x/a.jpg?w=3"),
            "image_042.jpg"
        );
    }

    #[test]
    fn unknown_extension_defaults_to_jpg() {
        assert_eq!(extension_for_url("https://c/x/a.bin"), ".jpg");
        assert_eq!(extension_for_url("https://c/x/a.WEBP"), ".webp");
    }

    #[test]
    fn skip_existing_detects_assets_but_not_partials() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!dir_has_assets(dir.path(), "image"));
        std::fs::write(dir.path().join("image_001.jpg.part"), b"x").unwrap();
        assert!(!dir_has_assets(dir.path(), "image"));
        std::fs::write(dir.path().join("image_001.jpg"), b"x").unwrap();
        assert!(dir_has_assets(dir.path(), "image"));
    }

    #[test]
    fn missing_dir_has_no_assets() {
        assert!(!dir_has_assets(Path::new("/nonexistent/gsd-test"), "image"));
    }
}
