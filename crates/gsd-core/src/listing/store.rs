//! Persisted item list: the crawl's output and the download stage's input.
//!
//! Plain text, one `URL | Display Name` per line, with a comment header.
//! Human-editable on purpose; people prune lines between the two stages.

use std::fs;
use std::io;
use std::path::Path;

use super::items::{display_name_from_slug, ItemReference};

/// Loads item references from `path`. Blank lines and `#` comments are
/// skipped; a line without the separator is treated as a bare URL.
pub fn load_items(path: &Path) -> io::Result<Vec<ItemReference>> {
    let data = fs::read_to_string(path)?;
    let mut items = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (url, name) = match line.split_once(" | ") {
            Some((url, name)) => (url.trim(), name.trim()),
            None => (line, ""),
        };
        let display_name = if name.is_empty() {
            let slug = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
            display_name_from_slug(slug)
        } else {
            name.to_string()
        };
        items.push(ItemReference {
            url: url.to_string(),
            display_name,
        });
    }
    Ok(items)
}

/// Writes the full item list to `path`, replacing any previous content.
pub fn save_items(path: &Path, items: &[ItemReference]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = String::new();
    out.push_str(&format!("# gsd item list: {} items\n", items.len()));
    out.push_str(&format!(
        "# Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("# Format: URL | Display Name\n\n");
    for item in items {
        out.push_str(&format!("{} | {}\n", item.url, item.display_name));
    }
    fs::write(path, out)
}

/// Merges `new_items` into the list already at `path` (if any) and saves the
/// union. Existing entries keep their position and display name; only URLs
/// not yet present are appended. Returns the merged list.
pub fn merge_and_save(path: &Path, new_items: &[ItemReference]) -> io::Result<Vec<ItemReference>> {
    let mut merged = if path.exists() {
        load_items(path)?
    } else {
        Vec::new()
    };
    let mut known: std::collections::HashSet<String> =
        merged.iter().map(|i| i.url.clone()).collect();
    for item in new_items {
        if known.insert(item.url.clone()) {
            merged.push(item.clone());
        }
    }
    save_items(path, &merged)?;
    Ok(merged)
}
