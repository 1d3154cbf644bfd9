/// Include-marker syntax for columns and tasks.
///
/// Handles the `!!!include(path)!!!` pattern. Paths are written with spaces
/// and parentheses percent-encoded, and decoded when read back.
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::sync::LazyLock;

use crate::types::IncludeInfo;

static INCLUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!!!include\(([^)]+)\)!!!").unwrap());

const PATH_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'(').add(b')').add(b'%');

/// Check if a title contains an include marker.
pub fn is_include(title: &str) -> bool {
    INCLUDE_RE.is_match(title)
}

/// All include paths in a title, decoded, in order of appearance.
pub fn extract_include_paths(title: &str) -> Vec<String> {
    INCLUDE_RE
        .captures_iter(title)
        .map(|caps| decode_include_path(&caps[1]))
        .collect()
}

/// Remove every include marker and tidy the leftover whitespace.
pub fn strip_include(title: &str) -> String {
    let stripped = INCLUDE_RE.replace_all(title, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn encode_include_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

/// Decode URL-encoded path components (%20 -> space, etc).
pub fn decode_include_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().to_string()
}

pub fn include_marker(path: &str) -> String {
    format!("!!!include({})!!!", encode_include_path(path))
}

/// Displayed title for an include-mode item: the markers, then the clean title.
pub fn display_title(clean_title: &str, files: &[String]) -> String {
    let mut parts: Vec<String> = files.iter().map(|f| include_marker(f)).collect();
    if !clean_title.is_empty() {
        parts.push(clean_title.to_string());
    }
    parts.join(" ")
}

/// Clean, editable title of an item.
///
/// Prefers the stored `original_title`; otherwise strips markers from the
/// displayed title so the result does not depend on stale metadata.
pub fn clean_title(title: &str, info: &IncludeInfo) -> String {
    match &info.original_title {
        Some(original) if info.include_mode => original.clone(),
        _ => strip_include(title),
    }
}

/// Switch an item into include mode. Returns the new displayed title.
pub fn enable(title: &str, info: &mut IncludeInfo, files: Vec<String>) -> String {
    let clean = clean_title(title, info);
    let display = display_title(&clean, &files);
    info.include_mode = true;
    info.include_files = files;
    info.original_title = Some(clean);
    display
}

/// Leave include mode, restoring the clean title.
pub fn disable(title: &str, info: &mut IncludeInfo) -> String {
    let clean = clean_title(title, info);
    *info = IncludeInfo::default();
    clean
}

/// Replace the clean title of an include-mode item, keeping its markers.
pub fn retitle(info: &mut IncludeInfo, clean: &str) -> String {
    info.original_title = Some(clean.to_string());
    display_title(clean, &info.include_files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_include() {
        assert!(is_include("!!!include(./root/file.md)!!!"));
        assert!(is_include("!!!include(root/file.md)!!! #stack"));
        assert!(!is_include("Normal column"));
        assert!(!is_include("!!!include(broken"));
    }

    #[test]
    fn test_extract_decodes_paths() {
        assert_eq!(
            extract_include_paths("!!!include(folder%20with%20space/file.md)!!! #stack"),
            vec!["folder with space/file.md".to_string()]
        );
        assert_eq!(
            extract_include_paths("!!!include(a.md)!!! !!!include(b.md)!!! Notes"),
            vec!["a.md".to_string(), "b.md".to_string()]
        );
        assert!(extract_include_paths("Normal title").is_empty());
    }

    #[test]
    fn test_display_title_encodes_spaces() {
        let files = vec!["notes/my file.md".to_string()];
        assert_eq!(
            display_title("Reading", &files),
            "!!!include(notes/my%20file.md)!!! Reading"
        );
        assert_eq!(display_title("", &files), "!!!include(notes/my%20file.md)!!!");
    }

    #[test]
    fn test_enable_then_disable_restores_clean_title() {
        let mut info = IncludeInfo::default();
        let shown = enable("Reading #row2", &mut info, vec!["list.md".to_string()]);
        assert_eq!(shown, "!!!include(list.md)!!! Reading #row2");
        assert!(info.is_active());
        assert_eq!(info.original_title.as_deref(), Some("Reading #row2"));

        let restored = disable(&shown, &mut info);
        assert_eq!(restored, "Reading #row2");
        assert_eq!(info, IncludeInfo::default());
    }

    #[test]
    fn test_disable_without_original_title_strips_markers() {
        let mut info = IncludeInfo {
            include_mode: true,
            include_files: vec!["a.md".to_string()],
            original_title: None,
        };
        assert_eq!(disable("!!!include(a.md)!!!  Notes", &mut info), "Notes");
    }

    #[test]
    fn test_reenable_replaces_files() {
        let mut info = IncludeInfo::default();
        let shown = enable("Notes", &mut info, vec!["a.md".to_string()]);
        let shown = enable(&shown, &mut info, vec!["b.md".to_string()]);
        assert_eq!(shown, "!!!include(b.md)!!! Notes");
    }
}
