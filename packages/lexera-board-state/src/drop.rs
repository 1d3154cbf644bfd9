/// Classification of drop payloads.
///
/// External drops arrive either as a file list or as a newline-delimited
/// URI list. Internal drags carry a private MIME marker; when a host strips
/// it, a text payload made only of our own ids is still treated as internal
/// so a reorder is never mistaken for a file drop.
use serde::{Deserialize, Serialize};

use crate::identity::looks_like_board_id;
use crate::include::decode_include_path;
use crate::mutation::link_markdown;

pub const INTERNAL_DRAG_MIME: &str = "application/x-lexera-board-item";
pub const URI_LIST_MIME: &str = "text/uri-list";

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "avif", "tif", "tiff",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedFile {
    pub name: String,
    /// Path relative to the board document, when the host could resolve one.
    #[serde(default)]
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub files: Vec<DroppedFile>,
    #[serde(default)]
    pub uri_list: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLink {
    pub target: String,
    pub is_image: bool,
}

impl DroppedLink {
    fn new(target: String) -> Self {
        let is_image = is_image_path(&target);
        Self { target, is_image }
    }

    pub fn markdown(&self) -> String {
        link_markdown(&self.target, self.is_image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropKind {
    /// An internal reorder of the given task or column id.
    Internal(String),
    Files(Vec<DroppedLink>),
    Uris(Vec<DroppedLink>),
    Unrecognized,
}

pub fn is_image_path(path: &str) -> bool {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let Some((_, ext)) = file.rsplit_once('.') else {
        return false;
    };
    let ext = ext.split(['?', '#']).next().unwrap_or(ext).to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Non-comment, non-blank lines of a `text/uri-list` payload.
pub fn parse_uri_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// `file://` URIs become decoded local paths; other URIs are kept as-is.
pub fn uri_to_target(uri: &str) -> String {
    match uri.strip_prefix("file://") {
        Some(rest) => decode_include_path(rest.strip_prefix("localhost").unwrap_or(rest)),
        None => uri.to_string(),
    }
}

pub fn classify(payload: &DropPayload) -> DropKind {
    let internal_text = payload
        .text
        .as_deref()
        .filter(|t| looks_like_board_id(t))
        .map(|t| t.trim().to_string());

    if payload.types.iter().any(|t| t == INTERNAL_DRAG_MIME) {
        return match internal_text {
            Some(id) => DropKind::Internal(id),
            None => DropKind::Unrecognized,
        };
    }
    if payload.files.is_empty() {
        if let Some(id) = internal_text {
            return DropKind::Internal(id);
        }
    }

    if !payload.files.is_empty() {
        return DropKind::Files(
            payload
                .files
                .iter()
                .map(|f| DroppedLink::new(f.relative_path.clone().unwrap_or_else(|| f.name.clone())))
                .collect(),
        );
    }

    let uris = payload.uri_list.as_deref().map(parse_uri_list).unwrap_or_default();
    if uris.iter().all(|u| looks_like_board_id(u)) {
        return match uris.first() {
            Some(id) => DropKind::Internal(id.clone()),
            None => DropKind::Unrecognized,
        };
    }
    DropKind::Uris(uris.iter().map(|u| DroppedLink::new(uri_to_target(u))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_marker() {
        let payload = DropPayload {
            types: vec![INTERNAL_DRAG_MIME.to_string(), "text/plain".to_string()],
            text: Some("task-0a1b2c3d4e5f".to_string()),
            ..DropPayload::default()
        };
        assert_eq!(classify(&payload), DropKind::Internal("task-0a1b2c3d4e5f".to_string()));
    }

    #[test]
    fn test_internal_by_id_prefix_without_marker() {
        let payload = DropPayload {
            types: vec!["text/plain".to_string()],
            text: Some("col-abc".to_string()),
            ..DropPayload::default()
        };
        assert_eq!(classify(&payload), DropKind::Internal("col-abc".to_string()));

        let payload = DropPayload {
            uri_list: Some("task-123\n".to_string()),
            ..DropPayload::default()
        };
        assert_eq!(classify(&payload), DropKind::Internal("task-123".to_string()));
    }

    #[test]
    fn test_file_list() {
        let payload = DropPayload {
            files: vec![
                DroppedFile {
                    name: "shot.PNG".to_string(),
                    relative_path: Some("media/shot.PNG".to_string()),
                },
                DroppedFile {
                    name: "spec.pdf".to_string(),
                    relative_path: None,
                },
            ],
            text: Some("task-1".to_string()),
            ..DropPayload::default()
        };
        match classify(&payload) {
            DropKind::Files(links) => {
                assert_eq!(links.len(), 2);
                assert!(links[0].is_image);
                assert_eq!(links[0].markdown(), "![shot.PNG](media/shot.PNG)");
                assert_eq!(links[1].markdown(), "[spec.pdf](spec.pdf)");
            }
            other => panic!("expected files, got {:?}", other),
        }
    }

    #[test]
    fn test_uri_list_skips_comments() {
        let payload = DropPayload {
            types: vec![URI_LIST_MIME.to_string()],
            uri_list: Some(
                "# comment\nfile:///home/me/My%20Docs/a.md\r\n\nhttps://example.com/pic.jpg?x=1\n".to_string(),
            ),
            ..DropPayload::default()
        };
        match classify(&payload) {
            DropKind::Uris(links) => {
                assert_eq!(links[0].target, "/home/me/My Docs/a.md");
                assert!(!links[0].is_image);
                assert_eq!(links[1].target, "https://example.com/pic.jpg?x=1");
                assert!(links[1].is_image);
            }
            other => panic!("expected uris, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_payload_unrecognized() {
        assert_eq!(classify(&DropPayload::default()), DropKind::Unrecognized);
        let payload = DropPayload {
            text: Some("just some prose".to_string()),
            ..DropPayload::default()
        };
        assert_eq!(classify(&payload), DropKind::Unrecognized);
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path("a/b/c.JPEG"));
        assert!(!is_image_path("notes.md"));
        assert!(!is_image_path("folder.png/readme"));
        assert!(!is_image_path("noext"));
    }
}
