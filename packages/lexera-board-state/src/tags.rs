use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Compiled regex singletons
// ---------------------------------------------------------------------------

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(#[\p{L}\p{N}_][\p{L}\p{N}_\-.]*)").unwrap());

static LAYOUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#(?:row\d*|span\d*|stack)$").unwrap());

/// Normalize a tag name to its `#name` form.
pub fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{}", trimmed)
    }
}

/// Layout directives (`#row2`, `#span3`, `#stack`) shape the board but are not
/// user tags.
pub fn is_layout_directive(token: &str) -> bool {
    LAYOUT_TAG_RE.is_match(token)
}

/// A `#tag` token with its byte range in the title.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagToken<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn tag_tokens(title: &str) -> Vec<TagToken<'_>> {
    TAG_RE
        .captures_iter(title)
        .filter_map(|caps| caps.get(1))
        .map(|m| TagToken {
            start: m.start(),
            end: m.end(),
            text: m.as_str(),
        })
        .collect()
}

fn find_tag<'a>(title: &'a str, tag: &str) -> Option<TagToken<'a>> {
    let wanted = normalize_tag(tag).to_lowercase();
    tag_tokens(title)
        .into_iter()
        .find(|t| t.text.to_lowercase() == wanted)
}

/// Whether `title` carries `tag` (case-insensitive, whole token).
pub fn has_tag(title: &str, tag: &str) -> bool {
    find_tag(title, tag).is_some()
}

/// User tags in `title`, in order, without layout directives.
pub fn extract_tags(title: &str) -> Vec<String> {
    tag_tokens(title)
        .into_iter()
        .filter(|t| !is_layout_directive(t.text))
        .map(|t| t.text.to_string())
        .collect()
}

/// Byte offset where the trailing run of layout directives begins, if the
/// title ends with one or more of them.
pub fn trailing_directive_start(title: &str) -> Option<usize> {
    let end = title.trim_end().len();
    let mut start = None;
    for token in tag_tokens(title).into_iter().rev() {
        let expected_end = start.map_or(end, |s: usize| title[..s].trim_end().len());
        if token.end != expected_end || !is_layout_directive(token.text) {
            break;
        }
        start = Some(token.start);
    }
    start
}

/// Add `tag` to `title`, placing it before any trailing layout directives.
/// Returns the title unchanged if the tag is already present.
pub fn add_tag(title: &str, tag: &str) -> String {
    if has_tag(title, tag) {
        return title.to_string();
    }
    let tag = normalize_tag(tag);
    match trailing_directive_start(title) {
        Some(pos) => format!("{}{} {}", &title[..pos], tag, &title[pos..]),
        None if title.is_empty() => tag,
        None => format!("{} {}", title, tag),
    }
}

/// Remove `tag` from `title` together with one adjacent separating space.
pub fn remove_tag(title: &str, tag: &str) -> String {
    let Some(token) = find_tag(title, tag) else {
        return title.to_string();
    };
    let before = &title[..token.start];
    let after = &title[token.end..];
    if let Some(stripped) = before.strip_suffix(' ') {
        format!("{}{}", stripped, after)
    } else if let Some(stripped) = after.strip_prefix(' ') {
        format!("{}{}", before, stripped)
    } else {
        format!("{}{}", before, after)
    }
}

/// Toggle `tag` on `title`: a pure text transform that leaves every other
/// tag and directive in place.
pub fn toggle_tag(title: &str, tag: &str) -> String {
    if has_tag(title, tag) {
        remove_tag(title, tag)
    } else {
        add_tag(title, tag)
    }
}
