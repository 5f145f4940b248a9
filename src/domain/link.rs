//! Link syntax inside note text and the edges derived from it.

use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

/// URI prefix used by in-app links to items.
pub const ITEM_SCHEME: &str = "folio://open-item/";

// [label](target "optional title"); a leading '!' marks an image.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]\n]*)\]\(\s*([^)\s]+)((?:\s+"[^"\n]*")?)\s*\)"#)
        .expect("link pattern is valid")
});

/// A directed edge from a note to any item id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Turns a raw link target into an item id.
///
/// Returns `None` for external URLs (`http:`, `https:`, `www.`) and for
/// targets that are empty once the `#fragment` is removed. The in-app
/// scheme prefix is stripped and `%20` is decoded to a space.
pub fn normalize_target(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("www.") {
        return None;
    }
    let raw = raw.strip_prefix(ITEM_SCHEME).unwrap_or(raw);
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let target = without_fragment.replace("%20", " ");
    let target = target.trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// Extracts the distinct item ids referenced by links in `content`.
///
/// Targets keep the order in which they first appear. Images are ignored.
pub fn extract_link_targets(content: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for caps in LINK_PATTERN.captures_iter(content) {
        if &caps[1] == "!" {
            continue;
        }
        if let Some(target) = normalize_target(&caps[3])
            && !targets.contains(&target)
        {
            targets.push(target);
        }
    }
    targets
}

/// Rewrites every link pointing at `old` so that it points at `new`.
///
/// The `#fragment`, scheme prefix and title of each link are kept. A label
/// equal to `old` is renamed too. Returns `Cow::Borrowed` when nothing
/// matched.
pub fn rewrite_link_targets<'a>(content: &'a str, old: &str, new: &str) -> Cow<'a, str> {
    let rewritten = LINK_PATTERN.replace_all(content, |caps: &Captures| {
        let whole = caps[0].to_string();
        if &caps[1] == "!" || normalize_target(&caps[3]).as_deref() != Some(old) {
            return whole;
        }
        let raw = &caps[3];
        let scheme = if raw.starts_with(ITEM_SCHEME) {
            ITEM_SCHEME
        } else {
            ""
        };
        let fragment = raw.find('#').map(|i| &raw[i..]).unwrap_or_default();
        let label = if &caps[2] == old { new } else { &caps[2] };
        format!(
            "[{}]({}{}{}{})",
            label,
            scheme,
            new.replace(' ', "%20"),
            fragment,
            &caps[4]
        )
    });
    match rewritten {
        Cow::Owned(text) if text == content => Cow::Borrowed(content),
        other => other,
    }
}
