use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::PostFields;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaIssue {
    pub key: String,
    pub code: String,
    pub message: String,
}

impl QaIssue {
    fn new(key: &str, code: &str, message: String) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            message,
        }
    }
}

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}(```|~~~)").expect("fence pattern"));

/// Number of fenced code blocks (pairs of ``` or ~~~ fence lines).
pub fn fenced_blocks(markdown: &str) -> usize {
    FENCE.find_iter(markdown).count() / 2
}

/// Heuristic checks on a translated post. Issues are advisory only.
pub fn check_post(key: &str, original: &PostFields, translated: &PostFields) -> Vec<QaIssue> {
    let mut issues = Vec::new();

    let title = translated.title.trim();
    if !title.is_empty() && title == original.title.trim() {
        issues.push(QaIssue::new(
            key,
            "SAME_AS_ORIGINAL",
            format!("title was left untranslated: {title:?}"),
        ));
    }

    // Translation wiped a body that had content
    if !original.content.trim().is_empty() && translated.content.trim().is_empty() {
        issues.push(QaIssue::new(
            key,
            "EMPTY_CONTENT",
            "translated body is empty".to_string(),
        ));
    }

    let expected = fenced_blocks(&original.content);
    let found = fenced_blocks(&translated.content);
    if expected != found {
        issues.push(QaIssue::new(
            key,
            "CODE_BLOCK_COUNT",
            format!("{expected} fenced code block(s) in the original, {found} in the translation"),
        ));
    }

    issues
}

pub fn report(issues: &[QaIssue]) {
    for issue in issues {
        warn!("qa [{}] {}: {}", issue.code, issue.key, issue.message);
    }
}
