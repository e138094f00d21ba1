//! Turns section-labelled model replies back into typed records.
//!
//! Two reply shapes are accepted for every section:
//!
//! ```text
//! TITLE:
//! Olá
//! TITLE: Olá
//! ```
//!
//! Fields the reply does not provide keep their fallback value.

use std::collections::HashSet;

use crate::model::{Field, FieldKind, Overlay, Translatable};

/// Longest run `*term*` / `_term_` that [`strip_term_emphasis`] unwraps.
const MAX_TERM_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    NeedsRevision(String),
}

/// Parse a translate/refine reply, starting from `fallback`.
pub fn parse<T: Translatable>(raw: &str, fallback: &T) -> T {
    let overlay = parse_sections(raw, &fallback.fields());
    fallback.apply(&overlay)
}

/// Collect the sections of `raw` whose markers appear in `fields`.
pub fn parse_sections(raw: &str, fields: &[Field]) -> Overlay {
    let mut overlay = Overlay::new();
    let mut current: Option<usize> = None;
    let mut seen: HashSet<usize> = HashSet::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let last = fields.len().checked_sub(1);

    for line in raw.lines() {
        let in_block = current.is_some_and(|i| fields[i].kind == FieldKind::Block);
        if in_block && is_fence(line) {
            in_fence = !in_fence;
        }

        // Inside a block body a marker needs its exact case when it was
        // already consumed or when the body is the final section, so
        // "Tags:" prose stays in the post while "p2:" still opens P2.
        let marker = if in_fence {
            None
        } else {
            match_marker(line, fields, |i| {
                in_block && (current == last || seen.contains(&i))
            })
        };

        if let Some((i, rest)) = marker {
            if let Some(done) = current {
                flush(&mut overlay, &fields[done], &buffer);
            }
            current = Some(i);
            seen.insert(i);
            buffer.clear();
            in_fence = false;
            if !rest.is_empty() {
                buffer.push(rest);
            }
            continue;
        }

        // Preamble before the first marker is dropped.
        if current.is_some() {
            buffer.push(line);
        }
    }

    if let Some(done) = current {
        flush(&mut overlay, &fields[done], &buffer);
    }

    overlay
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Recognize `MARKER:` at the start of a line, ignoring leading `#`/`*`
/// decoration. Case is ignored unless `exact(index)` holds for the field.
/// Returns the field index and any inline remainder.
fn match_marker<'l>(
    line: &'l str,
    fields: &[Field],
    exact: impl Fn(usize) -> bool,
) -> Option<(usize, &'l str)> {
    let head = line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());

    fields.iter().enumerate().find_map(|(i, f)| {
        let n = f.marker.len();
        let candidate = head.get(..n)?;
        let same = if exact(i) {
            candidate == f.marker
        } else {
            candidate.eq_ignore_ascii_case(&f.marker)
        };
        if !same || head.get(n..n + 1) != Some(":") {
            return None;
        }
        let rest = head[n + 1..]
            .trim()
            .trim_start_matches('*')
            .trim_start();
        Some((i, rest))
    })
}

fn flush(overlay: &mut Overlay, field: &Field, buffer: &[&str]) {
    let text = match field.kind {
        FieldKind::Block => {
            let joined = buffer.join("\n");
            let body = joined
                .trim_end()
                .trim_start_matches(|c| c == '\n' || c == '\r');
            strip_term_emphasis(body)
        }
        FieldKind::Line | FieldKind::List => {
            let joined = buffer
                .iter()
                .flat_map(|l| l.split_whitespace())
                .collect::<Vec<_>>()
                .join(" ");
            strip_term_emphasis(&joined)
        }
    };

    if !text.trim().is_empty() {
        overlay.insert(field.marker.clone(), text);
    }
}

/// Unwrap `*term*` and `_term_` around a short run of word characters.
///
/// Leaves `**bold**`, snake_case identifiers, inline code spans and fenced
/// code blocks untouched.
pub fn strip_term_emphasis(text: &str) -> String {
    let mut out = Vec::new();
    let mut in_fence = false;

    for line in text.split('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        if in_fence {
            out.push(line.to_string());
        } else {
            out.push(strip_line(line));
        }
    }

    out.join("\n")
}

fn strip_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut in_code = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '`' {
            in_code = !in_code;
        } else if !in_code && (c == '*' || c == '_') {
            if let Some(end) = emphasized_term(&chars, i) {
                out.extend(&chars[i + 1..end]);
                i = end + 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Index of the closing marker when `chars[start]` opens a short term.
fn emphasized_term(chars: &[char], start: usize) -> Option<usize> {
    let mark = chars[start];

    if start > 0 {
        let prev = chars[start - 1];
        if prev == mark || prev.is_alphanumeric() {
            return None;
        }
    }

    let is_term_char = |c: char| c.is_alphanumeric() || c == '-' || (mark == '*' && c == '_');

    let mut end = start + 1;
    while end < chars.len() && is_term_char(chars[end]) {
        end += 1;
    }

    let len = end - start - 1;
    if len == 0 || len > MAX_TERM_CHARS || chars.get(end) != Some(&mark) {
        return None;
    }

    match chars.get(end + 1) {
        Some(&next) if next == mark || next.is_alphanumeric() => None,
        _ => Some(end),
    }
}

/// Classify a critique reply. Anything unrecognized is approved.
pub fn parse_verdict(raw: &str) -> Verdict {
    let text = raw
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());

    if text.starts_with("OK") {
        return Verdict::Approved;
    }

    let is_feedback = text
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("FEEDBACK:"));

    if is_feedback {
        let feedback = text[9..].trim().trim_start_matches('*').trim();
        if !feedback.is_empty() {
            return Verdict::NeedsRevision(feedback.to_string());
        }
    }

    Verdict::Approved
}
