//! Prompt builders for the translate, critique and refine stages.
//!
//! All three are pure functions of a unit's field table. Replies are
//! expected in the `MARKER:` section layout understood by
//! [`super::parser::parse`].

use crate::model::{Field, FieldKind, Translatable, UnitKind};

/// Block fields longer than this are cut in critique prompts.
pub const CRITIQUE_EXCERPT_CHARS: usize = 1500;

const TECH_TERMS: &str = "machine learning, deep learning, GPU, CUDA, kernel, API, pipeline, \
workflow, frontend, backend, framework, build, cache, deploy, debug, commit, pull request, \
merge, branch, benchmark, throughput, latency, batch size, checkpoint, tensor, training loop";

fn rules(kind: UnitKind) -> Vec<&'static str> {
    let mut rules = vec![
        "Write as a bilingual Brazilian engineer would naturally write, in Brazilian (not European) Portuguese",
        "Mirror the original tone; do not embellish, simplify, or editorialize",
        "Use Brazilian idioms: \"I'm Daniel\" = \"Me chamo Daniel\" (not \"Eu sou Daniel\")",
    ];

    match kind {
        UnitKind::Post => {
            rules.push("Keep established technical terms in English (see list below)");
            rules.push("Preserve ALL Markdown syntax, code blocks, links, and formatting EXACTLY");
            rules.push("Never translate code, variable names, file paths, or commands");
        }
        UnitKind::About => {
            rules.push("Keep job titles, company names, and proper nouns in the original language");
            rules.push("Keep technical terms in English (see list below)");
        }
        UnitKind::Cv => {
            rules.push("Keep job titles, company names, and skill names in the original language");
            rules.push("Translate dates and periods naturally (\"Present\" = \"Atual\")");
        }
    }

    rules.push("Do NOT wrap English terms in asterisks, underscores, or quotes");
    rules.push("Do NOT add explanations, notes, or JSON blocks");
    rules.push("Output ONLY the sections below in the exact format shown");
    rules
}

fn push_rules(p: &mut String, kind: UnitKind) {
    p.push_str("TRANSLATION RULES:\n");
    for rule in rules(kind) {
        p.push_str("- ");
        p.push_str(rule);
        p.push('\n');
    }
    if kind != UnitKind::Cv {
        p.push_str("- Technical terms to keep in English: ");
        p.push_str(TECH_TERMS);
        p.push('\n');
    }
    p.push('\n');
}

fn push_labelled(p: &mut String, fields: &[Field], limit: Option<usize>) {
    for f in fields {
        let text = match (f.kind, limit) {
            (FieldKind::Block, Some(n)) => truncate(&f.text, n),
            _ => f.text.clone(),
        };
        match f.kind {
            FieldKind::Block => p.push_str(&format!("{}:\n{}\n\n", f.label, text.trim_end())),
            _ => p.push_str(&format!("{}: {}\n", f.label, text)),
        }
    }
    p.push('\n');
}

fn push_output_format(p: &mut String, fields: &[Field]) {
    p.push_str("OUTPUT FORMAT (provide ONLY these sections, nothing else):\n");
    for f in fields {
        let hint = match f.kind {
            FieldKind::List => format!("[comma-separated translated {}]", f.label.to_lowercase()),
            FieldKind::Block => format!("[full translated {}]", f.label.to_lowercase()),
            FieldKind::Line => format!("[translated {}]", f.label.to_lowercase()),
        };
        p.push_str(&format!("{}:\n{}\n", f.marker, hint));
    }
}

/// Stage 1: initial translation.
pub fn translate<T: Translatable>(original: &T) -> String {
    let fields = original.fields();
    let mut p = format!(
        "Translate this {} from English to natural Brazilian Portuguese.\n\n",
        T::KIND.describe()
    );
    push_rules(&mut p, T::KIND);
    p.push_str("INPUT:\n");
    push_labelled(&mut p, &fields, None);
    push_output_format(&mut p, &fields);
    p
}

/// Stage 2: review a candidate translation against the original.
pub fn critique<T: Translatable>(original: &T, candidate: &T) -> String {
    let mut p = format!(
        "Compare the English original with the Portuguese translation of this {}.\n\
         Check if they convey the same ideas, tone, and meaning.\n\n",
        T::KIND.describe()
    );

    p.push_str("ORIGINAL ENGLISH:\n");
    push_labelled(&mut p, &original.fields(), Some(CRITIQUE_EXCERPT_CHARS));

    p.push_str("PORTUGUESE TRANSLATION:\n");
    push_labelled(&mut p, &candidate.fields(), Some(CRITIQUE_EXCERPT_CHARS));

    p.push_str(
        "If the translation is semantically aligned and sounds natural, respond exactly:\n\
         OK\n\n\
         If there are issues (wrong meaning, unnatural phrasing, missing content, wrong tone, \
         broken formatting), respond:\n\
         FEEDBACK: [specific issues to fix]\n\n\
         Your response:",
    );
    p
}

/// Stage 3: apply critique feedback to a candidate.
pub fn refine<T: Translatable>(original: &T, candidate: &T, feedback: &str) -> String {
    let mut p = format!(
        "Improve this Portuguese translation of a {} based on reviewer feedback.\n\n",
        T::KIND.describe()
    );

    p.push_str("ORIGINAL ENGLISH:\n");
    push_labelled(&mut p, &original.fields(), None);

    p.push_str("CURRENT TRANSLATION:\n");
    push_labelled(&mut p, &candidate.fields(), None);

    p.push_str("FEEDBACK:\n");
    p.push_str(feedback.trim());
    p.push_str("\n\nApply the feedback while keeping natural Brazilian Portuguese.\n\n");

    push_rules(&mut p, T::KIND);
    push_output_format(&mut p, &candidate.fields());
    p
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}
