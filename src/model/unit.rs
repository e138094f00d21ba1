use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};

/// How a section of a model reply is joined back into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line scalar (title, excerpt). Buffered lines join with spaces.
    Line,
    /// Multi-line body (markdown, paragraphs). Buffered lines join with `\n`.
    Block,
    /// Comma-separated list (tags).
    List,
}

/// The kinds of content that go through the translation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Post,
    About,
    Cv,
}

impl UnitKind {
    pub fn describe(self) -> &'static str {
        match self {
            UnitKind::Post => "technical blog post",
            UnitKind::About => "About page",
            UnitKind::Cv => "CV (résumé) page",
        }
    }
}

/// One translatable field of a unit, in prompt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// ALL-CAPS section marker, without the trailing colon.
    pub marker: String,
    /// Human label used in the INPUT part of prompts.
    pub label: String,
    pub kind: FieldKind,
    /// Field value; list fields are comma-joined.
    pub text: String,
}

impl Field {
    pub fn new(
        marker: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            label: label.into(),
            kind,
            text: text.into(),
        }
    }

    pub fn list(marker: impl Into<String>, label: impl Into<String>, items: &[String]) -> Self {
        Self::new(marker, label, FieldKind::List, items.join(", "))
    }
}

/// Sections a model reply actually provided, keyed by marker.
///
/// Anything absent here was not translated and keeps its fallback value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    sections: BTreeMap<String, String>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: impl Into<String>, text: impl Into<String>) {
        self.sections.insert(marker.into(), text.into());
    }

    pub fn text(&self, marker: &str) -> Option<&str> {
        self.sections.get(marker).map(String::as_str)
    }

    pub fn list(&self, marker: &str) -> Option<Vec<String>> {
        self.text(marker)
            .map(split_list)
            .filter(|items| !items.is_empty())
    }

    /// Overwrite `slot` when the reply provided this marker.
    pub fn apply_text(&self, marker: &str, slot: &mut String) {
        if let Some(t) = self.text(marker) {
            *slot = t.to_string();
        }
    }

    pub fn apply_list(&self, marker: &str, slot: &mut Vec<String>) {
        if let Some(items) = self.list(marker) {
            *slot = items;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A group of fields translated, cached and fingerprinted together.
pub trait Translatable: Clone + Serialize + DeserializeOwned {
    const KIND: UnitKind;

    /// Translatable fields in a stable order. The order is part of the
    /// fingerprint.
    fn fields(&self) -> Vec<Field>;

    /// Copy of `self` with every field the overlay provides replaced.
    fn apply(&self, overlay: &Overlay) -> Self;

    /// Markers of fields that are non-empty in `original` but empty here.
    fn missing_fields(&self, original: &Self) -> Vec<String> {
        let ours = self.fields();
        let theirs = original.fields();

        if ours.len() != theirs.len() {
            return theirs.into_iter().map(|f| f.marker).collect();
        }

        ours.into_iter()
            .zip(theirs)
            .filter(|(mine, orig)| !orig.text.trim().is_empty() && mine.text.trim().is_empty())
            .map(|(_, orig)| orig.marker)
            .collect()
    }

    fn is_complete(&self, original: &Self) -> bool {
        self.missing_fields(original).is_empty()
    }

    fn fingerprint_fields(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .flat_map(|f| [f.marker, f.text])
            .collect()
    }
}
