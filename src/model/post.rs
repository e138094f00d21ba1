use serde::{Deserialize, Serialize};

use super::unit::{Field, FieldKind, Overlay, Translatable, UnitKind};

/// The translatable part of a blog post.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PostFields {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub excerpt: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Raw markdown body.
    #[serde(default)]
    pub content: String,
}

impl Translatable for PostFields {
    const KIND: UnitKind = UnitKind::Post;

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("TITLE", "Title", FieldKind::Line, &self.title),
            Field::new("EXCERPT", "Excerpt", FieldKind::Line, &self.excerpt),
            Field::list("TAGS", "Tags", &self.tags),
            Field::new("CONTENT", "Content", FieldKind::Block, &self.content),
        ]
    }

    fn apply(&self, overlay: &Overlay) -> Self {
        let mut out = self.clone();
        overlay.apply_text("TITLE", &mut out.title);
        overlay.apply_text("EXCERPT", &mut out.excerpt);
        overlay.apply_list("TAGS", &mut out.tags);
        overlay.apply_text("CONTENT", &mut out.content);
        out
    }
}

/// A post as loaded from disk, in one language.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Post {
    pub slug: String,

    /// Publication date as written in front matter (`YYYY-MM-DD`).
    pub date: String,

    #[serde(default)]
    pub order: i64,

    /// `readingTime` from front matter, shown verbatim when present.
    #[serde(default)]
    pub reading_time: Option<String>,

    /// Estimated from the English body; shared by both languages.
    #[serde(default)]
    pub reading_minutes: usize,

    /// RFC 3339 timestamps from the post metadata store.
    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,

    pub fields: PostFields,
}

impl Post {
    /// Same post with translated fields swapped in.
    pub fn with_fields(&self, fields: PostFields) -> Self {
        Post {
            fields,
            ..self.clone()
        }
    }
}

/// Minutes at 200 words per minute, never less than one.
pub fn reading_minutes(words: usize) -> usize {
    ((words as f64 / 200.0).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PostFields {
        PostFields {
            title: "Hello".into(),
            excerpt: "A post".into(),
            tags: vec!["gpu".into(), "cuda".into()],
            content: "Body".into(),
        }
    }

    #[test]
    fn apply_keeps_fields_missing_from_overlay() {
        let mut overlay = Overlay::new();
        overlay.insert("TITLE", "Olá");

        let out = sample().apply(&overlay);
        assert_eq!(out.title, "Olá");
        assert_eq!(out.tags, sample().tags);
        assert_eq!(out.content, "Body");
    }

    #[test]
    fn empty_excerpt_in_original_is_not_required() {
        let original = PostFields {
            excerpt: String::new(),
            ..sample()
        };
        let translated = PostFields {
            title: "Olá".into(),
            excerpt: String::new(),
            tags: vec![],
            content: "Corpo".into(),
        };
        assert_eq!(translated.missing_fields(&original), vec!["TAGS".to_string()]);
    }

    #[test]
    fn reading_time_rounds_and_floors_at_one() {
        assert_eq!(reading_minutes(0), 1);
        assert_eq!(reading_minutes(299), 1);
        assert_eq!(reading_minutes(300), 2);
        assert_eq!(reading_minutes(1000), 5);
    }

    #[test]
    fn blank_title_is_incomplete() {
        let translated = PostFields {
            title: "   ".into(),
            ..sample()
        };
        assert!(!translated.is_complete(&sample()));
    }
}
