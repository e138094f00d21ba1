use serde::Deserialize;

use crate::model::unit::split_list;

/// `tags:` accepts a YAML list or a comma-separated string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Tags {
    List(Vec<String>),
    Csv(String),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::List(Vec::new())
    }
}

impl Tags {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Tags::List(items) => items
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Tags::Csv(s) => split_list(&s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Tags,
    pub slug: Option<String>,
    pub order: i64,
    #[serde(rename = "readingTime")]
    pub reading_time: Option<String>,
}

/// Split a leading `---` YAML block from the body.
///
/// Returns `None` when the text has no front matter block.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Parse front matter and return it with the markdown body.
///
/// Text without a front matter block is all body.
pub fn parse(text: &str) -> Result<(FrontMatter, &str), String> {
    let Some((yaml, body)) = split(text) else {
        return Ok((FrontMatter::default(), text));
    };

    if yaml.trim().is_empty() {
        return Ok((FrontMatter::default(), body));
    }

    let fm: FrontMatter = serde_yaml_ng::from_str(yaml).map_err(|e| e.to_string())?;
    Ok((fm, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_front_matter() {
        let text = "---\n\
                    title: Hello\n\
                    date: 2024-01-15\n\
                    excerpt: A first post\n\
                    tags: [gpu, cuda]\n\
                    slug: my-post\n\
                    order: 2\n\
                    readingTime: 4 min read\n\
                    ---\n\
                    # Body\n";
        let (fm, body) = parse(text).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.date.as_deref(), Some("2024-01-15"));
        assert_eq!(fm.slug.as_deref(), Some("my-post"));
        assert_eq!(fm.order, 2);
        assert_eq!(fm.reading_time.as_deref(), Some("4 min read"));
        assert_eq!(fm.tags.into_vec(), vec!["gpu".to_string(), "cuda".to_string()]);
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn tags_may_be_comma_separated() {
        let (fm, _) = parse("---\ntags: gpu, cuda ,  ml\n---\nx").unwrap();
        assert_eq!(
            fm.tags.into_vec(),
            vec!["gpu".to_string(), "cuda".to_string(), "ml".to_string()]
        );
    }

    #[test]
    fn no_front_matter_is_all_body() {
        let (fm, body) = parse("# Just markdown\n").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "# Just markdown\n");
    }

    #[test]
    fn crlf_and_empty_blocks() {
        let (fm, body) = parse("---\r\ntitle: Win\r\n---\r\nbody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Win"));
        assert_eq!(body, "body");

        let (fm, body) = parse("---\n---\nbody").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "body");
    }

    #[test]
    fn unterminated_block_is_body() {
        assert_eq!(split("---\ntitle: x\n"), None);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(parse("---\ntitle: [unclosed\n---\n").is_err());
    }
}
