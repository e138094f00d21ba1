//! Markdown → HTML for post bodies.
//!
//! Posts are translated as raw markdown, so the same renderer runs on both
//! languages after translation.

use pulldown_cmark::{html::push_html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

pub fn render_markdown(content: &str) -> String {
    let parser = Parser::new_ext(content, options());
    let events = anchor_headings(parser);

    let mut html = String::with_capacity(content.len() * 2);
    push_html(&mut html, events.into_iter());
    html
}

/// Give h2..h6 an `id` built from their text so sections can be linked.
///
/// h1 is left alone; the post title is the page's only h1.
fn anchor_headings<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut open: Option<usize> = None;
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) if level != HeadingLevel::H1 && id.is_none() => {
                open = Some(events.len());
                text.clear();
                events.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(start) = open.take() {
                    let slug = slugify(&text);
                    if !slug.is_empty() {
                        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
                            *id = Some(CowStr::from(slug));
                        }
                    }
                }
                events.push(Event::End(TagEnd::Heading(level)));
            }
            Event::Text(t) if open.is_some() => {
                text.push_str(&t);
                events.push(Event::Text(t));
            }
            Event::Code(c) if open.is_some() => {
                text.push_str(&c);
                events.push(Event::Code(c));
            }
            other => events.push(other),
        }
    }

    events
}

/// Lower-case, alphanumeric runs joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    slug
}
