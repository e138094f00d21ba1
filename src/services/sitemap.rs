use std::fmt::{self, Write};

use maud::Render;

use crate::config::{Lang, SiteConfig};
use crate::model::Post;

fn escape(s: &str) -> String {
    s.render().into_string()
}

/// Pages generated in both languages, relative to the language directory,
/// each with an optional `lastmod` date.
pub fn pages(posts: &[Post]) -> Vec<(String, Option<String>)> {
    let mut pages = vec![
        ("index.html".to_string(), None),
        ("about.html".to_string(), None),
        ("cv.html".to_string(), None),
    ];
    for post in posts {
        let lastmod = post
            .updated_at
            .get(..10)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        pages.push((format!("blog/{}.html", post.slug), lastmod));
    }
    pages
}

pub fn sitemap(cfg: &SiteConfig, posts: &[Post]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" \
         xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
    );

    for (page, lastmod) in pages(posts) {
        for lang in Lang::ALL {
            // Writing into a String cannot fail.
            let _ = write_url(&mut xml, cfg, lang, &page, lastmod.as_deref());
        }
    }

    xml.push_str("</urlset>\n");
    xml
}

fn write_url(
    xml: &mut String,
    cfg: &SiteConfig,
    lang: Lang,
    page: &str,
    lastmod: Option<&str>,
) -> fmt::Result {
    writeln!(xml, "  <url>")?;
    writeln!(xml, "    <loc>{}</loc>", escape(&cfg.absolute(lang, page)))?;
    if let Some(date) = lastmod {
        writeln!(xml, "    <lastmod>{}</lastmod>", escape(date))?;
    }
    for alt in Lang::ALL {
        writeln!(
            xml,
            "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>",
            escape(&cfg.language(alt).code),
            escape(&cfg.absolute(alt, page)),
        )?;
    }
    writeln!(xml, "  </url>")
}
