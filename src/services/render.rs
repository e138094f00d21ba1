//! HTML layouts for every generated page.

use chrono::{DateTime, Datelike, NaiveDate};
use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::markdown::render_markdown;
use crate::config::{Lang, Language, SiteConfig};
use crate::model::{AboutPage, Cv, Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nav {
    Blog,
    About,
    Cv,
}

/// Shared page chrome.
struct Page<'a> {
    cfg: &'a SiteConfig,
    lang: Lang,
    /// Path relative to the language directory, e.g. `blog/my-post.html`.
    path: &'a str,
    title: String,
    description: &'a str,
    nav: Option<Nav>,
}

impl Page<'_> {
    fn language(&self) -> &Language {
        self.cfg.language(self.lang)
    }

    fn wrap(&self, body: Markup) -> String {
        let cfg = self.cfg;
        let lang = self.language();
        let other = self.lang.other();
        let ui = &lang.ui;

        let markup = html! {
            (DOCTYPE)
            html lang=(lang.code) {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (self.title) }
                    meta name="description" content=(self.description);
                    meta property="og:title" content=(self.title);
                    meta property="og:url" content=(cfg.absolute(self.lang, self.path));
                    link rel="canonical" href=(cfg.absolute(self.lang, self.path));
                    @for l in Lang::ALL {
                        link rel="alternate"
                            hreflang=(cfg.language(l).code)
                            href=(cfg.absolute(l, self.path));
                    }
                    link rel="stylesheet" href=(cfg.root_link("static/css/style.css"));
                }
                body {
                    header class="site-header" {
                        a class="logo" href=(cfg.link(self.lang, "index.html")) { (cfg.site.name) }
                        nav {
                            ul {
                                li { a class=[self.active(Nav::Blog)] href=(cfg.link(self.lang, "index.html")) { (ui.blog) } }
                                li { a class=[self.active(Nav::About)] href=(cfg.link(self.lang, "about.html")) { (ui.about) } }
                                li { a class=[self.active(Nav::Cv)] href=(cfg.link(self.lang, "cv.html")) { (ui.cv) } }
                            }
                        }
                        a class="lang-toggle"
                            href=(cfg.link(other, self.path))
                            hreflang=(cfg.language(other).code)
                            aria-label=(format!("{} ({})", cfg.language(other).name, lang.name)) {
                            (cfg.language(other).label)
                        }
                    }
                    main { (body) }
                    footer class="site-footer" {
                        @if !cfg.site.author.is_empty() {
                            p { "© " (cfg.site.author) }
                        }
                    }
                }
            }
        };
        markup.into_string()
    }

    fn active(&self, nav: Nav) -> Option<&'static str> {
        (self.nav == Some(nav)).then_some("active")
    }
}

/// `YYYY-MM-DD` as `March 05, 2024` in the page language. Unparseable
/// dates are shown as written.
pub fn format_date(lang: &Language, date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(d) => format!("{} {:02}, {}", lang.month(d.month()), d.day(), d.year()),
        Err(_) => date.to_string(),
    }
}

/// RFC 3339 timestamp as a localized date.
pub fn format_timestamp(lang: &Language, ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => format!("{} {:02}, {}", lang.month(dt.month()), dt.day(), dt.year()),
        Err(_) => ts.to_string(),
    }
}

fn reading_time(lang: &Language, post: &Post) -> String {
    match &post.reading_time {
        Some(custom) => custom.clone(),
        None => format!("{} {}", post.reading_minutes, lang.ui.min_read),
    }
}

fn tag_list(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            div class="post-tags" {
                @for tag in tags {
                    span class="tag" { (tag) }
                }
            }
        }
    }
}

pub fn post_page(cfg: &SiteConfig, lang: Lang, post: &Post) -> String {
    let path = format!("blog/{}.html", post.slug);
    let page = Page {
        cfg,
        lang,
        path: &path,
        title: format!("{} | {}", post.fields.title, cfg.site.name),
        description: &post.fields.excerpt,
        nav: Some(Nav::Blog),
    };
    let language = page.language();
    let edited = !post.updated_at.is_empty() && post.updated_at != post.created_at;

    page.wrap(html! {
        article class="post" {
            a class="back-link" href=(cfg.link(lang, "index.html")) { (language.ui.back_to_blog) }
            header class="post-header" {
                h1 class="post-title" { (post.fields.title) }
                div class="post-meta" {
                    time datetime=(post.date) { (format_date(language, &post.date)) }
                    span class="post-reading-time" { (reading_time(language, post)) }
                }
                @if edited {
                    div class="last-updated" {
                        (language.ui.last_updated) ": " (format_timestamp(language, &post.updated_at))
                    }
                }
                (tag_list(&post.fields.tags))
            }
            div class="post-content" {
                (PreEscaped(render_markdown(&post.fields.content)))
            }
        }
    })
}

pub fn index_page(cfg: &SiteConfig, lang: Lang, posts: &[Post]) -> String {
    let page = Page {
        cfg,
        lang,
        path: "index.html",
        title: cfg.site.name.clone(),
        description: &cfg.site.description,
        nav: Some(Nav::Blog),
    };
    let language = page.language();

    page.wrap(html! {
        section class="posts" {
            h1 { (language.ui.latest_posts) }
            @for (i, post) in posts.iter().enumerate() {
                article class="post-card" data-number=(i + 1) {
                    h2 class="post-card-title" {
                        a href=(cfg.link(lang, &format!("blog/{}.html", post.slug))) { (post.fields.title) }
                    }
                    div class="post-meta" {
                        time datetime=(post.date) { (format_date(language, &post.date)) }
                        span class="post-reading-time" { (reading_time(language, post)) }
                    }
                    @if !post.fields.excerpt.is_empty() {
                        p class="post-excerpt" { (post.fields.excerpt) }
                    }
                    (tag_list(&post.fields.tags))
                }
            }
        }
    })
}

pub fn about_page(cfg: &SiteConfig, lang: Lang, about: &AboutPage) -> String {
    let page = Page {
        cfg,
        lang,
        path: "about.html",
        title: format!("{} | {}", about.title, cfg.site.name),
        description: &cfg.site.description,
        nav: Some(Nav::About),
    };

    page.wrap(html! {
        article class="post about" {
            h1 class="post-title" { (about.title) }
            @for para in &about.paragraphs {
                p { (para) }
            }
        }
    })
}

pub fn cv_page(cfg: &SiteConfig, lang: Lang, cv: &Cv) -> String {
    let page = Page {
        cfg,
        lang,
        path: "cv.html",
        title: format!("{} | {}", cv.title, cfg.site.name),
        description: &cv.tagline,
        nav: Some(Nav::Cv),
    };
    let ui = &page.language().ui;

    page.wrap(html! {
        article class="post cv" {
            header class="cv-header" {
                h1 class="post-title" { (cv.title) }
                @if !cv.tagline.is_empty() {
                    p class="cv-tagline" { (cv.tagline) }
                }
            }
            @if !cv.experience.is_empty() {
                section class="cv-section" {
                    h2 { (ui.experience) }
                    @for exp in &cv.experience {
                        div class="cv-experience-item" {
                            div class="cv-period" { (exp.period) }
                            div class="cv-details" {
                                h3 class="cv-title" { (exp.title) }
                                div class="cv-company" {
                                    (exp.company)
                                    @if !exp.location.is_empty() { " · " (exp.location) }
                                }
                                p class="cv-description" { (exp.description) }
                            }
                        }
                    }
                }
            }
            @if !cv.skills.is_empty() {
                section class="cv-section" {
                    h2 { (ui.skills) }
                    @for group in &cv.skills {
                        div class="cv-skill-category" {
                            span class="cv-skill-label" { (group.category) }
                            span class="cv-skill-items" { (group.items.join(", ")) }
                        }
                    }
                }
            }
            @if !cv.education.is_empty() {
                section class="cv-section" {
                    h2 { (ui.education) }
                    p { (cv.education) }
                }
            }
            @if !cv.contact.github.is_empty() || !cv.contact.linkedin.is_empty() {
                section class="cv-contact" {
                    @if !cv.contact.github.is_empty() {
                        a href=(cv.contact.github) { "GitHub" }
                    }
                    @if !cv.contact.linkedin.is_empty() {
                        a href=(cv.contact.linkedin) { "LinkedIn" }
                    }
                }
            }
        }
    })
}

/// Entry page with links into the English site.
pub fn landing_page(cfg: &SiteConfig) -> String {
    let ui = &cfg.language(Lang::En).ui;
    html! {
        (DOCTYPE)
        html lang=(cfg.language(Lang::En).code) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (cfg.site.name) }
                meta name="description" content=(cfg.site.description);
                link rel="stylesheet" href=(cfg.root_link("static/css/style.css"));
            }
            body class="landing" {
                main class="landing-content" {
                    h1 class="landing-title" { (cfg.site.name) }
                    nav class="landing-links" {
                        a class="landing-link" href=(cfg.link(Lang::En, "index.html")) { (ui.blog) }
                        a class="landing-link" href=(cfg.link(Lang::En, "about.html")) { (ui.about) }
                        a class="landing-link" href=(cfg.link(Lang::En, "cv.html")) { (ui.cv) }
                    }
                }
            }
        }
    }
    .into_string()
}

/// Site root: redirects to the landing page.
pub fn root_redirect(cfg: &SiteConfig) -> String {
    let target = cfg.root_link("landing.html");
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta http-equiv="refresh" content=(format!("0; url={target}"));
                link rel="canonical" href=(target);
                title { (cfg.site.name) }
            }
            body {
                a href=(target) { (cfg.site.name) }
            }
        }
    }
    .into_string()
}
