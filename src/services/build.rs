//! One full site build: load, translate, render, write.

use std::{
    collections::HashSet,
    fmt, fs,
    path::Path,
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::metadata::{MetadataStore, METADATA_FILE};
use super::posts::{load_posts, sort_newest_first};
use super::qa;
use super::render;
use super::sitemap::sitemap;
use super::translation::hash::fingerprint;
use super::translation::store::CACHE_FILE;
use super::translation::{
    Backend, Clock, Gateway, GeminiBackend, Lookup, RateLimiter, SystemClock, Translator,
    TranslationCache,
};
use crate::config::{cache_file, Lang, SiteConfig};
use crate::error::BuildError;
use crate::model::{AboutPage, Cv, Post, Translatable};

pub const ABOUT_KEY: &str = "about-page";
pub const CV_KEY: &str = "cv-page";

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Retranslate everything, ignoring cached entries.
    pub force: bool,
    /// Overrides the configured critique setting when set.
    pub critique: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub posts: usize,
    pub pages: usize,
    pub cached: usize,
    pub translated: usize,
    pub model_calls: u64,
    pub qa_issues: usize,
}

/// Build the site against the Gemini backend.
pub fn build(cfg: &SiteConfig, api_key: &str, opts: BuildOptions) -> Result<BuildReport, BuildError> {
    let backend = GeminiBackend::new(api_key, &cfg.translation.model)?;
    info!("translating with {}", backend.model());

    let limiter = RateLimiter::new(SystemClock, cfg.translation.min_interval());
    let gateway = Gateway::new(backend, limiter, cfg.translation.retry_policy());
    build_with(cfg, gateway, opts, Utc::now())
}

pub fn build_with<B: Backend, C: Clock>(
    cfg: &SiteConfig,
    gateway: Gateway<B, C>,
    opts: BuildOptions,
    now: DateTime<Utc>,
) -> Result<BuildReport, BuildError> {
    let mut posts = load_posts(&cfg.posts_dir)?;
    check_slugs(&posts)?;

    let mut meta = MetadataStore::load(cache_file(cfg, METADATA_FILE));
    for post in posts.iter_mut() {
        let stamp = meta.stamp(&post.slug, &post.fields.content, now);
        post.created_at = stamp.created_at;
        post.updated_at = stamp.updated_at;
    }

    let cache = TranslationCache::load(cache_file(cfg, CACHE_FILE));
    let mut translator = Translator::new(gateway, cache)
        .with_critique(opts.critique.unwrap_or(cfg.translation.critique))
        .with_force(opts.force);

    let mut report = BuildReport {
        posts: posts.len(),
        ..BuildReport::default()
    };

    let about_pt = translate_unit(&mut translator, &mut report, ABOUT_KEY, &cfg.about)?;
    let cv_pt = translate_unit(&mut translator, &mut report, CV_KEY, &cfg.cv)?;

    let mut issues = Vec::new();
    let mut posts_pt = Vec::with_capacity(posts.len());
    for post in &posts {
        let fields = translate_unit(&mut translator, &mut report, &post.slug, &post.fields)?;
        issues.extend(qa::check_post(&post.slug, &post.fields, &fields));
        posts_pt.push(post.with_fields(fields));
    }
    qa::report(&issues);
    report.qa_issues = issues.len();
    report.model_calls = translator.gateway().calls();

    // Stamps are kept only for builds whose translations all succeeded.
    meta.save()?;

    sort_newest_first(&mut posts);
    sort_newest_first(&mut posts_pt);

    let out = &cfg.output_dir;
    let sites = [
        SiteContent {
            lang: Lang::En,
            posts: &posts,
            about: &cfg.about,
            cv: &cfg.cv,
        },
        SiteContent {
            lang: Lang::Pt,
            posts: &posts_pt,
            about: &about_pt,
            cv: &cv_pt,
        },
    ];
    for site in &sites {
        report.pages += write_language(cfg, out, site)?;
    }

    write_page(out, "landing.html", &render::landing_page(cfg))?;
    write_page(out, "index.html", &render::root_redirect(cfg))?;
    write_page(out, "sitemap.xml", &sitemap(cfg, &posts))?;
    report.pages += 2;

    info!(
        "built {} post(s), {} page(s) in {} ({} cached, {} translated, {} model call(s))",
        report.posts,
        report.pages,
        out.display(),
        report.cached,
        report.translated,
        report.model_calls
    );

    Ok(report)
}

/// Everything rendered for one language.
struct SiteContent<'a> {
    lang: Lang,
    posts: &'a [Post],
    about: &'a AboutPage,
    cv: &'a Cv,
}

/// Write one language tree; returns the number of pages written.
fn write_language(cfg: &SiteConfig, out: &Path, site: &SiteContent<'_>) -> Result<usize, BuildError> {
    let dir = out.join(&cfg.language(site.lang).dir);

    for post in site.posts {
        let rel = format!("blog/{}.html", post.slug);
        write_page(&dir, &rel, &render::post_page(cfg, site.lang, post))?;
    }
    write_page(&dir, "index.html", &render::index_page(cfg, site.lang, site.posts))?;
    write_page(&dir, "about.html", &render::about_page(cfg, site.lang, site.about))?;
    write_page(&dir, "cv.html", &render::cv_page(cfg, site.lang, site.cv))?;

    info!("wrote {} ({} posts)", dir.display(), site.posts.len());
    Ok(site.posts.len() + 3)
}

fn has_content<T: Translatable>(unit: &T) -> bool {
    unit.fields().iter().any(|f| !f.text.trim().is_empty())
}

fn translate_unit<T: Translatable, B: Backend, C: Clock>(
    translator: &mut Translator<B, C>,
    report: &mut BuildReport,
    key: &str,
    original: &T,
) -> Result<T, BuildError> {
    if !has_content(original) {
        debug!("{key}: nothing to translate");
        return Ok(original.clone());
    }

    let done = translator.translate(key, original)?;
    if done.outcome.is_cached() {
        report.cached += 1;
    } else {
        report.translated += 1;
    }
    Ok(done.value)
}

fn check_slugs(posts: &[Post]) -> Result<(), BuildError> {
    let mut seen: HashSet<&str> = HashSet::from([ABOUT_KEY, CV_KEY]);
    for post in posts {
        if !seen.insert(post.slug.as_str()) {
            return Err(BuildError::DuplicateSlug(post.slug.clone()));
        }
    }
    Ok(())
}

fn write_page(dir: &Path, rel: &str, content: &str) -> Result<(), BuildError> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(&path, content).map_err(|e| BuildError::io(&path, e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Cache state of one translation unit, without calling the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Fresh,
    Missing,
    Stale,
    Unreadable,
    Incomplete(Vec<String>),
    /// Nothing to translate.
    Empty,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Fresh => write!(f, "fresh"),
            CacheState::Missing => write!(f, "missing"),
            CacheState::Stale => write!(f, "stale"),
            CacheState::Unreadable => write!(f, "unreadable"),
            CacheState::Incomplete(fields) => write!(f, "incomplete ({})", fields.join(", ")),
            CacheState::Empty => write!(f, "empty"),
        }
    }
}

fn state_of<T: Translatable>(cache: &TranslationCache, key: &str, original: &T) -> CacheState {
    if !has_content(original) {
        return CacheState::Empty;
    }

    let fp = fingerprint(&original.fingerprint_fields());
    match cache.lookup(key, &fp, original) {
        Lookup::Hit(_) => CacheState::Fresh,
        Lookup::Absent => CacheState::Missing,
        Lookup::Stale => CacheState::Stale,
        Lookup::Unreadable => CacheState::Unreadable,
        Lookup::Incomplete(fields) => CacheState::Incomplete(fields),
    }
}

/// Cache state of every unit a build would translate, in build order.
pub fn cache_status(cfg: &SiteConfig) -> Result<Vec<(String, CacheState)>, BuildError> {
    let posts = load_posts(&cfg.posts_dir)?;
    let cache = TranslationCache::load(cache_file(cfg, CACHE_FILE));

    let mut states = vec![
        (ABOUT_KEY.to_string(), state_of::<AboutPage>(&cache, ABOUT_KEY, &cfg.about)),
        (CV_KEY.to_string(), state_of::<Cv>(&cache, CV_KEY, &cfg.cv)),
    ];
    for post in &posts {
        states.push((post.slug.clone(), state_of(&cache, &post.slug, &post.fields)));
    }
    Ok(states)
}
