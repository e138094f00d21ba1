use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::{debug, info, warn};

use super::encoding;
use crate::error::BuildError;
use crate::model::post::reading_minutes;
use crate::model::{Post, PostFields};
use crate::parsers::frontmatter;

/// `*.md` files directly under `dir`, in file-name order.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let rd = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in rd {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if is_md && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn load_post(path: &Path) -> Result<Post, BuildError> {
    let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let decoded = encoding::decode(&bytes);
    if decoded.had_errors {
        warn!("{}: invalid bytes replaced while decoding", path.display());
    }

    let (fm, body) = frontmatter::parse(&decoded.text).map_err(|message| {
        BuildError::FrontMatter {
            path: path.to_path_buf(),
            message,
        }
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let slug = fm
        .slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(stem);

    let date = fm
        .date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

    let content = body.trim().to_string();
    let words = content.split_whitespace().count();

    Ok(Post {
        slug,
        date,
        order: fm.order,
        reading_time: fm.reading_time.filter(|r| !r.trim().is_empty()),
        reading_minutes: reading_minutes(words),
        created_at: String::new(),
        updated_at: String::new(),
        fields: PostFields {
            title: fm
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled Post".to_string()),
            excerpt: fm.excerpt.unwrap_or_default(),
            tags: fm.tags.into_vec(),
            content,
        },
    })
}

/// Load every post under `dir`. An empty directory is an error.
pub fn load_posts(dir: &Path) -> Result<Vec<Post>, BuildError> {
    let files = markdown_files(dir)?;
    if files.is_empty() {
        return Err(BuildError::NoPosts(dir.to_path_buf()));
    }

    info!("found {} markdown file(s) in {}", files.len(), dir.display());

    let mut posts = Vec::with_capacity(files.len());
    for path in files {
        let post = load_post(&path)?;
        debug!("parsed {} as {}", path.display(), post.slug);
        posts.push(post);
    }

    Ok(posts)
}

/// Newest `created_at` first; ties fall back to slug order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}
