use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::model::{AboutPage, Cv};
use crate::services::translation::gemini::DEFAULT_MODEL;
use crate::services::translation::RetryPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "site.json";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";

/// The two languages every page is generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Pt,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Pt];

    pub fn other(self) -> Lang {
        match self {
            Lang::En => Lang::Pt,
            Lang::Pt => Lang::En,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
    /// Absolute origin used for canonical links and the sitemap.
    pub url: String,
    /// Path prefix for every generated link, e.g. `/blog`. Empty for root.
    pub base_path: String,
    pub author: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "ponte".into(),
            description: "A bilingual technical blog.".into(),
            url: "http://localhost:8000".into(),
            base_path: String::new(),
            author: String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UiStrings {
    pub latest_posts: String,
    pub blog: String,
    pub about: String,
    pub cv: String,
    pub back_to_blog: String,
    pub last_updated: String,
    pub min_read: String,
    pub experience: String,
    pub skills: String,
    pub education: String,
}

impl UiStrings {
    fn english() -> Self {
        Self {
            latest_posts: "Latest Posts".into(),
            blog: "BLOG".into(),
            about: "ABOUT".into(),
            cv: "CV".into(),
            back_to_blog: "← Back to Blog".into(),
            last_updated: "Last updated".into(),
            min_read: "min read".into(),
            experience: "Experience".into(),
            skills: "Skills".into(),
            education: "Education".into(),
        }
    }

    fn portuguese() -> Self {
        Self {
            latest_posts: "Posts Recentes".into(),
            blog: "BLOG".into(),
            about: "SOBRE".into(),
            cv: "CV".into(),
            back_to_blog: "← Voltar ao Blog".into(),
            last_updated: "Última atualização".into(),
            min_read: "min de leitura".into(),
            experience: "Experiência".into(),
            skills: "Habilidades".into(),
            education: "Formação".into(),
        }
    }
}

impl Default for UiStrings {
    fn default() -> Self {
        Self::english()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Language {
    /// `lang` attribute / hreflang value.
    pub code: String,
    /// Output directory under the site root.
    pub dir: String,
    /// Toggle label.
    pub label: String,
    pub name: String,
    pub ui: UiStrings,
    /// January through December.
    pub months: Vec<String>,
}

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const PT_MONTHS: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

impl Language {
    pub fn english() -> Self {
        Self {
            code: "en".into(),
            dir: "en".into(),
            label: "EN".into(),
            name: "English".into(),
            ui: UiStrings::english(),
            months: EN_MONTHS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn portuguese() -> Self {
        Self {
            code: "pt-BR".into(),
            dir: "pt".into(),
            label: "PT".into(),
            name: "Português".into(),
            ui: UiStrings::portuguese(),
            months: PT_MONTHS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Localized month name for `month` in 1..=12.
    pub fn month(&self, month: u32) -> &str {
        let i = month.clamp(1, 12) as usize - 1;
        self.months
            .get(i)
            .map(String::as_str)
            .unwrap_or(EN_MONTHS[i])
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Languages {
    pub en: Language,
    pub pt: Language,
}

impl Default for Languages {
    fn default() -> Self {
        Self {
            en: Language::english(),
            pt: Language::portuguese(),
        }
    }
}

/// Gap between model calls; the free Gemini quota is a few calls a minute.
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TranslationSettings {
    pub model: String,
    pub min_interval_secs: u64,
    pub critique: bool,
    pub max_attempts: u32,
    pub transient_delay_secs: u64,
    pub quota_cooldown_secs: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            model: DEFAULT_MODEL.into(),
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            critique: true,
            max_attempts: policy.max_attempts,
            transient_delay_secs: policy.transient_delay.as_secs(),
            quota_cooldown_secs: policy.quota_cooldown.as_secs(),
        }
    }
}

impl TranslationSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            transient_delay: Duration::from_secs(self.transient_delay_secs),
            quota_cooldown: Duration::from_secs(self.quota_cooldown_secs),
        }
    }
}

/// Everything a build needs besides the API key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteInfo,
    pub posts_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub languages: Languages,
    /// English About page; the Portuguese one is translated.
    pub about: AboutPage,
    /// English CV; the Portuguese one is translated.
    pub cv: Cv,
    pub translation: TranslationSettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteInfo::default(),
            posts_dir: "posts".into(),
            output_dir: "public".into(),
            cache_dir: ".cache".into(),
            languages: Languages::default(),
            about: AboutPage {
                title: "ABOUT".into(),
                paragraphs: Vec::new(),
            },
            cv: Cv {
                title: "CV".into(),
                ..Cv::default()
            },
            translation: TranslationSettings::default(),
        }
    }
}

impl SiteConfig {
    /// Read `path`, or fall back to defaults when it does not exist.
    ///
    /// Relative directories are resolved against the config file's parent.
    /// `GEMINI_MODEL` overrides the configured model.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = if path.exists() {
            let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str::<SiteConfig>(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            info!("{} not found, using default site config", path.display());
            SiteConfig::default()
        };

        if let Some(root) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            cfg.resolve_paths(root);
        }

        if let Ok(model) = env::var(MODEL_VAR) {
            if !model.trim().is_empty() {
                cfg.translation.model = model.trim().to_string();
            }
        }

        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        for dir in [&mut self.posts_dir, &mut self.output_dir, &mut self.cache_dir] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
    }

    pub fn language(&self, lang: Lang) -> &Language {
        match lang {
            Lang::En => &self.languages.en,
            Lang::Pt => &self.languages.pt,
        }
    }

    /// Site-relative link, e.g. `/blog/pt/about.html`.
    pub fn link(&self, lang: Lang, page: &str) -> String {
        let base = self.site.base_path.trim_end_matches('/');
        format!("{}/{}/{}", base, self.language(lang).dir, page)
    }

    /// Absolute URL for canonical links and the sitemap.
    pub fn absolute(&self, lang: Lang, page: &str) -> String {
        format!("{}{}", self.site.url.trim_end_matches('/'), self.link(lang, page))
    }

    pub fn root_link(&self, page: &str) -> String {
        format!("{}/{}", self.site.base_path.trim_end_matches('/'), page)
    }
}

/// `GEMINI_API_KEY` from the environment (after `.env` is loaded).
pub fn api_key() -> Result<String, ConfigError> {
    match env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingApiKey),
    }
}

/// Path of a cache file inside the configured cache directory.
pub fn cache_file(cfg: &SiteConfig, name: &str) -> PathBuf {
    cfg.cache_dir.join(name)
}
