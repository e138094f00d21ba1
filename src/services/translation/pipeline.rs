use tracing::{debug, info, warn};

use super::gateway::{Backend, Gateway};
use super::hash::fingerprint;
use super::parser::{self, Verdict};
use super::prompt;
use super::rate_limit::{Clock, SystemClock};
use super::store::{Lookup, TranslationCache};
use crate::error::PipelineError;
use crate::model::Translatable;

/// How a translation was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache; no model calls.
    Cached,
    /// Initial translation only (critique disabled).
    Translated,
    /// The critic approved the initial translation, or could not be reached.
    Approved,
    /// Refined after reviewer feedback.
    Refined,
    /// Refinement failed or came back incomplete; initial translation kept.
    RefineFallback,
}

impl Outcome {
    pub fn is_cached(self) -> bool {
        self == Outcome::Cached
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translated<T> {
    pub value: T,
    pub outcome: Outcome,
}

/// Translate → critique → refine, backed by the translation cache.
pub struct Translator<B: Backend, C: Clock = SystemClock> {
    gateway: Gateway<B, C>,
    cache: TranslationCache,
    critique: bool,
    force: bool,
}

impl<B: Backend, C: Clock> Translator<B, C> {
    pub fn new(gateway: Gateway<B, C>, cache: TranslationCache) -> Self {
        Self {
            gateway,
            cache,
            critique: true,
            force: false,
        }
    }

    pub fn with_critique(mut self, enabled: bool) -> Self {
        self.critique = enabled;
        self
    }

    /// Skip cache lookups. Results are still written back.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn gateway(&self) -> &Gateway<B, C> {
        &self.gateway
    }

    pub fn translate<T: Translatable>(
        &mut self,
        key: &str,
        original: &T,
    ) -> Result<Translated<T>, PipelineError> {
        let fp = fingerprint(&original.fingerprint_fields());

        if !self.force {
            match self.cache.lookup(key, &fp, original) {
                Lookup::Hit(value) => {
                    debug!("{key}: cache hit");
                    return Ok(Translated {
                        value,
                        outcome: Outcome::Cached,
                    });
                }
                Lookup::Absent => debug!("{key}: not cached"),
                Lookup::Stale => info!("{key}: source changed, retranslating"),
                Lookup::Unreadable => warn!("{key}: cached entry unreadable, retranslating"),
                Lookup::Incomplete(missing) => {
                    warn!("{key}: cached entry missing {}, retranslating", missing.join(", "))
                }
            }
        }

        info!("{key}: translating {}", T::KIND.describe());
        let reply = self
            .gateway
            .call(&prompt::translate(original))
            .map_err(|source| PipelineError::Translate {
                key: key.to_string(),
                source,
            })?;
        let draft = parser::parse(&reply, original);

        let (value, outcome) = if self.critique {
            self.review(key, original, draft)
        } else {
            (draft, Outcome::Translated)
        };

        self.cache.put(key, &fp, &value)?;
        info!("{key}: done ({outcome:?})");

        Ok(Translated { value, outcome })
    }

    fn review<T: Translatable>(&mut self, key: &str, original: &T, draft: T) -> (T, Outcome) {
        let verdict = match self.gateway.call(&prompt::critique(original, &draft)) {
            Ok(reply) => parser::parse_verdict(&reply),
            Err(e) => {
                warn!("{key}: critique failed, keeping translation: {e}");
                return (draft, Outcome::Approved);
            }
        };

        let feedback = match verdict {
            Verdict::Approved => {
                debug!("{key}: critique approved");
                return (draft, Outcome::Approved);
            }
            Verdict::NeedsRevision(feedback) => feedback,
        };

        info!("{key}: refining after feedback");
        let reply = match self.gateway.call(&prompt::refine(original, &draft, &feedback)) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{key}: refine failed, keeping initial translation: {e}");
                return (draft, Outcome::RefineFallback);
            }
        };

        let refined = parser::parse(&reply, &draft);
        let missing = refined.missing_fields(original);
        if !missing.is_empty() {
            warn!(
                "{key}: refined translation missing {}, keeping initial translation",
                missing.join(", ")
            );
            return (draft, Outcome::RefineFallback);
        }

        (refined, Outcome::Refined)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{CacheError, LlmError};
    use crate::model::{AboutPage, PostFields};
    use crate::services::translation::gateway::testing::ScriptedBackend;
    use crate::services::translation::gateway::RetryPolicy;
    use crate::services::translation::rate_limit::testing::FakeClock;
    use crate::services::translation::rate_limit::RateLimiter;
    use crate::services::translation::store::CACHE_FILE;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn translator(
        backend: &ScriptedBackend,
        dir: &TempDir,
        max_attempts: u32,
    ) -> Translator<ScriptedBackend, FakeClock> {
        let limiter = RateLimiter::new(FakeClock::new(), Duration::from_secs(10));
        let policy = RetryPolicy {
            max_attempts,
            transient_delay: Duration::from_secs(1),
            quota_cooldown: Duration::from_secs(90),
        };
        let gateway = Gateway::new(backend.clone(), limiter, policy);
        let cache = TranslationCache::load(dir.path().join(CACHE_FILE));
        Translator::new(gateway, cache)
    }

    fn my_post() -> PostFields {
        PostFields {
            title: "Hello".into(),
            excerpt: "A first post".into(),
            tags: vec!["gpu".into()],
            content: "Hello World".into(),
        }
    }

    const REPLY: &str = "TITLE:\nOlá\nEXCERPT:\nUm primeiro post\nTAGS:\ngpu\nCONTENT:\nOlá Mundo";

    #[test]
    fn translates_then_serves_from_cache() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend.reply(REPLY).reply("OK");

        let mut t = translator(&backend, &dir, 3);
        let first = t.translate("my-post", &my_post()).unwrap();
        assert_eq!(first.outcome, Outcome::Approved);
        assert_eq!(first.value.title, "Olá");
        assert_eq!(first.value.content, "Olá Mundo");
        assert_eq!(t.gateway().calls(), 2);

        // A fresh run over the same cache makes no calls.
        let mut again = translator(&backend, &dir, 3);
        let second = again.translate("my-post", &my_post()).unwrap();
        assert_eq!(second.outcome, Outcome::Cached);
        assert!(second.outcome.is_cached());
        assert_eq!(second.value, first.value);
        assert_eq!(again.gateway().calls(), 0);
    }

    #[test]
    fn changed_source_is_retranslated() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply(REPLY)
            .reply("TITLE: Olá\nEXCERPT: Um primeiro post\nTAGS: gpu\nCONTENT:\nOlá Mundo!");

        let mut t = translator(&backend, &dir, 3).with_critique(false);
        t.translate("my-post", &my_post()).unwrap();

        let mut edited = my_post();
        edited.content = "Hello World!".into();
        let out = t.translate("my-post", &edited).unwrap();

        assert_eq!(out.outcome, Outcome::Translated);
        assert_eq!(out.value.content, "Olá Mundo!");
        assert_eq!(t.gateway().calls(), 2);
    }

    #[test]
    fn title_change_invalidates_the_entry() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply("TITLE: Olá")
            .reply("TITLE: Olá Mundo");

        let hello = PostFields {
            title: "Hello".into(),
            ..PostFields::default()
        };
        let mut t = translator(&backend, &dir, 1).with_critique(false);
        assert_eq!(t.translate("my-post", &hello).unwrap().value.title, "Olá");

        let again = t.translate("my-post", &hello).unwrap();
        assert_eq!(again.value.title, "Olá");
        assert_eq!(again.outcome, Outcome::Cached);
        assert_eq!(t.gateway().calls(), 1);

        let renamed = PostFields {
            title: "Hello World".into(),
            ..PostFields::default()
        };
        let out = t.translate("my-post", &renamed).unwrap();
        assert_eq!(out.value.title, "Olá Mundo");
        assert_eq!(t.gateway().calls(), 2);
    }

    #[test]
    fn force_skips_lookup_but_still_writes() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply(REPLY)
            .reply("TITLE: Oi\nEXCERPT: x\nTAGS: gpu\nCONTENT: y");

        translator(&backend, &dir, 3)
            .with_critique(false)
            .translate("my-post", &my_post())
            .unwrap();

        let mut forced = translator(&backend, &dir, 3)
            .with_critique(false)
            .with_force(true);
        let out = forced.translate("my-post", &my_post()).unwrap();
        assert_eq!(out.outcome, Outcome::Translated);
        assert_eq!(out.value.title, "Oi");

        let cached = translator(&backend, &dir, 3)
            .translate("my-post", &my_post())
            .unwrap();
        assert_eq!(cached.outcome, Outcome::Cached);
        assert_eq!(cached.value.title, "Oi");
    }

    #[test]
    fn feedback_triggers_refinement() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply(REPLY)
            .reply("FEEDBACK: title is too literal")
            .reply("TITLE:\nOlá, pessoal");

        let mut t = translator(&backend, &dir, 3);
        let out = t.translate("my-post", &my_post()).unwrap();

        assert_eq!(out.outcome, Outcome::Refined);
        assert_eq!(out.value.title, "Olá, pessoal");
        // Sections the refine reply omitted come from the draft.
        assert_eq!(out.value.content, "Olá Mundo");

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains("title is too literal"));
    }

    #[test]
    fn critique_failure_approves_the_draft() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply(REPLY)
            .fail(LlmError::TransientFailure("503".into()));

        // One attempt per call, so the critique call fails outright.
        let mut t = translator(&backend, &dir, 1);
        let out = t.translate("my-post", &my_post()).unwrap();

        assert_eq!(out.outcome, Outcome::Approved);
        assert_eq!(out.value.title, "Olá");
    }

    #[test]
    fn refine_failure_keeps_the_draft() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .reply(REPLY)
            .reply("FEEDBACK: wrong tone")
            .fail(LlmError::QuotaExceeded("429".into()));

        let mut t = translator(&backend, &dir, 1);
        let out = t.translate("my-post", &my_post()).unwrap();

        assert_eq!(out.outcome, Outcome::RefineFallback);
        assert_eq!(out.value.title, "Olá");

        let cached = translator(&backend, &dir, 1)
            .translate("my-post", &my_post())
            .unwrap();
        assert_eq!(cached.value, out.value);
    }

    #[test]
    fn partial_refinement_merges_with_draft() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        let about = AboutPage {
            title: "ABOUT".into(),
            paragraphs: vec!["One.".into(), "Two.".into()],
        };
        backend
            .reply("TITLE: SOBRE\nP1: Um.\nP2: Dois.")
            .reply("FEEDBACK: p2 is wrong")
            .reply("P2: Dois!");

        let mut t = translator(&backend, &dir, 1);
        let out = t.translate("about-page", &about).unwrap();
        assert_eq!(out.outcome, Outcome::Refined);
        assert_eq!(out.value.paragraphs, vec!["Um.".to_string(), "Dois!".to_string()]);
    }

    #[test]
    fn cache_write_failure_surfaces() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let backend = ScriptedBackend::new();
        backend.reply(REPLY);

        let limiter = RateLimiter::new(FakeClock::new(), Duration::from_secs(10));
        let policy = RetryPolicy {
            max_attempts: 1,
            transient_delay: Duration::from_secs(1),
            quota_cooldown: Duration::from_secs(90),
        };
        let gateway = Gateway::new(backend.clone(), limiter, policy);
        let cache = TranslationCache::load(blocker.join(CACHE_FILE));
        let mut t = Translator::new(gateway, cache).with_critique(false);

        let err = t.translate("my-post", &my_post()).unwrap_err();
        assert!(
            matches!(err, PipelineError::Cache(CacheError::Io { .. })),
            "got {err}"
        );
    }

    #[test]
    fn initial_translation_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new();
        backend
            .fail(LlmError::TransientFailure("a".into()))
            .fail(LlmError::QuotaExceeded("b".into()));

        let mut t = translator(&backend, &dir, 2);
        let err = t.translate("my-post", &my_post()).unwrap_err();

        match err {
            PipelineError::Translate { key, source } => {
                assert_eq!(key, "my-post");
                assert_eq!(
                    source,
                    LlmError::FatalFailure {
                        attempts: 2,
                        last: "b".into()
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(t.cache().is_empty());
        assert!(!dir.path().join(CACHE_FILE).exists());
    }
}
