pub mod gateway;
pub mod gemini;
pub mod hash;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod rate_limit;
pub mod store;

pub use gateway::{Backend, Gateway, RetryPolicy};
pub use gemini::GeminiBackend;
pub use pipeline::{Outcome, Translated, Translator};
pub use rate_limit::{Clock, RateLimiter, SystemClock};
pub use store::{Lookup, TranslationCache};
