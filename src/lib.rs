//! Bilingual (EN/PT-BR) static blog generator.
//!
//! Posts are written in English markdown. Each build translates whatever
//! changed since the last one through a language model, caches the result
//! by content fingerprint, and renders both language trees.

pub mod config;
pub mod error;
pub mod model;
pub mod parsers;
pub mod services;
