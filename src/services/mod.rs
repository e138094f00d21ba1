pub mod build;
pub mod encoding;
pub mod markdown;
pub mod metadata;
pub mod posts;
pub mod qa;
pub mod render;
pub mod sitemap;
pub mod translation;

