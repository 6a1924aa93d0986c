//! Directory: healthcare professionals and the reviews patients leave them.
//!
//! Reputation (average rating and review count) is always derived from the
//! approved reviews at read time. The `score` / `reference_count` columns on
//! `professionals` are a cache refreshed after review moderation and are
//! never trusted by read paths.
//!
//! Data access goes through `store::DirectoryStore`; free-text matching
//! goes through `search::TextMatcher`.

pub mod access;
pub mod filters;
pub mod handlers;
pub mod profiles;
pub mod prompts;
pub mod query;
pub mod reputation;
pub mod reviews;
pub mod search;
pub mod store;
