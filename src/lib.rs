#![deny(missing_docs)]
//! Film Finder - Telegram bot for movie and TV lookups
//!
//! Searches TMDB by free-text title, offers the matches as inline buttons and
//! renders a detail card for the chosen one. Upstream responses are memoized
//! by a TTL fetch cache with a proxy fallback.

/// Telegram bot implementation
pub mod bot;
/// TTL fetch cache with proxy fallback
pub mod cache;
/// Configuration management
pub mod config;
/// Query classification, TMDB views and lookup orchestration
pub mod media;
/// Utility functions
pub mod utils;
