/// Command, search and selection handlers
pub mod handlers;
/// Best-effort helpers for transient messages
pub mod messaging;
/// Telegram calls with retry
pub mod resilient;
/// Texts, formatters and keyboards
pub mod views;
