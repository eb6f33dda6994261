use dotenvy::dotenv;
use filmfinder::bot::handlers::{self, Command};
use filmfinder::cache::{FetchCache, FetchPolicy, HttpUpstream, SystemClock};
use filmfinder::config::Settings;
use filmfinder::media::{DetailOrchestrator, SearchOrchestrator, TmdbApi};
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting secrets from log output
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
    api_key: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            // Also matches the percent-encoded form inside proxied URLs
            api_key: Regex::new(r"(api_key(?:=|%3D))[^\s&%]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .api_key
            .replace_all(&output, "${1}[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length even though the redacted one differs
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Patterns are needed before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Film Finder bot...");

    let settings = init_settings();

    let cache = init_cache(&settings);
    let search = Arc::new(SearchOrchestrator::new(
        cache.clone(),
        TmdbApi::from_settings(&settings),
    ));
    let details = Arc::new(DetailOrchestrator::from_settings(cache.clone(), &settings));

    let bot = Bot::new(settings.telegram_token.clone());

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![cache, search, details])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_cache(settings: &Settings) -> Arc<FetchCache> {
    let policy = FetchPolicy::from_settings(settings);

    info!(
        "Initializing FetchCache (ttl: {}s, primary timeout: {}s, fallback timeout: {}s)",
        policy.ttl.as_secs(),
        policy.primary_timeout.as_secs(),
        policy.fallback_timeout.as_secs()
    );

    Arc::new(FetchCache::new(
        Arc::new(HttpUpstream::default()),
        Arc::new(SystemClock),
        policy,
    ))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_selection_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.text().is_some_and(handlers::is_command_text)
                    })
                    .endpoint(handle_unknown_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_search_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cache: Arc<FetchCache>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Help => handlers::help(bot, msg).await,
        Command::Stats => handlers::stats(bot, msg, cache).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_unknown_command(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::unknown_command(bot, msg).await {
        error!("Unknown command handler error: {}", e);
    }
    respond(())
}

async fn handle_search_text(
    bot: Bot,
    msg: Message,
    search: Arc<SearchOrchestrator>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, search).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_selection_callback(
    bot: Bot,
    q: CallbackQuery,
    details: Arc<DetailOrchestrator>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_selection(bot, q, details).await {
        error!("Selection callback handler error: {}", e);
    }
    respond(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_tmdb_api_key() -> Result<(), regex::Error> {
        let patterns = RedactionPatterns::new()?;
        let line = "GET https://api.themoviedb.org/3/movie/603?api_key=abc123 failed";
        assert_eq!(
            patterns.redact(line),
            "GET https://api.themoviedb.org/3/movie/603?api_key=[MASKED] failed"
        );
        let proxied = "https://proxy.test/raw?url=https%3A%2F%2Fx%2Fmovie%2F603%3Fapi_key%3Dabc123";
        assert!(!patterns.redact(proxied).contains("abc123"));
        Ok(())
    }

    #[test]
    fn test_redacts_bot_token() -> Result<(), regex::Error> {
        let patterns = RedactionPatterns::new()?;
        let line = "https://api.telegram.org/bot123456789:AAH-abcdefghijklmnopqrstuvwxyz0123456/getMe";
        assert!(!patterns.redact(line).contains("AAH-abc"));
        Ok(())
    }
}
