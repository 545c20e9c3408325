pub mod app_logic;
pub mod core;

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::sync::Once;

// Environment variable selecting the log level, e.g. `COPYRIGHT_LOG=debug`.
pub const LOG_LEVEL_ENV: &str = "COPYRIGHT_LOG";

static LOGGING_INIT: Once = Once::new();

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/*
 * Installs the terminal logger. Safe to call any number of times; only the
 * first call has an effect.
 */
pub fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_thread_level(LevelFilter::Debug)
            .set_target_level(LevelFilter::Off)
            .build();
        if let Err(err) = TermLogger::init(
            level_from_env(),
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ) {
            eprintln!("Failed to initialize logger: {err}");
        }
    });
}
