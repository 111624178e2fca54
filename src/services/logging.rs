// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tracing setup and redaction of user-entered text in log lines.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used. Calling this
/// twice is harmless: the second call leaves the first subscriber in place.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Redact free-text search input for logging.
/// Keeps the first character and the length: "shoes" -> "s***(5)"
pub fn redact_search_text(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => format!("{}***({})", first, text.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_search_text() {
        assert_eq!(redact_search_text("shoes"), "s***(5)");
        assert_eq!(redact_search_text("x"), "x***(1)");
    }

    #[test]
    fn test_redact_counts_characters_not_bytes() {
        assert_eq!(redact_search_text("čaj"), "č***(3)");
    }

    #[test]
    fn test_redact_empty() {
        assert_eq!(redact_search_text(""), "");
    }

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing("debug");
        init_tracing("info");
    }
}
