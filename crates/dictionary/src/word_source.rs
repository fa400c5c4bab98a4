use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Url;

use crate::random_word_api::get_random_word;

/// Words used when the random word service cannot be reached.
pub const FALLBACK_WORDS: [&str; 9] = [
    "apple",
    "banana",
    "cherry",
    "table",
    "chair",
    "run",
    "beautiful",
    "happy",
    "quick",
];

/// Picks a fallback word from a unix timestamp in seconds. The same second
/// always yields the same word.
pub fn fallback_word(unix_seconds: u64) -> &'static str {
    FALLBACK_WORDS[(unix_seconds % FALLBACK_WORDS.len() as u64) as usize]
}

fn fallback_word_now() -> &'static str {
    let unix_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    fallback_word(unix_seconds)
}

/// Asks the random word service for a word, or falls back to the local list.
/// Never fails.
pub(crate) async fn acquire(client: &reqwest::Client, url: Option<&Url>) -> String {
    let Some(url) = url else {
        return fallback_word_now().to_owned();
    };
    match get_random_word(client, url).await {
        Ok(word) => {
            tracing::debug!(%word, "received random word");
            word
        }
        Err(error) => {
            let word = fallback_word_now();
            tracing::warn!(%error, %word, "random word service unavailable, using fallback word");
            word.to_owned()
        }
    }
}
