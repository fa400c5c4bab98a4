use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use dictionary::DictionaryOptions;

const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpeechBackend {
    /// Download synthesized audio from a text-to-speech service
    Cloud,
    /// Speak through a local speech command
    Local,
}

impl FromStr for SpeechBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cloud" => Ok(Self::Cloud),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown speech backend {other}")),
        }
    }
}

/// Expand your vocabulary with new words and pronunciations.
#[derive(Debug, Default, Parser)]
#[command(version)]
pub struct Args {
    /// Path of the SQLite database holding saved words
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// Pronunciation backend
    #[arg(long, value_enum)]
    pub speech: Option<SpeechBackend>,
    /// Never call the random word service, pick from the built-in list instead
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,
    pub tts_url: String,
    /// Program and leading arguments; the word is appended as the last argument
    pub command: String,
    /// Where downloaded audio is written
    pub audio_output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub random_word_url: Option<String>,
    pub dictionary_url: String,
    pub http_timeout: Duration,
    pub db_busy_timeout: Duration,
    pub speech: SpeechConfig,
}

impl Config {
    /// Reads the configuration from the environment, falling back to defaults.
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = DictionaryOptions::default();
        // Zero or unparsable values use the default.
        let seconds = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs)
        };

        let http_timeout = seconds("HTTP_TIMEOUT_SECS").unwrap_or(defaults.timeout);
        let db_busy_timeout = seconds("DB_BUSY_TIMEOUT_SECS").unwrap_or(Duration::from_secs(5));

        let backend = lookup("SPEECH_BACKEND")
            .and_then(|value| value.parse().ok())
            .unwrap_or(SpeechBackend::Cloud);

        Config {
            db_path: lookup("VOCAB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("vocab.db")),
            random_word_url: lookup("RANDOM_WORD_URL").or(defaults.random_word_url),
            dictionary_url: lookup("DICTIONARY_URL").unwrap_or(defaults.dictionary_url),
            http_timeout,
            db_busy_timeout,
            speech: SpeechConfig {
                backend,
                tts_url: lookup("TTS_URL").unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
                command: lookup("SPEECH_COMMAND").unwrap_or_else(|| "espeak".to_string()),
                audio_output: lookup("SPEECH_OUTPUT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("pronunciation.mp3")),
            },
        }
    }

    /// Command line flags take precedence over the environment.
    pub fn apply_args(mut self, args: Args) -> Self {
        if let Some(db) = args.db {
            self.db_path = db;
        }
        if let Some(backend) = args.speech {
            self.speech.backend = backend;
        }
        if args.offline {
            self.random_word_url = None;
        }
        self
    }

    pub fn dictionary_options(&self) -> DictionaryOptions {
        DictionaryOptions {
            random_word_url: self.random_word_url.clone(),
            dictionary_url: self.dictionary_url.clone(),
            timeout: self.http_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.db_path, PathBuf::from("vocab.db"));
        let defaults = DictionaryOptions::default();
        assert_eq!(config.random_word_url, defaults.random_word_url);
        assert_eq!(config.dictionary_url, defaults.dictionary_url);
        assert_eq!(
            config.dictionary_url,
            "https://api.dictionaryapi.dev/api/v2/entries/en"
        );
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.db_busy_timeout, Duration::from_secs(5));
        assert_eq!(config.speech.backend, SpeechBackend::Cloud);
        assert_eq!(config.speech.command, "espeak");
    }

    #[test]
    fn reads_environment() {
        let config = config_from(&[
            ("VOCAB_DB_PATH", "/tmp/words.db"),
            ("HTTP_TIMEOUT_SECS", "2"),
            ("DB_BUSY_TIMEOUT_SECS", "not a number"),
            ("SPEECH_BACKEND", " Local "),
            ("SPEECH_COMMAND", "say -v Daniel"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/words.db"));
        assert_eq!(config.http_timeout, Duration::from_secs(2));
        assert_eq!(config.db_busy_timeout, Duration::from_secs(5));
        assert_eq!(config.speech.backend, SpeechBackend::Local);
        assert_eq!(config.speech.command, "say -v Daniel");
    }

    #[test]
    fn zero_timeouts_fall_back_to_defaults() {
        let config = config_from(&[("HTTP_TIMEOUT_SECS", "0"), ("DB_BUSY_TIMEOUT_SECS", "0")]);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.db_busy_timeout, Duration::from_secs(5));
        assert_eq!(config.dictionary_options().timeout, Duration::from_secs(5));
    }

    #[test]
    fn args_override_environment() {
        let config = config_from(&[("SPEECH_BACKEND", "local")]).apply_args(Args {
            db: Some(PathBuf::from("other.db")),
            speech: Some(SpeechBackend::Cloud),
            offline: true,
        });
        assert_eq!(config.db_path, PathBuf::from("other.db"));
        assert_eq!(config.speech.backend, SpeechBackend::Cloud);
        assert_eq!(config.dictionary_options().random_word_url, None);
    }
}
