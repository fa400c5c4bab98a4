use std::time::Duration;

use dictionary_api::{get_definition, DICTIONARY_API_URL};
use random_word_api::RANDOM_WORD_API_URL;
use reqwest::{StatusCode, Url};

mod dictionary;
mod dictionary_api;
mod normalize;
mod random_word_api;
mod word_source;

pub use dictionary::{
    Accent, PartialRecord, Pronunciations, WordRecord, UNKNOWN_PART_OF_SPEECH,
};
pub use normalize::{generate_example, normalize};
pub use word_source::{fallback_word, FALLBACK_WORDS};

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("request failed: {0}")]
    Fetch(#[source] reqwest::Error),
    #[error("service answered with status {0}")]
    Status(StatusCode),
    #[error("no dictionary entry for '{word}'")]
    NotFound { word: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("invalid endpoint url '{0}'")]
    InvalidEndpoint(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DictionaryError {
    /// The service answered but had no usable entry for the word.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Malformed(_))
    }
}

#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// `None` skips the random word service and always uses the fallback list.
    pub random_word_url: Option<String>,
    pub dictionary_url: String,
    pub timeout: Duration,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            random_word_url: Some(RANDOM_WORD_API_URL.to_owned()),
            dictionary_url: DICTIONARY_API_URL.to_owned(),
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct Dictionary {
    client: reqwest::Client,
    random_word_url: Option<Url>,
    dictionary_url: Url,
}

impl Dictionary {
    pub fn new() -> Result<Self, DictionaryError> {
        Self::with_options(DictionaryOptions::default())
    }

    pub fn with_options(options: DictionaryOptions) -> Result<Self, DictionaryError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(DictionaryError::Client)?;
        Ok(Self {
            client,
            random_word_url: options
                .random_word_url
                .as_deref()
                .map(parse_endpoint)
                .transpose()?,
            dictionary_url: parse_endpoint(&options.dictionary_url)?,
        })
    }

    /// A candidate word, from the random word service or the fallback list.
    pub async fn acquire_word(&self) -> String {
        word_source::acquire(&self.client, self.random_word_url.as_ref()).await
    }

    pub async fn lookup(&self, word: &str) -> Result<PartialRecord, DictionaryError> {
        get_definition(&self.client, &self.dictionary_url, word).await
    }

    /// Acquires a word, looks it up and fills in missing fields. A failed
    /// lookup fails the whole fetch.
    pub async fn fetch_new_word(&self) -> Result<WordRecord, DictionaryError> {
        let word = self.acquire_word().await;
        let partial = self.lookup(&word).await?;
        Ok(normalize(partial))
    }
}

fn parse_endpoint(url: &str) -> Result<Url, DictionaryError> {
    Url::parse(url).map_err(|_| DictionaryError::InvalidEndpoint(url.to_owned()))
}
