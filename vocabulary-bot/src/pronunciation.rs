use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{SpeechBackend, SpeechConfig};

#[derive(Debug, PartialEq, Eq)]
pub enum Pronunciation {
    /// Encoded audio to be played or saved by the caller
    Audio(Vec<u8>),
    /// Already spoken on the local output device
    Played,
}

#[derive(Debug, thiserror::Error)]
pub enum PronunciationError {
    #[error("a pronunciation is already playing")]
    Busy,
    #[error("speech command is empty")]
    NoCommand,
    #[error("speech request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("speech service answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to start speech command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("speech command exited with {0}")]
    Exited(ExitStatus),
    #[error("speech worker stopped: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait PronunciationProvider: Send + Sync {
    async fn speak(&self, word: &str) -> Result<Pronunciation, PronunciationError>;
}

pub fn from_config(
    config: &SpeechConfig,
    timeout: Duration,
) -> Result<Arc<dyn PronunciationProvider>, PronunciationError> {
    let provider: Arc<dyn PronunciationProvider> = match config.backend {
        SpeechBackend::Cloud => Arc::new(CloudSpeech::new(config.tts_url.clone(), timeout)?),
        SpeechBackend::Local => Arc::new(LocalSpeech::new(&config.command)?),
    };
    Ok(provider)
}

/// Allows one playback at a time. A second request is rejected, never queued.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSlot(Arc<AtomicBool>);

impl PlaybackSlot {
    /// Takes the slot, or returns `None` while another playback holds it.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the slot when dropped.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fetches MP3 audio for a word from an HTTP text-to-speech endpoint. Only
/// one download runs at a time.
pub struct CloudSpeech {
    client: reqwest::Client,
    url: String,
    slot: PlaybackSlot,
}

impl CloudSpeech {
    pub fn new(url: String, timeout: Duration) -> Result<Self, PronunciationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            slot: PlaybackSlot::default(),
        })
    }
}

#[async_trait]
impl PronunciationProvider for CloudSpeech {
    async fn speak(&self, word: &str) -> Result<Pronunciation, PronunciationError> {
        let _guard = self.slot.try_acquire().ok_or(PronunciationError::Busy)?;
        tracing::debug!(word, url = %self.url, "requesting synthesized speech");
        let res = self
            .client
            .get(&self.url)
            .query(&[("ie", "UTF-8"), ("tl", "en"), ("client", "tw-ob"), ("q", word)])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(PronunciationError::Status(res.status()));
        }
        let audio = res.bytes().await?;
        Ok(Pronunciation::Audio(audio.to_vec()))
    }
}

/// Speaks through a local command on a blocking worker. Only one word plays
/// at a time: a request made while another is playing is rejected, not
/// queued, and a started playback always runs to completion.
pub struct LocalSpeech {
    program: String,
    args: Vec<String>,
    slot: PlaybackSlot,
}

impl LocalSpeech {
    pub fn new(command: &str) -> Result<Self, PronunciationError> {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or(PronunciationError::NoCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            slot: PlaybackSlot::default(),
        })
    }
}

#[async_trait]
impl PronunciationProvider for LocalSpeech {
    async fn speak(&self, word: &str) -> Result<Pronunciation, PronunciationError> {
        // Owned by the worker so the slot stays taken even if this future is dropped.
        let guard = self.slot.try_acquire().ok_or(PronunciationError::Busy)?;
        let program = self.program.clone();
        let args = self.args.clone();
        let word = word.to_owned();

        let status = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            Command::new(&program)
                .args(&args)
                .arg(&word)
                .status()
                .map_err(|source| PronunciationError::Spawn { program, source })
        })
        .await??;

        if !status.success() {
            return Err(PronunciationError::Exited(status));
        }
        Ok(Pronunciation::Played)
    }
}
