use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::{Args, Config};
use dictionary::Dictionary;
use pronunciation::{BusyGuard, PlaybackSlot, Pronunciation, PronunciationError, PronunciationProvider};
use session::{render, render_saved_list, render_saved_word, Session};
use storage::{StorageError, VocabularyStore};
use tracing_subscriber::EnvFilter;
use utilities::{closest_match, input, str_to_bool};

mod config;
mod pronunciation;
mod session;
mod storage;
mod utilities;

const HELP: &str = "Commands:
    new               fetch a new word
    word              show the current word again
    list              list saved words
    show <word>       show a saved word
    play [word]       pronounce the current word or a saved word
    delete <word>     delete a saved word
    quit              leave";

struct App {
    dict: Dictionary,
    storage: VocabularyStore,
    speech: Arc<dyn PronunciationProvider>,
    /// Held from the request until downloaded audio is written
    playback: PlaybackSlot,
    audio_output: PathBuf,
    session: Session,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::new().apply_args(Args::parse());

    let storage = VocabularyStore::open(&config.db_path, config.db_busy_timeout)
        .await
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let dict = Dictionary::with_options(config.dictionary_options())?;
    let speech = pronunciation::from_config(&config.speech, config.http_timeout)?;
    tracing::debug!(backend = ?config.speech.backend, "pronunciation backend selected");

    let mut app = App {
        dict,
        storage,
        speech,
        playback: PlaybackSlot::default(),
        audio_output: config.speech.audio_output.clone(),
        session: Session::default(),
    };

    println!("Expand your vocabulary with new words and pronunciations! Type 'help' for commands.");
    while let Some(line) = input(">> ")? {
        let mut command_parts = line.split_ascii_whitespace();
        if let Some(command) = command_parts.next() {
            let argument = command_parts.collect::<Vec<&str>>().join(" ");
            match command {
                "exit" | "leave" | "quit" | "e" | "q" | "l" => {
                    break;
                }
                command => {
                    if let Err(error) = run_command(&mut app, command, &argument).await {
                        tracing::error!("{command} failed: {error:#}");
                        println!("Something went wrong: {error:#}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vocabulary_bot=warn,dictionary=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(app: &mut App, command: &str, argument: &str) -> anyhow::Result<()> {
    match command {
        "help" | "h" => println!("{HELP}"),
        "new" | "next" | "get" => new_word(app).await?,
        "word" | "current" => println!("{}", render(&app.session.view)),
        "list" | "saved" => println!("{}", render_saved_list(&app.storage.list_all().await?)),
        "show" => show_word(&app.storage, argument).await?,
        "play" | "say" => play(app, argument).await?,
        "delete" | "remove" => remove_word(&app.storage, argument).await?,
        _ => println!("Unknown command {command}."),
    }
    Ok(())
}

async fn new_word(app: &mut App) -> anyhow::Result<()> {
    app.session.record_fetch(app.dict.fetch_new_word().await);
    println!("{}", render(&app.session.view));
    if let Some(record) = app.session.current_word() {
        let answer = input("Save this word? (Y/n): ")?.unwrap_or_default();
        if str_to_bool(answer).unwrap_or(true) {
            if app.storage.insert_if_absent(record).await? {
                println!("Saved the word successfully.");
            } else {
                println!("This word is already saved.");
            }
        }
    }
    Ok(())
}

async fn show_word(storage: &VocabularyStore, word: &str) -> anyhow::Result<()> {
    if word.is_empty() {
        println!("Usage: show <word>");
        return Ok(());
    }
    match storage.get(word).await? {
        Some(saved) => println!("{}", render_saved_word(&saved)),
        None => {
            println!("This word is not saved.");
            suggest(storage, word).await?;
        }
    }
    Ok(())
}

async fn remove_word(storage: &VocabularyStore, word: &str) -> anyhow::Result<()> {
    if word.is_empty() {
        println!("Usage: delete <word>");
        return Ok(());
    }
    if storage.delete(word).await? {
        println!("Deleted the word successfully.");
    } else {
        println!("This word is not saved.");
        suggest(storage, word).await?;
    }
    Ok(())
}

async fn suggest(storage: &VocabularyStore, word: &str) -> Result<(), StorageError> {
    let saved = storage.list_all().await?;
    if let Some(candidate) = closest_match(word, saved.iter().map(|saved| saved.word.as_str())) {
        println!("Did you mean '{candidate}'?");
    }
    Ok(())
}

async fn play(app: &App, argument: &str) -> anyhow::Result<()> {
    let current = app
        .session
        .current_word()
        .filter(|record| argument.is_empty() || record.word == argument);
    let word = match current {
        Some(record) => {
            for (accent, url) in record.pronunciations.iter() {
                println!("{} pronunciation: {url}", accent.label());
            }
            record.word.clone()
        }
        None if argument.is_empty() => {
            println!("No word to play. Fetch one with 'new' or name a saved word.");
            return Ok(());
        }
        None => match app.storage.get(argument).await? {
            Some(saved) => saved.word,
            None => {
                println!("This word is not saved.");
                suggest(&app.storage, argument).await?;
                return Ok(());
            }
        },
    };

    let Some(guard) = app.playback.try_acquire() else {
        tracing::warn!(%word, "pronunciation rejected, another one is playing");
        println!("A pronunciation is already playing, try again when it finishes.");
        return Ok(());
    };
    // Playback runs in the background; the prompt stays usable meanwhile.
    tokio::spawn(pronounce(
        Arc::clone(&app.speech),
        word,
        app.audio_output.clone(),
        guard,
    ));
    Ok(())
}

async fn pronounce(
    speech: Arc<dyn PronunciationProvider>,
    word: String,
    audio_output: PathBuf,
    _guard: BusyGuard,
) {
    match speech.speak(&word).await {
        Ok(Pronunciation::Audio(audio)) => {
            if let Err(error) = save_audio(&audio_output, &audio).await {
                tracing::error!("failed to save pronunciation of {word}: {error:#}");
                println!("Couldn't save the pronunciation audio.");
            } else {
                println!(
                    "Saved the pronunciation of '{word}' to {}",
                    audio_output.display()
                );
            }
        }
        Ok(Pronunciation::Played) => {
            tracing::debug!(%word, "pronunciation played");
        }
        Err(PronunciationError::Busy) => {
            tracing::warn!(%word, "pronunciation rejected, another one is playing");
            println!("A pronunciation is already playing, try again when it finishes.");
        }
        Err(error) => {
            tracing::warn!(%error, %word, "pronunciation failed");
            println!("Couldn't pronounce '{word}': {error}");
        }
    }
}

async fn save_audio(path: &Path, audio: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(path, audio)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
