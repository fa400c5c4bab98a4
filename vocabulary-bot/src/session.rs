use std::fmt::Write;

use dictionary::{DictionaryError, WordRecord};

use crate::storage::SavedWord;

/// What the word panel currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    /// Nothing fetched yet
    #[default]
    Empty,
    Word(WordRecord),
    FetchFailed(String),
}

/// State owned by one interactive session.
#[derive(Debug, Default)]
pub struct Session {
    pub view: View,
}

impl Session {
    /// Records the outcome of a fetch. A failure replaces the previous word.
    pub fn record_fetch(&mut self, result: Result<WordRecord, DictionaryError>) {
        self.view = match result {
            Ok(record) => View::Word(record),
            Err(error) => {
                tracing::warn!(%error, "failed to fetch a word");
                let message = if error.is_not_found() {
                    "Failed to fetch a word: the dictionary has no usable entry for it. Try again."
                } else {
                    "Failed to fetch a word. Check your internet connection and try again."
                };
                View::FetchFailed(message.to_owned())
            }
        };
    }

    pub fn current_word(&self) -> Option<&WordRecord> {
        match &self.view {
            View::Word(record) => Some(record),
            _ => None,
        }
    }
}

pub fn render(view: &View) -> String {
    match view {
        View::Empty => "No word yet. Type 'new' to get one.".to_owned(),
        View::FetchFailed(message) => message.clone(),
        View::Word(record) => render_record(record),
    }
}

fn render_record(record: &WordRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Word: {} ({})", record.word, record.part_of_speech);
    let _ = writeln!(out, "    Meaning: {}", record.meaning);
    let _ = writeln!(out, "    Example: {}", record.example);
    if !record.synonyms.is_empty() {
        let _ = writeln!(out, "    Synonyms: {}", record.synonyms.join(", "));
    }
    for (accent, url) in record.pronunciations.iter() {
        let _ = writeln!(out, "    {} pronunciation: {url}", accent.label());
    }
    out.trim_end().to_owned()
}

pub fn render_saved_list(words: &[SavedWord]) -> String {
    if words.is_empty() {
        return "No words saved yet.".to_owned();
    }
    words
        .iter()
        .map(saved_heading)
        .collect::<Vec<String>>()
        .join("\n")
}

fn saved_heading(saved: &SavedWord) -> String {
    match saved.date_added {
        Some(date) => format!("{} ({}) - {}", saved.word, saved.part_of_speech, date.format("%Y-%m-%d")),
        None => format!("{} ({})", saved.word, saved.part_of_speech),
    }
}

pub fn render_saved_word(saved: &SavedWord) -> String {
    let synonyms = saved.synonym_list();
    let synonyms = if synonyms.is_empty() {
        "None".to_owned()
    } else {
        synonyms.join(", ")
    };
    format!(
        "{}\n    Meaning: {}\n    Example: {}\n    Synonyms: {synonyms}",
        saved_heading(saved),
        saved.meaning,
        saved.example,
    )
}
