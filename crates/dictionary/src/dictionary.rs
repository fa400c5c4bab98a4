use serde::Deserialize;

/// Part of speech used when the dictionary service does not report one.
pub const UNKNOWN_PART_OF_SPEECH: &str = "Unknown";

// Wire types for the dictionary service. Every field the service may omit is
// an `Option`, so a missing key is a `None` instead of a parse failure.

#[derive(Debug, Deserialize)]
pub(crate) struct Word {
    pub phonetics: Option<Vec<Phonetic>>,
    pub meanings: Option<Vec<WordMeaning>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Phonetic {
    pub text: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WordMeaning {
    pub part_of_speech: Option<String>,
    pub definitions: Option<Vec<WordDefinition>>,
    pub synonyms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WordDefinition {
    pub definition: Option<String>,
    pub example: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accent {
    Uk,
    Us,
}

impl Accent {
    pub const ALL: [Accent; 2] = [Accent::Uk, Accent::Us];

    pub fn label(self) -> &'static str {
        match self {
            Accent::Uk => "UK",
            Accent::Us => "US",
        }
    }

    /// Case-insensitive substring match of the accent label against a
    /// phonetic's text.
    pub(crate) fn matches(self, text: &str) -> bool {
        text.to_lowercase().contains(&self.label().to_lowercase())
    }
}

/// Audio locators per accent. Each slot is independent of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pronunciations {
    pub uk: Option<String>,
    pub us: Option<String>,
}

impl Pronunciations {
    pub fn get(&self, accent: Accent) -> Option<&str> {
        match accent {
            Accent::Uk => self.uk.as_deref(),
            Accent::Us => self.us.as_deref(),
        }
    }

    /// Present locators, UK first.
    pub fn iter(&self) -> impl Iterator<Item = (Accent, &str)> {
        Accent::ALL
            .into_iter()
            .filter_map(move |accent| self.get(accent).map(|url| (accent, url)))
    }

    pub fn is_empty(&self) -> bool {
        self.uk.is_none() && self.us.is_none()
    }
}

/// Word data as returned by a lookup, before missing fields are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRecord {
    pub word: String,
    pub meaning: String,
    pub example: Option<String>,
    pub synonyms: Vec<String>,
    pub part_of_speech: String,
    pub pronunciations: Pronunciations,
}

/// A fully populated word, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub word: String,
    pub meaning: String,
    pub example: String,
    pub synonyms: Vec<String>,
    pub part_of_speech: String,
    pub pronunciations: Pronunciations,
}
