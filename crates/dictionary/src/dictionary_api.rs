use reqwest::{StatusCode, Url};

use crate::dictionary::{Accent, Phonetic, PartialRecord, Pronunciations, Word, UNKNOWN_PART_OF_SPEECH};
use crate::DictionaryError;

pub(crate) const DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

pub(crate) async fn get_definition(
    client: &reqwest::Client,
    base_url: &Url,
    word: &str,
) -> Result<PartialRecord, DictionaryError> {
    let url = entry_url(base_url, word)?;
    tracing::debug!(%url, "looking up word");
    let res = client.get(url).send().await.map_err(DictionaryError::Fetch)?;
    match res.status() {
        StatusCode::NOT_FOUND => {
            return Err(DictionaryError::NotFound {
                word: word.to_owned(),
            })
        }
        status if !status.is_success() => return Err(DictionaryError::Status(status)),
        _ => {}
    }
    let body = res.text().await.map_err(DictionaryError::Fetch)?;
    parse_entries(word, &body)
}

fn entry_url(base_url: &Url, word: &str) -> Result<Url, DictionaryError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| DictionaryError::InvalidEndpoint(base_url.to_string()))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}

/// Reads the first definition of the first meaning of the first entry.
pub(crate) fn parse_entries(word: &str, body: &str) -> Result<PartialRecord, DictionaryError> {
    let entries: Vec<Word> =
        serde_json::from_str(body).map_err(|error| DictionaryError::Malformed(error.to_string()))?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| malformed("no entries"))?;
    let meaning = entry
        .meanings
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| malformed("entry has no meanings"))?;
    let definition = meaning
        .definitions
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| malformed("meaning has no definitions"))?;
    let phonetics = entry.phonetics.unwrap_or_default();

    Ok(PartialRecord {
        word: word.to_owned(),
        meaning: definition
            .definition
            .ok_or_else(|| malformed("definition text is missing"))?,
        example: definition.example.filter(|example| !example.is_empty()),
        synonyms: meaning.synonyms.unwrap_or_default(),
        part_of_speech: meaning
            .part_of_speech
            .unwrap_or_else(|| UNKNOWN_PART_OF_SPEECH.to_owned()),
        pronunciations: Pronunciations {
            uk: first_audio(&phonetics, Accent::Uk),
            us: first_audio(&phonetics, Accent::Us),
        },
    })
}

/// Audio of the first phonetic whose text names the accent. Later matches are
/// not consulted even when the first one has no audio.
fn first_audio(phonetics: &[Phonetic], accent: Accent) -> Option<String> {
    phonetics
        .iter()
        .find(|phonetic| accent.matches(phonetic.text.as_deref().unwrap_or("")))
        .and_then(|phonetic| phonetic.audio.clone())
        .filter(|audio| !audio.is_empty())
}

fn malformed(reason: &str) -> DictionaryError {
    DictionaryError::Malformed(reason.to_owned())
}
