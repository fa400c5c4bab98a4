use crate::dictionary::{PartialRecord, WordRecord};

/// Fills in the example sentence when the dictionary did not provide one.
pub fn normalize(partial: PartialRecord) -> WordRecord {
    let example = match partial.example {
        Some(example) => example,
        None => generate_example(&partial.word, &partial.part_of_speech),
    };
    WordRecord {
        word: partial.word,
        meaning: partial.meaning,
        example,
        synonyms: partial.synonyms,
        part_of_speech: partial.part_of_speech,
        pronunciations: partial.pronunciations,
    }
}

/// Template sentence for a word, chosen by its part of speech.
pub fn generate_example(word: &str, part_of_speech: &str) -> String {
    match part_of_speech {
        "verb" | "action" => format!("I often {word} when I feel energetic."),
        "adjective" | "descriptive" => format!("The sunset was truly {word}."),
        "noun" | "object" => format!("The {word} is essential in my daily life."),
        _ => format!("This is an example sentence using the word '{word}'."),
    }
}
