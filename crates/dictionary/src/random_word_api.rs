// https://random-word-api.herokuapp.com/word - one word per request, returned as ["word"]

use reqwest::Url;

use crate::DictionaryError;

pub(crate) const RANDOM_WORD_API_URL: &str = "https://random-word-api.herokuapp.com/word";

pub(crate) async fn get_random_word(
    client: &reqwest::Client,
    url: &Url,
) -> Result<String, DictionaryError> {
    let res = client
        .get(url.clone())
        .send()
        .await
        .map_err(DictionaryError::Fetch)?;
    if !res.status().is_success() {
        return Err(DictionaryError::Status(res.status()));
    }
    let body = res.text().await.map_err(DictionaryError::Fetch)?;
    parse_random_word(&body)
}

pub(crate) fn parse_random_word(body: &str) -> Result<String, DictionaryError> {
    let words: Vec<String> =
        serde_json::from_str(body).map_err(|error| DictionaryError::Malformed(error.to_string()))?;
    words
        .into_iter()
        .next()
        .map(|word| word.trim().to_owned())
        .filter(|word| !word.is_empty())
        .ok_or_else(|| DictionaryError::Malformed("no word in response".to_owned()))
}
