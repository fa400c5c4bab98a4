use std::path::Path;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use dictionary::WordRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{query, query_as, FromRow, Pool, Row, Sqlite};

/// Synonyms are stored as one text column joined with this separator.
pub const SYNONYM_SEPARATOR: &str = ", ";

const CREATE_WORDS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word TEXT UNIQUE,
        meaning TEXT,
        example TEXT,
        synonyms TEXT,
        part_of_speech TEXT,
        date_added TEXT
    )";

/// Columns missing from stores created before they existed.
const ADDED_COLUMNS: &[(&str, &str)] = &[
    ("synonyms", "ALTER TABLE words ADD COLUMN synonyms TEXT"),
    ("part_of_speech", "ALTER TABLE words ADD COLUMN part_of_speech TEXT"),
];

const SELECT_WORDS: &str = "
    SELECT id, word,
        COALESCE(meaning, '') AS meaning,
        COALESCE(example, '') AS example,
        COALESCE(synonyms, '') AS synonyms,
        COALESCE(part_of_speech, 'Unknown') AS part_of_speech,
        date_added
    FROM words";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SavedWord {
    pub id: i64,
    pub word: String,
    pub meaning: String,
    pub example: String,
    /// Joined with [`SYNONYM_SEPARATOR`]
    pub synonyms: String,
    pub part_of_speech: String,
    pub date_added: Option<NaiveDate>,
}

impl SavedWord {
    pub fn synonym_list(&self) -> Vec<String> {
        if self.synonyms.is_empty() {
            return Vec::new();
        }
        self.synonyms
            .split(SYNONYM_SEPARATOR)
            .map(str::to_owned)
            .collect()
    }
}

pub struct VocabularyStore {
    pool: Pool<Sqlite>,
}

impl VocabularyStore {
    /// Opens or creates the database file and brings its schema up to date.
    pub async fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(busy_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        query(CREATE_WORDS_TABLE).execute(&self.pool).await?;
        let columns = self.columns().await?;
        for &(column, statement) in ADDED_COLUMNS {
            if !columns.iter().any(|existing| existing == column) {
                tracing::info!(column, "adding missing column to words table");
                query(statement).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    async fn columns(&self) -> Result<Vec<String>, StorageError> {
        let rows = query("PRAGMA table_info(words)")
            .fetch_all(&self.pool)
            .await?;
        let columns = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl VocabularyStore {
    /// Saves a word unless it is already stored. Returns true if a row was added.
    pub async fn insert_if_absent(&self, record: &WordRecord) -> Result<bool, StorageError> {
        let date_added = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let result = query(
            "INSERT OR IGNORE INTO words
            (word, meaning, example, synonyms, part_of_speech, date_added)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.word)
        .bind(&record.meaning)
        .bind(&record.example)
        .bind(record.synonyms.join(SYNONYM_SEPARATOR))
        .bind(&record.part_of_speech)
        .bind(date_added)
        .execute(&self.pool)
        .await?;
        let inserted = result.rows_affected() > 0;
        if inserted {
            tracing::info!(word = %record.word, "saved word");
        } else {
            tracing::debug!(word = %record.word, "word already saved");
        }
        Ok(inserted)
    }

    /// All saved words in the order they were added.
    pub async fn list_all(&self) -> Result<Vec<SavedWord>, StorageError> {
        let words: Vec<SavedWord> = query_as(&format!("{SELECT_WORDS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(words)
    }

    pub async fn get(&self, word: &str) -> Result<Option<SavedWord>, StorageError> {
        let saved: Option<SavedWord> = query_as(&format!("{SELECT_WORDS} WHERE word = ?"))
            .bind(word)
            .fetch_optional(&self.pool)
            .await?;
        Ok(saved)
    }

    /// Attempt to remove a word, returns true if the word was removed
    pub async fn delete(&self, word: &str) -> Result<bool, StorageError> {
        let result = query("DELETE FROM words WHERE word = ?")
            .bind(word)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(word, "deleted word");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use dictionary::Pronunciations;
    use sqlx::{Connection, SqliteConnection, SqlitePool};
    use tempfile::TempDir;

    use super::*;

    async fn setup_store() -> (VocabularyStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = VocabularyStore::open(&temp_dir.path().join("vocab.db"), Duration::from_secs(5))
            .await
            .expect("Failed to open store");
        (store, temp_dir)
    }

    fn record(word: &str, meaning: &str, synonyms: &[&str]) -> WordRecord {
        WordRecord {
            word: word.to_owned(),
            meaning: meaning.to_owned(),
            example: format!("The {word} is essential in my daily life."),
            synonyms: synonyms.iter().map(|synonym| synonym.to_string()).collect(),
            part_of_speech: "noun".to_owned(),
            pronunciations: Pronunciations::default(),
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent() {
        let (store, _temp) = setup_store().await;

        assert!(store.insert_if_absent(&record("apple", "a round fruit", &[])).await.unwrap());
        assert!(!store.insert_if_absent(&record("apple", "changed", &["x"])).await.unwrap());

        let words = store.list_all().await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].meaning, "a round fruit");
        assert_eq!(words[0].synonyms, "");
        assert_eq!(words[0].date_added, Some(Local::now().date_naive()));
    }

    #[tokio::test]
    async fn synonyms_round_trip() {
        let (store, _temp) = setup_store().await;
        store
            .insert_if_absent(&record("rapid", "fast", &["quick", "fast"]))
            .await
            .unwrap();

        let saved = store.get("rapid").await.unwrap().expect("word should be saved");
        assert_eq!(saved.synonyms, "quick, fast");
        assert_eq!(saved.synonym_list(), vec!["quick", "fast"]);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let (store, _temp) = setup_store().await;
        for word in ["cherry", "apple", "banana"] {
            store.insert_if_absent(&record(word, "fruit", &[])).await.unwrap();
        }
        let words: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|saved| saved.word)
            .collect();
        assert_eq!(words, vec!["cherry", "apple", "banana"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _temp) = setup_store().await;
        store.insert_if_absent(&record("apple", "fruit", &[])).await.unwrap();
        store.insert_if_absent(&record("table", "furniture", &[])).await.unwrap();

        assert!(store.delete("apple").await.unwrap());
        assert!(!store.delete("apple").await.unwrap());

        let words = store.list_all().await.unwrap();
        assert!(words.iter().all(|saved| saved.word != "apple"));
        assert_eq!(words.len(), 1);
    }

    #[tokio::test]
    async fn delete_matches_exact_word() {
        let (store, _temp) = setup_store().await;
        store.insert_if_absent(&record("Apple", "company", &[])).await.unwrap();
        assert!(!store.delete("apple").await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn evolves_old_schema_without_losing_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("old.db");

        let old = SqlitePool::connect_with(
            SqliteConnectOptions::new().filename(&path).create_if_missing(true),
        )
        .await
        .unwrap();
        query(
            "CREATE TABLE words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT UNIQUE,
                meaning TEXT,
                example TEXT,
                date_added TEXT
            )",
        )
        .execute(&old)
        .await
        .unwrap();
        query("INSERT INTO words (word, meaning, example, date_added) VALUES (?, ?, ?, ?)")
            .bind("chair")
            .bind("a seat")
            .bind("The chair is essential in my daily life.")
            .bind("2024-01-31")
            .execute(&old)
            .await
            .unwrap();
        old.close().await;

        let store = VocabularyStore::open(&path, Duration::from_secs(5)).await.unwrap();
        let columns = store.columns().await.unwrap();
        assert!(columns.iter().any(|column| column == "synonyms"));
        assert!(columns.iter().any(|column| column == "part_of_speech"));

        store.ensure_schema().await.unwrap();
        assert_eq!(store.columns().await.unwrap().len(), 7);

        let words = store.list_all().await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "chair");
        assert_eq!(words[0].meaning, "a seat");
        assert_eq!(words[0].synonyms, "");
        assert!(words[0].synonym_list().is_empty());
        assert_eq!(words[0].part_of_speech, "Unknown");
        assert_eq!(words[0].date_added, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[tokio::test]
    async fn reopening_keeps_saved_words() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vocab.db");
        {
            let store = VocabularyStore::open(&path, Duration::from_secs(5)).await.unwrap();
            store.insert_if_absent(&record("happy", "glad", &["glad"])).await.unwrap();
        }
        let store = VocabularyStore::open(&path, Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn locked_database_fails_the_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vocab.db");
        let store = VocabularyStore::open(&path, Duration::from_secs(1)).await.unwrap();

        let mut holder = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(&path))
            .await
            .unwrap();
        query("BEGIN EXCLUSIVE").execute(&mut holder).await.unwrap();

        let started = Instant::now();
        let result = store.insert_if_absent(&record("apple", "a round fruit", &[])).await;
        let waited = started.elapsed();
        assert!(
            matches!(result, Err(StorageError::Database(_))),
            "save under an exclusive lock gave {result:?}"
        );
        assert!(waited >= Duration::from_millis(900), "gave up after {waited:?}");
        assert!(waited < Duration::from_secs(5), "waited {waited:?}");

        query("ROLLBACK").execute(&mut holder).await.unwrap();
        holder.close().await.unwrap();
        assert!(store.insert_if_absent(&record("apple", "a round fruit", &[])).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
