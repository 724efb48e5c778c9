// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a bilingual corpus stored as JSON lines, one record per
// line, in the shape of the opus_books export:
//
//   {"id": "0", "translation": {"en": "Source text", "it": "Testo"}}
//
// and resolves each record to a TranslationPair for the
// configured language pair. Records that miss either language,
// blank lines and lines that do not parse are skipped with a
// warning rather than failing the whole corpus.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

use crate::domain::traits::PairSource;
use crate::domain::translation_pair::TranslationPair;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    translation: HashMap<String, String>,
}

/// Loads sentence pairs for `lang_src → lang_tgt` from a JSONL file.
pub struct JsonlCorpusLoader {
    path:     PathBuf,
    lang_src: String,
    lang_tgt: String,
}

impl JsonlCorpusLoader {
    pub fn new(
        path:     impl Into<PathBuf>,
        lang_src: impl Into<String>,
        lang_tgt: impl Into<String>,
    ) -> Self {
        Self {
            path:     path.into(),
            lang_src: lang_src.into(),
            lang_tgt: lang_tgt.into(),
        }
    }

    /// Parse corpus text already in memory.
    pub fn parse(&self, contents: &str) -> Vec<TranslationPair> {
        let mut pairs   = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: CorpusRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping line {}: {}", line_no + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            match (
                record.translation.get(&self.lang_src),
                record.translation.get(&self.lang_tgt),
            ) {
                (Some(source), Some(target)) => {
                    pairs.push(TranslationPair::new(source.as_str(), target.as_str()));
                }
                _ => {
                    tracing::warn!(
                        "Skipping line {}: missing '{}' or '{}'",
                        line_no + 1,
                        self.lang_src,
                        self.lang_tgt
                    );
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} corpus records", skipped);
        }
        pairs
    }
}

impl PairSource for JsonlCorpusLoader {
    fn load_pairs(&self) -> Result<Vec<TranslationPair>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;

        let pairs = self.parse(&contents);
        tracing::info!(
            "Loaded {} {}→{} pairs from '{}'",
            pairs.len(),
            self.lang_src,
            self.lang_tgt,
            self.path.display()
        );
        Ok(pairs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORPUS: &str = r#"{"id": "0", "translation": {"en": "Hello.", "it": "Ciao."}}
{"id": "1", "translation": {"en": "Only English."}}

not json at all
{"id": "3", "translation": {"it": "Buongiorno!", "en": "Good morning!", "fr": "Bonjour !"}}
"#;

    #[test]
    fn test_parse_keeps_complete_records() {
        let loader = JsonlCorpusLoader::new("unused", "en", "it");
        let pairs  = loader.parse(CORPUS);
        assert_eq!(
            pairs,
            vec![
                TranslationPair::new("Hello.", "Ciao."),
                TranslationPair::new("Good morning!", "Buongiorno!"),
            ]
        );
    }

    #[test]
    fn test_language_direction_is_configurable() {
        let loader = JsonlCorpusLoader::new("unused", "fr", "en");
        let pairs  = loader.parse(CORPUS);
        assert_eq!(pairs, vec![TranslationPair::new("Bonjour !", "Good morning!")]);
    }

    #[test]
    fn test_load_pairs_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CORPUS.as_bytes()).unwrap();

        let loader = JsonlCorpusLoader::new(file.path(), "en", "it");
        assert_eq!(loader.load_pairs().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = JsonlCorpusLoader::new("/definitely/not/here.jsonl", "en", "it");
        assert!(loader.load_pairs().is_err());
    }
}
