use lazy_static::lazy_static;
use regex::{Matches, Regex};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Runs of letters and digits; combining marks stay attached to the word they modify.
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}][\p{L}\p{M}\p{N}]*").expect("valid regex");
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","cannot","could",
    "did","do","does","doing","down","during",
    "each","few","for","from","further",
    "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
    "i","if","in","into","is","it","its","itself",
    "me","more","most","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","should","so","some","such",
    "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
    "under","until","up","very",
    "was","we","were","what","when","where","which","while","who","whom","why","with","would",
    "you","your","yours","yourself","yourselves",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "a","al","algo","algunas","algunos","ante","antes","como","con","contra","cual","cuando",
    "de","del","desde","donde","durante","e","el","él","ella","ellas","ellos","en","entre","era","es","esa","ese","eso",
    "esta","estar","estas","este","esto","estos","fue","ha","han","hasta","hay","la","las","le","les","lo","los",
    "me","mi","mí","mis","mucho","muchos","muy","más","nada","ni","no","nos","nosotras","nosotros",
    "o","os","otra","otras","otro","otros","para","pero","poco","por","porque","que","qué","quien","quienes",
    "se","ser","si","sí","sin","sobre","son","su","sus","también","tanto","te","ti","todo","todos","tu","tú","tus",
    "un","una","uno","unos","vosotras","vosotros","y","ya","yo",
];

/// Which built-in stop-word list, if any, is removed during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopWords {
    #[default]
    None,
    English,
    Spanish,
}

impl StopWords {
    fn words(self) -> &'static [&'static str] {
        match self {
            StopWords::None => &[],
            StopWords::English => ENGLISH_STOPWORDS,
            StopWords::Spanish => SPANISH_STOPWORDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemLanguage {
    English,
    Spanish,
}

impl StemLanguage {
    fn algorithm(self) -> Algorithm {
        match self {
            StemLanguage::English => Algorithm::English,
            StemLanguage::Spanish => Algorithm::Spanish,
        }
    }
}

/// Normalization policy. It is stored inside every index so that queries are
/// normalized exactly like the documents they are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Terms shorter than this many characters are dropped.
    pub min_token_len: usize,
    pub stopwords: StopWords,
    /// Strip diacritics, so "título" and "titulo" yield the same term.
    pub fold_accents: bool,
    pub stemmer: Option<StemLanguage>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { min_token_len: 1, stopwords: StopWords::None, fold_accents: true, stemmer: None }
    }
}

pub struct Tokenizer {
    config: TokenizerConfig,
    stopwords: HashSet<String>,
    stemmer: Option<Stemmer>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer").field("config", &self.config).finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let mut tokenizer = Self {
            stopwords: HashSet::new(),
            stemmer: config.stemmer.map(|lang| Stemmer::create(lang.algorithm())),
            config,
        };
        // Stop words go through the same case and accent folding as document text.
        tokenizer.stopwords = tokenizer.config.stopwords.words().iter().map(|w| tokenizer.fold(w)).collect();
        tokenizer
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Lazily yields the normalized terms of `text` in document order.
    /// Calling it again on the same text restarts the sequence.
    pub fn terms<'a>(&'a self, text: &'a str) -> Terms<'a> {
        let re: &'static Regex = &WORD;
        Terms { tokenizer: self, matches: re.find_iter(text) }
    }

    fn fold(&self, word: &str) -> String {
        if self.config.fold_accents {
            word.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
        } else {
            word.nfkc().collect::<String>().to_lowercase()
        }
    }

    fn normalize(&self, word: &str) -> Option<String> {
        let folded = self.fold(word);
        if folded.is_empty() || folded.chars().count() < self.config.min_token_len {
            return None;
        }
        if self.stopwords.contains(&folded) {
            return None;
        }
        match &self.stemmer {
            Some(stemmer) => Some(stemmer.stem(&folded).into_owned()),
            None => Some(folded),
        }
    }
}

pub struct Terms<'a> {
    tokenizer: &'a Tokenizer,
    matches: Matches<'static, 'a>,
}

impl Iterator for Terms<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let word = self.matches.next()?;
            if let Some(term) = self.tokenizer.normalize(word.as_str()) {
                return Some(term);
            }
        }
    }
}

/// Tokenize with the default policy.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().terms(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        let t = tokenize("Universidad Europea, MADRID!campus");
        assert_eq!(t, vec!["universidad", "europea", "madrid", "campus"]);
    }

    #[test]
    fn replacement_chars_are_boundaries() {
        let raw = String::from_utf8_lossy(b"caf\xffmenu").into_owned();
        assert_eq!(tokenize(&raw), vec!["caf", "menu"]);
    }

    #[test]
    fn folds_accents_when_enabled() {
        assert_eq!(tokenize("Título Información"), vec!["titulo", "informacion"]);

        let keep = Tokenizer::new(TokenizerConfig { fold_accents: false, ..TokenizerConfig::default() });
        let t: Vec<String> = keep.terms("Título").collect();
        assert_eq!(t, vec!["título"]);
    }

    #[test]
    fn min_len_and_stopwords() {
        let tok = Tokenizer::new(TokenizerConfig {
            min_token_len: 3,
            stopwords: StopWords::Spanish,
            ..TokenizerConfig::default()
        });
        let t: Vec<String> = tok.terms("la universidad de más prestigio es UE").collect();
        assert_eq!(t, vec!["universidad", "prestigio"]);
    }

    #[test]
    fn terms_are_restartable() {
        let tok = Tokenizer::default();
        let text = "alpha beta gamma";
        let first: Vec<String> = tok.terms(text).collect();
        let second: Vec<String> = tok.terms(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn stems_when_configured() {
        let tok = Tokenizer::new(TokenizerConfig { stemmer: Some(StemLanguage::English), ..TokenizerConfig::default() });
        let t: Vec<String> = tok.terms("Running runs").collect();
        assert_eq!(t, vec!["run", "run"]);
    }
}
