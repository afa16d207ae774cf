use jieba_rs::Jieba;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

use crate::config::{TokenizerConfig, TokenizerKind};

lazy_static! {
    static ref JIEBA: Jieba = Jieba::new();
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Splits document text into index terms.
///
/// Query words are run through the same tokenizer, one whitespace-separated word
/// at a time, so a word like `rust-lang` looks up the same sub-terms it was indexed as.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;

    /// Index terms for one query word. Empty when the word is all punctuation or a stopword.
    fn query_terms(&self, word: &str) -> Vec<String> { self.tokenize(word).collect() }
}

/// Whitespace split, terms kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(text.split_whitespace().map(str::to_string))
    }
}

fn normalize(token: &str) -> String { token.nfkc().collect::<String>().to_lowercase() }

/// NFKC normalization, lowercase, letter-run matching, with optional stopword removal and stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer {
    pub stem: bool,
    pub stopwords: bool,
}

impl WordTokenizer {
    pub fn new(stem: bool, stopwords: bool) -> Self { Self { stem, stopwords } }

    fn finish(&self, token: String) -> Option<String> {
        if self.stopwords && is_stopword(&token) { return None; }
        Some(if self.stem { STEMMER.stem(&token).into_owned() } else { token })
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(RE.find_iter(text).filter_map(move |mat| self.finish(normalize(mat.as_str()))))
    }
}

/// Chinese word segmentation in search mode: long words are also emitted as their
/// dictionary sub-words, so `搜索` finds a document containing `搜索引擎`.
/// Tokens without a letter or digit (punctuation, whitespace) are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JiebaTokenizer {
    pub stopwords: bool,
}

impl JiebaTokenizer {
    pub fn new(stopwords: bool) -> Self { Self { stopwords } }
}

impl Tokenizer for JiebaTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        let words = JIEBA.cut_for_search(text, true);
        Box::new(
            words
                .into_iter()
                .filter(|w| w.chars().any(char::is_alphanumeric))
                .map(normalize)
                .filter(move |w| !(self.stopwords && is_stopword(w))),
        )
    }
}

/// Build the tokenizer described by `config`.
pub fn from_config(config: &TokenizerConfig) -> Box<dyn Tokenizer> {
    match config.kind {
        TokenizerKind::Word => Box::new(WordTokenizer::new(config.stem, config.stopwords)),
        TokenizerKind::Jieba => Box::new(JiebaTokenizer::new(config.stopwords)),
        TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t: Vec<String> = WordTokenizer::new(true, true).tokenize("Running, runner's run!").collect();
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn whitespace_keeps_case() {
        let t: Vec<String> = WhitespaceTokenizer.tokenize("  Foo bar\tBAZ ").collect();
        assert_eq!(t, vec!["Foo", "bar", "BAZ"]);
    }

    #[test]
    fn query_terms_normalize_like_documents() {
        let tok = WordTokenizer::new(true, false);
        let indexed: Vec<String> = tok.tokenize("Searching").collect();
        assert_eq!(indexed, tok.query_terms("SEARCHING"));
    }

    #[test]
    fn query_word_splits_on_punctuation() {
        let tok = WordTokenizer::default();
        assert_eq!(tok.query_terms("Rust-Lang"), vec!["rust", "lang"]);
        assert_eq!(tok.query_terms("book."), vec!["book"]);
        assert!(tok.query_terms("(").is_empty());
        assert!(WordTokenizer::new(false, true).query_terms("The").is_empty());
    }

    #[test]
    fn word_tokenizer_is_lazy_over_matches() {
        let tok = WordTokenizer::default();
        let mut it = tok.tokenize("alpha beta gamma");
        assert_eq!(it.next().as_deref(), Some("alpha"));
        assert_eq!(it.count(), 2);
    }

    #[test]
    fn jieba_segments_chinese_with_sub_words() {
        let t: Vec<String> = JiebaTokenizer::default().tokenize("搜索引擎很好用。").collect();
        assert!(t.contains(&"搜索".to_string()));
        assert!(t.contains(&"搜索引擎".to_string()));
        assert!(!t.iter().any(|w| w == "。"));
    }

    #[test]
    fn jieba_lowercases_latin_words() {
        let t: Vec<String> = JiebaTokenizer::default().tokenize("Rust 很好").collect();
        assert!(t.contains(&"rust".to_string()));
    }
}
