use search_core::tokenizer::{Tokenizer, WordTokenizer};

#[test]
fn it_normalizes_and_stems() {
    let words: Vec<String> = WordTokenizer::new(true, true).tokenize("Running Runners RUN!").collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the ligature
    let words: Vec<String> = WordTokenizer::default().tokenize("The ﬁle menu.").collect();
    assert_eq!(words, vec!["the", "file", "menu"]);
}

#[test]
fn it_filters_stopwords() {
    let words: Vec<String> = WordTokenizer::new(false, true).tokenize("The quick brown fox and the lazy dog").collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"quick".to_string()));
}

#[test]
fn it_keeps_operator_words_by_default() {
    let words: Vec<String> = WordTokenizer::default().tokenize("Salt AND pepper or not").collect();
    assert_eq!(words, vec!["salt", "and", "pepper", "or", "not"]);
}
