use recs_core::tokenizer::tokenize;

#[test]
fn it_normalizes_and_lowercases() {
    let words = tokenize("Café CHAIRS, ﬁne oak");
    // NFKC folds the "fi" ligature; accents survive as letters.
    assert_eq!(words, vec!["café", "chairs", "fine", "oak"]);
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_drops_contraction_stopwords_whole() {
    let words = tokenize("Don't miss this bike's gears");
    assert_eq!(words, vec!["miss", "bike", "gears"]);
}
