use proptest::prelude::*;
use synoptic_ingest::{Lexicon, VocabularyResolver};

fn resolver() -> VocabularyResolver {
    VocabularyResolver::new(Lexicon::build(
        ["carcinoma", "lobular", "nottingham", "histologic", "grade"],
        ["breast", "left", "right"],
    ))
}

fn non_whitespace(text: &str) -> usize {
    text.chars().filter(|ch| !ch.is_whitespace()).count()
}

#[test]
fn repairs_several_words_in_a_line() {
    let text = "Histo logic grade: 2\nLob ular carci noma, left breast";
    assert_eq!(
        resolver().resolve(text),
        "Histologic grade: 2\nLobular carcinoma, left breast"
    );
}

#[test]
fn unknown_words_survive_unchanged() {
    let text = "qzx wvy: 3";
    assert_eq!(resolver().resolve(text), text);
}

proptest! {
    #[test]
    fn never_drops_visible_characters(text in "[a-zA-Z0-9 :,.\\n-]{0,80}") {
        let out = resolver().resolve(&text);
        prop_assert_eq!(non_whitespace(&out), non_whitespace(&text));
    }

    #[test]
    fn never_adds_whitespace(text in "[a-z ]{0,60}") {
        let out = resolver().resolve(&text);
        let before = text.chars().filter(|ch| ch.is_whitespace()).count();
        let after = out.chars().filter(|ch| ch.is_whitespace()).count();
        prop_assert!(after <= before);
    }
}
