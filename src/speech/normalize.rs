//! Final-transcript cleanup.
//!
//! Speech engines hand back lowercase, sparsely punctuated text. The rules
//! below run in a fixed order; the capitalization passes depend on the
//! terminal-punctuation pass having run first.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn space_after_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?])([A-Za-z])").expect("valid pattern"))
}

fn space_before_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([.!?,])").expect("valid pattern"))
}

fn missing_terminal_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^.!?])$").expect("valid pattern"))
}

fn sentence_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|[.!?]\s+)([a-z])").expect("valid pattern"))
}

fn leading_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]").expect("valid pattern"))
}

/// Normalize a final transcript: fix spacing around sentence punctuation,
/// guarantee terminal punctuation, and capitalize sentence starts.
///
/// Idempotent: running the result through again changes nothing.
pub fn normalize_final_transcript(text: &str) -> String {
    // Surrounding whitespace would defeat the terminal-punctuation rule.
    let text = text.trim();

    let text = space_after_punct().replace_all(text, "$1 $2");
    let text = space_before_punct().replace_all(&text, "$1");
    let text = missing_terminal_punct().replace_all(&text, "$1.");
    let text = sentence_start().replace_all(&text, |caps: &Captures| {
        format!("{}{}", &caps[1], caps[2].to_uppercase())
    });
    let text = leading_letter().replace_all(&text, |caps: &Captures| caps[0].to_uppercase());

    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_period_and_capitalizes() {
        assert_eq!(
            normalize_final_transcript("hallo hoe gaat het"),
            "Hallo hoe gaat het."
        );
    }

    #[test]
    fn test_splits_glued_sentences() {
        assert_eq!(
            normalize_final_transcript("wat is dit?geen idee"),
            "Wat is dit? Geen idee."
        );
    }

    #[test]
    fn test_strips_space_before_punctuation() {
        assert_eq!(
            normalize_final_transcript("dat klopt , denk ik !"),
            "Dat klopt, denk ik!"
        );
    }

    #[test]
    fn test_keeps_existing_terminal_punctuation() {
        assert_eq!(normalize_final_transcript("Is dat zo?"), "Is dat zo?");
    }

    #[test]
    fn test_capitalizes_every_sentence_start() {
        assert_eq!(
            normalize_final_transcript("ja. nee. misschien"),
            "Ja. Nee. Misschien."
        );
    }

    #[test]
    fn test_idempotent_on_normalized_input() {
        for input in [
            "hallo hoe gaat het",
            "wat is dit?geen idee",
            "dat klopt , denk ik",
            "al netjes. echt waar!",
            "hallo   ",
        ] {
            let once = normalize_final_transcript(input);
            assert_eq!(normalize_final_transcript(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(normalize_final_transcript(""), "");
        assert_eq!(normalize_final_transcript("   "), "");
    }
}
