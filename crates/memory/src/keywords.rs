//! Keyword extraction for relevance scoring.
//!
//! Deliberately cheap: lowercase, split on non-alphanumeric, keep words
//! longer than 3 characters, drop stop words. Stop-word lists cover English
//! and Russian; splitting is Unicode-aware so other scripts degrade to plain
//! length filtering rather than breaking.

use std::collections::BTreeSet;

const STOP_WORDS_EN: &[&str] = &[
    "about", "after", "against", "all", "also", "and", "any", "are", "because", "been",
    "before", "being", "between", "both", "but", "can", "could", "does", "down", "each",
    "find", "from", "has", "have", "having", "here", "his", "how", "into", "its",
    "just", "like", "looking", "made", "make", "more", "most", "much", "must", "need",
    "needs", "not", "now", "only", "other", "our", "over", "own", "per", "same",
    "should", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "under", "until", "very", "want", "was",
    "were", "what", "when", "where", "which", "while", "who", "will", "with", "would",
    "your",
];

const STOP_WORDS_RU: &[&str] = &[
    "быть", "весь", "всех", "где", "для", "если", "есть", "или", "как", "какой",
    "когда", "которые", "который", "куда", "меня", "может", "можно", "надо", "нам",
    "нас", "наш", "него", "нет", "них", "нужен", "нужно", "однако", "около", "они",
    "оно", "опять", "после", "потом", "почти", "при", "про", "так", "также", "там",
    "тебя", "тем", "теперь", "того", "тоже", "только", "том", "тут", "чего", "чем",
    "через", "что", "чтобы", "эта", "эти", "это", "этого", "этой", "этот",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS_EN.binary_search(&word).is_ok() || STOP_WORDS_RU.binary_search(&word).is_ok()
}

/// Extract the normalized keyword set from free text.
pub fn extract(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .filter(|w| !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Count how many of `query` keywords appear in `target`.
pub fn overlap(query: &BTreeSet<String>, target: &BTreeSet<String>) -> usize {
    query.intersection(target).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_word_lists_are_sorted() {
        // binary_search above depends on this
        assert!(STOP_WORDS_EN.windows(2).all(|w| w[0] < w[1]));
        assert!(STOP_WORDS_RU.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn short_and_stop_words_dropped() {
        let kw = extract("Find an SMS provider with direct routes to Argentina");
        assert!(kw.contains("provider"));
        assert!(kw.contains("direct"));
        assert!(kw.contains("routes"));
        assert!(kw.contains("argentina"));
        // "find" and "with" are stop words; "an"/"to"/"SMS" too short
        assert!(!kw.contains("find"));
        assert!(!kw.contains("with"));
        assert!(!kw.contains("sms"));
    }

    #[test]
    fn russian_stop_words_dropped() {
        let kw = extract("Найти провайдера для рассылки через прямые маршруты");
        assert!(kw.contains("провайдера"));
        assert!(kw.contains("рассылки"));
        assert!(kw.contains("маршруты"));
        assert!(!kw.contains("для"));
        assert!(!kw.contains("через"));
    }

    #[test]
    fn punctuation_stripped() {
        let kw = extract("price: under $0.05/SMS (REST-API)!");
        assert!(kw.contains("price"));
        assert!(kw.contains("rest"));
        // "under" is a stop word, "api" is too short
        assert!(!kw.contains("under"));
        assert!(!kw.contains("api"));
    }

    #[test]
    fn overlap_counts_shared_keywords() {
        let a = extract("sms provider argentina routes");
        let b = extract("argentina telecom routes pricing");
        assert_eq!(overlap(&a, &b), 2);
        assert_eq!(overlap(&a, &extract("unrelated topic entirely")), 0);
    }
}
