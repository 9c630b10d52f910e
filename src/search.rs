use crate::Note;

/// Similarity above which a note counts as a fuzzy hit.
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// Dice coefficient over character bigrams, whitespace ignored.
///
/// Identical inputs score 1.0. Anything shorter than two characters scores
/// 0.0 unless it is identical to the other side.
pub fn similarity(first: &str, second: &str) -> f64 {
    strsim::sorensen_dice(first, second)
}

/// Matches a note's content against a query with the default threshold.
pub fn matches(note: &Note, query: &str) -> bool {
    SearchFilter::default().matches(note, query)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchFilter {
    pub threshold: f64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn matches(&self, note: &Note, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let content = note.content.to_lowercase();
        let query = query.to_lowercase();

        similarity(&content, &query) > self.threshold || content.contains(&query)
    }

    /// Keeps the notes that match, in their original order.
    pub fn apply(&self, notes: Vec<Note>, query: &str) -> Vec<Note> {
        notes
            .into_iter()
            .filter(|note| self.matches(note, query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str) -> Note {
        Note::new("title", content, 0)
    }

    #[test]
    fn test_similarity_known_values() {
        assert!((similarity("healed", "sealed") - 0.8).abs() < 1e-9);
        assert!((similarity("night", "nacht") - 0.25).abs() < 1e-9);
        assert_eq!(similarity("same", "same"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("a", "ab"), 0.0);
    }

    #[test]
    fn test_similarity_ignores_whitespace() {
        assert_eq!(similarity("to do list", "todolist"), 1.0);
    }

    #[test]
    fn test_similarity_respects_bigram_multiplicity() {
        // "aaaa" has three "aa" bigrams, "aa" only one
        assert!((similarity("aaaa", "aa") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(matches(&note("anything at all"), ""));
        assert!(matches(&note(""), ""));
    }

    #[test]
    fn test_substring_always_matches() {
        let long = note("Remember to buy milk, eggs, bread and a very long list of other things");
        assert!(similarity(&long.content.to_lowercase(), "milk") <= DEFAULT_THRESHOLD);
        assert!(matches(&long, "MILK"));
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        assert!(matches(&note("groceries"), "grocereis"));
        assert!(!matches(&note("groceries"), "xylophone"));
    }

    #[test]
    fn test_threshold_is_strict() {
        // similarity("night", "nacht") is exactly 0.25 and "nacht" is not a substring
        assert!(!matches(&note("night"), "nacht"));
        assert!(SearchFilter::new(0.2).matches(&note("night"), "nacht"));
    }

    #[test]
    fn test_apply_keeps_order() {
        let notes = vec![note("alpha"), note("beta"), note("alphabet")];
        let hits = SearchFilter::default().apply(notes, "alpha");
        let contents: Vec<_> = hits.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha", "alphabet"]);
    }
}
