use crate::feedback::{History, LetterResult};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the feedback so far says about the hidden word.
///
/// Recomputed from the full [`History`] on every attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    /// 0-based position -> letter that is known to be there.
    pub confirmed_positions: BTreeMap<usize, char>,
    /// Letter -> 1-based columns where it was marked present (so it is in the
    /// word, but not at those columns).
    pub misplaced_letters: BTreeMap<char, BTreeSet<usize>>,
    /// Letters that appear nowhere in the word.
    pub excluded_letters: BTreeSet<char>,
    pub tried_words: BTreeSet<String>,
}

impl ConstraintSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.confirmed_positions.is_empty()
            && self.misplaced_letters.is_empty()
            && self.excluded_letters.is_empty()
            && self.tried_words.is_empty()
    }

    /// Board template with confirmed letters filled in, e.g. `_ _ a _ _`.
    #[must_use]
    pub fn board(&self, word_size: usize) -> String {
        (0..word_size)
            .map(|i| self.confirmed_positions.get(&i).copied().unwrap_or('_'))
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Folds the history into a normalized constraint set.
#[must_use]
pub fn derive_constraints(history: &History, word_size: usize) -> ConstraintSet {
    let mut constraints = ConstraintSet::default();
    let mut absent = BTreeSet::new();

    for record in history {
        constraints.tried_words.insert(record.word().to_string());
        for (i, (letter, result)) in record.letters().enumerate() {
            match result {
                LetterResult::Correct => {
                    if i < word_size {
                        constraints.confirmed_positions.insert(i, letter);
                    }
                }
                LetterResult::Present => {
                    constraints
                        .misplaced_letters
                        .entry(letter)
                        .or_default()
                        .insert(i + 1);
                }
                LetterResult::Absent => {
                    absent.insert(letter);
                }
            }
        }
    }

    // A letter can be gray in one slot and green/yellow in another when the
    // guess repeats it more often than the target does.
    let known_present: BTreeSet<char> = constraints
        .confirmed_positions
        .values()
        .chain(constraints.misplaced_letters.keys())
        .copied()
        .collect();
    constraints.excluded_letters = absent.difference(&known_present).copied().collect();

    constraints
}

/// Whether `word` could still be the answer given `constraints`.
#[must_use]
pub fn is_consistent(word: &str, constraints: &ConstraintSet, word_size: usize) -> bool {
    let letters: Vec<char> = word.chars().collect();

    if letters.len() != word_size {
        return false;
    }
    if constraints.tried_words.contains(word) {
        return false;
    }

    for (&pos, &letter) in &constraints.confirmed_positions {
        if letters.get(pos) != Some(&letter) {
            return false;
        }
    }

    for (&letter, columns) in &constraints.misplaced_letters {
        if !letters.contains(&letter) {
            return false;
        }
        let at_bad_column = columns
            .iter()
            .any(|&column| column >= 1 && letters.get(column - 1) == Some(&letter));
        if at_bad_column {
            return false;
        }
    }

    !letters
        .iter()
        .any(|c| constraints.excluded_letters.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::GuessRecord;
    use LetterResult::{Absent, Correct, Present};

    fn history(entries: &[&str]) -> History {
        entries
            .iter()
            .map(|e| GuessRecord::parse(e).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_history_yields_empty_constraints() {
        let constraints = derive_constraints(&History::new(), 5);
        assert!(constraints.is_empty());
        assert_eq!(constraints, ConstraintSet::default());
    }

    #[test]
    fn test_crane_scenario() {
        let record =
            GuessRecord::new("crane", vec![Absent, Absent, Correct, Present, Absent]).unwrap();
        let constraints = derive_constraints(&std::iter::once(record).collect(), 5);

        assert_eq!(constraints.confirmed_positions, BTreeMap::from([(2, 'a')]));
        assert_eq!(
            constraints.misplaced_letters,
            BTreeMap::from([('n', BTreeSet::from([4]))])
        );
        assert_eq!(constraints.excluded_letters, BTreeSet::from(['c', 'r', 'e']));
        assert_eq!(constraints.tried_words, BTreeSet::from(["crane".to_string()]));

        // "slain" keeps 'a' at index 2 and moves 'n' to column 5
        assert!(is_consistent("slain", &constraints, 5));
        // 'a' away from index 2
        assert!(!is_consistent("salon", &constraints, 5));
        // 'n' back at column 4
        assert!(!is_consistent("plant", &constraints, 5));
        assert!(!is_consistent("giant", &constraints, 5));
        assert!(is_consistent("snaps", &constraints, 5));
    }

    #[test]
    fn test_correct_letter_is_confirmed_for_later_derivations() {
        let mut h = history(&["crane:XXGYX"]);
        h.push(GuessRecord::parse("snaps:XGGXX").unwrap());
        let constraints = derive_constraints(&h, 5);
        assert_eq!(constraints.confirmed_positions.get(&2), Some(&'a'));
        assert_eq!(constraints.confirmed_positions.get(&1), Some(&'n'));
    }

    #[test]
    fn test_present_then_absent_is_not_excluded() {
        let h = history(&["lemon:YXXXX", "hello:XXXXX"]);
        let constraints = derive_constraints(&h, 5);
        assert!(!constraints.excluded_letters.contains(&'l'));
        assert!(constraints.misplaced_letters.contains_key(&'l'));
        assert!(constraints.excluded_letters.contains(&'h'));
    }

    #[test]
    fn test_duplicate_letter_in_one_guess() {
        // target "cheap": only the middle 'e' of "geese" is green
        let h = history(&["geese:XXGXX"]);
        let constraints = derive_constraints(&h, 5);
        assert_eq!(constraints.confirmed_positions.get(&2), Some(&'e'));
        assert!(!constraints.excluded_letters.contains(&'e'));
        assert!(constraints.excluded_letters.contains(&'g'));
        assert!(constraints.excluded_letters.contains(&'s'));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let h = history(&["crane:XXGYX", "slant:XXGGX", "giant:XYGGX"]);
        assert_eq!(derive_constraints(&h, 5), derive_constraints(&h, 5));
    }

    #[test]
    fn test_positions_beyond_word_size_are_ignored() {
        let h = history(&["cranes:GGGGGG"]);
        let constraints = derive_constraints(&h, 5);
        assert_eq!(constraints.confirmed_positions.len(), 5);
        assert!(constraints.confirmed_positions.keys().all(|&p| p < 5));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let constraints = ConstraintSet::default();
        assert!(!is_consistent("cran", &constraints, 5));
        assert!(!is_consistent("cranes", &constraints, 5));
        assert!(!is_consistent("", &constraints, 5));
    }

    #[test]
    fn test_rejects_tried_words() {
        let constraints = derive_constraints(&history(&["crane:XXXXX"]), 5);
        assert!(!is_consistent("crane", &constraints, 5));
    }

    #[test]
    fn test_empty_constraints_accept_any_untried_word() {
        let constraints = ConstraintSet::default();
        for word in ["crane", "slate", "zzzzz", "abcde"] {
            assert!(is_consistent(word, &constraints, 5), "{word}");
        }
    }

    #[test]
    fn test_misplaced_letter_must_appear_elsewhere() {
        // 'n' yellow at column 4
        let constraints = derive_constraints(&history(&["crane:XXGYX"]), 5);
        assert!(!is_consistent("toast", &constraints, 5)); // no 'n'
        assert!(!is_consistent("ghant", &constraints, 5)); // 'n' at column 4 again
        assert!(!is_consistent("nasal", &constraints, 5)); // 'a' not at index 2
        assert!(is_consistent("snaky", &constraints, 5));
    }

    #[test]
    fn test_rejects_excluded_letters() {
        let constraints = derive_constraints(&history(&["crane:XXXXX"]), 5);
        assert!(!is_consistent("brick", &constraints, 5));
        assert!(is_consistent("tulip", &constraints, 5));
    }

    #[test]
    fn test_board_template() {
        let constraints = derive_constraints(&history(&["crane:XXGYG"]), 5);
        assert_eq!(constraints.board(5), "_ _ a _ e");
    }
}
