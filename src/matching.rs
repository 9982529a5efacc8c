//! Bitap approximate matching: locate a pattern in text near an
//! expected location, tolerating errors up to the configured threshold
//! and penalizing positional drift.

use std::collections::HashMap;

use crate::{chars, Mend};

impl Mend {
    /// Find the position nearest `loc` where `pattern` best matches
    /// `text`, or `None` if nothing scores under the match threshold.
    ///
    /// The score weighs character errors against distance from `loc`:
    /// with the defaults, an exact match `match_distance` characters
    /// away scores the same as a pattern-length's worth of errors in
    /// place.
    ///
    /// # Example
    /// ```
    /// use mend::Mend;
    ///
    /// let mend = Mend::new();
    /// assert_eq!(Some(4), mend.match_main("abcdefghijk", "efg", 0));
    /// assert_eq!(None, mend.match_main("abcdefghijk", "zzz", 0));
    /// ```
    pub fn match_main(&self, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();

        self.match_chars(&text, &pattern, loc)
    }

    pub(crate) fn match_chars(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        let loc = loc.min(text.len());

        if text == pattern {
            // Shortcut; also covers two empty inputs.
            return Some(0);
        }
        if text.is_empty() {
            return None;
        }
        if pattern.is_empty() {
            // Nothing to match; report the requested spot.
            return Some(loc);
        }

        if loc + pattern.len() <= text.len() && &text[loc..loc + pattern.len()] == pattern {
            // Perfect match at the perfect spot.
            return Some(loc);
        }

        self.bitap(text, pattern, loc)
    }

    // One bit per pattern position, so the pattern must fit in a word.
    pub(crate) fn bitap(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        if pattern.len() > self.match_max_bits() {
            return None;
        }

        let alphabet = alphabet(pattern);

        // Highest score still worth considering; shrinks as matches
        // turn up.
        let mut score_limit = self.match_threshold();

        // A nearby exact match caps the score cheaply from both sides.
        if let Some(best) = chars::find(text, pattern, loc) {
            score_limit = self.bitap_score(0, best, loc, pattern.len()).min(score_limit);

            if let Some(best) = chars::rfind(text, pattern, loc + pattern.len()) {
                score_limit = self.bitap_score(0, best, loc, pattern.len()).min(score_limit);
            }
        }

        let match_mask = 1_usize << (pattern.len() - 1);
        let mut best_loc = None;

        let mut bin_max = pattern.len() + text.len();
        let mut last_rd: Vec<usize> = Vec::new();

        for d in 0..pattern.len() {
            // How far from `loc` can a match with d errors sit and
            // still beat the score limit? Binary search the radius.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.bitap_score(d, loc + bin_mid, loc, pattern.len()) <= score_limit {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // This radius is the ceiling for the next error count too.
            bin_max = bin_mid;

            let mut start = if loc > bin_mid { loc - bin_mid + 1 } else { 1 };
            let finish = (loc + bin_mid).min(text.len()) + pattern.len();

            // rd[j] bit i set = pattern[..i+1] matches ending at j-1
            // with <= d errors.
            let mut rd = vec![0_usize; finish + 2];
            rd[finish + 1] = (1 << d) - 1;

            let mut j = finish;
            while j >= start {
                let char_match = if text.len() < j {
                    0
                } else {
                    alphabet.get(&text[j - 1]).copied().unwrap_or(0)
                };

                rd[j] = if d == 0 {
                    // First pass: exact matches only.
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    // Shift in a match, or carry a substitution,
                    // insertion or deletion from the previous error
                    // level.
                    (((rd[j + 1] << 1) | 1) & char_match)
                        | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                        | last_rd[j + 1]
                };

                if rd[j] & match_mask != 0 {
                    let score = self.bitap_score(d, j - 1, loc, pattern.len());
                    // This match will almost certainly be better than
                    // any existing one, but check anyway.
                    if score <= score_limit {
                        score_limit = score;
                        let found = j - 1;
                        best_loc = Some(found);
                        if found > loc {
                            // Passed loc; don't stray further than the
                            // current best distance on the near side.
                            start = 1.max((2 * loc).saturating_sub(found));
                        } else {
                            // Already before loc; downhill from here.
                            break;
                        }
                    }
                }

                j -= 1;
            }

            // No better match possible with more errors?
            if self.bitap_score(d + 1, loc, loc, pattern.len()) > score_limit {
                break;
            }

            last_rd = rd;
        }

        best_loc
    }

    // Score a match with `errors` errors at `pos`: error rate plus
    // scaled distance from the expected location, lower is better.
    fn bitap_score(&self, errors: usize, pos: usize, loc: usize, pattern_len: usize) -> f32 {
        let accuracy = errors as f32 / pattern_len as f32;
        let drift = loc.abs_diff(pos);

        if self.match_distance() == 0 {
            // Drift is all-or-nothing without a distance scale.
            return if drift > 0 { 1.0 } else { accuracy };
        }

        accuracy + drift as f32 / self.match_distance() as f32
    }
}

// Bitmask per pattern character: bit i set means the character appears
// at position |pattern| - i - 1. Duplicates OR together.
pub(crate) fn alphabet(pattern: &[char]) -> HashMap<char, usize> {
    let mut masks = HashMap::with_capacity(pattern.len());

    for (i, &ch) in pattern.iter().enumerate() {
        *masks.entry(ch).or_insert(0) |= 1_usize << (pattern.len() - i - 1);
    }

    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn test_alphabet() {
        // Unique.
        assert_eq!(
            HashMap::from([('a', 4), ('b', 2), ('c', 1)]),
            alphabet(&c("abc"))
        );

        // Duplicates OR in.
        assert_eq!(
            HashMap::from([('a', 37), ('b', 18), ('c', 8)]),
            alphabet(&c("abcaba"))
        );
    }

    #[test]
    fn test_bitap() {
        let mut mend = Mend::new();
        mend.set_match_distance(100);

        // Exact matches.
        assert_eq!(Some(5), mend.bitap(&c("abcdefghijk"), &c("fgh"), 5));
        assert_eq!(Some(5), mend.bitap(&c("abcdefghijk"), &c("fgh"), 0));

        // Fuzzy matches.
        assert_eq!(Some(4), mend.bitap(&c("abcdefghijk"), &c("efxhi"), 0));
        assert_eq!(Some(2), mend.bitap(&c("abcdefghijk"), &c("cdefxyhijk"), 5));
        assert_eq!(None, mend.bitap(&c("abcdefghijk"), &c("bxy"), 1));

        // Overflow.
        assert_eq!(Some(2), mend.bitap(&c("123456789xx0"), &c("3456789x0"), 2));

        // Threshold test.
        mend.set_match_threshold(0.4);
        assert_eq!(Some(4), mend.bitap(&c("abcdefghijk"), &c("efxyhi"), 1));

        mend.set_match_threshold(0.3);
        assert_eq!(None, mend.bitap(&c("abcdefghijk"), &c("efxyhi"), 1));

        mend.set_match_threshold(0.0);
        assert_eq!(Some(1), mend.bitap(&c("abcdefghijk"), &c("bcdef"), 1));
        mend.set_match_threshold(0.5);

        // Multiple selects.
        assert_eq!(Some(0), mend.bitap(&c("abcdexyzabcde"), &c("abccde"), 3));
        assert_eq!(Some(8), mend.bitap(&c("abcdexyzabcde"), &c("abccde"), 5));

        // Distance test.
        mend.set_match_distance(10);
        assert_eq!(
            None,
            mend.bitap(&c("abcdefghijklmnopqrstuvwxyz"), &c("abcdefg"), 24)
        );
        assert_eq!(
            Some(0),
            mend.bitap(&c("abcdefghijklmnopqrstuvwxyz"), &c("abcdxxefg"), 1)
        );

        mend.set_match_distance(1000);
        assert_eq!(
            Some(0),
            mend.bitap(&c("abcdefghijklmnopqrstuvwxyz"), &c("abcdefg"), 24)
        );
    }

    #[test]
    fn test_match_main() {
        let mend = Mend::new();

        // Identical texts match at the origin.
        assert_eq!(Some(0), mend.match_main("abcdef", "abcdef", 1000));

        // Nothing matches in an empty text.
        assert_eq!(None, mend.match_main("", "abcdef", 1));

        // An empty pattern matches wherever asked, clamped to the text.
        assert_eq!(Some(3), mend.match_main("abcdef", "", 3));
        assert_eq!(Some(6), mend.match_main("abcdef", "", 100));

        // Exact and fuzzy.
        assert_eq!(Some(3), mend.match_main("abcdef", "de", 3));
        assert_eq!(Some(3), mend.match_main("abcdef", "defy", 4));
        assert_eq!(Some(0), mend.match_main("abcdef", "abcdefy", 0));

        // Location drift weighed against character errors.
        let mut mend = Mend::new();
        mend.set_match_threshold(0.7);
        assert_eq!(
            Some(4),
            mend.match_main("I am the very model of a modern major general.", " that berry ", 5)
        );
    }

    #[test]
    fn test_oversized_pattern_is_rejected() {
        let mend = Mend::new();
        let pattern: String = "x".repeat(33);
        let text = format!("padding {pattern} padding");
        assert_eq!(None, mend.match_main(&text, &pattern, 0));

        // At the limit it still runs.
        let pattern: String = "x".repeat(32);
        let text = format!("padding {pattern} padding");
        assert_eq!(Some(8), mend.match_main(&text, &pattern, 0));
    }
}
