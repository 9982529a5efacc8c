//! Edit-script serialization: source/target reconstruction, the
//! tab-separated delta wire form, offset translation and Levenshtein
//! distance.

use crate::{errors::Error, uri, Diff, Mend, Op};

pub(crate) fn text_old_chars(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Op::Insert)
        .flat_map(|diff| diff.chars().iter().copied())
        .collect()
}

pub(crate) fn text_new_chars(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Op::Delete)
        .flat_map(|diff| diff.chars().iter().copied())
        .collect()
}

impl Mend {
    /// The source text a script was computed from: everything except
    /// insertions.
    pub fn diff_text_old(diffs: &[Diff]) -> String {
        text_old_chars(diffs).into_iter().collect()
    }

    /// The target text a script produces: everything except deletions.
    pub fn diff_text_new(diffs: &[Diff]) -> String {
        text_new_chars(diffs).into_iter().collect()
    }

    /// Crush a script into a delta string: `=n` keeps n characters,
    /// `-n` drops n, `+text` adds percent-encoded text, tab-separated.
    /// `jumps` -> `jumped` comes out as `=4\t-1\t+ed`.
    ///
    /// Paired with the source text, [`Mend::diff_from_delta`] rebuilds
    /// the full script, so only the delta needs to travel.
    pub fn diff_to_delta(diffs: &[Diff]) -> String {
        let tokens: Vec<String> = diffs
            .iter()
            .map(|diff| match diff.op {
                Op::Insert => format!("+{}", uri::encode(diff.chars())),
                Op::Delete => format!("-{}", diff.len()),
                Op::Equal => format!("={}", diff.len()),
            })
            .collect();

        tokens.join("\t")
    }

    /// Rebuild the full script from the source text and a delta
    /// produced by [`Mend::diff_to_delta`].
    ///
    /// Fails if the delta is malformed or doesn't span exactly the
    /// source text.
    pub fn diff_from_delta(old: &str, delta: &str) -> Result<Vec<Diff>, Error> {
        let old: Vec<char> = old.chars().collect();

        let mut diffs = Vec::new();
        // Cursor into `old`, advanced by every keep and drop.
        let mut pointer = 0;

        for token in delta.split('\t') {
            if token.is_empty() {
                // Blank tokens are okay (from a blank delta).
                continue;
            }

            // One-character opcode, then the parameter.
            let opcode = token.chars().next().unwrap_or_default();
            let param = &token[opcode.len_utf8()..];

            match opcode {
                '+' => diffs.push(Diff {
                    op: Op::Insert,
                    text: uri::decode(param)?,
                }),
                '-' | '=' => {
                    let n: usize = param
                        .parse()
                        .map_err(|_| Error::MalformedDelta(token.to_string()))?;

                    let end = pointer + n;
                    if end > old.len() {
                        return Err(Error::DeltaLengthMismatch {
                            consumed: end,
                            expected: old.len(),
                        });
                    }

                    let op = if opcode == '=' { Op::Equal } else { Op::Delete };
                    diffs.push(Diff::from_chars(op, &old[pointer..end]));
                    pointer = end;
                }
                _ => return Err(Error::MalformedDelta(token.to_string())),
            }
        }

        if pointer != old.len() {
            return Err(Error::DeltaLengthMismatch {
                consumed: pointer,
                expected: old.len(),
            });
        }

        Ok(diffs)
    }

    /// Translate a position in the source text to its counterpart in
    /// the target text. Positions inside a deletion land at the start
    /// of what follows it.
    pub fn x_index(diffs: &[Diff], loc: usize) -> usize {
        let mut chars_old = 0;
        let mut chars_new = 0;
        let mut last_old = 0;
        let mut last_new = 0;

        let mut overshot = None;
        for diff in diffs {
            if diff.op != Op::Insert {
                chars_old += diff.len();
            }
            if diff.op != Op::Delete {
                chars_new += diff.len();
            }
            if chars_old > loc {
                overshot = Some(diff);
                break;
            }
            last_old = chars_old;
            last_new = chars_new;
        }

        if let Some(diff) = overshot {
            if diff.op == Op::Delete {
                // The location was deleted.
                return last_new;
            }
        }

        last_new + (loc - last_old)
    }

    /// The Levenshtein distance of a script: inserted plus deleted
    /// characters, with a co-located delete/insert pair counting as one
    /// substitution.
    pub fn levenshtein(diffs: &[Diff]) -> usize {
        let mut distance = 0;
        let mut inserts = 0;
        let mut deletes = 0;

        for diff in diffs {
            match diff.op {
                Op::Insert => inserts += diff.len(),
                Op::Delete => deletes += diff.len(),
                Op::Equal => {
                    // An equality closes the edit block on its left.
                    distance += inserts.max(deletes);
                    inserts = 0;
                    deletes = 0;
                }
            }
        }

        distance + inserts.max(deletes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_texts() {
        let diffs = vec![
            Diff::equal("jump"),
            Diff::delete("s"),
            Diff::insert("ed"),
            Diff::equal(" over "),
            Diff::delete("the"),
            Diff::insert("a"),
            Diff::equal(" lazy"),
        ];
        assert_eq!("jumps over the lazy", Mend::diff_text_old(&diffs));
        assert_eq!("jumped over a lazy", Mend::diff_text_new(&diffs));
    }

    #[test]
    fn test_delta_roundtrip() {
        let diffs = vec![
            Diff::equal("jump"),
            Diff::delete("s"),
            Diff::insert("ed"),
            Diff::equal(" over "),
            Diff::delete("the"),
            Diff::insert("a"),
            Diff::equal(" lazy"),
            Diff::insert("old dog"),
        ];
        let old = Mend::diff_text_old(&diffs);
        assert_eq!("jumps over the lazy", old);

        let delta = Mend::diff_to_delta(&diffs);
        assert_eq!("=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog", delta);

        assert_eq!(Ok(diffs), Mend::diff_from_delta(&old, &delta));
    }

    #[test]
    fn test_delta_rejects_length_mismatch() {
        let delta = "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog";

        // Source one character longer than the delta covers.
        assert_eq!(
            Err(Error::DeltaLengthMismatch {
                consumed: 19,
                expected: 20,
            }),
            Mend::diff_from_delta("jumps over the lazyx", delta)
        );

        // Delta one character shorter than the source.
        assert_eq!(
            Err(Error::DeltaLengthMismatch {
                consumed: 19,
                expected: 18,
            }),
            Mend::diff_from_delta("umps over the lazy", delta)
        );
    }

    #[test]
    fn test_delta_rejects_garbage() {
        // Bad opcode.
        assert!(Mend::diff_from_delta("", "x12").is_err());
        // Negative and non-numeric counts.
        assert!(Mend::diff_from_delta("abc", "=-2\t=5").is_err());
        assert!(Mend::diff_from_delta("abc", "=three").is_err());
        // Invalid percent escape.
        assert_eq!(
            Err(Error::BadEscape("%xy".to_string())),
            Mend::diff_from_delta("", "+%xy")
        );
    }

    #[test]
    fn test_delta_special_characters() {
        let diffs = vec![
            Diff::equal("\u{680} \u{0} \t %"),
            Diff::delete("\u{681} \u{1} \n ^"),
            Diff::insert("\u{682} \u{2} \\ |"),
        ];
        let old = Mend::diff_text_old(&diffs);
        assert_eq!("\u{680} \u{0} \t %\u{681} \u{1} \n ^", old);

        let delta = Mend::diff_to_delta(&diffs);
        assert_eq!("=7\t-7\t+%DA%82 %02 %5C %7C", delta);

        assert_eq!(Ok(diffs), Mend::diff_from_delta(&old, &delta));
    }

    #[test]
    fn test_delta_unchanged_characters() {
        let unchanged = "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ";
        let diffs = vec![Diff::insert(unchanged)];

        let delta = Mend::diff_to_delta(&diffs);
        assert_eq!(format!("+{unchanged}"), delta);

        assert_eq!(Ok(diffs), Mend::diff_from_delta("", &delta));
    }

    #[test]
    fn test_delta_surrogate_width_scalars() {
        // Scalars above U+FFFF are single characters here, so the
        // count tokens stay small and symmetric.
        let diffs = vec![
            Diff::equal("🌊🌊"),
            Diff::delete("🍊"),
            Diff::insert("🦀"),
        ];
        let delta = Mend::diff_to_delta(&diffs);
        assert_eq!("=2\t-1\t+%F0%9F%A6%80", delta);

        assert_eq!(Ok(diffs), Mend::diff_from_delta("🌊🌊🍊", &delta));
    }

    #[test]
    fn test_x_index() {
        // Translation on equality.
        let diffs = vec![Diff::delete("a"), Diff::insert("1234"), Diff::equal("xyz")];
        assert_eq!(5, Mend::x_index(&diffs, 2));

        // Translation on deletion.
        let diffs = vec![Diff::equal("a"), Diff::delete("1234"), Diff::equal("xyz")];
        assert_eq!(1, Mend::x_index(&diffs, 3));
    }

    #[test]
    fn test_levenshtein() {
        // Trailing equality.
        let diffs = vec![Diff::delete("abc"), Diff::insert("1234"), Diff::equal("xyz")];
        assert_eq!(4, Mend::levenshtein(&diffs));

        // Leading equality.
        let diffs = vec![Diff::equal("xyz"), Diff::delete("abc"), Diff::insert("1234")];
        assert_eq!(4, Mend::levenshtein(&diffs));

        // Middle equality splits the blocks.
        let diffs = vec![Diff::delete("abc"), Diff::equal("xyz"), Diff::insert("1234")];
        assert_eq!(7, Mend::levenshtein(&diffs));
    }
}
