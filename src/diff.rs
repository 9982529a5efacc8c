//! The edit-script model and the top-level diff pipeline.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{chars, lines, Mend};

/// What an edit does to the source text.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum Op {
    Delete = -1,
    Insert,
    Equal,
}

/// Anything that can hand over its scalars. Lets callers and tests
/// build edits from `&str` while the engine passes slices around.
pub trait IntoChars {
    fn into_chars(self) -> Vec<char>;
}

impl IntoChars for &str {
    fn into_chars(self) -> Vec<char> {
        self.chars().collect()
    }
}

impl IntoChars for String {
    fn into_chars(self) -> Vec<char> {
        self.chars().collect()
    }
}

impl IntoChars for &[char] {
    fn into_chars(self) -> Vec<char> {
        self.to_vec()
    }
}

impl IntoChars for Vec<char> {
    fn into_chars(self) -> Vec<char> {
        self
    }
}

/// One edit: an operation and the text it covers.
///
/// `Diff::delete("Hello")` removes `Hello`, `Diff::insert("Goodbye")`
/// adds `Goodbye`, `Diff::equal("World")` keeps `World`. A sequence of
/// these is an edit script: concatenating every non-insert payload
/// reconstructs the old text, every non-delete payload the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub(crate) op: Op,
    pub(crate) text: Vec<char>,
}

impl Diff {
    pub fn new(op: Op, text: impl IntoChars) -> Self {
        Self {
            op,
            text: text.into_chars(),
        }
    }

    pub fn delete(text: impl IntoChars) -> Self {
        Self::new(Op::Delete, text)
    }

    pub fn insert(text: impl IntoChars) -> Self {
        Self::new(Op::Insert, text)
    }

    pub fn equal(text: impl IntoChars) -> Self {
        Self::new(Op::Equal, text)
    }

    pub(crate) fn from_chars(op: Op, text: &[char]) -> Self {
        Self {
            op,
            text: text.to_vec(),
        }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// The covered text, reassembled.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.text
    }

    /// Covered length in scalars.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {})", self.op, self.text())
    }
}

// A successful half-match split: `old` = old_head + shared + old_tail,
// `new` = new_head + shared + new_tail, with `shared` at least half the
// longer input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Hinge<'a> {
    pub(crate) old_head: &'a [char],
    pub(crate) old_tail: &'a [char],
    pub(crate) new_head: &'a [char],
    pub(crate) new_tail: &'a [char],
    pub(crate) shared: &'a [char],
}

impl Mend {
    /// Compute the differences between two texts as an edit script.
    ///
    /// The script is normalized: merged, with any common prefix and
    /// suffix restored as outer equalities. Feed it to
    /// [`Mend::cleanup_semantic`] for human eyes or
    /// [`Mend::cleanup_efficiency`] for compact storage.
    ///
    /// # Example
    /// ```
    /// use mend::{Diff, Mend};
    ///
    /// let diffs = Mend::new().diff_main("abc", "ab123c");
    /// assert_eq!(
    ///     vec![Diff::equal("ab"), Diff::insert("123"), Diff::equal("c")],
    ///     diffs,
    /// );
    /// ```
    pub fn diff_main(&self, old: &str, new: &str) -> Vec<Diff> {
        let old: Vec<char> = old.chars().collect();
        let new: Vec<char> = new.chars().collect();

        self.diff_chars(&old, &new, self.checklines(), self.deadline())
    }

    pub(crate) fn diff_chars(
        &self,
        old: &[char],
        new: &[char],
        linemode: bool,
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        if old == new {
            if old.is_empty() {
                return Vec::new();
            }
            return vec![Diff::from_chars(Op::Equal, old)];
        }

        if old.is_empty() {
            return vec![Diff::from_chars(Op::Insert, new)];
        }
        if new.is_empty() {
            return vec![Diff::from_chars(Op::Delete, old)];
        }

        // Strip what the ends share and diff only the middle.
        let prefix = chars::common_prefix(old, new);
        let suffix = chars::common_suffix(&old[prefix..], &new[prefix..]);

        let mut diffs = self.compute(
            &old[prefix..old.len() - suffix],
            &new[prefix..new.len() - suffix],
            linemode,
            deadline,
        );

        if prefix > 0 {
            diffs.insert(0, Diff::from_chars(Op::Equal, &old[..prefix]));
        }
        if suffix > 0 {
            diffs.push(Diff::from_chars(Op::Equal, &new[new.len() - suffix..]));
        }

        Self::cleanup_merge(&mut diffs);

        diffs
    }

    // `old` and `new` share no prefix or suffix here.
    fn compute(
        &self,
        old: &[char],
        new: &[char],
        linemode: bool,
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        if old.is_empty() {
            return vec![Diff::from_chars(Op::Insert, new)];
        }
        if new.is_empty() {
            return vec![Diff::from_chars(Op::Delete, old)];
        }

        let (long, short, old_is_long) = if old.len() > new.len() {
            (old, new, true)
        } else {
            (new, old, false)
        };

        // Shorter text inside the longer one: two edits suffice.
        if let Some(at) = chars::find(long, short, 0) {
            let op = if old_is_long { Op::Delete } else { Op::Insert };
            return vec![
                Diff::from_chars(op, &long[..at]),
                Diff::from_chars(Op::Equal, short),
                Diff::from_chars(op, &long[at + short.len()..]),
            ];
        }

        if short.len() == 1 {
            // Single character and not contained above, so no equality.
            return vec![
                Diff::from_chars(Op::Delete, old),
                Diff::from_chars(Op::Insert, new),
            ];
        }

        // A dominant common substring lets the problem split in two.
        if let Some(hinge) = self.half_match(old, new) {
            let mut diffs = self.diff_chars(hinge.old_head, hinge.new_head, linemode, deadline);
            diffs.push(Diff::from_chars(Op::Equal, hinge.shared));
            diffs.extend(self.diff_chars(hinge.old_tail, hinge.new_tail, linemode, deadline));
            return diffs;
        }

        if linemode && old.len() > 100 && new.len() > 100 {
            return self.line_mode(old, new, deadline);
        }

        self.shortest_edit(old, new, deadline)
    }

    // Quick line-level diff, then re-diff the replacement blocks
    // character by character. Faster on big line-structured inputs,
    // at the cost of minimality.
    fn line_mode(
        &self,
        old: &[char],
        new: &[char],
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        let mut diffs = {
            let hashed = lines::to_tokens(old, new);
            let token_diffs = self.diff_chars(&hashed.old, &hashed.new, false, deadline);
            lines::from_tokens(&token_diffs, &hashed.lines)
        };

        // Eliminate freak line-level matches before refining.
        Self::cleanup_semantic(&mut diffs);

        // Walk the script re-diffing each delete+insert pair; a closing
        // dummy equality flushes the final pair.
        diffs.push(Diff::from_chars(Op::Equal, &[]));

        let mut pointer = 0;
        let mut delete_n = 0;
        let mut insert_n = 0;
        let mut delete_data = Vec::new();
        let mut insert_data = Vec::new();

        while pointer < diffs.len() {
            match diffs[pointer].op {
                Op::Insert => {
                    insert_n += 1;
                    insert_data.extend_from_slice(diffs[pointer].chars());
                }
                Op::Delete => {
                    delete_n += 1;
                    delete_data.extend_from_slice(diffs[pointer].chars());
                }
                Op::Equal => {
                    if delete_n >= 1 && insert_n >= 1 {
                        let start = pointer - delete_n - insert_n;
                        let refined = self.diff_chars(&delete_data, &insert_data, false, deadline);
                        let added = refined.len();
                        diffs.splice(start..pointer, refined);
                        pointer = start + added;
                    }
                    delete_n = 0;
                    insert_n = 0;
                    delete_data.clear();
                    insert_data.clear();
                }
            }
            pointer += 1;
        }

        diffs.pop();
        diffs
    }

    pub(crate) fn half_match<'a>(&self, old: &'a [char], new: &'a [char]) -> Option<Hinge<'a>> {
        // With unlimited time, take the optimal path instead.
        self.timeout()?;

        let (long, short) = if old.len() > new.len() {
            (old, new)
        } else {
            (new, old)
        };

        if long.len() < 4 || short.len() * 2 < long.len() {
            return None;
        }

        // Seed from the second and third quarters of the longer text.
        let hinge_q2 = half_match_seeded(long, short, long.len() / 4);
        let hinge_q3 = half_match_seeded(long, short, long.len() / 2);

        let hinge = match (hinge_q2, hinge_q3) {
            (None, None) => return None,
            (Some(h), None) | (None, Some(h)) => h,
            (Some(h2), Some(h3)) => {
                if h2.shared.len() > h3.shared.len() {
                    h2
                } else {
                    h3
                }
            }
        };

        // `half_match_seeded` works long/short; flip back to old/new.
        if old.len() > new.len() {
            Some(hinge)
        } else {
            Some(Hinge {
                old_head: hinge.new_head,
                old_tail: hinge.new_tail,
                new_head: hinge.old_head,
                new_tail: hinge.old_tail,
                shared: hinge.shared,
            })
        }
    }
}

// Does a substring of `short` exist within `long` such that the
// substring is at least half the length of `long`? Seeded from the
// quarter-length window at `idx`.
fn half_match_seeded<'a>(long: &'a [char], short: &'a [char], idx: usize) -> Option<Hinge<'a>> {
    let seed = &long[idx..idx + long.len() / 4];

    let mut best_shared: &[char] = &[];
    let mut best = Hinge {
        old_head: &[],
        old_tail: &[],
        new_head: &[],
        new_tail: &[],
        shared: &[],
    };

    let mut j = 0;
    while let Some(found) = chars::find(short, seed, j) {
        j = found;

        let head_len = chars::common_prefix(&long[idx..], &short[j..]);
        let tail_len = chars::common_suffix(&long[..idx], &short[..j]);

        if best_shared.len() < tail_len + head_len {
            best_shared = &short[j - tail_len..j + head_len];
            best = Hinge {
                old_head: &long[..idx - tail_len],
                old_tail: &long[idx + head_len..],
                new_head: &short[..j - tail_len],
                new_tail: &short[j + head_len..],
                shared: best_shared,
            };
        }

        j += 1;
    }

    if best_shared.len() * 2 >= long.len() {
        Some(best)
    } else {
        None
    }
}
