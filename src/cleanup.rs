//! Edit-script normalization: merging, semantic tidying, lossless
//! boundary alignment, and efficiency compaction. Every pass rewrites
//! the script in place and preserves what it reconstructs to.

use crate::{chars, Diff, Mend, Op};

impl Mend {
    /// Reorder and merge like edit sections; merge equalities. Any edit
    /// section can move as long as it doesn't cross an equality.
    pub fn cleanup_merge(diffs: &mut Vec<Diff>) {
        // Dummy equality at the end flushes a trailing run.
        diffs.push(Diff::from_chars(Op::Equal, &[]));

        let mut pointer = 0;
        let mut delete_n = 0;
        let mut insert_n = 0;
        let mut delete_data: Vec<char> = Vec::new();
        let mut insert_data: Vec<char> = Vec::new();

        while pointer < diffs.len() {
            match diffs[pointer].op {
                Op::Insert => {
                    insert_n += 1;
                    insert_data.extend_from_slice(diffs[pointer].chars());
                    pointer += 1;
                }
                Op::Delete => {
                    delete_n += 1;
                    delete_data.extend_from_slice(diffs[pointer].chars());
                    pointer += 1;
                }
                Op::Equal => {
                    // An equality closes the run before it.
                    if delete_n + insert_n > 1 {
                        if delete_n != 0 && insert_n != 0 {
                            // A prefix shared by both sides belongs to
                            // the preceding equality.
                            let common = chars::common_prefix(&insert_data, &delete_data);
                            if common != 0 {
                                let run_start = pointer - delete_n - insert_n;
                                if run_start > 0 && diffs[run_start - 1].op == Op::Equal {
                                    diffs[run_start - 1]
                                        .text
                                        .extend_from_slice(&insert_data[..common]);
                                } else {
                                    diffs.insert(
                                        0,
                                        Diff::from_chars(Op::Equal, &insert_data[..common]),
                                    );
                                    pointer += 1;
                                }
                                insert_data.drain(..common);
                                delete_data.drain(..common);
                            }

                            // And a shared suffix to the following one.
                            let common = chars::common_suffix(&insert_data, &delete_data);
                            if common != 0 {
                                let mut text = insert_data[insert_data.len() - common..].to_vec();
                                text.extend_from_slice(diffs[pointer].chars());
                                diffs[pointer].text = text;
                                insert_data.truncate(insert_data.len() - common);
                                delete_data.truncate(delete_data.len() - common);
                            }
                        }

                        // Swap the run for its merged form.
                        pointer -= delete_n + insert_n;
                        diffs.drain(pointer..pointer + delete_n + insert_n);
                        if !delete_data.is_empty() {
                            diffs.insert(pointer, Diff::from_chars(Op::Delete, &delete_data));
                            pointer += 1;
                        }
                        if !insert_data.is_empty() {
                            diffs.insert(pointer, Diff::from_chars(Op::Insert, &insert_data));
                            pointer += 1;
                        }
                        pointer += 1;
                    } else if pointer != 0 && diffs[pointer - 1].op == Op::Equal {
                        // Fold into the previous equality.
                        let text = std::mem::take(&mut diffs[pointer].text);
                        diffs[pointer - 1].text.extend(text);
                        diffs.remove(pointer);
                    } else {
                        pointer += 1;
                    }

                    delete_n = 0;
                    insert_n = 0;
                    delete_data.clear();
                    insert_data.clear();
                }
            }
        }

        if diffs.last().is_some_and(Diff::is_empty) {
            diffs.pop();
        }

        // Second pass: a single edit surrounded by equalities may slide
        // over either one, eliminating it.
        // e.g. A<ins>BA</ins>C -> <ins>AB</ins>AC
        let mut changes = false;
        let mut pointer = 1;
        while pointer + 1 < diffs.len() {
            if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
                let prev = diffs[pointer - 1].text.clone();
                let next = diffs[pointer + 1].text.clone();

                if diffs[pointer].text.ends_with(&prev) {
                    // Slide left.
                    let edit = &diffs[pointer].text;
                    let mut slid = prev.clone();
                    slid.extend_from_slice(&edit[..edit.len() - prev.len()]);
                    diffs[pointer].text = slid;

                    let mut merged = prev;
                    merged.extend_from_slice(&next);
                    diffs[pointer + 1].text = merged;

                    diffs.remove(pointer - 1);
                    changes = true;
                } else if diffs[pointer].text.starts_with(&next) {
                    // Slide right.
                    diffs[pointer - 1].text.extend_from_slice(&next);

                    let edit = &diffs[pointer].text;
                    let mut slid = edit[next.len()..].to_vec();
                    slid.extend_from_slice(&next);
                    diffs[pointer].text = slid;

                    diffs.remove(pointer + 1);
                    changes = true;
                }
            }
            pointer += 1;
        }

        // A slide can expose another merge.
        if changes {
            Self::cleanup_merge(diffs);
        }
    }

    /// Reduce the number of edits by eliminating semantically trivial
    /// equalities: short stretches of common text whose surrounding
    /// edits dwarf them. Turns the minimal-but-unreadable diff of
    /// "mouse"/"sofas" into a plain delete + insert.
    pub fn cleanup_semantic(diffs: &mut Vec<Diff>) {
        let mut changes = false;

        // Indices of candidate equalities, newest last.
        let mut equalities: Vec<usize> = Vec::new();
        let mut last_equality: Option<Vec<char>> = None;

        // Edit sizes on each side of the candidate.
        let mut insert_len_pre = 0;
        let mut delete_len_pre = 0;
        let mut insert_len_post = 0;
        let mut delete_len_post = 0;

        let mut pointer: isize = 0;
        while (pointer as usize) < diffs.len() {
            let at = pointer as usize;
            if diffs[at].op == Op::Equal {
                equalities.push(at);
                insert_len_pre = insert_len_post;
                delete_len_pre = delete_len_post;
                insert_len_post = 0;
                delete_len_post = 0;
                last_equality = Some(diffs[at].text.clone());
            } else {
                if diffs[at].op == Op::Insert {
                    insert_len_post += diffs[at].len();
                } else {
                    delete_len_post += diffs[at].len();
                }

                // Drop an equality smaller than the edits on both
                // sides of it.
                let useless = last_equality.as_ref().is_some_and(|eq| {
                    eq.len() <= insert_len_pre.max(delete_len_pre)
                        && eq.len() <= insert_len_post.max(delete_len_post)
                });
                if useless {
                    if let (Some(eq), Some(last)) = (last_equality.take(), equalities.pop()) {
                        // Replace the equality with a delete + insert
                        // of the same text; merging folds them into
                        // the neighbors.
                        diffs[last] = Diff::from_chars(Op::Insert, &eq);
                        diffs.insert(last, Diff::from_chars(Op::Delete, &eq));

                        // The previous equality needs re-evaluation.
                        equalities.pop();
                        pointer = equalities.last().map(|&e| e as isize).unwrap_or(-1);

                        insert_len_pre = 0;
                        delete_len_pre = 0;
                        insert_len_post = 0;
                        delete_len_post = 0;
                        changes = true;
                    }
                }
            }
            pointer += 1;
        }

        if changes {
            Self::cleanup_merge(diffs);
        }
        Self::cleanup_semantic_lossless(diffs);

        // Extract overlaps between adjacent deletions and insertions
        // when the overlap is at least half of either edit.
        // e.g. <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
        // e.g. <del>xxxabc</del><ins>defxxx</ins> -> <ins>def</ins>xxx<del>abc</del>
        let mut pointer = 1;
        while pointer < diffs.len() {
            if diffs[pointer - 1].op == Op::Delete && diffs[pointer].op == Op::Insert {
                let deletion = diffs[pointer - 1].text.clone();
                let insertion = diffs[pointer].text.clone();

                let overlap_fwd = chars::common_overlap(&deletion, &insertion);
                let overlap_rev = chars::common_overlap(&insertion, &deletion);

                let delete_need = deletion.len().div_ceil(2);
                let insert_need = insertion.len().div_ceil(2);

                if overlap_fwd >= overlap_rev {
                    if overlap_fwd >= delete_need || overlap_fwd >= insert_need {
                        diffs.insert(
                            pointer,
                            Diff::from_chars(Op::Equal, &insertion[..overlap_fwd]),
                        );
                        diffs[pointer - 1].text = deletion[..deletion.len() - overlap_fwd].to_vec();
                        diffs[pointer + 1].text = insertion[overlap_fwd..].to_vec();
                        pointer += 1;
                    }
                } else if overlap_rev >= delete_need || overlap_rev >= insert_need {
                    // Reverse overlap: the equality sits between the
                    // swapped edits.
                    diffs.insert(
                        pointer,
                        Diff::from_chars(Op::Equal, &deletion[..overlap_rev]),
                    );
                    diffs[pointer - 1] = Diff::from_chars(
                        Op::Insert,
                        &insertion[..insertion.len() - overlap_rev],
                    );
                    diffs[pointer + 1] = Diff::from_chars(Op::Delete, &deletion[overlap_rev..]);
                    pointer += 1;
                }
                pointer += 1;
            }
            pointer += 1;
        }
    }

    /// Slide each edit flanked by equalities to the position that best
    /// aligns its boundaries with word, sentence or line seams. Changes
    /// where the script splits, never what it covers.
    /// e.g. The c<ins>at c</ins>ame. -> The <ins>cat </ins>came.
    pub fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
        let mut pointer = 1;
        while pointer + 1 < diffs.len() {
            if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
                let mut prev = diffs[pointer - 1].text.clone();
                let mut edit = diffs[pointer].text.clone();
                let mut next = diffs[pointer + 1].text.clone();

                // First shift the edit as far left as it goes.
                let slide = chars::common_suffix(&prev, &edit);
                if slide > 0 {
                    let common = edit[edit.len() - slide..].to_vec();
                    prev.truncate(prev.len() - slide);

                    let mut slid = common.clone();
                    slid.extend_from_slice(&edit[..edit.len() - slide]);
                    edit = slid;

                    let mut slid = common;
                    slid.extend_from_slice(&next);
                    next = slid;
                }

                // Then walk right one scalar at a time, scoring each
                // position.
                let mut best_prev = prev.clone();
                let mut best_edit = edit.clone();
                let mut best_next = next.clone();
                let mut best_score = boundary_score(&prev, &edit) + boundary_score(&edit, &next);

                while !edit.is_empty() && !next.is_empty() && edit[0] == next[0] {
                    prev.push(edit[0]);
                    edit.remove(0);
                    edit.push(next[0]);
                    next.remove(0);

                    let score = boundary_score(&prev, &edit) + boundary_score(&edit, &next);
                    // >= favors trailing over leading whitespace on
                    // edits.
                    if score >= best_score {
                        best_score = score;
                        best_prev.clone_from(&prev);
                        best_edit.clone_from(&edit);
                        best_next.clone_from(&next);
                    }
                }

                if diffs[pointer - 1].text != best_prev {
                    // An improvement; write it back.
                    if !best_prev.is_empty() {
                        diffs[pointer - 1].text = best_prev;
                    } else {
                        diffs.remove(pointer - 1);
                        pointer -= 1;
                    }

                    diffs[pointer].text = best_edit;

                    if !best_next.is_empty() {
                        diffs[pointer + 1].text = best_next;
                    } else {
                        diffs.remove(pointer + 1);
                        pointer = pointer.saturating_sub(1);
                    }
                }
            }
            pointer += 1;
        }
    }

    /// Reduce the number of edits by eliminating operationally trivial
    /// equalities: ones short enough that folding them into the
    /// surrounding edits costs less than keeping the extra operations,
    /// priced by the configured edit cost.
    pub fn cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        if diffs.is_empty() {
            return;
        }

        let edit_cost = self.edit_cost();
        let mut changes = false;

        let mut equalities: Vec<usize> = Vec::new();
        let mut last_equality: Option<Vec<char>> = None;

        // Which sides of the candidate equality carry which edits.
        let mut pre_ins = false;
        let mut pre_del = false;
        let mut post_ins = false;
        let mut post_del = false;

        let mut pointer: isize = 0;
        while (pointer as usize) < diffs.len() {
            let at = pointer as usize;
            if diffs[at].op == Op::Equal {
                if diffs[at].len() < edit_cost && (post_ins || post_del) {
                    // Candidate found.
                    equalities.push(at);
                    pre_ins = post_ins;
                    pre_del = post_del;
                    last_equality = Some(diffs[at].text.clone());
                } else {
                    // Too big, and can never become a candidate.
                    equalities.clear();
                    last_equality = None;
                }
                post_ins = false;
                post_del = false;
            } else {
                if diffs[at].op == Op::Delete {
                    post_del = true;
                } else {
                    post_ins = true;
                }

                // Five shapes to split:
                // <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
                // <ins>A</ins>X<ins>C</ins><del>D</del>
                // <ins>A</ins><del>B</del>X<ins>C</ins>
                // <ins>A</ins>X<ins>C</ins><del>D</del>
                // <ins>A</ins><del>B</del>X<del>C</del>
                let split = last_equality.as_ref().is_some_and(|eq| {
                    (pre_ins && pre_del && post_ins && post_del)
                        || (eq.len() < edit_cost / 2
                            && pre_ins as u8 + pre_del as u8 + post_ins as u8 + post_del as u8
                                == 3)
                });
                if split {
                    if let (Some(eq), Some(last)) = (last_equality.take(), equalities.pop()) {
                        diffs[last] = Diff::from_chars(Op::Insert, &eq);
                        diffs.insert(last, Diff::from_chars(Op::Delete, &eq));
                        changes = true;

                        if pre_ins && pre_del {
                            // Nothing behind this point can change.
                            post_ins = true;
                            post_del = true;
                            equalities.clear();
                        } else {
                            // Re-evaluate from the previous candidate.
                            equalities.pop();
                            pointer = equalities.last().map(|&e| e as isize).unwrap_or(-1);
                            post_ins = false;
                            post_del = false;
                        }
                    }
                }
            }
            pointer += 1;
        }

        if changes {
            Self::cleanup_merge(diffs);
        }
    }
}

// Score how well the boundary between `one` and `two` lands on a
// linguistic seam, 6 (best, a document edge) down to 0 (mid-word).
fn boundary_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&before), Some(&after)) = (one.last(), two.first()) else {
        // An edge is the best boundary there is.
        return 6;
    };

    // Definitions of whitespace and alphanumeric vary between ports of
    // this scoring; this one leans on char's Unicode notions, which is
    // fine for a purely cosmetic ranking.
    let space_before = before.is_whitespace();
    let space_after = after.is_whitespace();
    let line_before = space_before && (before == '\n' || before == '\r');
    let line_after = space_after && (after == '\n' || after == '\r');
    let blank_before = line_before && ends_with_blank_line(one);
    let blank_after = line_after && starts_with_blank_line(two);

    if blank_before || blank_after {
        5
    } else if line_before || line_after {
        4
    } else if !before.is_alphanumeric() && !space_before && space_after {
        // End of a sentence.
        3
    } else if space_before || space_after {
        2
    } else if !before.is_alphanumeric() || !after.is_alphanumeric() {
        1
    } else {
        0
    }
}

fn ends_with_blank_line(text: &[char]) -> bool {
    text.ends_with(&['\n', '\n']) || text.ends_with(&['\n', '\r', '\n'])
}

fn starts_with_blank_line(text: &[char]) -> bool {
    text.starts_with(&['\n', '\n'])
        || text.starts_with(&['\n', '\r', '\n'])
        || text.starts_with(&['\r', '\n', '\n'])
        || text.starts_with(&['\r', '\n', '\r', '\n'])
}
