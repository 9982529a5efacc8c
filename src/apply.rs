//! Patch construction and best-effort application.

use tracing::debug;

use crate::{chars, delta, patch::PatchSource, Diff, Mend, Op, Patch};

impl Mend {
    /// Build a list of patches from two texts, a precomputed edit
    /// script, or both. When only texts are given the script is
    /// computed and cleaned up here; pass [`PatchSource::TextDiffs`]
    /// when the script already exists to skip the recomputation.
    ///
    /// Each run of non-equal edits becomes one hunk, wrapped in
    /// `patch_margin` characters of context on each side (more if the
    /// context is ambiguous in the source).
    pub fn patch_make(&self, source: PatchSource) -> Vec<Patch> {
        let mut computed: Vec<Diff> = Vec::new();

        let (text_old, diffs): (Vec<char>, &[Diff]) = match source {
            PatchSource::Texts(old, new) => {
                computed = self.diff_main(old, new);
                if computed.len() > 2 {
                    Self::cleanup_semantic(&mut computed);
                    self.cleanup_efficiency(&mut computed);
                }
                (old.chars().collect(), &computed)
            }
            PatchSource::Diffs(diffs) => (delta::text_old_chars(diffs), diffs),
            PatchSource::TextDiffs(old, diffs) => (old.chars().collect(), diffs),
        };

        self.build_patches(&text_old, diffs)
    }

    fn build_patches(&self, text: &[char], diffs: &[Diff]) -> Vec<Patch> {
        if diffs.is_empty() {
            return Vec::new();
        }

        let margin = self.patch_margin();

        let mut patches = Vec::new();
        let mut patch = Patch::default();

        let mut chars_old = 0;
        let mut chars_new = 0;

        // Unlike unidiff, these hunks carry a rolling context: each
        // one's coordinates assume all earlier hunks are applied.
        let mut prepatch: Vec<char> = text.to_vec();
        let mut postpatch: Vec<char> = prepatch.clone();

        for (idx, diff) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && diff.op != Op::Equal {
                // A new hunk starts here.
                patch.start1 = chars_old;
                patch.start2 = chars_new;
            }

            match diff.op {
                Op::Insert => {
                    patch.length2 += diff.len();
                    postpatch.splice(chars_new..chars_new, diff.chars().iter().copied());
                    patch.diffs.push(diff.clone());
                }
                Op::Delete => {
                    patch.length1 += diff.len();
                    postpatch.drain(chars_new..chars_new + diff.len());
                    patch.diffs.push(diff.clone());
                }
                Op::Equal => {
                    if diff.len() <= 2 * margin && !patch.diffs.is_empty() && idx + 1 != diffs.len()
                    {
                        // Small equality inside a hunk.
                        patch.length1 += diff.len();
                        patch.length2 += diff.len();
                        patch.diffs.push(diff.clone());
                    } else if diff.len() >= 2 * margin && !patch.diffs.is_empty() {
                        // Big enough to close the hunk.
                        self.add_context(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));

                        // Later hunks see the already-patched text.
                        prepatch.clone_from(&postpatch);
                        chars_old = chars_new;
                    }
                }
            }

            if diff.op != Op::Insert {
                chars_old += diff.len();
            }
            if diff.op != Op::Delete {
                chars_new += diff.len();
            }
        }

        // Pick up the leftover hunk if it has edits.
        if !patch.diffs.is_empty() {
            self.add_context(&mut patch, &prepatch);
            patches.push(patch);
        }

        patches
    }

    // Grow the hunk's equality context until its pre-text pins down a
    // unique spot in `text`, then add one margin for good measure.
    pub(crate) fn add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }

        let margin = self.patch_margin();
        let mut padding = 0;

        let mut pattern = &text[patch.start2..(patch.start2 + patch.length1).min(text.len())];
        while !unique_in(text, pattern) && pattern.len() < self.match_max_bits() - margin * 2 {
            padding += margin;
            let begin = patch.start2.saturating_sub(padding);
            let end = (patch.start2 + patch.length1 + padding).min(text.len());
            pattern = &text[begin..end];
        }

        // One extra chunk for good luck.
        padding += margin;

        let prefix = &text[patch.start2.saturating_sub(padding)..patch.start2];
        if !prefix.is_empty() {
            patch.diffs.insert(0, Diff::from_chars(Op::Equal, prefix));
        }

        let begin = (patch.start2 + patch.length1).min(text.len());
        let end = (patch.start2 + patch.length1 + padding).min(text.len());
        let suffix = &text[begin..end];
        if !suffix.is_empty() {
            patch.diffs.push(Diff::from_chars(Op::Equal, suffix));
        }

        patch.start1 -= prefix.len();
        patch.start2 -= prefix.len();
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    // Break up any hunk longer than the matcher can handle into
    // consecutive smaller hunks, each with freshly cut context.
    pub(crate) fn split_max(&self, patches: &mut Vec<Patch>) {
        let max_bits = self.match_max_bits();
        let margin = self.patch_margin();

        let mut idx = 0;
        while idx < patches.len() {
            if patches[idx].length1 <= max_bits {
                idx += 1;
                continue;
            }

            let mut bigpatch = patches.remove(idx);
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;

            let mut precontext: Vec<char> = Vec::new();
            let mut replacements = Vec::new();

            while !bigpatch.diffs.is_empty() {
                let mut patch = Patch::default();
                let mut empty = true;

                patch.start1 = start1 - precontext.len();
                patch.start2 = start2 - precontext.len();
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Diff::from_chars(Op::Equal, &precontext));
                }

                while !bigpatch.diffs.is_empty() && patch.length1 < max_bits - margin {
                    let front_op = bigpatch.diffs[0].op;
                    match front_op {
                        Op::Insert => {
                            // Insertions are harmless; take it whole.
                            let d = bigpatch.diffs.remove(0);
                            patch.length2 += d.len();
                            start2 += d.len();
                            patch.diffs.push(d);
                            empty = false;
                        }
                        Op::Delete
                            if patch.diffs.len() == 1
                                && patch.diffs[0].op == Op::Equal
                                && bigpatch.diffs[0].len() > 2 * max_bits =>
                        {
                            // A monster deletion passes in one chunk.
                            let d = bigpatch.diffs.remove(0);
                            patch.length1 += d.len();
                            start1 += d.len();
                            patch.diffs.push(d);
                            empty = false;
                        }
                        _ => {
                            // Deletion or equality; take what fits.
                            let take = bigpatch.diffs[0]
                                .len()
                                .min(max_bits - patch.length1 - margin);
                            let text = bigpatch.diffs[0].chars()[..take].to_vec();

                            patch.length1 += text.len();
                            start1 += text.len();
                            if front_op == Op::Equal {
                                patch.length2 += text.len();
                                start2 += text.len();
                            } else {
                                empty = false;
                            }

                            if take == bigpatch.diffs[0].len() {
                                bigpatch.diffs.remove(0);
                            } else {
                                bigpatch.diffs[0].text.drain(..take);
                            }
                            patch.diffs.push(Diff::from_chars(front_op, &text));
                        }
                    }
                }

                // The tail of what this sub-hunk produces becomes the
                // head context of the next one.
                precontext = delta::text_new_chars(&patch.diffs);
                if precontext.len() > margin {
                    precontext.drain(..precontext.len() - margin);
                }

                // Close with trailing context from the remainder.
                let mut postcontext = delta::text_old_chars(&bigpatch.diffs);
                postcontext.truncate(margin);
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    match patch.diffs.last_mut() {
                        Some(last) if last.op == Op::Equal => {
                            last.text.extend_from_slice(&postcontext);
                        }
                        _ => patch.diffs.push(Diff::from_chars(Op::Equal, &postcontext)),
                    }
                }

                if !empty {
                    replacements.push(patch);
                }
            }

            let added = replacements.len();
            patches.splice(idx..idx, replacements);
            idx += added;
        }
    }

    // Pad both document edges with sentinel characters so edits at the
    // very start or end still have context to anchor on. Returns the
    // padding, which the caller mirrors onto the text.
    pub(crate) fn add_padding(&self, patches: &mut [Patch]) -> Vec<char> {
        let margin = self.patch_margin();
        let padding: Vec<char> = (1..=margin as u32).filter_map(char::from_u32).collect();

        // Bump every hunk past the leading pad.
        for patch in patches.iter_mut() {
            patch.start1 += margin;
            patch.start2 += margin;
        }

        if let Some(first) = patches.first_mut() {
            let bare = first.diffs.first().map_or(true, |d| d.op != Op::Equal);
            if bare {
                // No leading context at all; the pad becomes it.
                first.diffs.insert(0, Diff::from_chars(Op::Equal, &padding));
                first.start1 -= margin;
                first.start2 -= margin;
                first.length1 += margin;
                first.length2 += margin;
            } else if let Some(d) = first.diffs.first_mut() {
                if margin > d.len() {
                    // Grow a short leading context to the full margin.
                    let grow = margin - d.len();
                    let mut text = padding[d.len()..].to_vec();
                    text.extend_from_slice(&d.text);
                    d.text = text;
                    first.start1 -= grow;
                    first.start2 -= grow;
                    first.length1 += grow;
                    first.length2 += grow;
                }
            }
        }

        if let Some(last) = patches.last_mut() {
            let bare = last.diffs.last().map_or(true, |d| d.op != Op::Equal);
            if bare {
                last.diffs.push(Diff::from_chars(Op::Equal, &padding));
                last.length1 += margin;
                last.length2 += margin;
            } else if let Some(d) = last.diffs.last_mut() {
                if margin > d.len() {
                    let grow = margin - d.len();
                    d.text.extend_from_slice(&padding[..grow]);
                    last.length1 += grow;
                    last.length2 += grow;
                }
            }
        }

        padding
    }

    /// Apply patches to `text`, relocating each hunk by fuzzy-matching
    /// its context against whatever the text has become.
    ///
    /// Returns the patched text and one flag per input hunk; a `false`
    /// flag means that hunk could not be placed (or its deletion no
    /// longer resembled what it was supposed to remove) and was skipped.
    /// Application is best-effort, not transactional: other hunks still
    /// apply.
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let deadline = self.deadline();
        let max_bits = self.match_max_bits();

        // Work on copies; padding and splitting are application
        // details the caller's patches shouldn't see.
        let mut patches = patches.to_vec();
        let padding = self.add_padding(&mut patches);

        let mut source: Vec<char> = padding
            .iter()
            .copied()
            .chain(text.chars())
            .chain(padding.iter().copied())
            .collect();

        self.split_max(&mut patches);

        // Offset between expected and actual positions: if a hunk
        // expected at 10 lands at 12, the next one expects +2 too.
        let mut drift: isize = 0;
        let mut results = vec![false; patches.len()];

        for (x, patch) in patches.iter().enumerate() {
            let expected = usize::try_from(patch.start2 as isize + drift).unwrap_or(0);
            let text_old = delta::text_old_chars(&patch.diffs);

            let (found, found_end) = if text_old.len() > max_bits {
                // split_max only leaves an oversized pre-text for a
                // monster deletion; anchor both of its ends.
                match self.match_chars(&source, &text_old[..max_bits], expected) {
                    Some(head) => {
                        let tail = self.match_chars(
                            &source,
                            &text_old[text_old.len() - max_bits..],
                            expected + text_old.len() - max_bits,
                        );
                        match tail {
                            // The ends must be in order to count.
                            Some(tail) if head < tail => (Some(head), Some(tail)),
                            _ => (None, None),
                        }
                    }
                    None => (None, None),
                }
            } else {
                (self.match_chars(&source, &text_old, expected), None)
            };

            let Some(found) = found else {
                debug!(hunk = x, expected, "no match for hunk context, skipping");
                // Subtract what this hunk would have shifted.
                drift -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };

            results[x] = true;
            drift = found as isize - expected as isize;

            let span_end = match found_end {
                Some(tail) => (tail + max_bits).min(source.len()),
                None => (found + text_old.len()).min(source.len()),
            };
            let text_new = source[found..span_end].to_vec();

            if text_old == text_new {
                // Perfect match; shove the replacement in directly.
                source.splice(
                    found..found + text_old.len(),
                    delta::text_new_chars(&patch.diffs),
                );
            } else {
                // Imperfect match: diff what we found against what we
                // expected to map the edit offsets across.
                let mut map = self.diff_chars(&text_old, &text_new, false, deadline);
                let badness = Self::levenshtein(&map) as f32 / text_old.len() as f32;
                if text_old.len() > max_bits && badness > self.patch_delete_threshold() {
                    // End points match but the middle is another text.
                    debug!(hunk = x, badness, "deletion body too different, skipping");
                    results[x] = false;
                } else {
                    Self::cleanup_semantic_lossless(&mut map);

                    let mut index_old = 0;
                    for diff in &patch.diffs {
                        if diff.op != Op::Equal {
                            let at = Self::x_index(&map, index_old);
                            match diff.op {
                                Op::Insert => {
                                    source.splice(
                                        found + at..found + at,
                                        diff.chars().iter().copied(),
                                    );
                                }
                                Op::Delete => {
                                    let until =
                                        Self::x_index(&map, index_old + diff.len());
                                    source.drain(found + at..found + until);
                                }
                                Op::Equal => {}
                            }
                        }
                        if diff.op != Op::Delete {
                            index_old += diff.len();
                        }
                    }
                }
            }
        }

        // Strip the padding back off.
        source.drain(source.len() - padding.len()..);
        source.drain(..padding.len());

        (source.into_iter().collect(), results)
    }
}

// Does `pattern` pin down exactly one spot in `text`? An empty pattern
// never does.
fn unique_in(text: &[char], pattern: &[char]) -> bool {
    match (
        chars::find(text, pattern, 0),
        chars::rfind(text, pattern, text.len()),
    ) {
        (Some(first), Some(last)) => first == last && !pattern.is_empty(),
        _ => false,
    }
}
