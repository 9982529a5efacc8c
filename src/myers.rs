//! The O(ND) shortest-edit search, after Myers 1986: "An O(ND)
//! Difference Algorithm and Its Variations".
//!
//! Small inputs (at or below the dual threshold) run a single forward
//! walk that snapshots each frontier row and backtracks through the
//! snapshots to materialize the script. Larger inputs walk from both
//! ends at once, and on the first overlapping diagonal split the
//! problem there and recurse. Either way, hitting the deadline degrades
//! the result to the trivial delete-everything/insert-everything script.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{Diff, Mend, Op};

impl Mend {
    pub(crate) fn shortest_edit(
        &self,
        old: &[char],
        new: &[char],
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        if old.len() + new.len() <= self.dual_threshold() {
            if let Some(diffs) = forward_walk(old, new, deadline) {
                return diffs;
            }
            debug!(
                old = old.len(),
                new = new.len(),
                "forward walk hit the deadline, degrading to a trivial diff"
            );
            return vec![
                Diff::from_chars(Op::Delete, old),
                Diff::from_chars(Op::Insert, new),
            ];
        }

        self.bisect(old, new, deadline)
    }

    // Find the middle snake by walking the edit graph from both ends,
    // split the texts there, and diff the halves recursively.
    pub(crate) fn bisect(
        &self,
        old: &[char],
        new: &[char],
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        let old_len = old.len() as isize;
        let new_len = new.len() as isize;

        let max_d = (old_len + new_len + 1) / 2;
        let v_offset = max_d;
        let v_len = (2 * max_d) as usize;

        let mut v1 = vec![-1_isize; v_len];
        let mut v2 = vec![-1_isize; v_len];
        v1[v_offset as usize + 1] = 0;
        v2[v_offset as usize + 1] = 0;

        let delta = old_len - new_len;
        // With an odd delta the forward path is the one that crosses
        // the reverse path.
        let front = delta % 2 != 0;

        // Trim the k range once a path runs off the grid.
        let mut k1start: isize = 0;
        let mut k1end: isize = 0;
        let mut k2start: isize = 0;
        let mut k2end: isize = 0;

        for d in 0..max_d {
            if let Some(deadline) = deadline {
                if Utc::now() > deadline {
                    debug!(d, "bisect hit the deadline, degrading to a trivial diff");
                    break;
                }
            }

            // Forward path, one step.
            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 =
                    if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                        v1[k1_offset + 1]
                    } else {
                        v1[k1_offset - 1] + 1
                    };
                let mut y1 = x1 - k1;

                while x1 < old_len && y1 < new_len && old[x1 as usize] == new[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;

                if x1 > old_len {
                    // Ran off the right of the graph.
                    k1end += 2;
                } else if y1 > new_len {
                    // Ran off the bottom of the graph.
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if (0..v_len as isize).contains(&k2_offset) && v2[k2_offset as usize] != -1 {
                        // Mirror x2 onto the top-left coordinate system.
                        let x2 = old_len - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }

                k1 += 2;
            }

            // Reverse path, one step.
            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 =
                    if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                        v2[k2_offset + 1]
                    } else {
                        v2[k2_offset - 1] + 1
                    };
                let mut y2 = x2 - k2;

                while x2 < old_len
                    && y2 < new_len
                    && old[(old_len - x2 - 1) as usize] == new[(new_len - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;

                if x2 > old_len {
                    // Ran off the left of the graph.
                    k2end += 2;
                } else if y2 > new_len {
                    // Ran off the top of the graph.
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if (0..v_len as isize).contains(&k1_offset) && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        let x2 = old_len - x2;
                        if x1 >= x2 {
                            return self.bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }

                k2 += 2;
            }
        }

        // Ran out of time, or the number of edits equals the number of
        // characters: no commonality at all.
        vec![
            Diff::from_chars(Op::Delete, old),
            Diff::from_chars(Op::Insert, new),
        ]
    }

    fn bisect_split(
        &self,
        old: &[char],
        new: &[char],
        x: usize,
        y: usize,
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Diff> {
        let mut diffs = self.diff_chars(&old[..x], &new[..y], false, deadline);
        diffs.extend(self.diff_chars(&old[x..], &new[y..], false, deadline));
        diffs
    }
}

// Single-ended farthest-reaching search. Keeps every frontier row so
// the script can be reconstructed without recursion; only used for
// inputs small enough that the quadratic row storage is noise.
fn forward_walk(
    old: &[char],
    new: &[char],
    deadline: Option<DateTime<Utc>>,
) -> Option<Vec<Diff>> {
    let old_len = old.len() as isize;
    let new_len = new.len() as isize;

    let max_d = old.len() + new.len();
    let offset = max_d as isize;

    let mut v = vec![0_isize; 2 * max_d + 2];
    let mut rows: Vec<Vec<isize>> = Vec::with_capacity(max_d + 1);

    for d in 0..=(max_d as isize) {
        if let Some(deadline) = deadline {
            if Utc::now() > deadline {
                return None;
            }
        }

        let mut k = -d;
        while k <= d {
            let k_offset = (offset + k) as usize;
            let mut x = if k == -d || (k != d && v[k_offset - 1] < v[k_offset + 1]) {
                v[k_offset + 1]
            } else {
                v[k_offset - 1] + 1
            };
            let mut y = x - k;

            while x < old_len && y < new_len && old[x as usize] == new[y as usize] {
                x += 1;
                y += 1;
            }
            v[k_offset] = x;

            if x >= old_len && y >= new_len {
                rows.push(v.clone());
                return Some(backtrack(old, new, &rows, offset));
            }

            k += 2;
        }

        rows.push(v.clone());
    }

    // Unreachable: d = |old| + |new| always suffices.
    None
}

// Re-trace the walk from (|old|, |new|) back to the origin. Rows hold
// the farthest-reaching x per diagonal after each iteration; entries on
// diagonals k±1 were last written in the previous iteration, which is
// exactly what each step needs.
fn backtrack(old: &[char], new: &[char], rows: &[Vec<isize>], offset: isize) -> Vec<Diff> {
    let mut trail: Vec<(Op, char)> = Vec::new();

    let mut x = old.len() as isize;
    let mut y = new.len() as isize;

    for d in (1..rows.len()).rev() {
        let row = &rows[d - 1];
        let d = d as isize;
        let k = x - y;

        let prev_k = if k == -d
            || (k != d && row[(offset + k - 1) as usize] < row[(offset + k + 1) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = row[(offset + prev_k) as usize];
        let prev_y = prev_x - prev_k;

        // The snake back along the shared diagonal.
        while x > prev_x && y > prev_y {
            trail.push((Op::Equal, old[(x - 1) as usize]));
            x -= 1;
            y -= 1;
        }

        if prev_k == k + 1 {
            trail.push((Op::Insert, new[(y - 1) as usize]));
            y -= 1;
        } else {
            trail.push((Op::Delete, old[(x - 1) as usize]));
            x -= 1;
        }
    }

    // Whatever remains is the leading snake of iteration zero.
    while x > 0 && y > 0 {
        trail.push((Op::Equal, old[(x - 1) as usize]));
        x -= 1;
        y -= 1;
    }

    // The trail is right-to-left, one scalar per step; fold it into
    // merged edits.
    let mut diffs: Vec<Diff> = Vec::new();
    for (op, ch) in trail.into_iter().rev() {
        match diffs.last_mut() {
            Some(last) if last.op == op => last.text.push(ch),
            _ => diffs.push(Diff::from_chars(op, &[ch])),
        }
    }
    diffs
}
