//! Diff, fuzzy match and patch for plain text.
//!
//! `mend` computes the differences between two texts as an edit script,
//! cleans that script up for human consumption or wire efficiency,
//! serializes it as a compact delta, locates patterns in drifted text
//! with a Bitap fuzzy search, and applies context-carrying patches to
//! documents that no longer exactly match the text the patch was made
//! from.
//!
//! All offsets and lengths are counted in Unicode scalar values, so a
//! `🦀` is one character here, not four.
//!
//! # Example
//! ```
//! use mend::{Mend, PatchSource};
//!
//! let mend = Mend::new();
//!
//! let patches = mend.patch_make(PatchSource::Texts(
//!     "Apples are a fruit.",
//!     "Bananas are also fruit.",
//! ));
//! let (patched, applied) = mend.patch_apply(&patches, "Apples are a fruit.");
//!
//! assert_eq!("Bananas are also fruit.", patched);
//! assert!(applied.iter().all(|&ok| ok));
//! ```

use chrono::{DateTime, TimeDelta, Utc};

mod apply;
mod chars;
mod cleanup;
mod delta;
mod diff;
pub mod errors;
pub mod fuzz;
mod lines;
mod matching;
mod myers;
mod patch;
mod uri;

pub use diff::{Diff, IntoChars, Op};
pub use errors::Error;
pub use patch::{Patch, PatchSource};

/// The engine: a bag of tuning knobs threaded through every operation.
///
/// A fresh [`Mend::new`] carries the conventional defaults; adjust the
/// knobs with the `set_*` methods before calling into the diff, match
/// or patch families. The value carries no state between calls, so a
/// single instance can serve any number of operations.
#[derive(Clone)]
pub struct Mend {
    /// Run a line-level pre-pass over large inputs to narrow the
    /// changed regions before the character-level diff.
    checklines: bool,
    /// Diff time budget in milliseconds; `None` means unlimited, which
    /// also disables the half-match shortcut (no reason to risk a
    /// suboptimal split when time is not a concern).
    timeout: Option<u32>,
    /// Cost of an extra edit operation, in characters, for the
    /// efficiency cleanup.
    edit_cost: usize,
    /// Total input size at or below which the Myers search runs
    /// single-ended instead of bisecting from both ends.
    dual_threshold: usize,
    /// Score above which a fuzzy match is rejected (0.0 = exact only).
    match_threshold: f32,
    /// Distance from the expected location that contributes 1.0 to the
    /// match score; 0 demands the exact location.
    match_distance: usize,
    /// Longest pattern the bit-parallel matcher can handle.
    match_max_bits: usize,
    /// How loosely the interior of a large deletion may match before
    /// the hunk is rejected during application.
    patch_delete_threshold: f32,
    /// Characters of equality context kept around each hunk.
    patch_margin: u8,
}

impl Default for Mend {
    fn default() -> Self {
        Self {
            checklines: true,
            timeout: Some(1000),
            edit_cost: 4,
            dual_threshold: 32,
            match_threshold: 0.5,
            match_distance: 1000,
            match_max_bits: 32,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
        }
    }
}

impl Mend {
    /// An engine with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn checklines(&self) -> bool {
        self.checklines
    }

    /// Enable or disable the line-mode pre-pass. Worth turning off for
    /// inputs known to be short or not line-structured.
    pub fn set_checklines(&mut self, checklines: bool) {
        self.checklines = checklines;
    }

    pub(crate) fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Set the diff time budget in milliseconds. `None` removes the
    /// budget entirely; past the budget the diff degrades to a single
    /// delete/insert pair rather than failing.
    pub fn set_timeout(&mut self, millis: Option<u32>) {
        self.timeout = millis;
    }

    pub(crate) fn edit_cost(&self) -> usize {
        self.edit_cost
    }

    /// Set the cost of an edit operation for [`Mend::cleanup_efficiency`].
    /// With the default of 4, growing an edit by three characters to
    /// eliminate another edit is a net win.
    pub fn set_edit_cost(&mut self, edit_cost: usize) {
        self.edit_cost = edit_cost;
    }

    pub(crate) fn dual_threshold(&self) -> usize {
        self.dual_threshold
    }

    /// Set the input size at or below which the shortest-edit search
    /// runs from one end only.
    pub fn set_dual_threshold(&mut self, threshold: usize) {
        self.dual_threshold = threshold;
    }

    pub(crate) fn match_threshold(&self) -> f32 {
        self.match_threshold
    }

    /// Set the score ceiling for accepting a fuzzy match. Closer to 0
    /// demands accuracy, closer to 1 accepts nearly anything.
    pub fn set_match_threshold(&mut self, threshold: f32) {
        self.match_threshold = threshold;
    }

    pub(crate) fn match_distance(&self) -> usize {
        self.match_distance
    }

    /// Set the location-drift scale of the match score: a match this
    /// many characters from the expected location scores a full 1.0.
    pub fn set_match_distance(&mut self, distance: usize) {
        self.match_distance = distance;
    }

    pub(crate) fn match_max_bits(&self) -> usize {
        self.match_max_bits
    }

    /// Set the longest matchable pattern, clamped to the machine word
    /// size. Oversized patch hunks are split down to this before
    /// application.
    pub fn set_match_max_bits(&mut self, bits: usize) {
        self.match_max_bits = bits.min(usize::BITS as usize);
    }

    pub(crate) fn patch_delete_threshold(&self) -> f32 {
        self.patch_delete_threshold
    }

    /// Set how loosely the contents of a large deletion may match the
    /// expected text before the hunk is rejected.
    pub fn set_patch_delete_threshold(&mut self, threshold: f32) {
        self.patch_delete_threshold = threshold;
    }

    pub(crate) fn patch_margin(&self) -> usize {
        self.patch_margin as usize
    }

    /// Set the number of context characters kept around each hunk.
    pub fn set_patch_margin(&mut self, margin: u8) {
        self.patch_margin = margin;
    }

    // The wall-clock instant at which the current diff gives up, if a
    // budget is configured.
    pub(crate) fn deadline(&self) -> Option<DateTime<Utc>> {
        self.timeout
            .and_then(|ms| Utc::now().checked_add_signed(TimeDelta::milliseconds(ms as i64)))
    }
}
