//! Round-trip assertions for the fuzz harness (and anyone else who
//! wants a cheap end-to-end sanity check).

use crate::{Mend, PatchSource};

/// Diff two texts, push the script through the delta codec and the
/// patch pipeline, and panic if anything fails to reconstruct.
pub fn roundtrip(old: &str, new: &str) {
    let mend = Mend::new();

    let diffs = mend.diff_main(old, new);
    assert_eq!(old, Mend::diff_text_old(&diffs));
    assert_eq!(new, Mend::diff_text_new(&diffs));

    let delta = Mend::diff_to_delta(&diffs);
    assert_eq!(Ok(&diffs), Mend::diff_from_delta(old, &delta).as_ref());

    let patches = mend.patch_make(PatchSource::Diffs(&diffs));
    let reparsed = Mend::patch_from_text(&Mend::patch_to_text(&patches));
    assert_eq!(Ok(&patches), reparsed.as_ref());

    let (patched, _) = mend.patch_apply(&patches, old);
    assert_eq!(new, patched);
}
