//! Fixtures produced by other implementations of the same wire
//! formats: patch texts and deltas generated elsewhere must parse and
//! apply here.

use mend::{Mend, PatchSource};

#[test]
fn test_foreign_patch_text_applies() {
    // Patch text as emitted by the reference implementations for
    // "That quick..." -> "The quick...".
    const PATCH: &str = "@@ -1,8 +1,7 @@\n Th\n-at\n+e\n  qui\n@@ -21,17 +21,18 @@\n jump\n-ed\n+s\n  over \n-a\n+the\n  laz\n";

    let mend = Mend::new();
    let patches = Mend::patch_from_text(PATCH).unwrap();

    // Round-trips byte for byte.
    assert_eq!(PATCH, Mend::patch_to_text(&patches));

    let (patched, results) =
        mend.patch_apply(&patches, "That quick brown fox jumped over a lazy dog.");
    assert_eq!("The quick brown fox jumps over the lazy dog.", patched);
    assert_eq!(vec![true, true], results);
}

#[test]
fn test_foreign_delta_applies() {
    // Delta for: jump[s->ed] over [the->a] lazy[+old dog].
    const DELTA: &str = "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog";
    const SOURCE: &str = "jumps over the lazy";

    let mend = Mend::new();
    let diffs = Mend::diff_from_delta(SOURCE, DELTA).unwrap();
    assert_eq!("jumped over a lazyold dog", Mend::diff_text_new(&diffs));

    // Re-encoding gives back the foreign delta.
    assert_eq!(DELTA, Mend::diff_to_delta(&diffs));

    // And the diffs drive a working patch.
    let patches = mend.patch_make(PatchSource::TextDiffs(SOURCE, &diffs));
    let (patched, results) = mend.patch_apply(&patches, SOURCE);
    assert_eq!("jumped over a lazyold dog", patched);
    assert!(results.iter().all(|&ok| ok));
}

#[test]
fn test_foreign_delta_with_multibyte_scalars() {
    // A delta produced against scalar-counting sources: the monkey is
    // one character on the wire, not four bytes.
    const DELTA: &str = "-1\t+%F0%9F%99%89\t=8";

    let diffs = Mend::diff_from_delta("🙈 says hi", DELTA).unwrap();
    assert_eq!("🙉 says hi", Mend::diff_text_new(&diffs));
    assert_eq!(DELTA, Mend::diff_to_delta(&diffs));
}
