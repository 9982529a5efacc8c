use criterion::{criterion_group, criterion_main, Criterion};

use mend::{Mend, PatchSource};

const TXT_OLD: &str = "I am the very model of a modern Major-General,
I've information vegetable, animal, and mineral,
I know the kings of England, and I quote the fights historical,
From Marathon to Waterloo, in order categorical.";

const TXT_NEW: &str = "I am the very model of a cartoon individual,
My animation's comical, unusual, and whimsical,
I'm quite adept at funny gags, comedic theory I have read,
From wicked puns and stupid jokes to anvils that drop on your head.";

fn diff_main(c: &mut Criterion) {
    let mend = Mend::new();

    c.bench_function("diff_main", |bencher| {
        bencher.iter(|| mend.diff_main(TXT_OLD, TXT_NEW));
    });
}

fn patch_roundtrip(c: &mut Criterion) {
    let mend = Mend::new();
    let patches = mend.patch_make(PatchSource::Texts(TXT_OLD, TXT_NEW));

    c.bench_function("patch_apply", |bencher| {
        bencher.iter(|| mend.patch_apply(&patches, TXT_OLD));
    });
}

criterion_group!(benches, diff_main, patch_roundtrip);
criterion_main!(benches);
