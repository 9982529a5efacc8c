#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    mend::fuzz::roundtrip(data.0, data.1);
});
