//! Parser fuzz target: feed arbitrary text to the IDL parser and verifier.
//! Neither may panic; both return Ok or a positioned error.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(root) = busidl::parse(s) {
        let _ = busidl::verify(&root);
    }
    let _ = busidl::parse_type_ref(s);
    let _ = busidl::parse_annotations(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
