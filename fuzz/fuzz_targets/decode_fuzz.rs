//! Decoder fuzz target: arbitrary bytes against a fixed schema covering every
//! decodable kind. Decoding must never panic or over-allocate on large length prefixes.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const IDL: &str = r#"
module fuzz {
    struct All {
        octet a;
        short b;
        unsigned short c;
        long d;
        unsigned long e;
        long long f;
        unsigned long long g;
        boolean h;
        float i;
        string j;
        sequence<sequence<octet>> k;
        sequence<string> l;
    };
}
"#;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Ok(schema) = busidl::Schema::parse(IDL) else {
        return;
    };
    let Ok(decoder) = schema.decoder("All") else {
        return;
    };
    let _ = busidl::decode_frame(&decoder, data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
