//! Parser fuzz target: feed arbitrary text to the PDL parser, run the fix-up
//! pass on what parses, and re-parse whatever the writer produces for it.
//! None of the steps may panic.
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
    if let Ok(protocol) = pdlgen::parse(s) {
        let _ = pdlgen::fix_domains(&mut protocol.clone(), &pdlgen::FixupConfig::default());
        if let Ok(text) = pdlgen::to_pdl(&protocol) {
            let _ = pdlgen::parse(&text);
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
