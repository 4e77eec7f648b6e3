#![no_main]

use caseforge_core::TypeDescriptor;
use caseforge_core::metadata::{TypeParameter, TypeScope};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let params = [TypeParameter::new("T", 0), TypeParameter::new("U", 1)];
        let scope = TypeScope::new(&params, "Fuzz");
        // A parsed expression must print back to something that parses to the same type
        if let Ok(ty) = TypeDescriptor::parse(s, &scope) {
            let printed = ty.to_string();
            let reparsed = TypeDescriptor::parse(&printed, &scope);
            assert_eq!(reparsed.ok(), Some(ty), "reparse of {printed:?}");
        }
    }
});
