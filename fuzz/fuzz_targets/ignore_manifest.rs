#![no_main]

use libfuzzer_sys::fuzz_target;

use booklint_domain::{IgnoreManifest, RuleCatalog};
use booklint_types::IgnoreFile;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(file) = toml::from_str::<IgnoreFile>(text) else {
        return;
    };
    let Ok(catalog) = RuleCatalog::builtin() else {
        return;
    };
    let _ = IgnoreManifest::compile(&file, &catalog, "booklint-ignore.toml");
});
