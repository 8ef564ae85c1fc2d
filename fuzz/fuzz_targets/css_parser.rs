#![no_main]

use libfuzzer_sys::fuzz_target;

use booklint_model::ParsedCss;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(css) = ParsedCss::parse("epub/css/fuzz.css", s.as_ref()) {
        for rule in css.style_rules() {
            for selector in &rule.selectors {
                let _ = selector.is_supported();
            }
        }
    }
});
