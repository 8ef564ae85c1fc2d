#![no_main]

use libfuzzer_sys::fuzz_target;

use booklint_model::ParsedXhtmlDocument;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(doc) = ParsedXhtmlDocument::parse("epub/text/fuzz.xhtml", s.as_ref()) {
        let dom = doc.dom();
        for node in dom.elements() {
            let _ = dom.locator(node);
            let _ = dom.location(node);
        }
    }
});
