#![no_main]

use libfuzzer_sys::fuzz_target;

use booklint_domain::{EvaluateOptions, RuleCatalog, evaluate};
use booklint_model::SourceTree;

const CONTAINER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
	<rootfiles>
		<rootfile full-path="epub/content.opf" media-type="application/oebps-package+xml"/>
	</rootfiles>
</container>
"#;

const PACKAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid" version="3.0" xml:lang="en-GB">
	<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
		<dc:identifier id="uid">url:https://standardebooks.org/ebooks/fuzz</dc:identifier>
		<dc:language>en-GB</dc:language>
	</metadata>
	<manifest>
		<item href="text/chapter-1.xhtml" id="chapter-1.xhtml" media-type="application/xhtml+xml"/>
	</manifest>
	<spine>
		<itemref idref="chapter-1.xhtml"/>
	</spine>
</package>
"#;

// Every predicate must tolerate any well-formed chapter without failing.
fuzz_target!(|data: &[u8]| {
    let chapter = String::from_utf8_lossy(data).into_owned();
    let files = vec![
        ("mimetype".to_string(), "application/epub+zip".to_string()),
        ("META-INF/container.xml".to_string(), CONTAINER.to_string()),
        ("epub/content.opf".to_string(), PACKAGE.to_string()),
        ("epub/text/chapter-1.xhtml".to_string(), chapter),
    ];
    let Ok(tree) = SourceTree::from_files("fuzz", files) else {
        return;
    };
    let Ok(catalog) = RuleCatalog::builtin() else {
        return;
    };
    let evaluation = evaluate(&tree, &catalog, EvaluateOptions { parallel: false });
    assert!(evaluation.diagnostics.is_empty(), "{:?}", evaluation.diagnostics);
});
