//! Builder for minimal ebook source trees.
//!
//! The default book passes every built-in rule: one chapter, a navigation
//! document, one stylesheet, and complete metadata. Tests add exactly the
//! violation they care about on top of it.
//!
//! # Layout
//!
//! ```text
//! mimetype
//! META-INF/container.xml
//! epub/content.opf
//! epub/toc.xhtml
//! epub/css/local.css
//! epub/text/<chapters>
//! ```
//!
//! With [`EbookBuilder::src_layout`] everything above lives under `src/`.

use std::fs;
use std::io;
use std::path::Path;

use booklint_types::DEFAULT_IGNORE_FILE;
use tempfile::TempDir;

/// Stylesheet of the default book; every selector is used by `toc.xhtml`.
pub const DEFAULT_CSS: &str = r#"@charset "utf-8";
@namespace epub "http://www.idpf.org/2007/ops";

h2{
	margin-top: 3em;
	text-align: center;
}
"#;

/// Body of the default chapter.
pub const DEFAULT_CHAPTER: &str = r#"<section id="chapter-1" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">I</h2>
			<p>It was a bright cold day in April.</p>
		</section>"#;

#[derive(Debug, Clone)]
pub struct EbookBuilder {
    title: String,
    language: String,
    chapters: Vec<(String, String)>,
    css: String,
    extra: Vec<(String, String)>,
    omit: Vec<String>,
    ignore_manifest: Option<String>,
    src_layout: bool,
}

impl Default for EbookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EbookBuilder {
    pub fn new() -> Self {
        Self {
            title: "The Test Book".to_string(),
            language: "en-GB".to_string(),
            chapters: Vec::new(),
            css: DEFAULT_CSS.to_string(),
            extra: Vec::new(),
            omit: Vec::new(),
            ignore_manifest: None,
            src_layout: false,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Adds a chapter `epub/text/<file_name>` whose `<body>` holds `body`.
    ///
    /// The first call replaces the default chapter.
    pub fn chapter(mut self, file_name: &str, body: &str) -> Self {
        self.chapters.push((file_name.to_string(), body.to_string()));
        self
    }

    pub fn css(mut self, css: &str) -> Self {
        self.css = css.to_string();
        self
    }

    /// Adds an arbitrary file, relative to the source root.
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.extra.push((path.to_string(), contents.to_string()));
        self
    }

    /// Leaves out a generated file, relative to the source root.
    pub fn without(mut self, path: &str) -> Self {
        self.omit.push(path.to_string());
        self
    }

    /// Writes `booklint-ignore.toml` at the target root.
    pub fn ignore_manifest(mut self, toml: &str) -> Self {
        self.ignore_manifest = Some(toml.to_string());
        self
    }

    pub fn src_layout(mut self) -> Self {
        self.src_layout = true;
        self
    }

    fn chapter_list(&self) -> Vec<(String, String)> {
        if self.chapters.is_empty() {
            vec![("chapter-1.xhtml".to_string(), DEFAULT_CHAPTER.to_string())]
        } else {
            self.chapters.clone()
        }
    }

    /// All files of the book as `(target-relative path, contents)`.
    pub fn files(&self) -> Vec<(String, String)> {
        let chapters = self.chapter_list();
        let mut files: Vec<(String, String)> = vec![
            ("mimetype".to_string(), "application/epub+zip".to_string()),
            ("META-INF/container.xml".to_string(), container_xml()),
            ("epub/content.opf".to_string(), self.content_opf(&chapters)),
            ("epub/toc.xhtml".to_string(), self.toc_xhtml(&chapters)),
            ("epub/css/local.css".to_string(), self.css.clone()),
        ];
        for (name, body) in &chapters {
            files.push((format!("epub/text/{name}"), self.chapter_xhtml(name, body)));
        }
        files.retain(|(path, _)| !self.omit.contains(path));
        files.extend(self.extra.iter().cloned());

        let prefix = if self.src_layout { "src/" } else { "" };
        let mut files: Vec<(String, String)> = files
            .into_iter()
            .map(|(path, contents)| (format!("{prefix}{path}"), contents))
            .collect();
        if let Some(toml) = &self.ignore_manifest {
            files.push((DEFAULT_IGNORE_FILE.to_string(), toml.clone()));
        }
        files
    }

    /// Writes the book below `dir`.
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        for (path, contents) in self.files() {
            let full = dir.join(&path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full, contents)?;
        }
        Ok(())
    }

    /// Writes the book into a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created or written.
    pub fn build(&self) -> TempDir {
        let dir = TempDir::new().expect("create temp dir");
        self.write_to(dir.path()).expect("write ebook");
        dir
    }

    fn content_opf(&self, chapters: &[(String, String)]) -> String {
        let mut manifest = String::from(
            "\t\t<item href=\"css/local.css\" id=\"local.css\" media-type=\"text/css\"/>\n",
        );
        let mut spine = String::new();
        for (name, _) in chapters {
            manifest.push_str(&format!(
                "\t\t<item href=\"text/{name}\" id=\"{name}\" media-type=\"application/xhtml+xml\"/>\n"
            ));
            spine.push_str(&format!("\t\t<itemref idref=\"{name}\"/>\n"));
        }
        manifest.push_str(
            "\t\t<item href=\"toc.xhtml\" id=\"toc.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
        spine.push_str("\t\t<itemref idref=\"toc.xhtml\"/>\n");

        format!(
            r##"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" dir="ltr" prefix="se: https://standardebooks.org/vocab/1.0" unique-identifier="uid" version="3.0" xml:lang="{lang}">
	<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
		<dc:identifier id="uid">url:https://standardebooks.org/ebooks/test/book</dc:identifier>
		<dc:title id="title">{title}</dc:title>
		<meta property="file-as" refines="#title">{title}</meta>
		<dc:language>{lang}</dc:language>
		<dc:description id="description">A book used in tests.</dc:description>
		<meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
	</metadata>
	<manifest>
{manifest}	</manifest>
	<spine>
{spine}	</spine>
</package>
"##,
            lang = self.language,
            title = self.title,
        )
    }

    fn toc_xhtml(&self, chapters: &[(String, String)]) -> String {
        let mut entries = String::new();
        for (index, (name, _)) in chapters.iter().enumerate() {
            entries.push_str(&format!(
                "\t\t\t\t<li>\n\t\t\t\t\t<a href=\"text/{name}\">{}</a>\n\t\t\t\t</li>\n",
                index + 1
            ));
        }
        let first = chapters.first().map(|(name, _)| name.as_str()).unwrap_or("");
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" epub:prefix="z3998: http://www.daisy.org/z3998/2012/vocab/structure/" xml:lang="{lang}">
	<head>
		<title>Table of Contents</title>
		<link href="css/local.css" rel="stylesheet" type="text/css"/>
	</head>
	<body epub:type="backmatter">
		<nav id="toc" epub:type="toc">
			<h2 epub:type="title">Table of Contents</h2>
			<ol>
{entries}			</ol>
		</nav>
		<nav id="landmarks" epub:type="landmarks">
			<h2 epub:type="title">Landmarks</h2>
			<ol>
				<li>
					<a href="text/{first}" epub:type="bodymatter z3998:fiction">{title}</a>
				</li>
			</ol>
		</nav>
	</body>
</html>
"#,
            lang = self.language,
            title = self.title,
        )
    }

    fn chapter_xhtml(&self, name: &str, body: &str) -> String {
        let title = name.trim_end_matches(".xhtml");
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" epub:prefix="z3998: http://www.daisy.org/z3998/2012/vocab/structure/" xml:lang="{lang}">
	<head>
		<title>{title}</title>
		<link href="../css/local.css" rel="stylesheet" type="text/css"/>
	</head>
	<body epub:type="bodymatter z3998:fiction">
		{body}
	</body>
</html>
"#,
            lang = self.language,
        )
    }
}

fn container_xml() -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
	<rootfiles>
		<rootfile full-path="epub/content.opf" media-type="application/oebps-package+xml"/>
	</rootfiles>
</container>
"#
    .to_string()
}
