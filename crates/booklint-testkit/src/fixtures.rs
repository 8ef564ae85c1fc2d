//! Sample chapter bodies and stylesheets for tests across the workspace.

/// Chapter bodies that each trip exactly one rule.
pub mod sample_chapters {
    /// `s-004`: an `<img>` without `alt`. Pair with [`MAP_IMAGE`](super::MAP_IMAGE).
    pub const IMG_WITHOUT_ALT: &str = r#"<section id="chapter-1" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">I</h2>
			<p>It was a bright cold day in April.</p>
			<figure id="map">
				<img src="../images/map.png"/>
			</figure>
		</section>"#;

    /// `s-013`: a `<pre>` element.
    pub const PRE: &str = r#"<section id="chapter-2" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">II</h2>
			<pre>Verbatim.</pre>
		</section>"#;

    /// `t-001`: two spaces between sentences.
    pub const DOUBLE_SPACED: &str = r#"<section id="chapter-3" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">III</h2>
			<p>One sentence.  Another sentence.</p>
		</section>"#;

    /// `x-012`: an inline `style` attribute.
    pub const INLINE_STYLE: &str = r#"<section id="chapter-4" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">IV</h2>
			<p style="color: red">Styled.</p>
		</section>"#;
}

/// Path of the image referenced by [`sample_chapters::IMG_WITHOUT_ALT`],
/// relative to the source root.
pub const MAP_IMAGE: &str = "epub/images/map.png";

/// An ignore manifest accepting the missing `alt` in `chapter-1.xhtml`.
pub const IGNORE_IMG_ALT: &str = r#"[[ignore]]
code = "s-004"
path = "chapter-1.xhtml"
reason = "The map is decorative."
"#;

/// An ignore manifest whose only entry matches nothing in the default book.
pub const IGNORE_STALE: &str = r#"[[ignore]]
code = "s-013"
path = "chapter-9.xhtml"
reason = "Was needed for an old chapter."
"#;
