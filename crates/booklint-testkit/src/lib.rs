//! Shared test utilities for the booklint workspace.
//!
//! This crate provides:
//! - **ebook**: a fluent builder that writes a minimal, lint-clean ebook
//!   source tree to disk (or returns it in memory)
//! - **fixtures**: sample documents and stylesheets that trip specific rules
//! - **arb**: proptest strategies for findings and ignore entries
//!
//! # Example
//!
//! ```rust,no_run
//! use booklint_testkit::EbookBuilder;
//!
//! let book = EbookBuilder::new()
//!     .chapter("chapter-1.xhtml", r#"<section id="chapter-1"><p>Hi.</p></section>"#)
//!     .build();
//! assert!(book.path().join("epub/content.opf").exists());
//! ```

pub mod arb;
pub mod ebook;
pub mod fixtures;

pub use arb::{arb_finding, arb_ignore_entry, arb_location, arb_rule_code, arb_severity};
pub use ebook::EbookBuilder;
