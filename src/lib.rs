//! Line numbering, diffing, and change merging for motion texts.
//!
//! The engine behind change recommendations and amendments in a motion
//! workflow: it assigns stable line numbers to wrapped HTML text, computes
//! diffs between an original text and a proposed replacement for a line
//! range, and merges sets of possibly-competing change recommendations and
//! amendment paragraphs into one consistent rendering per view mode — all
//! while preserving tag nesting across every insertion point.
//!
//! The crate is a pure library: no I/O, no ambient state, deterministic
//! output. Input HTML is restricted to a safe tag subset
//! ([`html::SAFE_TAGS`]), and configuration arrives as an explicit
//! [`MotionRenderConfig`] per call.
//!
//! ```
//! use motiondiff::linenumbering;
//!
//! let numbered = linenumbering::insert_line_numbers("<p>Hello world</p>", 80, None)?;
//! assert!(numbered.contains("data-line-number=\"1\""));
//! assert_eq!(linenumbering::strip_line_numbers(&numbered)?, "<p>Hello world</p>");
//! # Ok::<(), motiondiff::Error>(())
//! ```

pub mod cache;
pub mod diff;
pub mod error;
pub mod format;
pub mod html;
pub mod linenumbering;
pub mod merger;
pub mod types;

pub use error::Error;
pub use types::{
    AmendmentChange, AmendmentParagraphs, ChangeRecoMode, ChangeRecommendation, ChangeSource,
    LineNumberingMode, LineRange, ModificationType, Motion, MotionRenderConfig, ParagraphDiff,
    StatuteParagraph,
};
