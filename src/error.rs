/// Crate-level error types for the motion text engine.
use crate::types::LineRange;

/// All errors carry enough context to produce a useful diagnostic without a
/// debugger. None of them is retried: each one signals either bad input or a
/// genuine authoring conflict that needs a human decision.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two changes claim overlapping line ranges. Never auto-resolved, since
    /// silently picking a winner would silently discard authored content.
    #[error(
        "conflicting changes: #{first_id} (lines {}..{}) overlaps #{second_id} (lines {}..{})",
        first_range.from,
        first_range.to,
        second_range.from,
        second_range.to
    )]
    ConflictingChanges {
        /// Identifier of the earlier change (by line order).
        first_id: u64,
        /// Line range claimed by the earlier change.
        first_range: LineRange,
        /// Identifier of the later change.
        second_id: u64,
        /// Line range claimed by the later change.
        second_range: LineRange,
    },

    /// A motion record violates a data-model invariant — an amendment with no
    /// paragraph entries, or a declared lead/statute reference whose record
    /// was not supplied alongside it.
    #[error("invalid motion #{motion_id}: {reason}")]
    InvalidMotion {
        /// Identifier of the offending motion.
        motion_id: u64,
        /// Description of the violated invariant.
        reason: String,
    },

    /// A requested line range cannot be resolved against the document:
    /// inverted, out of bounds, or addressed at un-numbered content.
    #[error(
        "invalid line range {}..{} (document ends at line {last_line})",
        range.from,
        range.to
    )]
    InvalidRange {
        /// Highest line number present in the document.
        last_line: u32,
        /// The range that could not be resolved.
        range: LineRange,
    },

    /// Input HTML violates the safe-tag/well-formedness assumption. A hard
    /// failure: it indicates a data-integrity bug upstream of this engine.
    #[error("malformed html: {reason}")]
    MalformedHtml {
        /// Description of the parse failure.
        reason: String,
    },
}
