/// Core domain types for motions, change recommendations, and diff results.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse map from paragraph index to replacement HTML — the set of lead-motion
/// paragraphs a paragraph-based amendment actually changes. Keys index into the
/// lead motion's paragraph decomposition. An amendment with zero entries is
/// invalid.
pub type AmendmentParagraphs = BTreeMap<usize, String>;

/// One paragraph-based amendment's claim over a line range of its lead motion,
/// reduced to what the merger needs. Amendment changes always act as
/// replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentChange {
    /// Identifier of the amendment motion this slice came from.
    pub amendment_id: u64,
    /// First affected line of the lead motion (inclusive).
    pub line_from: u32,
    /// First line after the affected range (exclusive).
    pub line_to: u32,
    /// Whether the amendment was rejected.
    pub rejected: bool,
    /// Replacement HTML for the range.
    pub text: String,
}

/// Selects which rendering the façade produces for a motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRecoMode {
    /// Base text with each recommendation's range replaced per its type.
    Changed,
    /// Base text annotated with inline `<ins>`/`<del>`, nothing replaced.
    Diff,
    /// Non-rejected recommendations applied, line numbers stripped.
    Final,
    /// The manually edited final version verbatim if present, else `Final`.
    ModifiedFinal,
    /// Line-numbered base text, unmodified.
    #[default]
    Original,
}

/// An editor-authored suggested edit to a specific line range of a motion's
/// text. Belongs to exactly one motion. `line_from == line_to == 0` encodes a
/// title change — the degenerate case with no line-range semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecommendation {
    /// Unique identifier of this recommendation.
    pub id: u64,
    /// Visibility flag interpreted by the presentation layer, carried through
    /// unchanged by this engine.
    pub internal: bool,
    /// First affected line (inclusive); 0 for title changes.
    pub line_from: u32,
    /// First line after the affected range (exclusive); 0 for title changes.
    pub line_to: u32,
    /// How `text` combines with the base text over the range.
    #[serde(rename = "type")]
    pub modification: ModificationType,
    /// Identifier of the motion this recommendation belongs to.
    pub motion_id: u64,
    /// Whether the recommendation was rejected; rejected recommendations are
    /// excluded from the applying render modes.
    pub rejected: bool,
    /// Replacement or insertion HTML; the new title for title changes.
    pub text: String,
}

impl ChangeRecommendation {
    /// Whether this recommendation targets the motion title rather than a
    /// line range of the body.
    pub fn is_title_change(&self) -> bool {
        return self.line_from == 0 && self.line_to == 0;
    }

    /// The body line range this recommendation claims.
    pub fn line_range(&self) -> LineRange {
        return LineRange {
            from: self.line_from,
            to: self.line_to,
        };
    }
}

/// Anything that can change a motion's rendered text: a change recommendation
/// or a paragraph-based amendment. The merger treats both uniformly through
/// the query methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// A paragraph-based amendment's replacement over a lead-motion range.
    Amendment(AmendmentChange),
    /// An editor-authored change recommendation.
    Recommendation(ChangeRecommendation),
}

impl ChangeSource {
    /// Identifier of the underlying change object.
    pub fn id(&self) -> u64 {
        return match self {
            ChangeSource::Amendment(a) => a.amendment_id,
            ChangeSource::Recommendation(r) => r.id,
        };
    }

    /// Whether this change targets the motion title. Amendments never do.
    pub fn is_title_change(&self) -> bool {
        return match self {
            ChangeSource::Amendment(_) => false,
            ChangeSource::Recommendation(r) => r.is_title_change(),
        };
    }

    /// The claimed line range; `None` for title changes.
    pub fn line_range(&self) -> Option<LineRange> {
        match self {
            ChangeSource::Amendment(a) => Some(LineRange {
                from: a.line_from,
                to: a.line_to,
            }),
            ChangeSource::Recommendation(r) => {
                if r.is_title_change() {
                    None
                } else {
                    Some(r.line_range())
                }
            },
        }
    }

    /// How the change combines with the base text. Amendment slices act as
    /// replacements.
    pub fn modification(&self) -> ModificationType {
        return match self {
            ChangeSource::Amendment(_) => ModificationType::Replacement,
            ChangeSource::Recommendation(r) => r.modification,
        };
    }

    /// Whether the change was rejected.
    pub fn rejected(&self) -> bool {
        return match self {
            ChangeSource::Amendment(a) => a.rejected,
            ChangeSource::Recommendation(r) => r.rejected,
        };
    }

    /// Whether the diff rendering includes this change. Diff view shows every
    /// recommendation (rejected ones included, so the reader sees what was
    /// declined) but only non-rejected amendments.
    pub fn show_in_diff_view(&self) -> bool {
        return match self {
            ChangeSource::Amendment(a) => !a.rejected,
            ChangeSource::Recommendation(_) => true,
        };
    }

    /// Whether the final rendering applies this change. Final text is built
    /// from non-rejected recommendations only.
    pub fn show_in_final_view(&self) -> bool {
        return match self {
            ChangeSource::Amendment(_) => false,
            ChangeSource::Recommendation(r) => !r.rejected,
        };
    }

    /// The change's replacement/insertion HTML.
    pub fn text(&self) -> &str {
        return match self {
            ChangeSource::Amendment(a) => &a.text,
            ChangeSource::Recommendation(r) => &r.text,
        };
    }
}

/// Whether and where line-number markers are rendered relative to text flow.
/// Inside/outside placement is a stylesheet concern; both keep markers in the
/// markup, while `None` renders without them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineNumberingMode {
    /// Markers rendered within the text flow.
    Inside,
    /// No markers.
    None,
    /// Markers rendered in the margin.
    #[default]
    Outside,
}

/// A line interval: inclusive `from`, exclusive `to`. Valid iff
/// `1 <= from < to`, matching click-selection semantics (`to` is the line
/// after the last clicked one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First line of the range (inclusive, 1-based).
    pub from: u32,
    /// First line after the range (exclusive).
    pub to: u32,
}

impl LineRange {
    /// Whether the range satisfies its own invariant.
    pub fn is_well_formed(&self) -> bool {
        return self.from >= 1 && self.from < self.to;
    }

    /// Whether two ranges overlap: `a.from < b.to && b.from < a.to`.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        return self.from < other.to && other.from < self.to;
    }
}

/// How a change recommendation's text combines with the base text over its
/// line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationType {
    /// The range is removed; the change's text is ignored.
    Deletion,
    /// The change's text is added before the range; nothing is removed.
    Insertion,
    /// The change's text replaces the range.
    Replacement,
}

/// A motion record as handed in by the (out-of-scope) fetch layer. The engine
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    /// Present iff this is a paragraph-based amendment: the sparse paragraph
    /// overrides applied on top of the lead motion's text.
    pub amendment_paragraphs: Option<AmendmentParagraphs>,
    /// Unique identifier.
    pub id: u64,
    /// The lead motion this amendment is attached to, if any.
    pub lead_motion_id: Option<u64>,
    /// Manually edited final version, overriding the computed final text.
    pub modified_final_version: Option<String>,
    /// The statute paragraph this motion amends, if any.
    pub statute_paragraph_id: Option<u64>,
    /// Motion body as safe-subset HTML, without line-number markers.
    pub text: String,
    /// Motion title, plain text.
    pub title: String,
}

impl Motion {
    /// Whether this motion is a paragraph-based amendment.
    pub fn is_paragraph_based_amendment(&self) -> bool {
        return self.amendment_paragraphs.is_some();
    }
}

/// Explicit render settings passed into every façade call — the meeting-level
/// configuration snapshot, populated once per render request by the caller. No
/// ambient state lives inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionRenderConfig {
    /// Which rendering to produce.
    pub change_reco_mode: ChangeRecoMode,
    /// Line to visually highlight, if any.
    pub highlight_line: Option<u32>,
    /// Visible characters per line; 0 disables soft wrapping.
    pub line_length: usize,
    /// Whether and where line-number markers are rendered.
    pub line_numbering: LineNumberingMode,
}

impl Default for MotionRenderConfig {
    fn default() -> Self {
        return Self {
            change_reco_mode: ChangeRecoMode::default(),
            highlight_line: None,
            line_length: 80,
            line_numbering: LineNumberingMode::default(),
        };
    }
}

/// A single paragraph's diffed region plus the unchanged context immediately
/// before and after it. Produced per amendment paragraph; consumed read-only
/// by display components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphDiff {
    /// First line of the diffed region in the original's numbering; 0 when
    /// the original carried no markers.
    pub diff_line_from: u32,
    /// First line after the diffed region; 0 when un-numbered.
    pub diff_line_to: u32,
    /// Full rendering: leading context, diffed paragraph, trailing context.
    pub html: String,
    /// Index of the paragraph in the document's paragraph decomposition.
    pub paragraph_no: usize,
    /// The diff-annotated paragraph itself.
    pub text: String,
    /// The unchanged paragraph following the diffed one, empty if none.
    pub text_post: String,
    /// The unchanged paragraph preceding the diffed one, empty if none.
    pub text_pre: String,
}

/// A statute paragraph a motion may amend, as handed in by the fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatuteParagraph {
    /// Unique identifier.
    pub id: u64,
    /// Paragraph text as safe-subset HTML.
    pub text: String,
    /// Display title of the paragraph.
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::{ChangeRecommendation, ChangeSource, LineRange, ModificationType};

    fn recommendation(line_from: u32, line_to: u32) -> ChangeRecommendation {
        ChangeRecommendation {
            id: 1,
            internal: false,
            line_from,
            line_to,
            modification: ModificationType::Replacement,
            motion_id: 7,
            rejected: false,
            text: "<p>new</p>".to_string(),
        }
    }

    #[test]
    fn zero_range_is_title_change() {
        assert!(recommendation(0, 0).is_title_change());
        assert!(!recommendation(1, 2).is_title_change());
    }

    #[test]
    fn title_change_has_no_line_range() {
        let source = ChangeSource::Recommendation(recommendation(0, 0));
        assert!(source.line_range().is_none());
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = LineRange { from: 1, to: 3 };
        let b = LineRange { from: 2, to: 4 };
        let c = LineRange { from: 3, to: 5 };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn modification_type_uses_wire_names() {
        let json = serde_json::to_string(&ModificationType::Replacement).unwrap();
        assert_eq!(json, "\"replacement\"");
    }
}
