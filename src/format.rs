//! Motion formatting façade: selects the correct source text for a motion,
//! applies the change merger, and re-applies line numbering for display.
//!
//! Errors from the lower layers are propagated, never swallowed — the caller
//! decides whether to surface a dialog and abort instead of saving corrupt
//! state.

use crate::diff;
use crate::error::Error;
use crate::html;
use crate::linenumbering;
use crate::merger::{self, BaseInput};
use crate::types::{
    AmendmentParagraphs, ChangeSource, Motion, MotionRenderConfig, ParagraphDiff,
    StatuteParagraph,
};

/// The rendering produced for one motion: body HTML plus the (possibly
/// change-substituted) title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMotion {
    /// Body HTML for the requested mode.
    pub html: String,
    /// Title for the requested mode.
    pub title: String,
}

/// Produce the single rendering for a motion: base-text selection, change
/// merging, and display numbering in one call.
///
/// `lead` must be supplied for a paragraph-based amendment, `statute` for a
/// statute amendment; both are plain data fetched by the caller.
///
/// # Errors
///
/// Propagates `Error::ConflictingChanges`, `Error::InvalidRange`, and
/// `Error::MalformedHtml` from the lower layers, and returns
/// `Error::InvalidMotion` when the motion's own records are inconsistent.
pub fn format_motion(
    motion: &Motion,
    lead: Option<&Motion>,
    statute: Option<&StatuteParagraph>,
    changes: &[ChangeSource],
    config: &MotionRenderConfig,
) -> Result<RenderedMotion, Error> {
    tracing::debug!(
        motion_id = motion.id,
        mode = ?config.change_reco_mode,
        "formatting motion"
    );
    let base = base_text(motion, lead, statute, config.line_length)?;
    let html = merger::render_body(
        &base,
        changes,
        motion.modified_final_version.as_deref(),
        config,
    )?;
    let title = merger::render_title(&motion.title, changes, config.change_reco_mode);
    Ok(RenderedMotion { html, title })
}

/// Select and reconstruct the base text the merger starts from.
///
/// Plain motion: its own text. Paragraph-based amendment: the lead motion's
/// text with the amendment's paragraphs overlaid, already numbered in the
/// lead's coordinates. Statute amendment: the referenced statute paragraph's
/// text.
///
/// # Errors
///
/// Returns `Error::InvalidMotion` when a declared lead/statute reference has
/// no record supplied or the amendment map is empty, `Error::MalformedHtml`
/// for unparseable text.
pub fn base_text(
    motion: &Motion,
    lead: Option<&Motion>,
    statute: Option<&StatuteParagraph>,
    line_length: usize,
) -> Result<BaseInput, Error> {
    if let Some(paragraphs) = &motion.amendment_paragraphs {
        let Some(lead) = lead else {
            return Err(Error::InvalidMotion {
                motion_id: motion.id,
                reason: "paragraph-based amendment without its lead motion".to_string(),
            });
        };
        let overlay = amendment_base_text(motion, paragraphs, lead, line_length)?;
        return Ok(BaseInput::Numbered(overlay));
    }
    if motion.statute_paragraph_id.is_some() {
        let Some(statute) = statute else {
            return Err(Error::InvalidMotion {
                motion_id: motion.id,
                reason: "statute amendment without its statute paragraph".to_string(),
            });
        };
        return Ok(BaseInput::Plain(statute.text.clone()));
    }
    return Ok(BaseInput::Plain(motion.text.clone()));
}

/// One diff per amendment paragraph, each keeping the lead motion's line
/// coordinates — the view the recommendation-creation dialog selects a range
/// in. `collapse_context` drops the neighbouring context paragraphs.
///
/// # Errors
///
/// Returns `Error::InvalidMotion` for a motion that is not a paragraph-based
/// amendment, has an empty map, or overrides a paragraph the lead does not
/// have; `Error::MalformedHtml` for unparseable text.
pub fn all_amendment_paragraphs_with_original_line_numbers(
    amendment: &Motion,
    lead: &Motion,
    line_length: usize,
    collapse_context: bool,
) -> Result<Vec<ParagraphDiff>, Error> {
    let Some(paragraphs) = &amendment.amendment_paragraphs else {
        return Err(Error::InvalidMotion {
            motion_id: amendment.id,
            reason: "not a paragraph-based amendment".to_string(),
        });
    };
    if paragraphs.is_empty() {
        return Err(Error::InvalidMotion {
            motion_id: amendment.id,
            reason: "paragraph-based amendment with no paragraph entries".to_string(),
        });
    }

    let numbered_lead = linenumbering::insert_line_numbers(&lead.text, line_length, None)?;
    let lead_paragraphs = html::split_paragraphs(&numbered_lead)?;
    let mut diffs = Vec::new();

    for (&paragraph_no, replacement) in paragraphs {
        let Some(original) = lead_paragraphs.get(paragraph_no) else {
            return Err(Error::InvalidMotion {
                motion_id: amendment.id,
                reason: format!(
                    "amendment paragraph {paragraph_no} does not exist in the lead motion"
                ),
            });
        };
        let old_plain = linenumbering::strip_line_numbers(original)?;
        let new_plain = linenumbering::strip_line_numbers(replacement)?;
        let text = if old_plain == new_plain {
            old_plain.clone()
        } else {
            diff::diff_fragment(&old_plain, &new_plain)
        };
        let (diff_line_from, diff_line_to) = match linenumbering::marker_span(original)? {
            Some((first, last)) => (first, last.saturating_add(1)),
            None => (0, 0),
        };
        let (text_pre, text_post) = if collapse_context {
            (String::new(), String::new())
        } else {
            (
                paragraph_no
                    .checked_sub(1)
                    .and_then(|p| lead_paragraphs.get(p))
                    .cloned()
                    .unwrap_or_default(),
                lead_paragraphs
                    .get(paragraph_no + 1)
                    .cloned()
                    .unwrap_or_default(),
            )
        };
        diffs.push(ParagraphDiff {
            diff_line_from,
            diff_line_to,
            html: format!("{text_pre}{text}{text_post}"),
            paragraph_no,
            text,
            text_post,
            text_pre,
        });
    }
    Ok(diffs)
}

/// Rebuild a paragraph-based amendment's full text on top of its lead
/// motion. The lead is numbered first and split into paragraphs; overridden
/// paragraphs are replaced by the amendment's text re-numbered from the
/// original paragraph's first line; every other paragraph passes through
/// byte-identical, original markers included — change recommendations
/// against the lead still resolve in the amendment's context.
fn amendment_base_text(
    motion: &Motion,
    paragraphs: &AmendmentParagraphs,
    lead: &Motion,
    line_length: usize,
) -> Result<String, Error> {
    if paragraphs.is_empty() {
        return Err(Error::InvalidMotion {
            motion_id: motion.id,
            reason: "paragraph-based amendment with no paragraph entries".to_string(),
        });
    }

    let numbered_lead = linenumbering::insert_line_numbers(&lead.text, line_length, None)?;
    let mut lead_paragraphs = html::split_paragraphs(&numbered_lead)?;

    for (&paragraph_no, replacement) in paragraphs {
        let Some(original) = lead_paragraphs.get(paragraph_no) else {
            return Err(Error::InvalidMotion {
                motion_id: motion.id,
                reason: format!(
                    "amendment paragraph {paragraph_no} does not exist in the lead motion"
                ),
            });
        };
        let first_line = match linenumbering::marker_span(original)? {
            Some((first, _)) => first,
            None => 1,
        };
        lead_paragraphs[paragraph_no] =
            linenumbering::insert_line_numbers_from(replacement, line_length, first_line, None)?;
    }
    return Ok(lead_paragraphs.concat());
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        all_amendment_paragraphs_with_original_line_numbers, base_text, format_motion,
    };
    use crate::error::Error;
    use crate::html::split_paragraphs;
    use crate::linenumbering::insert_line_numbers;
    use crate::merger::BaseInput;
    use crate::types::{
        ChangeRecoMode, ChangeRecommendation, ChangeSource, LineNumberingMode, ModificationType,
        Motion, MotionRenderConfig, StatuteParagraph,
    };

    const LEAD_TEXT: &str =
        "<p>first paragraph</p><p>second paragraph</p><p>third paragraph</p>";

    fn plain_motion(id: u64, text: &str) -> Motion {
        Motion {
            amendment_paragraphs: None,
            id,
            lead_motion_id: None,
            modified_final_version: None,
            statute_paragraph_id: None,
            text: text.to_string(),
            title: "A motion".to_string(),
        }
    }

    fn amendment_of(lead: &Motion, paragraphs: BTreeMap<usize, String>) -> Motion {
        Motion {
            amendment_paragraphs: Some(paragraphs),
            id: lead.id + 1,
            lead_motion_id: Some(lead.id),
            modified_final_version: None,
            statute_paragraph_id: None,
            text: String::new(),
            title: "An amendment".to_string(),
        }
    }

    fn config(mode: ChangeRecoMode) -> MotionRenderConfig {
        MotionRenderConfig {
            change_reco_mode: mode,
            highlight_line: None,
            line_length: 80,
            line_numbering: LineNumberingMode::None,
        }
    }

    #[test]
    fn plain_motion_uses_its_own_text() {
        let motion = plain_motion(1, "<p>own text</p>");
        let base = base_text(&motion, None, None, 80).unwrap();
        assert_eq!(base, BaseInput::Plain("<p>own text</p>".to_string()));
    }

    #[test]
    fn amendment_overlay_keeps_untouched_paragraphs_bit_identical() {
        let lead = plain_motion(1, LEAD_TEXT);
        let overrides =
            BTreeMap::from([(1usize, "<p>second paragraph, amended</p>".to_string())]);
        let amendment = amendment_of(&lead, overrides);

        let base = base_text(&amendment, Some(&lead), None, 80).unwrap();
        let BaseInput::Numbered(overlay) = base else {
            panic!("amendment base must carry the lead's numbering");
        };

        let numbered_lead = insert_line_numbers(LEAD_TEXT, 80, None).unwrap();
        let lead_paragraphs = split_paragraphs(&numbered_lead).unwrap();
        let overlay_paragraphs = split_paragraphs(&overlay).unwrap();

        assert_eq!(overlay_paragraphs.len(), 3);
        assert_eq!(overlay_paragraphs[0], lead_paragraphs[0]);
        assert_eq!(overlay_paragraphs[2], lead_paragraphs[2]);
        // The replaced paragraph keeps the lead's coordinate for its line.
        assert!(overlay_paragraphs[1].contains("data-line-number=\"2\""));
        assert!(overlay_paragraphs[1].contains("second paragraph, amended"));
    }

    #[test]
    fn recommendations_against_the_lead_resolve_in_amendment_context() {
        let lead = plain_motion(1, LEAD_TEXT);
        let overrides =
            BTreeMap::from([(1usize, "<p>second paragraph, amended</p>".to_string())]);
        let amendment = amendment_of(&lead, overrides);
        // Addresses line 3 of the lead — the untouched third paragraph.
        let changes = vec![ChangeSource::Recommendation(ChangeRecommendation {
            id: 4,
            internal: false,
            line_from: 3,
            line_to: 4,
            modification: ModificationType::Replacement,
            motion_id: 1,
            rejected: false,
            text: "<p>third paragraph, recommended</p>".to_string(),
        })];

        let rendered = format_motion(
            &amendment,
            Some(&lead),
            None,
            &changes,
            &config(ChangeRecoMode::Changed),
        )
        .unwrap();
        assert!(rendered.html.contains("second paragraph, amended"));
        assert!(rendered.html.contains("third paragraph, recommended"));
        assert!(!rendered.html.contains("<p>third paragraph</p>"));
    }

    #[test]
    fn amendment_without_lead_is_invalid() {
        let lead = plain_motion(1, LEAD_TEXT);
        let amendment = amendment_of(
            &lead,
            BTreeMap::from([(0usize, "<p>changed</p>".to_string())]),
        );
        let result = base_text(&amendment, None, None, 80);
        assert!(matches!(result, Err(Error::InvalidMotion { .. })));
    }

    #[test]
    fn amendment_with_no_entries_is_invalid() {
        let lead = plain_motion(1, LEAD_TEXT);
        let amendment = amendment_of(&lead, BTreeMap::new());
        let result = base_text(&amendment, Some(&lead), None, 80);
        assert!(matches!(result, Err(Error::InvalidMotion { .. })));
    }

    #[test]
    fn amendment_overriding_a_missing_paragraph_is_invalid() {
        let lead = plain_motion(1, LEAD_TEXT);
        let amendment = amendment_of(
            &lead,
            BTreeMap::from([(9usize, "<p>nowhere</p>".to_string())]),
        );
        let result = base_text(&amendment, Some(&lead), None, 80);
        assert!(matches!(result, Err(Error::InvalidMotion { .. })));
    }

    #[test]
    fn statute_amendment_uses_the_statute_paragraph() {
        let mut motion = plain_motion(2, "<p>unused</p>");
        motion.statute_paragraph_id = Some(11);
        let statute = StatuteParagraph {
            id: 11,
            text: "<p>statute text</p>".to_string(),
            title: "§ 11".to_string(),
        };
        let base = base_text(&motion, None, Some(&statute), 80).unwrap();
        assert_eq!(base, BaseInput::Plain("<p>statute text</p>".to_string()));

        motion.statute_paragraph_id = Some(12);
        let result = base_text(&motion, None, None, 80);
        assert!(matches!(result, Err(Error::InvalidMotion { .. })));
    }

    #[test]
    fn title_change_diffs_in_diff_mode_and_leaves_body_alone() {
        let motion = plain_motion(1, "<p>body text</p>");
        let changes = vec![ChangeSource::Recommendation(ChangeRecommendation {
            id: 8,
            internal: false,
            line_from: 0,
            line_to: 0,
            modification: ModificationType::Replacement,
            motion_id: 1,
            rejected: false,
            text: "New Title".to_string(),
        })];
        let rendered = format_motion(
            &motion,
            None,
            None,
            &changes,
            &config(ChangeRecoMode::Diff),
        )
        .unwrap();
        assert_eq!(rendered.title, "<del>A motion</del><ins>New Title</ins>");
        assert_eq!(rendered.html, "<p>body text</p>");
    }

    #[test]
    fn amendment_paragraph_diffs_keep_lead_coordinates() {
        let lead = plain_motion(1, LEAD_TEXT);
        let overrides =
            BTreeMap::from([(1usize, "<p>second paragraph, amended</p>".to_string())]);
        let amendment = amendment_of(&lead, overrides);

        let diffs =
            all_amendment_paragraphs_with_original_line_numbers(&amendment, &lead, 80, false)
                .unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0];
        assert_eq!(diff.paragraph_no, 1);
        assert_eq!(diff.diff_line_from, 2);
        assert_eq!(diff.diff_line_to, 3);
        assert!(diff.text.contains("<ins>"));
        assert!(diff.text_pre.contains("first paragraph"));
        assert!(diff.text_post.contains("third paragraph"));

        let collapsed =
            all_amendment_paragraphs_with_original_line_numbers(&amendment, &lead, 80, true)
                .unwrap();
        assert!(collapsed[0].text_pre.is_empty());
        assert!(collapsed[0].text_post.is_empty());
    }
}
