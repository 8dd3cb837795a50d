//! Applies a motion's change set to its base text — one rendering per
//! [`ChangeRecoMode`].
//!
//! A merge pass selects the applicable changes, sorts them by line range,
//! rejects overlaps, and splices every range in a single pass over the
//! numbered base. All ranges address the original base's numbering; nothing
//! is re-numbered between splices. Inputs are never mutated.

use crate::diff;
use crate::error::Error;
use crate::linenumbering;
use crate::types::{
    ChangeRecoMode, ChangeSource, LineNumberingMode, ModificationType, MotionRenderConfig,
};

/// The base text a merge pass starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseInput {
    /// Already numbered — an amendment overlay carrying the lead motion's
    /// coordinates, which must not be re-numbered.
    Numbered(String),
    /// Plain motion text, numbered at the configured line length first.
    Plain(String),
}

impl BaseInput {
    /// The underlying HTML.
    pub fn as_str(&self) -> &str {
        return match self {
            BaseInput::Numbered(text) | BaseInput::Plain(text) => text,
        };
    }
}

/// Produce the body rendering for one mode.
///
/// | Mode | Change set | Output |
/// |---|---|---|
/// | `Original` | none | numbered base |
/// | `Changed` | non-rejected recommendations | ranges spliced, re-numbered |
/// | `Diff` | recommendations + non-rejected amendments | inline `<ins>`/`<del>`, re-numbered |
/// | `Final` | non-rejected recommendations | spliced, markers stripped |
/// | `ModifiedFinal` | — | `modified_final` when present, else `Final` |
///
/// # Errors
///
/// Returns `Error::ConflictingChanges` when two applicable changes overlap,
/// `Error::InvalidRange` when a change's range cannot be resolved, and
/// `Error::MalformedHtml` for unparseable input.
pub fn render_body(
    base: &BaseInput,
    changes: &[ChangeSource],
    modified_final: Option<&str>,
    config: &MotionRenderConfig,
) -> Result<String, Error> {
    tracing::debug!(
        mode = ?config.change_reco_mode,
        line_length = config.line_length,
        changes = changes.len(),
        "rendering motion body"
    );
    match config.change_reco_mode {
        ChangeRecoMode::Changed => {
            let numbered = numbered_base(base, config.line_length)?;
            let applied = apply_changes(&numbered, changes)?;
            for_display(&applied, config)
        },
        ChangeRecoMode::Diff => {
            let numbered = numbered_base(base, config.line_length)?;
            let annotated = annotate_changes(&numbered, changes)?;
            for_display(&annotated, config)
        },
        ChangeRecoMode::Final => {
            let numbered = numbered_base(base, config.line_length)?;
            apply_changes(&numbered, changes)
        },
        ChangeRecoMode::ModifiedFinal => match modified_final {
            Some(text) => linenumbering::strip_line_numbers(text),
            None => {
                let numbered = numbered_base(base, config.line_length)?;
                apply_changes(&numbered, changes)
            },
        },
        ChangeRecoMode::Original => match base {
            BaseInput::Numbered(text) => match config.line_numbering {
                LineNumberingMode::None => linenumbering::strip_line_numbers(text),
                LineNumberingMode::Inside | LineNumberingMode::Outside => Ok(text.clone()),
            },
            BaseInput::Plain(text) => for_display(text, config),
        },
    }
}

/// Produce the title rendering for one mode. A title change has no line-range
/// semantics and merges by plain substitution, independent of body merging;
/// at most one title change is meaningful per motion, so the first
/// non-rejected one in the set wins.
pub fn render_title(title: &str, changes: &[ChangeSource], mode: ChangeRecoMode) -> String {
    let Some(change) = changes
        .iter()
        .find(|c| c.is_title_change() && !c.rejected())
    else {
        return title.to_string();
    };
    return match mode {
        ChangeRecoMode::Original => title.to_string(),
        ChangeRecoMode::Diff => format!("<del>{title}</del><ins>{}</ins>", change.text()),
        ChangeRecoMode::Changed | ChangeRecoMode::Final | ChangeRecoMode::ModifiedFinal => {
            change.text().to_string()
        },
    };
}

/// Splice every applicable change over the numbered base, per its
/// modification type. The result carries no markers.
fn apply_changes(numbered: &str, changes: &[ChangeSource]) -> Result<String, Error> {
    let selected = select_sorted(changes, ChangeSource::show_in_final_view);
    ensure_disjoint(&selected)?;

    let mut replacements = Vec::with_capacity(selected.len());
    for change in &selected {
        let Some(range) = change.line_range() else {
            continue;
        };
        let fragment = match change.modification() {
            ModificationType::Deletion => String::new(),
            ModificationType::Insertion => {
                let extracted = diff::extract_range_by_line_numbers(numbered, range)?;
                format!("{}{}", change.text(), extracted.html)
            },
            ModificationType::Replacement => change.text().to_string(),
        };
        replacements.push((range, fragment));
    }
    return diff::splice_ranges(numbered, &replacements);
}

/// Annotate every applicable change in place with `<ins>`/`<del>` instead of
/// replacing it. The result carries no markers.
fn annotate_changes(numbered: &str, changes: &[ChangeSource]) -> Result<String, Error> {
    let selected = select_sorted(changes, ChangeSource::show_in_diff_view);
    ensure_disjoint(&selected)?;

    let mut replacements = Vec::with_capacity(selected.len());
    for change in &selected {
        let Some(range) = change.line_range() else {
            continue;
        };
        let extracted = diff::extract_range_by_line_numbers(numbered, range)?;
        let fragment = match change.modification() {
            ModificationType::Deletion => format!("<del>{}</del>", extracted.html),
            ModificationType::Insertion => {
                format!("<ins>{}</ins>{}", change.text(), extracted.html)
            },
            ModificationType::Replacement => {
                format!("<del>{}</del><ins>{}</ins>", extracted.html, change.text())
            },
        };
        replacements.push((range, fragment));
    }
    return diff::splice_ranges(numbered, &replacements);
}

/// Body changes passing the mode's visibility filter, sorted by
/// `(line_from, line_to)`.
fn select_sorted<'a>(
    changes: &'a [ChangeSource],
    visible: impl Fn(&ChangeSource) -> bool,
) -> Vec<&'a ChangeSource> {
    let mut selected: Vec<&ChangeSource> = changes
        .iter()
        .filter(|c| !c.is_title_change() && visible(c))
        .collect();
    selected.sort_by_key(|c| c.line_range().map(|r| (r.from, r.to)));
    selected
}

/// Reject overlapping ranges. The set is sorted, so checking neighbours is
/// enough.
fn ensure_disjoint(selected: &[&ChangeSource]) -> Result<(), Error> {
    for pair in selected.windows(2) {
        let (Some(first_range), Some(second_range)) = (pair[0].line_range(), pair[1].line_range())
        else {
            continue;
        };
        if first_range.overlaps(&second_range) {
            return Err(Error::ConflictingChanges {
                first_id: pair[0].id(),
                first_range,
                second_id: pair[1].id(),
                second_range,
            });
        }
    }
    return Ok(());
}

fn numbered_base(base: &BaseInput, line_length: usize) -> Result<String, Error> {
    return match base {
        BaseInput::Numbered(text) => Ok(text.clone()),
        BaseInput::Plain(text) => linenumbering::insert_line_numbers(text, line_length, None),
    };
}

fn for_display(html_text: &str, config: &MotionRenderConfig) -> Result<String, Error> {
    return match config.line_numbering {
        LineNumberingMode::None => Ok(html_text.to_string()),
        LineNumberingMode::Inside | LineNumberingMode::Outside => {
            linenumbering::insert_line_numbers(
                html_text,
                config.line_length,
                config.highlight_line,
            )
        },
    };
}
