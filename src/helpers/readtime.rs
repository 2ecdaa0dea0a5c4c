//! Estimated reading time

use crate::content::Section;

/// Average reading speed used for the estimate
const WORDS_PER_MINUTE: usize = 200;

/// Estimate the reading time of a post body in whole minutes
///
/// Every section contributes its heading plus the plain-text extraction
/// of its body blocks; markup never counts as words. The word count is
/// divided by 200 words/minute and rounded up, so a post with no content
/// reports zero minutes.
pub fn estimate_minutes(sections: &[Section]) -> usize {
    let text = sections
        .iter()
        .map(|s| s.plain_text())
        .collect::<Vec<_>>()
        .join(" ");

    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE)
}
