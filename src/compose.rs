//! Article filtering & text composition.
//!
//! Decides which articles carry enough signal to score and turns each
//! survivor into a single classifier input string.

use crate::news::ArticleRecord;

/// Substituted for a single missing title/description before composition.
/// A real phrase, not an empty string: FinBERT maps it to a polarity of ~0,
/// so it does not tilt the score of an article that still has one field.
pub const NEUTRAL_FILLER: &str = "confident.";

fn is_blank(field: Option<&str>) -> bool {
    field.map(str::trim).unwrap_or("").is_empty()
}

/// Filter and compose classifier inputs, preserving source order.
///
/// Articles with both title and description absent or empty are dropped
/// entirely; a record with no text must not be fabricated into a neutral
/// entry. If exactly one field is missing it is replaced by
/// [`NEUTRAL_FILLER`], then the survivor is composed as
/// `"{description} {title}"`.
pub fn prepare_texts(articles: &[ArticleRecord]) -> Vec<String> {
    let mut out = Vec::with_capacity(articles.len());

    for article in articles {
        let title_blank = is_blank(article.title.as_deref());
        let desc_blank = is_blank(article.description.as_deref());

        if title_blank && desc_blank {
            continue;
        }

        let description = if desc_blank {
            NEUTRAL_FILLER
        } else {
            article.description.as_deref().unwrap_or(NEUTRAL_FILLER)
        };
        let title = if title_blank {
            NEUTRAL_FILLER
        } else {
            article.title.as_deref().unwrap_or(NEUTRAL_FILLER)
        };

        out.push(format!("{description} {title}"));
    }

    out
}
