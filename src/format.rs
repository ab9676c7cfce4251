//! Rendering ranked passages for the answer agent

use crate::pipeline::SearchOutcome;
use crate::rerank::RankedPassage;

/// Default excerpt length handed to the answer agent
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

/// Render an outcome as provenance-annotated text
///
/// The empty outcome gets a distinct marker so the consuming agent can
/// tell "searched and found nothing" apart from missing context.
pub fn render_outcome(outcome: &SearchOutcome, max_chars: usize) -> String {
    match outcome {
        SearchOutcome::Found { passages, .. } => render_passages(passages, max_chars),
        SearchOutcome::NoMatches { .. } => "No matching passages were found.".to_string(),
    }
}

/// Render passages as numbered, truncated excerpts with provenance
pub fn render_passages(passages: &[RankedPassage], max_chars: usize) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            format!(
                "[{}] {}\n   source: {}, score: {:.3}, query: '{}'",
                i + 1,
                truncate_chars(&passage.candidate.text, max_chars),
                passage.candidate.source_tag,
                passage.score,
                passage.origin_query,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Truncate on a character boundary; corpus text is frequently multibyte
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Candidate;

    fn passage(text: &str, score: f32) -> RankedPassage {
        RankedPassage {
            candidate: Candidate {
                id: "c1".to_string(),
                text: text.to_string(),
                raw_score: score,
                source_tag: "incoterms".to_string(),
                origin_query: "delivery terms".to_string(),
            },
            score,
            origin_query: "delivery terms".to_string(),
        }
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let korean = "무역".repeat(300);
        let truncated = truncate_chars(&korean, 500);
        assert_eq!(truncated.chars().count(), 500);
    }

    #[test]
    fn test_render_includes_provenance() {
        let rendered = render_passages(&[passage("FOB shifts risk at loading", 0.912)], 500);

        assert!(rendered.starts_with("[1] FOB shifts risk at loading"));
        assert!(rendered.contains("source: incoterms"));
        assert!(rendered.contains("score: 0.912"));
        assert!(rendered.contains("query: 'delivery terms'"));
    }

    #[test]
    fn test_render_numbers_sequentially() {
        let rendered = render_passages(&[passage("a", 0.9), passage("b", 0.8)], 500);
        assert!(rendered.contains("[1] a"));
        assert!(rendered.contains("[2] b"));
    }

    #[test]
    fn test_render_truncates_excerpts() {
        let long = "x".repeat(600);
        let rendered = render_passages(&[passage(&long, 0.5)], 500);
        let first_line = rendered.lines().next().unwrap();
        // "[1] " prefix plus exactly 500 characters of excerpt
        assert_eq!(first_line.chars().count(), 4 + 500);
    }
}
