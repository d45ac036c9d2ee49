//! Reading-order line reconstruction from unordered OCR tokens.
//!
//! Recognizers return tokens with no guaranteed line grouping, and a fixed
//! pixel tolerance breaks across font sizes and scan resolutions. The band
//! height is therefore derived from the median token height, and the running
//! line centroid absorbs mild skew across a page.

use serde::{Deserialize, Serialize};

use crate::types::{TextLine, Token};

/// Groups spatially unordered tokens into top-to-bottom text lines.
#[derive(Debug, Clone, Copy)]
pub struct LineReconstructor {
    /// Fraction of the median token height two tokens may differ in
    /// vertical center and still share a line.
    pub tolerance_factor: f32,
}

impl Default for LineReconstructor {
    fn default() -> Self {
        Self { tolerance_factor: 0.7 }
    }
}

impl LineReconstructor {
    pub fn new(tolerance_factor: f32) -> Self {
        Self { tolerance_factor }
    }

    /// Reconstruct reading-order lines. Every input token lands in exactly
    /// one output line; zero tokens produce zero lines.
    pub fn reconstruct(&self, tokens: &[Token]) -> Vec<TextLine> {
        struct Placed {
            token: Token,
            min_x: f32,
            min_y: f32,
            center_y: f32,
        }

        struct Cluster {
            members: Vec<Placed>,
            centroid_y: f32,
        }

        if tokens.is_empty() {
            return Vec::new();
        }

        let tolerance = self.tolerance_factor * median_height(tokens);

        let mut placed: Vec<Placed> = tokens
            .iter()
            .map(|t| Placed {
                min_x: t.min_x(),
                min_y: t.min_y(),
                center_y: t.center_y(),
                token: t.clone(),
            })
            .collect();
        placed.sort_by(|a, b| {
            a.min_y
                .total_cmp(&b.min_y)
                .then_with(|| a.min_x.total_cmp(&b.min_x))
        });

        let mut clusters: Vec<Cluster> = Vec::new();
        for p in placed {
            match clusters.last_mut() {
                None => clusters.push(Cluster { centroid_y: p.center_y, members: vec![p] }),
                Some(cluster) => {
                    if (p.center_y - cluster.centroid_y).abs() <= tolerance {
                        let n = cluster.members.len() as f32;
                        cluster.centroid_y = (cluster.centroid_y * n + p.center_y) / (n + 1.0);
                        cluster.members.push(p);
                    } else {
                        clusters.push(Cluster { centroid_y: p.center_y, members: vec![p] });
                    }
                }
            }
        }

        clusters
            .into_iter()
            .map(|mut cluster| {
                cluster.members.sort_by(|a, b| a.min_x.total_cmp(&b.min_x));
                let tokens: Vec<Token> = cluster.members.into_iter().map(|p| p.token).collect();
                let text = tokens
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string();
                let avg_confidence =
                    tokens.iter().map(|t| t.confidence).sum::<f32>() / tokens.len() as f32;
                TextLine { text, avg_confidence, tokens }
            })
            .collect()
    }
}

/// Median of token heights; 10.0 when there are no tokens.
fn median_height(tokens: &[Token]) -> f32 {
    if tokens.is_empty() {
        return 10.0;
    }
    let mut heights: Vec<f32> = tokens.iter().map(Token::height).collect();
    heights.sort_by(f32::total_cmp);
    let mid = heights.len() / 2;
    if heights.len() % 2 == 0 {
        (heights[mid - 1] + heights[mid]) / 2.0
    } else {
        heights[mid]
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
/// Idempotent: normalizing already-normalized text is a no-op.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join reconstructed lines into one normalized paragraph.
pub fn paragraph_from_lines(lines: &[TextLine]) -> String {
    let joined = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join(" ");
    normalize_whitespace(&joined)
}

/// Mean of per-line confidences; 0.0 with no lines.
pub fn average_confidence(lines: &[TextLine]) -> f32 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|l| l.avg_confidence).sum::<f32>() / lines.len() as f32
}

/// The whole document as one normalized string with its overall confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub confidence: f32,
}

impl Paragraph {
    pub fn from_lines(lines: &[TextLine]) -> Self {
        Self {
            text: paragraph_from_lines(lines),
            confidence: average_confidence(lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[TextLine]) -> Vec<String> {
        lines.iter().map(|l| l.text.clone()).collect()
    }

    #[test]
    fn no_tokens_no_lines() {
        let lines = LineReconstructor::default().reconstruct(&[]);
        assert!(lines.is_empty());
    }

    #[test]
    fn orders_within_line_left_to_right() {
        // Same row, tokens supplied right to left.
        let tokens = vec![
            Token::from_rect(120.0, 10.0, 50.0, 12.0, "RECEIPT", 0.9),
            Token::from_rect(0.0, 10.0, 50.0, 12.0, "OFFICIAL", 0.9),
        ];
        let lines = LineReconstructor::default().reconstruct(&tokens);
        assert_eq!(texts(&lines), vec!["OFFICIAL RECEIPT"]);
    }

    #[test]
    fn separates_rows_into_lines() {
        let tokens = vec![
            Token::from_rect(0.0, 60.0, 80.0, 12.0, "TOTAL", 0.9),
            Token::from_rect(0.0, 0.0, 80.0, 12.0, "ACME", 0.9),
            Token::from_rect(90.0, 0.0, 80.0, 12.0, "STORE", 0.9),
            Token::from_rect(0.0, 30.0, 80.0, 12.0, "Manila", 0.9),
            Token::from_rect(90.0, 60.0, 80.0, 12.0, "150.00", 0.9),
        ];
        let lines = LineReconstructor::default().reconstruct(&tokens);
        assert_eq!(texts(&lines), vec!["ACME STORE", "Manila", "TOTAL 150.00"]);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let tokens = vec![
            Token::from_rect(0.0, 0.0, 40.0, 12.0, "a", 0.9),
            Token::from_rect(50.0, 1.0, 40.0, 12.0, "b", 0.9),
            Token::from_rect(0.0, 40.0, 40.0, 12.0, "c", 0.9),
            Token::from_rect(50.0, 41.0, 40.0, 12.0, "d", 0.9),
        ];
        let mut shuffled = tokens.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        let r = LineReconstructor::default();
        assert_eq!(r.reconstruct(&tokens), r.reconstruct(&shuffled));
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        // Heights of 10 give a median of 10; factor 0.5 makes the
        // tolerance an exact 5.0 in float arithmetic.
        let r = LineReconstructor::new(0.5);
        let a = Token::from_rect(0.0, 0.0, 40.0, 10.0, "a", 0.9); // cy 5.0
        let exactly_at = Token::from_rect(50.0, 5.0, 40.0, 10.0, "b", 0.9); // cy 10.0
        let just_past = Token::from_rect(50.0, 5.5, 40.0, 10.0, "b", 0.9); // cy 10.5

        let merged = r.reconstruct(&[a.clone(), exactly_at]);
        assert_eq!(texts(&merged), vec!["a b"]);

        let split = r.reconstruct(&[a, just_past]);
        assert_eq!(texts(&split), vec!["a", "b"]);
    }

    #[test]
    fn centroid_tracks_mild_skew() {
        // Each token drifts 3px down; the running centroid keeps them on
        // one line where anchoring on the first token would split.
        let tokens = vec![
            Token::from_rect(0.0, 0.0, 30.0, 10.0, "a", 0.9),
            Token::from_rect(40.0, 3.0, 30.0, 10.0, "b", 0.9),
            Token::from_rect(80.0, 6.0, 30.0, 10.0, "c", 0.9),
            Token::from_rect(120.0, 9.0, 30.0, 10.0, "d", 0.9),
        ];
        let lines = LineReconstructor::default().reconstruct(&tokens);
        assert_eq!(texts(&lines), vec!["a b c d"]);
    }

    #[test]
    fn line_confidence_is_token_mean() {
        let tokens = vec![
            Token::from_rect(0.0, 0.0, 40.0, 10.0, "a", 0.75),
            Token::from_rect(50.0, 0.0, 40.0, 10.0, "b", 0.25),
            Token::from_rect(0.0, 40.0, 40.0, 10.0, "c", 1.0),
        ];
        let lines = LineReconstructor::default().reconstruct(&tokens);
        assert_eq!(lines[0].avg_confidence, 0.5);
        assert_eq!(lines[1].avg_confidence, 1.0);
        // Overall confidence averages lines, not tokens.
        assert_eq!(average_confidence(&lines), 0.75);
    }

    #[test]
    fn average_confidence_empty_is_zero() {
        assert_eq!(average_confidence(&[]), 0.0);
    }

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn normalize_whitespace_is_idempotent() {
        let raw = "  TOTAL \t 1,234.56 \n due ";
        let once = normalize_whitespace(raw);
        assert_eq!(normalize_whitespace(&once), once);
    }

    #[test]
    fn paragraph_joins_lines_with_single_spaces() {
        let lines = LineReconstructor::default().reconstruct(&[
            Token::from_rect(0.0, 0.0, 40.0, 12.0, "ACME", 0.9),
            Token::from_rect(0.0, 40.0, 40.0, 12.0, "Manila", 0.9),
        ]);
        assert_eq!(paragraph_from_lines(&lines), "ACME Manila");
        assert_eq!(paragraph_from_lines(&[]), "");
    }

    #[test]
    fn paragraph_carries_text_and_mean_confidence() {
        let lines = LineReconstructor::default().reconstruct(&[
            Token::from_rect(0.0, 0.0, 40.0, 12.0, "ACME", 1.0),
            Token::from_rect(0.0, 40.0, 40.0, 12.0, "Manila", 0.5),
        ]);
        let p = Paragraph::from_lines(&lines);
        assert_eq!(p.text, "ACME Manila");
        assert_eq!(p.confidence, 0.75);

        let empty = Paragraph::from_lines(&[]);
        assert_eq!(empty.text, "");
        assert_eq!(empty.confidence, 0.0);
    }
}
