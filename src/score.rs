//! Lexical response-quality heuristic
//!
//! Scores an analysis transcript from length bands and keyword hits. This is
//! a crude lexical proxy with no semantic grounding; the exact weights and
//! thresholds are load-bearing for compatibility with existing score
//! consumers. Do not extend this signal without redesigning it.

/// Keywords whose presence nudges the score upward
const QUALITY_INDICATORS: [&str; 15] = [
    "specific",
    "detailed",
    "comprehensive",
    "rigorous",
    "methodology",
    "evidence",
    "analysis",
    "recommendation",
    "improvement",
    "strength",
    "weakness",
    "observation",
    "conclusion",
    "framework",
    "approach",
];

/// Score an analysis transcript into `[0, 1]`
///
/// Pure function of the text: base 0.3, up to +0.3 for word counts inside
/// the open intervals (100, 2000) and (300, 1500), up to +0.3 proportional
/// to the fraction of [`QUALITY_INDICATORS`] found (case-insensitive), and
/// -0.3 (floored at zero) when the text mentions "error" or "failed".
pub fn score_analysis(analysis: &str) -> f64 {
    let mut score = 0.3;

    // Length bands use open intervals: exactly 100 or 2000 words earns nothing.
    let word_count = analysis.split_whitespace().count();
    if word_count > 100 && word_count < 2000 {
        score += 0.2;
    }
    if word_count > 300 && word_count < 1500 {
        score += 0.1;
    }

    let lowered = analysis.to_lowercase();
    let found = QUALITY_INDICATORS
        .iter()
        .filter(|indicator| lowered.contains(**indicator))
        .count();
    score += (found as f64 / QUALITY_INDICATORS.len() as f64) * 0.3;

    if lowered.contains("error") || lowered.contains("failed") {
        score = (score - 0.3).max(0.0);
    }

    score.clamp(0.0, 1.0)
}
