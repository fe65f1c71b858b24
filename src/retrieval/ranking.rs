//! Ranking and filtering of raw similarity matches
//!
//! A pure pipeline that turns a noisy ranked list into a bounded,
//! deduplicated, character-budgeted evidence list. Stage order matters:
//! threshold first so later stages never spend budget on noise, dedupe
//! before sorting so one page cannot dominate, count and character
//! limits last so the bounds hold whatever the earlier stages pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Citation-relevant location of a match within the knowledge base.
///
/// Defaults (`"unknown"`, page -1) are applied at the vector-store
/// boundary so a malformed payload can never abort the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub source: String,
    pub page: i64,
}

/// A raw similarity match returned by the vector store.
///
/// `score` is an opaque comparable value; higher is better, and no
/// particular range is assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub text: String,
    pub score: f32,
    pub metadata: MatchMetadata,
}

/// A match that survived ranking, with its text possibly truncated
pub type Evidence = Match;

/// Prefix of `s` holding at most `max_chars` characters, never split
/// inside a code point
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Drop every match scoring below `min_score`
pub fn filter_by_threshold(matches: Vec<Match>, min_score: f32) -> Vec<Match> {
    matches.into_iter().filter(|m| m.score >= min_score).collect()
}

/// Keep only the best-scoring match per (source, page).
///
/// First-seen order is preserved and exact score ties keep the earlier
/// match, so the result is deterministic for identical input.
pub fn dedupe_by_location(matches: Vec<Match>) -> Vec<Match> {
    let mut best: Vec<Match> = Vec::new();
    let mut index: HashMap<(String, i64), usize> = HashMap::new();

    for m in matches {
        let key = (m.metadata.source.clone(), m.metadata.page);
        match index.get(&key) {
            Some(&i) => {
                if m.score > best[i].score {
                    best[i] = m;
                }
            }
            None => {
                index.insert(key, best.len());
                best.push(m);
            }
        }
    }

    best
}

/// Accumulate matches until the total character budget is reached.
///
/// Each text is trimmed and capped to `per_chunk_char_cap` characters;
/// the first entry that would push the running total past
/// `max_context_chars` is dropped entirely and iteration stops.
pub fn trim_to_char_budget(
    matches: Vec<Match>,
    max_context_chars: usize,
    per_chunk_char_cap: usize,
) -> Vec<Match> {
    let mut trimmed = Vec::new();
    let mut total = 0;

    for mut m in matches {
        let text = m.text.trim();
        if text.is_empty() {
            continue;
        }

        let capped = truncate_chars(text, per_chunk_char_cap);
        let len = capped.chars().count();
        if total + len > max_context_chars {
            break;
        }

        m.text = capped.to_string();
        total += len;
        trimmed.push(m);
    }

    trimmed
}

/// Full ranking/filtering pipeline:
/// 1) score threshold
/// 2) dedupe by (source, page)
/// 3) stable sort by score descending
/// 4) limit count
/// 5) trim by total character budget
pub fn rank_and_filter(
    raw_matches: Vec<Match>,
    min_score: f32,
    final_top_k: usize,
    max_context_chars: usize,
    per_chunk_char_cap: usize,
) -> Vec<Evidence> {
    let filtered = filter_by_threshold(raw_matches, min_score);
    let mut deduped = dedupe_by_location(filtered);

    deduped.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    deduped.truncate(final_top_k);

    trim_to_char_budget(deduped, max_context_chars, per_chunk_char_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(source: &str, page: i64, score: f32, text: &str) -> Match {
        Match {
            text: text.to_string(),
            score,
            metadata: MatchMetadata {
                source: source.to_string(),
                page,
            },
        }
    }

    #[test]
    fn test_threshold_drops_weak_matches() {
        let matches = vec![
            make_match("a.txt", 1, 0.9, "strong"),
            make_match("b.txt", 1, 0.4, "weak"),
            make_match("c.txt", 1, 0.5, "borderline"),
        ];

        let kept = filter_by_threshold(matches, 0.5);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|m| m.score >= 0.5));
    }

    #[test]
    fn test_dedupe_keeps_best_per_location() {
        let matches = vec![
            make_match("a.txt", 3, 0.6, "weaker"),
            make_match("a.txt", 3, 0.9, "stronger"),
            make_match("a.txt", 4, 0.5, "other page"),
        ];

        let deduped = dedupe_by_location(matches);
        assert_eq!(deduped.len(), 2);

        let page3 = deduped.iter().find(|m| m.metadata.page == 3).unwrap();
        assert_eq!(page3.score, 0.9);
        assert_eq!(page3.text, "stronger");
    }

    #[test]
    fn test_dedupe_first_seen_wins_on_exact_tie() {
        let matches = vec![
            make_match("a.txt", 1, 0.8, "first"),
            make_match("a.txt", 1, 0.8, "second"),
        ];

        let deduped = dedupe_by_location(matches);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].text, "first");
    }

    #[test]
    fn test_rank_and_filter_bounds_count() {
        let matches: Vec<Match> = (0..20)
            .map(|i| make_match(&format!("doc{}.txt", i), 1, 0.9 - i as f32 * 0.01, "text"))
            .collect();

        let evidence = rank_and_filter(matches, 0.0, 6, 100_000, 1000);
        assert_eq!(evidence.len(), 6);
    }

    #[test]
    fn test_rank_and_filter_bounds_total_chars() {
        let matches: Vec<Match> = (0..10)
            .map(|i| make_match(&format!("doc{}.txt", i), 1, 0.9, &"x".repeat(400)))
            .collect();

        let evidence = rank_and_filter(matches, 0.0, 10, 1000, 900);
        let total: usize = evidence.iter().map(|e| e.text.chars().count()).sum();
        assert!(total <= 1000);
        assert_eq!(evidence.len(), 2);
    }

    #[test]
    fn test_char_budget_drops_overflowing_entry_entirely() {
        let matches = vec![
            make_match("a.txt", 1, 0.9, &"a".repeat(600)),
            make_match("b.txt", 1, 0.8, &"b".repeat(600)),
            make_match("c.txt", 1, 0.7, &"c".repeat(100)),
        ];

        // Second entry overflows the budget; nothing after it is considered
        let evidence = trim_to_char_budget(matches, 1000, 900);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].metadata.source, "a.txt");
    }

    #[test]
    fn test_per_chunk_cap_is_prefix_truncation() {
        let long_text = format!("  {}  ", "y".repeat(5000));
        let matches = vec![make_match("a.txt", 1, 0.9, &long_text)];

        let evidence = rank_and_filter(matches, 0.5, 6, 4500, 900);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].text, "y".repeat(900));
    }

    #[test]
    fn test_char_cap_counts_characters_not_bytes() {
        let text = "é".repeat(100);
        let matches = vec![make_match("a.txt", 1, 0.9, &text)];

        let evidence = rank_and_filter(matches, 0.0, 6, 4500, 40);
        assert_eq!(evidence[0].text.chars().count(), 40);
    }

    #[test]
    fn test_sort_is_stable_for_equal_scores() {
        let matches = vec![
            make_match("a.txt", 1, 0.7, "first"),
            make_match("b.txt", 1, 0.7, "second"),
            make_match("c.txt", 1, 0.7, "third"),
        ];

        let evidence = rank_and_filter(matches, 0.0, 6, 100_000, 1000);
        let order: Vec<&str> = evidence.iter().map(|e| e.metadata.source.as_str()).collect();
        assert_eq!(order, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(rank_and_filter(Vec::new(), 0.5, 6, 4500, 900).is_empty());
    }

    #[test]
    fn test_all_filtered_yields_empty_output() {
        let matches = vec![
            make_match("a.txt", 1, 0.1, "noise"),
            make_match("b.txt", 1, 0.2, "noise"),
        ];
        assert!(rank_and_filter(matches, 0.5, 6, 4500, 900).is_empty());
    }

    #[test]
    fn test_end_to_end_threshold_then_sort() {
        let matches = vec![
            make_match("a.txt", 1, 0.9, &"alpha ".repeat(50)),
            make_match("b.txt", 2, 0.4, &"beta ".repeat(50)),
            make_match("c.txt", 3, 0.85, &"gamma ".repeat(50)),
        ];

        let evidence = rank_and_filter(matches, 0.5, 6, 4500, 900);
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].metadata.source, "a.txt");
        assert_eq!(evidence[0].score, 0.9);
        assert_eq!(evidence[1].metadata.source, "c.txt");
        assert_eq!(evidence[1].score, 0.85);
    }

    #[test]
    fn test_determinism_for_identical_input() {
        let matches: Vec<Match> = vec![
            make_match("a.txt", 1, 0.81, "one"),
            make_match("b.txt", 2, 0.93, "two"),
            make_match("a.txt", 1, 0.81, "one again"),
            make_match("c.txt", 5, 0.93, "three"),
        ];

        let first = rank_and_filter(matches.clone(), 0.5, 6, 4500, 900);
        let second = rank_and_filter(matches, 0.5, 6, 4500, 900);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.metadata.source, b.metadata.source);
        }
    }
}
