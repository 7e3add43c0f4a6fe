//! Sentence-level BLEU.
//!
//! BLEU-4 over whitespace tokens with uniform weights, clipped n-gram
//! precision, no smoothing and the standard brevity penalty. A sentence with
//! no matching n-gram at some order (including sentences shorter than four
//! tokens) scores 0.

use std::collections::HashMap;

const MAX_ORDER: usize = 4;

fn ngram_counts<'a>(tokens: &'a [&'a str], n: usize) -> HashMap<&'a [&'a str], usize> {
    let mut counts = HashMap::new();
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

pub fn sentence_bleu(prediction: &str, reference: &str) -> f64 {
    let pred: Vec<&str> = prediction.split_whitespace().collect();
    let gold: Vec<&str> = reference.split_whitespace().collect();

    let mut log_precision_sum = 0.0;
    for n in 1..=MAX_ORDER {
        let pred_counts = ngram_counts(&pred, n);
        let gold_counts = ngram_counts(&gold, n);

        let matched: usize = pred_counts
            .iter()
            .map(|(gram, count)| (*count).min(gold_counts.get(gram).copied().unwrap_or(0)))
            .sum();
        let total = pred.len().saturating_sub(n - 1);

        if matched == 0 || total == 0 {
            return 0.0;
        }
        log_precision_sum += (matched as f64 / total as f64).ln();
    }

    let geometric_mean = (log_precision_sum / MAX_ORDER as f64).exp();
    let brevity_penalty = if pred.len() > gold.len() {
        1.0
    } else {
        (1.0 - gold.len() as f64 / pred.len() as f64).exp()
    };

    geometric_mean * brevity_penalty
}

/// Unweighted mean of per-sentence BLEU over aligned pairs; 0 for no pairs.
pub fn mean_sentence_bleu<P: AsRef<str>, R: AsRef<str>>(predictions: &[P], references: &[R]) -> f64 {
    let scores: Vec<f64> = predictions
        .iter()
        .zip(references)
        .map(|(p, r)| sentence_bleu(p.as_ref(), r.as_ref()))
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENT: &str = "the cat sat on the mat";

    #[test]
    fn identical_sentence_is_perfect() {
        assert!((sentence_bleu(SENT, SENT) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_vocabulary_is_zero() {
        assert_eq!(sentence_bleu("alpha beta gamma delta", SENT), 0.0);
    }

    #[test]
    fn short_sentences_have_no_four_grams() {
        assert_eq!(sentence_bleu("the cat", "the cat"), 0.0);
    }

    #[test]
    fn brevity_penalty_applies_to_short_predictions() {
        let pred = "the cat sat on the";
        let score = sentence_bleu(pred, SENT);
        let expected = (1.0f64 - 6.0 / 5.0).exp();
        assert!((score - expected).abs() < 1e-12, "{score} vs {expected}");
    }

    #[test]
    fn clipping_limits_repeated_tokens() {
        // clipped unigrams match but no bigram does
        let score = sentence_bleu("the the the the the the the", "the cat is on the mat");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn mean_over_pairs() {
        let preds = [SENT, "alpha beta gamma delta"];
        let refs = [SENT, SENT];
        assert!((mean_sentence_bleu(&preds, &refs) - 0.5).abs() < 1e-12);
        assert_eq!(mean_sentence_bleu::<&str, &str>(&[], &[]), 0.0);
    }
}
