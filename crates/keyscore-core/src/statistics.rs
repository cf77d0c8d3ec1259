//! Rank, percentile, and average computations over a score population.
//!
//! Ranks are strict: `1 + count(strictly greater)`. Equal scores share a
//! rank and the next distinct score skips past all of them.

/// Strict rank of `score` within `population`.
pub fn strict_rank(population: &[f64], score: f64) -> u32 {
    population.iter().filter(|&&other| other > score).count() as u32 + 1
}

/// Percentile for a rank within a population of `total` candidates.
///
/// `(total - rank + 1) / total * 100`, or 0 for an empty population.
pub fn percentile(total: usize, rank: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    (total - rank as f64 + 1.0) / total * 100.0
}

/// Arithmetic mean, or 0 for an empty slice.
pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_in_empty_population_is_one() {
        assert_eq!(strict_rank(&[], 42.0), 1);
    }

    #[test]
    fn ties_share_rank_and_leave_a_gap() {
        let population = [180.0, 180.0, 150.0];
        assert_eq!(strict_rank(&population, 180.0), 1);
        assert_eq!(strict_rank(&population, 150.0), 3);
        assert_eq!(strict_rank(&population, 149.5), 4);
    }

    #[test]
    fn higher_score_never_ranks_worse() {
        let population = [12.0, 55.5, -3.0, 90.0, 55.5, 0.0];
        let mut scores: Vec<f64> = (-20..=200).map(|s| s as f64 / 2.0).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in scores.windows(2) {
            assert!(strict_rank(&population, pair[1]) <= strict_rank(&population, pair[0]));
        }
    }

    #[test]
    fn percentile_boundaries() {
        assert_eq!(percentile(0, 1), 0.0);
        assert_eq!(percentile(1, 1), 100.0);
        assert_eq!(percentile(2, 2), 50.0);
        assert!((percentile(3, 2) - 66.666_666).abs() < 1e-4);
    }

    #[test]
    fn mean_of_scores() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
    }
}
