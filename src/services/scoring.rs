//! Pure per-question scoring.

/// Compute the score for one answer.
///
/// Incorrect answers score zero. Correct answers score
/// `round(max_points * (1 - elapsed / window))`, with the elapsed fraction
/// clamped to `[0, 1]` so that negative elapsed times (clock skew) award the
/// full `max_points` and submissions at or past the window boundary award
/// zero. The result is always within `[0, max_points]`; no input panics.
pub fn compute_score(
    is_correct: bool,
    elapsed_ms: i64,
    answer_window_ms: u32,
    max_points: u32,
) -> u32 {
    if !is_correct || answer_window_ms == 0 {
        return 0;
    }

    let fraction = (elapsed_ms as f64 / answer_window_ms as f64).clamp(0.0, 1.0);
    (max_points as f64 * (1.0 - fraction)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_correct_answer_scores_max() {
        assert_eq!(compute_score(true, 0, 20_000, 1000), 1000);
    }

    #[test]
    fn answer_at_window_boundary_scores_zero() {
        assert_eq!(compute_score(true, 20_000, 20_000, 1000), 0);
    }

    #[test]
    fn incorrect_answer_scores_zero_regardless_of_speed() {
        assert_eq!(compute_score(false, 0, 20_000, 1000), 0);
        assert_eq!(compute_score(false, 5_000, 20_000, 2000), 0);
    }

    #[test]
    fn faster_correct_answers_score_strictly_higher() {
        let fast = compute_score(true, 2_000, 20_000, 1000);
        let mid = compute_score(true, 10_000, 20_000, 1000);
        let slow = compute_score(true, 20_000, 20_000, 1000);
        assert_eq!(fast, 900);
        assert_eq!(mid, 500);
        assert_eq!(slow, 0);
        assert!(fast > mid && mid > slow);
    }

    #[test]
    fn negative_elapsed_clamps_to_full_points() {
        assert_eq!(compute_score(true, -3_000, 20_000, 1000), 1000);
    }

    #[test]
    fn over_window_elapsed_clamps_to_zero() {
        assert_eq!(compute_score(true, 120_000, 20_000, 1000), 0);
    }

    #[test]
    fn zero_window_never_divides_by_zero() {
        assert_eq!(compute_score(true, 0, 0, 1000), 0);
    }
}
