//! String similarity used for capability deduplication.

use std::time::Duration;

use similar::TextDiff;

/// Scores at or above this value count as "the same capability".
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.9;

/// Time budget of a single diff; past it the diff is finished approximately.
pub const DIFF_TIMEOUT: Duration = Duration::from_millis(50);

/// Normalized character similarity in `0.0..=1.0`.
///
/// `2 * kept / (len(a) + len(b))`, counting the characters a diff keeps.
/// Empty input never matches anything. The diff runs under `DIFF_TIMEOUT`,
/// so very long inputs get an approximate score instead of a slow exact one.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    TextDiff::configure()
        .timeout(DIFF_TIMEOUT)
        .diff_chars(a, b)
        .ratio()
}

/// Highest score `similarity(a, b)` can reach, from lengths alone.
///
/// Lets callers skip pairs whose lengths differ too much to ever match.
pub fn similarity_upper_bound(a: &str, b: &str) -> f32 {
    let (la, lb) = (a.chars().count(), b.chars().count());
    if la + lb == 0 {
        return 0.0;
    }
    (2 * la.min(lb)) as f32 / (la + lb) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    /// Deterministic pseudo-random text over a small alphabet
    fn noise(seed: u64, len: usize) -> String {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (b'a' + ((state >> 33) % 26) as u8) as char
            })
            .collect()
    }

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(similarity("tell_the_time", "tell_the_time"), 1.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_rephrased_names_cross_threshold() {
        let score = similarity("tell_the_weather", "tell_the_weathers");
        assert!(score >= DEFAULT_SIMILARITY_THRESHOLD, "score was {}", score);
    }

    #[test]
    fn test_unrelated_names_stay_below_threshold() {
        let score = similarity("open_spotify", "tell_the_time");
        assert!(score < DEFAULT_SIMILARITY_THRESHOLD, "score was {}", score);
    }

    #[test]
    fn test_score_is_symmetric_enough() {
        let forward = similarity("launch_browser", "launch_browsers");
        let backward = similarity("launch_browsers", "launch_browser");
        assert!((forward - backward).abs() < f32::EPSILON);
    }

    #[test]
    fn test_long_inputs_finish_quickly() {
        let a = noise(1, 20_000);
        let b = noise(2, 20_000);

        let started = Instant::now();
        let score = similarity(&a, &b);

        assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
        assert!((0.0..=1.0).contains(&score));
        assert!(score < DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_upper_bound_never_below_score() {
        let pairs = [
            ("tell_the_weather", "tell_the_weathers"),
            ("open_spotify", "tell_the_time"),
            ("what time is it", "tell_the_time() {\n    date\n}\n"),
        ];
        for (a, b) in pairs {
            assert!(similarity_upper_bound(a, b) + f32::EPSILON >= similarity(a, b));
        }
        assert!(similarity_upper_bound("short request", &"x".repeat(8_000)) < 0.01);
        assert_eq!(similarity_upper_bound("", ""), 0.0);
    }
}
