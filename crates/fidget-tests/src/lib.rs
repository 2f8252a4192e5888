//! Randomness quality battery for generated numbers in `[0, 2048)`.
//!
//! A pure consumer of generated output: feed it a list of integers, get back
//! per-test results with a pass/fail determination and, where the statistic
//! has a tractable distribution, a p-value. Five tests: chi-square frequency
//! across the 2048 buckets, up/down runs, serial correlation, gap analysis,
//! and a Shannon entropy estimate.

use std::collections::HashMap;

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Size of the output space.
pub const RANGE: usize = 2048;

/// Chi-square critical value at the 5% level for 2047 degrees of freedom,
/// as used by the reference analysis (≈ mean + 0.94σ; the exact 95th
/// percentile is ≈ 2154 — we report a real p-value alongside).
pub const CHI_SQUARE_CRITICAL: f64 = 2107.0;

/// Result of a single randomness test.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
}

impl TestResult {
    /// Determine pass/fail from a p-value against a threshold.
    fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        matches!(p, Some(p) if p >= threshold)
    }
}

/// Summary of a full battery run.
#[derive(Debug, Clone, Serialize)]
pub struct BatterySummary {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub total: usize,
    pub pass_rate: f64,
    /// GOOD (>= 0.8), ACCEPTABLE (>= 0.6), or POOR.
    pub verdict: &'static str,
}

/// Return a failing `TestResult` when data is too short for a test.
fn insufficient(name: &str, needed: usize, got: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient data: need {needed}, got {got}"),
    }
}

/// Test 1: Frequency — chi-square goodness-of-fit across all 2048 buckets.
pub fn frequency_test(numbers: &[u16]) -> TestResult {
    let name = "Frequency (chi-square)";
    let n = numbers.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }

    let mut counts = [0u64; RANGE];
    for &v in numbers {
        counts[v as usize % RANGE] += 1;
    }
    let expected = n as f64 / RANGE as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&observed| {
            let d = observed as f64 - expected;
            d * d / expected
        })
        .sum();

    let df = (RANGE - 1) as f64;
    let p = ChiSquared::new(df).map(|dist| dist.sf(chi2)).ok();
    TestResult {
        name: name.to_string(),
        passed: TestResult::pass_from_p(p, 0.01),
        p_value: p,
        statistic: chi2,
        details: format!(
            "chi2={chi2:.1}, df={df:.0}, reference critical={CHI_SQUARE_CRITICAL}"
        ),
    }
}

/// Test 2: Runs — counts of consecutive increasing/decreasing runs against
/// the expected `(2n - 1) / 3` with variance `(16n - 29) / 90`.
pub fn runs_test(numbers: &[u16]) -> TestResult {
    let name = "Runs (up/down)";
    let n = numbers.len();
    if n < 20 {
        return insufficient(name, 20, n);
    }

    let mut runs = 1usize;
    let mut prev_up: Option<bool> = None;
    for pair in numbers.windows(2) {
        if pair[1] == pair[0] {
            continue;
        }
        let up = pair[1] > pair[0];
        if prev_up.is_some_and(|p| p != up) {
            runs += 1;
        }
        prev_up = Some(up);
    }

    let expected = (2.0 * n as f64 - 1.0) / 3.0;
    let variance = (16.0 * n as f64 - 29.0) / 90.0;
    let z = (runs as f64 - expected) / variance.sqrt();
    // Two-sided p from the normal approximation.
    let p = Normal::new(0.0, 1.0)
        .map(|dist| 2.0 * dist.sf(z.abs()))
        .ok();
    TestResult {
        name: name.to_string(),
        passed: z.abs() < 1.96,
        p_value: p,
        statistic: z,
        details: format!("runs={runs}, expected={expected:.1}, z={z:.3}"),
    }
}

/// Test 3: Serial correlation — lag-1 correlation coefficient, which should
/// be near zero for independent draws.
pub fn serial_correlation_test(numbers: &[u16]) -> TestResult {
    let name = "Serial Correlation";
    let n = numbers.len();
    if n < 20 {
        return insufficient(name, 20, n);
    }

    let mean = numbers.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let numerator: f64 = numbers
        .windows(2)
        .map(|pair| (pair[0] as f64 - mean) * (pair[1] as f64 - mean))
        .sum();
    let denominator: f64 = numbers[..n - 1]
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();

    let r = if denominator != 0.0 {
        numerator / denominator
    } else {
        // Constant sequence: perfectly predictable.
        1.0
    };
    TestResult {
        name: name.to_string(),
        passed: r.abs() < 0.1,
        p_value: None,
        statistic: r,
        details: format!("r={r:.4}, threshold=0.1"),
    }
}

/// Test 4: Gap — gaps between occurrences of a mid-range target value should
/// average near `RANGE - 1` for uniform draws (geometric distribution).
pub fn gap_test(numbers: &[u16]) -> TestResult {
    gap_test_for(numbers, (RANGE / 2) as u16)
}

/// Gap test against a specific target value.
pub fn gap_test_for(numbers: &[u16], target: u16) -> TestResult {
    let name = "Gap";
    let mut gaps = Vec::new();
    let mut last: Option<usize> = None;
    for (i, &v) in numbers.iter().enumerate() {
        if v == target {
            if let Some(prev) = last {
                gaps.push((i - prev - 1) as f64);
            }
            last = Some(i);
        }
    }

    if gaps.is_empty() {
        return TestResult {
            name: name.to_string(),
            passed: false,
            p_value: None,
            statistic: 0.0,
            details: format!("target value {target} occurred fewer than twice"),
        };
    }

    let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let expected = (RANGE - 1) as f64;
    let passed = (mean_gap - expected).abs() < expected * 0.3;
    TestResult {
        name: name.to_string(),
        passed,
        p_value: None,
        statistic: mean_gap,
        details: format!(
            "target={target}, gaps={}, mean={mean_gap:.1}, expected={expected:.0} ±30%",
            gaps.len()
        ),
    }
}

/// Test 5: Shannon entropy of the output distribution; the ratio to the
/// theoretical maximum `log2(2048) = 11` should exceed 0.95.
pub fn entropy_estimate(numbers: &[u16]) -> TestResult {
    let name = "Shannon Entropy";
    let n = numbers.len();
    if n == 0 {
        return insufficient(name, 1, 0);
    }

    let mut counts: HashMap<u16, u64> = HashMap::new();
    for &v in numbers {
        *counts.entry(v).or_insert(0) += 1;
    }
    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.log2()
        })
        .sum();

    let max_entropy = (RANGE as f64).log2();
    let ratio = entropy / max_entropy;
    TestResult {
        name: name.to_string(),
        passed: ratio > 0.95,
        p_value: None,
        statistic: entropy,
        details: format!(
            "H={entropy:.3}, max={max_entropy:.1}, ratio={ratio:.4}, unique={}",
            counts.len()
        ),
    }
}

/// Run the whole battery and summarize.
pub fn run_all(numbers: &[u16]) -> BatterySummary {
    let results = vec![
        frequency_test(numbers),
        runs_test(numbers),
        serial_correlation_test(numbers),
        gap_test(numbers),
        entropy_estimate(numbers),
    ];
    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    let pass_rate = passed as f64 / total as f64;
    let verdict = if pass_rate >= 0.8 {
        "GOOD"
    } else if pass_rate >= 0.6 {
        "ACCEPTABLE"
    } else {
        "POOR"
    };
    BatterySummary {
        results,
        passed,
        total,
        pass_rate,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift32 stream reduced into the output range.
    fn xorshift_numbers(n: usize) -> Vec<u16> {
        let mut x: u32 = 0x9E37_79B9;
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                ((x >> 8) % RANGE as u32) as u16
            })
            .collect()
    }

    /// Perfectly uniform ramp: every value appears exactly `reps` times.
    fn uniform_ramp(reps: usize) -> Vec<u16> {
        (0..RANGE * reps).map(|i| (i % RANGE) as u16).collect()
    }

    #[test]
    fn frequency_passes_exactly_uniform_data() {
        let r = frequency_test(&uniform_ramp(3));
        assert!(r.passed, "{}", r.details);
        assert!(r.statistic < 1e-9);
    }

    #[test]
    fn frequency_fails_constant_data() {
        let r = frequency_test(&vec![42u16; 5000]);
        assert!(!r.passed, "{}", r.details);
    }

    #[test]
    fn frequency_rejects_short_input() {
        let r = frequency_test(&[1, 2, 3]);
        assert!(!r.passed);
        assert!(r.details.contains("Insufficient"));
    }

    #[test]
    fn runs_fails_monotone_data() {
        let ramp: Vec<u16> = (0..2000u16).collect();
        let r = runs_test(&ramp);
        assert!(!r.passed, "a single run is wildly non-random: {}", r.details);
    }

    #[test]
    fn runs_fails_strict_alternation() {
        let alternating: Vec<u16> = (0..2000).map(|i| if i % 2 == 0 { 0 } else { 2047 }).collect();
        let r = runs_test(&alternating);
        assert!(!r.passed, "{}", r.details);
    }

    #[test]
    fn runs_matches_expectation_for_balanced_pattern() {
        // The repeating pattern 0,2,1 yields two direction changes per three
        // steps: runs land almost exactly on the expected (2n - 1) / 3.
        let balanced: Vec<u16> = (0..3000).map(|i| [0u16, 2, 1][i % 3]).collect();
        let r = runs_test(&balanced);
        assert!(r.passed, "{}", r.details);
        assert!(r.statistic.abs() < 0.5);
    }

    #[test]
    fn correlation_detects_alternating_extremes() {
        let alternating: Vec<u16> = (0..1000).map(|i| if i % 2 == 0 { 0 } else { 2047 }).collect();
        let r = serial_correlation_test(&alternating);
        assert!(!r.passed);
        assert!(r.statistic < -0.9);
    }

    #[test]
    fn correlation_passes_prng_data() {
        let r = serial_correlation_test(&xorshift_numbers(5000));
        assert!(r.passed, "{}", r.details);
    }

    #[test]
    fn gap_reports_missing_target() {
        let r = gap_test_for(&[1, 2, 3, 4, 5], 1024);
        assert!(!r.passed);
        assert!(r.details.contains("fewer than twice"));
    }

    #[test]
    fn gap_passes_uniform_cycle() {
        // Target recurs every RANGE positions: gap is exactly RANGE - 1.
        let r = gap_test(&uniform_ramp(5));
        assert!(r.passed, "{}", r.details);
    }

    #[test]
    fn entropy_is_maximal_for_uniform_data() {
        let r = entropy_estimate(&uniform_ramp(2));
        assert!(r.passed, "{}", r.details);
        assert!((r.statistic - 11.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_is_zero_for_constant_data() {
        let r = entropy_estimate(&vec![7u16; 1000]);
        assert!(!r.passed);
        assert!(r.statistic.abs() < 1e-9);
    }

    #[test]
    fn run_all_summarizes() {
        let summary = run_all(&xorshift_numbers(20_480));
        assert_eq!(summary.total, 5);
        assert_eq!(
            summary.passed,
            summary.results.iter().filter(|r| r.passed).count()
        );
        assert!(
            summary.pass_rate >= 0.6,
            "xorshift data should be at least ACCEPTABLE: {:?}",
            summary
                .results
                .iter()
                .map(|r| (&r.name, r.passed))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn run_all_flags_degenerate_data() {
        let summary = run_all(&vec![100u16; 2000]);
        assert_eq!(summary.verdict, "POOR");
    }
}
