//! Frame rate analysis over video frame timestamps.
//!
//! FLV stores millisecond decode timestamps, so a 29.97 fps stream shows up
//! as a mix of 33 ms and 34 ms intervals and a naive average drifts with
//! every dropped or duplicated frame. Two figures are produced:
//!
//! - the *true* frame rate, the nominal rate the stream was encoded at. It is
//!   taken from the most common interval (ties go to the shortest) with its
//!   ±1 ms neighbours folded in, and snapped to a standard rate when within
//!   0.2% of one;
//! - the *average* frame rate, frame count over duration.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Rates that a measured value snaps to.
const STANDARD_RATES: [(u32, u32); 10] = [
    (24000, 1001),
    (24, 1),
    (25, 1),
    (30000, 1001),
    (30, 1),
    (48, 1),
    (50, 1),
    (60000, 1001),
    (60, 1),
    (120, 1),
];

/// Relative distance within which a measured rate is replaced by a standard one.
const SNAP_TOLERANCE: f64 = 0.002;

/// Exact frames-per-second value, always reduced with non-zero terms.
///
/// Displays as a short decimal (`29.97`); the alternate form `{:#}` shows the
/// fraction as well (`30000/1001 (29.970030)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    /// Builds a reduced rate, `None` when either term is zero.
    pub fn new(num: u32, den: u32) -> Option<Self> {
        Self::from_ratio(num as u64, den as u64)
    }

    /// Reduces `num / den`. Terms that still exceed `u32` after reduction are
    /// scaled down, losing the least significant bits.
    fn from_ratio(num: u64, den: u64) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }

        let divisor = gcd(num, den);
        let (mut num, mut den) = (num / divisor, den / divisor);
        while num > u32::MAX as u64 || den > u32::MAX as u64 {
            num >>= 1;
            den >>= 1;
        }
        if num == 0 || den == 0 {
            return None;
        }

        let divisor = gcd(num, den);
        Some(Self {
            num: (num / divisor) as u32,
            den: (den / divisor) as u32,
        })
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// The closest standard rate within [`SNAP_TOLERANCE`], if any.
    fn snap_to_standard(self) -> Self {
        let value = self.as_f64();
        STANDARD_RATES
            .iter()
            .map(|&(num, den)| Self { num, den })
            .map(|standard| {
                let distance = (value - standard.as_f64()).abs() / standard.as_f64();
                (standard, distance)
            })
            .filter(|(_, distance)| *distance <= SNAP_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(standard, _)| standard)
            .unwrap_or(self)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return write!(f, "{}/{} ({:.6})", self.num, self.den, self.as_f64());
        }

        if self.den == 1 {
            return write!(f, "{}", self.num);
        }

        let short = format!("{:.3}", self.as_f64());
        write!(f, "{}", short.trim_end_matches('0').trim_end_matches('.'))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Result of [`compute_frame_rates`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRates {
    pub true_frame_rate: Option<FrameRate>,
    pub average_frame_rate: Option<FrameRate>,
    /// One entry per ignored non-monotonic interval
    pub warnings: Vec<String>,
}

/// Derives the true and average frame rate from the decode timestamps of the
/// video frames of one file, in container order.
///
/// Both rates need at least two frames. Intervals that do not move forward
/// are left out of the true rate and reported in
/// [`FrameRates::warnings`].
pub fn compute_frame_rates(timestamps: &[u32]) -> FrameRates {
    let mut rates = FrameRates::default();
    if timestamps.len() < 2 {
        return rates;
    }

    let mut histogram: BTreeMap<u64, u64> = BTreeMap::new();
    for (frame, pair) in timestamps.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current <= previous {
            rates.warnings.push(format!(
                "non-monotonic video timestamp at frame {}: {current} ms follows {previous} ms, interval ignored",
                frame + 1
            ));
            continue;
        }
        *histogram.entry((current - previous) as u64).or_default() += 1;
    }

    rates.true_frame_rate = true_frame_rate(&histogram);

    let first = timestamps[0];
    let last = timestamps[timestamps.len() - 1];
    if last > first {
        let frames = (timestamps.len() - 1) as u64;
        rates.average_frame_rate = FrameRate::from_ratio(frames * 1000, (last - first) as u64);
    }

    debug!(
        frames = timestamps.len(),
        distinct_intervals = histogram.len(),
        true_rate = ?rates.true_frame_rate,
        average_rate = ?rates.average_frame_rate,
        "computed frame rates"
    );

    rates
}

fn true_frame_rate(histogram: &BTreeMap<u64, u64>) -> Option<FrameRate> {
    // Ascending iteration with a strict comparison keeps the shortest
    // interval among equally common ones
    let mut mode: Option<(u64, u64)> = None;
    for (&interval, &count) in histogram {
        if mode.is_none_or(|(_, best)| count > best) {
            mode = Some((interval, count));
        }
    }
    let (mode, _) = mode?;

    let (frames, duration) = [mode.saturating_sub(1), mode, mode + 1]
        .into_iter()
        .filter(|interval| *interval > 0)
        .filter_map(|interval| histogram.get(&interval).map(|count| (interval, *count)))
        .fold((0u64, 0u64), |(frames, duration), (interval, count)| {
            (frames + count, duration + interval * count)
        });

    let measured = FrameRate::from_ratio(frames * 1000, duration)?;
    Some(measured.snap_to_standard())
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn rate(num: u32, den: u32) -> Option<FrameRate> {
        FrameRate::new(num, den)
    }

    #[test]
    fn test_constant_interval() {
        let timestamps: Vec<u32> = (0..30).map(|i| i * 33).collect();
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.true_frame_rate, rate(1000, 33));
        assert_eq!(rates.average_frame_rate, rate(1000, 33));
        assert!(rates.warnings.is_empty());
    }

    #[test]
    fn test_ntsc_snaps_to_standard_rate() {
        let timestamps: Vec<u32> = (0..300).map(|i| i * 1001 / 30).collect();
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.true_frame_rate, rate(30000, 1001));
        // 299 intervals over 9976 ms, not snapped
        assert_eq!(rates.average_frame_rate, rate(299_000, 9976));
    }

    #[test]
    fn test_drops_do_not_move_the_true_rate() {
        // 25 fps with two dropped frames
        let timestamps = [0, 40, 80, 160, 200, 240, 280, 360, 400];
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.true_frame_rate, rate(25, 1));
        assert_eq!(rates.average_frame_rate, rate(20, 1));
    }

    #[test]
    fn test_tie_goes_to_shortest_interval() {
        let timestamps = [0, 20, 40, 60, 110, 160, 210];
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.true_frame_rate, rate(50, 1));
        assert_eq!(rates.average_frame_rate, rate(200, 7));
    }

    #[test]
    fn test_neighbouring_intervals_are_folded() {
        // 40 and 41 ms equally common, no standard rate nearby
        let timestamps = [0, 40, 81, 121, 162, 202, 243];
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.true_frame_rate, rate(6000, 243));
    }

    #[test]
    fn test_non_monotonic_timestamps() {
        let timestamps = [0, 40, 40, 80, 60, 100];
        let rates = compute_frame_rates(&timestamps);
        assert_eq!(rates.warnings.len(), 2);
        assert!(rates.warnings[0].starts_with("non-monotonic video timestamp at frame 2"));
        assert!(rates.warnings[1].starts_with("non-monotonic video timestamp at frame 4"));
        assert_eq!(rates.true_frame_rate, rate(25, 1));
        assert_eq!(rates.average_frame_rate, rate(50, 1));
    }

    #[test]
    fn test_too_few_frames() {
        assert_eq!(compute_frame_rates(&[]), FrameRates::default());
        assert_eq!(compute_frame_rates(&[1234]), FrameRates::default());

        let rates = compute_frame_rates(&[500, 500]);
        assert_eq!(rates.true_frame_rate, None);
        assert_eq!(rates.average_frame_rate, None);
        assert_eq!(rates.warnings.len(), 1);
    }

    #[test]
    fn test_input_is_untouched() {
        let timestamps = vec![0, 33, 66, 50];
        let copy = timestamps.clone();
        let _ = compute_frame_rates(&timestamps);
        assert_eq!(timestamps, copy);
    }

    #[test]
    fn test_display() {
        let ntsc = FrameRate::new(30000, 1001).unwrap();
        assert_eq!(ntsc.to_string(), "29.97");
        assert_eq!(format!("{ntsc:#}"), "30000/1001 (29.970030)");

        assert_eq!(FrameRate::new(50, 2).unwrap().to_string(), "25");
        assert_eq!(FrameRate::new(24000, 1001).unwrap().to_string(), "23.976");
        assert_eq!(FrameRate::new(1000, 33).unwrap().to_string(), "30.303");
        assert_eq!(format!("{:#}", FrameRate::new(25, 1).unwrap()), "25/1 (25.000000)");
    }

    #[test]
    fn test_reduction() {
        assert_eq!(FrameRate::new(60000, 2002), rate(30000, 1001));
        assert_eq!(FrameRate::new(0, 5), None);
        assert_eq!(FrameRate::new(5, 0), None);
        let huge = FrameRate::from_ratio(u64::MAX - 1, 1 << 40).unwrap();
        assert!(huge.as_f64() > 1e7);
    }
}
