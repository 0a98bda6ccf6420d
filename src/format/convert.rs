//! Conversion between mixer samples and 16-bit PCM.

use crate::frame::{Sample, SAMPLE_MAX, SAMPLE_MIN};

const PCM16_SCALE: Sample = 32767.0;
const PCM16_RANGE: Sample = 32768.0;

/// Converts a sample to 16-bit PCM, clamping to [`SAMPLE_MIN`, `SAMPLE_MAX`] first.
///
/// Scales by 32767 so both extremes stay in range: `SAMPLE_MIN` maps to
/// -32767, never -32768.
#[inline]
pub fn sample_to_pcm16(sample: Sample) -> i16 {
    (sample.clamp(SAMPLE_MIN, SAMPLE_MAX) * PCM16_SCALE) as i16
}

/// Converts a 16-bit PCM value to a sample in [`SAMPLE_MIN`, `SAMPLE_MAX`).
#[inline]
pub fn pcm16_to_sample(pcm: i16) -> Sample {
    Sample::from(pcm) / PCM16_RANGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_map_symmetrically() {
        assert_eq!(sample_to_pcm16(SAMPLE_MAX), 32767);
        assert_eq!(sample_to_pcm16(SAMPLE_MIN), -32767);
        assert_eq!(sample_to_pcm16(0.0), 0);
    }

    #[test]
    fn test_out_of_range_samples_are_clamped() {
        assert_eq!(sample_to_pcm16(3.0), 32767);
        assert_eq!(sample_to_pcm16(-3.0), -32767);
        assert_eq!(sample_to_pcm16(crate::POISON_SAMPLE), 32767);
    }

    #[test]
    fn test_pcm16_to_sample_stays_in_range() {
        assert!((pcm16_to_sample(i16::MIN) - SAMPLE_MIN).abs() < f32::EPSILON);
        assert!(pcm16_to_sample(i16::MAX) < SAMPLE_MAX);
        assert!(pcm16_to_sample(0).abs() < f32::EPSILON);
        assert!((pcm16_to_sample(16384) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ring_transport_error_is_one_step() {
        for &sample in &[0.0, 0.5, -0.5, 0.75, -0.999] {
            let back = pcm16_to_sample(sample_to_pcm16(sample));
            assert!((sample - back).abs() < 1.0 / 16384.0, "{sample} -> {back}");
        }
    }
}
