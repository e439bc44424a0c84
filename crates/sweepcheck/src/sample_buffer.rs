//! Single-channel sample buffers and 16-bit conversion.

/// Scaling factor for converting 16-bit PCM data to float and back.
pub const WAVE_SCALE_FACTOR: f32 = 32768.0;

/// Converts a float sample to 16-bit PCM, rounding and clamping to the
/// representable range. NaN maps to 0.
#[inline]
pub fn float_to_s16(v: f32) -> i16 {
    (v * WAVE_SCALE_FACTOR)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Converts a 16-bit PCM sample to float in `[-1.0, 1.0)`.
#[inline]
pub fn s16_to_float(v: i16) -> f32 {
    f32::from(v) / WAVE_SCALE_FACTOR
}

/// A fixed-length, single-channel run of samples at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate_hz: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    /// A buffer of `len` zero samples.
    pub fn silence(len: usize, sample_rate_hz: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate_hz)
    }

    /// Builds a buffer from 16-bit PCM samples.
    pub fn from_s16(samples: &[i16], sample_rate_hz: u32) -> Self {
        Self::new(
            samples.iter().copied().map(s16_to_float).collect(),
            sample_rate_hz,
        )
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate_hz)
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// The samples encoded as 16-bit PCM.
    pub fn to_s16(&self) -> Vec<i16> {
        self.samples.iter().copied().map(float_to_s16).collect()
    }

    /// A copy of this buffer passed through 16-bit quantization, i.e. what a
    /// saved reference file decodes back to.
    pub fn quantized(&self) -> Self {
        Self::from_s16(&self.to_s16(), self.sample_rate_hz)
    }
}
