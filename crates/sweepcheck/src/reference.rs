//! Loading reference recordings.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::error::{BoxError, Error};
use crate::sample_buffer::SampleBuffer;

/// File name of the stored reference for `test_id`.
pub fn reference_file_name(test_id: &str) -> String {
    format!("{test_id}-expected.wav")
}

/// Supplies the decoded reference for a test identifier.
pub trait ReferenceLoader {
    /// Loads the reference for `test_id`, or fails with [`Error::Decode`].
    fn load(&self, test_id: &str) -> Result<SampleBuffer, Error>;
}

/// Reads `<test_id>-expected.wav` files from a directory.
#[derive(Debug, Clone)]
pub struct WavReferenceLoader {
    dir: PathBuf,
}

impl WavReferenceLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the reference for `test_id`.
    pub fn path_for(&self, test_id: &str) -> PathBuf {
        self.dir.join(reference_file_name(test_id))
    }
}

impl ReferenceLoader for WavReferenceLoader {
    fn load(&self, test_id: &str) -> Result<SampleBuffer, Error> {
        let path = self.path_for(test_id);
        let buffer = read_wav(&path).map_err(|source| Error::decode(test_id, source))?;
        debug!(
            path = %path.display(),
            frames = buffer.len(),
            sample_rate_hz = buffer.sample_rate_hz(),
            "loaded reference"
        );
        Ok(buffer)
    }
}

/// Decodes the first channel of a WAV file into floats in `[-1, 1]`.
///
/// Integer PCM of any bit depth is scaled by `2^(bits - 1)`; float files are
/// taken as is.
pub fn read_wav(path: &Path) -> Result<SampleBuffer, BoxError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
    };

    if samples.is_empty() {
        return Err(format!("{} contains no samples", path.display()).into());
    }
    Ok(SampleBuffer::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_pcm16(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn loads_16_bit_reference() {
        let dir = tempfile::tempdir().unwrap();
        let loader = WavReferenceLoader::new(dir.path());
        write_pcm16(
            &loader.path_for("oscillator-sine"),
            1,
            &[0, 16384, -16384, i16::MIN],
        );

        let buffer = loader.load("oscillator-sine").unwrap();
        assert_eq!(buffer.sample_rate_hz(), 44_100);
        assert_eq!(buffer.samples(), &[0.0f32, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn keeps_only_the_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(reference_file_name("stereo"));
        write_pcm16(&path, 2, &[16384, 1, -16384, 2, 8192, 3]);

        let buffer = WavReferenceLoader::new(dir.path()).load("stereo").unwrap();
        assert_eq!(buffer.samples(), &[0.5f32, -0.5, 0.25]);
    }

    #[test]
    fn missing_reference_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = WavReferenceLoader::new(dir.path())
            .load("oscillator-square")
            .unwrap_err();
        assert!(
            matches!(&err, Error::Decode { test_id, .. } if test_id == "oscillator-square"),
            "{err:?}"
        );
    }

    #[test]
    fn garbage_file_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = WavReferenceLoader::new(dir.path());
        fs::write(loader.path_for("oscillator-custom"), b"not a wave file").unwrap();
        let err = loader.load("oscillator-custom").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn empty_reference_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = WavReferenceLoader::new(dir.path());
        write_pcm16(&loader.path_for("empty"), 1, &[]);
        let err = loader.load("empty").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
