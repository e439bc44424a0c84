//! Saving rendered output as a candidate reference.
//!
//! A saved render is named `<test_id>-actual.wav`. After inspecting it by
//! hand it can be renamed to `<test_id>-expected.wav` to become the new
//! reference.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, warn};

use crate::config::ArtifactPolicy;
use crate::error::Error;
use crate::sample_buffer::{SampleBuffer, float_to_s16};

/// File name of the saved render for `test_id`.
pub fn artifact_file_name(test_id: &str) -> String {
    format!("{test_id}-actual.wav")
}

/// Serializes a buffer to a 16-bit file.
pub trait ArtifactWriter {
    /// Writes `buffer` as `file_name`, returning the full path written.
    fn write(&self, buffer: &SampleBuffer, file_name: &str) -> Result<PathBuf, Error>;
}

/// Writes 16-bit mono WAV files into a directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct WavArtifactWriter {
    dir: PathBuf,
}

impl WavArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactWriter for WavArtifactWriter {
    fn write(&self, buffer: &SampleBuffer, file_name: &str) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(file_name);
        write_wav_s16(&path, buffer).map_err(|source| Error::Wav {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Writes `buffer` as a 16-bit mono WAV file.
pub fn write_wav_s16(path: &Path, buffer: &SampleBuffer) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate_hz(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in buffer.samples() {
        writer.write_sample(float_to_s16(s))?;
    }
    writer.finalize()
}

/// Saves `rendered` when `policy` asks for it given the verdict.
///
/// Returns the saved path, or `None` when nothing was saved. A failed write
/// is logged and reported as not saved; it never changes the verdict.
pub fn export_if_needed(
    writer: &dyn ArtifactWriter,
    policy: ArtifactPolicy,
    test_id: &str,
    rendered: &SampleBuffer,
    passed: bool,
) -> Option<PathBuf> {
    if !policy.should_export(passed) {
        return None;
    }
    match writer.write(rendered, &artifact_file_name(test_id)) {
        Ok(path) => {
            debug!(test_id, path = %path.display(), "saved rendered output");
            Some(path)
        }
        Err(err) => {
            warn!(test_id, error = %err, "could not save rendered output");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::reference::read_wav;

    #[derive(Debug, Default)]
    struct CountingWriter {
        names: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ArtifactWriter for CountingWriter {
        fn write(&self, _buffer: &SampleBuffer, file_name: &str) -> Result<PathBuf, Error> {
            self.names.borrow_mut().push(file_name.to_owned());
            if self.fail {
                return Err(Error::Io {
                    path: PathBuf::from(file_name),
                    source: std::io::Error::other("disk full"),
                });
            }
            Ok(PathBuf::from(file_name))
        }
    }

    fn render() -> SampleBuffer {
        SampleBuffer::new(vec![0.0, 0.25, -0.25, 0.5], 44_100)
    }

    #[test]
    fn export_follows_policy() {
        let writer = CountingWriter::default();
        let id = "oscillator-sine";

        assert_eq!(
            export_if_needed(&writer, ArtifactPolicy::Never, id, &render(), false),
            None
        );
        assert_eq!(
            export_if_needed(&writer, ArtifactPolicy::OnFailure, id, &render(), true),
            None
        );
        assert!(writer.names.borrow().is_empty());

        assert_eq!(
            export_if_needed(&writer, ArtifactPolicy::OnFailure, id, &render(), false),
            Some(PathBuf::from("oscillator-sine-actual.wav"))
        );
        assert!(export_if_needed(&writer, ArtifactPolicy::Always, id, &render(), true).is_some());
        assert_eq!(writer.names.borrow().len(), 2);
    }

    #[test]
    fn failed_write_is_not_saved() {
        let writer = CountingWriter {
            fail: true,
            ..Default::default()
        };
        let saved = export_if_needed(
            &writer,
            ArtifactPolicy::Always,
            "oscillator-square",
            &render(),
            false,
        );
        assert_eq!(saved, None);
        assert_eq!(writer.names.borrow().len(), 1);
    }

    #[test]
    fn wav_artifact_decodes_to_quantized_render() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WavArtifactWriter::new(dir.path().join("nested/out"));
        let rendered = SampleBuffer::new(
            (0..300).map(|i| (i as f32 * 0.02).sin() * 0.5).collect(),
            48_000,
        );

        let path = writer
            .write(&rendered, &artifact_file_name("oscillator-triangle"))
            .unwrap();
        assert!(path.ends_with("oscillator-triangle-actual.wav"));

        let decoded = read_wav(&path).unwrap();
        assert_eq!(decoded, rendered.quantized());
    }
}
