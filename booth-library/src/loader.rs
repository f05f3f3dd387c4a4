//! Audio file loading and decoding

use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::thread;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during track loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Track metadata
#[derive(Debug, Clone, Default)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

/// A loaded and decoded audio track
pub struct LoadedTrack {
    /// Interleaved stereo samples (f32, normalized to -1.0 to 1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz, matches the loader's target rate
    pub sample_rate: u32,
    /// Track metadata
    pub metadata: TrackMetadata,
}

/// Audio file loader using Symphonia
///
/// Output is always interleaved stereo at the target sample rate, so the
/// mixing engine never has to care about source formats.
pub struct TrackLoader {
    target_sample_rate: u32,
}

impl Default for TrackLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackLoader {
    /// Create a new track loader with default 48kHz sample rate
    pub fn new() -> Self {
        Self::with_sample_rate(48000)
    }

    /// Create a new track loader with specific sample rate
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Load and decode an audio file
    pub fn load(&self, path: &Path) -> Result<LoadedTrack, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut metadata = self.extract_metadata(&mut format, path);
        metadata.sample_rate = self.target_sample_rate;

        // Decode everything up front; tracks are played from memory
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(_) => continue,
            };

            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;

            let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        let samples = to_stereo(&samples, channels);

        let samples = if source_sample_rate != self.target_sample_rate {
            self.resample(&samples, source_sample_rate)?
        } else {
            samples
        };

        metadata.duration_secs = (samples.len() / 2) as f64 / self.target_sample_rate as f64;

        debug!(
            path = %path.display(),
            frames = samples.len() / 2,
            source_rate = source_sample_rate,
            "track decoded"
        );

        Ok(LoadedTrack {
            samples,
            sample_rate: self.target_sample_rate,
            metadata,
        })
    }

    /// Load on a worker thread; the result arrives on the returned channel
    ///
    /// Used for deck loads and one-shot decodes so the UI loop never blocks
    /// on file IO.
    pub fn load_async(&self, path: PathBuf) -> Receiver<Result<LoadedTrack, LoadError>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let loader = TrackLoader::with_sample_rate(self.target_sample_rate);
        thread::spawn(move || {
            let _ = tx.send(loader.load(&path));
        });
        rx
    }

    /// Resample interleaved stereo audio to the target sample rate
    fn resample(&self, samples: &[f32], source_rate: u32) -> Result<Vec<f32>, LoadError> {
        use rubato::{FftFixedInOut, Resampler};

        let frames = samples.len() / 2;

        let mut resampler = FftFixedInOut::<f32>::new(
            source_rate as usize,
            self.target_sample_rate as usize,
            1024,
            2,
        )
        .map_err(|e| LoadError::Decode(e.to_string()))?;

        // Deinterleave
        let deinterleaved: Vec<Vec<f32>> = (0..2)
            .map(|ch| (0..frames).map(|f| samples[f * 2 + ch]).collect())
            .collect();

        let chunk_size = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); 2];

        let mut pos = 0;
        while pos + chunk_size <= frames {
            let input_refs: Vec<&[f32]> = deinterleaved
                .iter()
                .map(|ch| &ch[pos..pos + chunk_size])
                .collect();

            let resampled = resampler
                .process(&input_refs, None)
                .map_err(|e| LoadError::Decode(e.to_string()))?;

            for (ch, data) in resampled.into_iter().enumerate() {
                output[ch].extend(data);
            }

            pos += chunk_size;
        }

        // Pad the tail chunk with zeros and keep only the real frames
        if pos < frames {
            let remaining = frames - pos;
            let padded: Vec<Vec<f32>> = deinterleaved
                .iter()
                .map(|ch| {
                    let mut v = ch[pos..].to_vec();
                    v.resize(chunk_size, 0.0);
                    v
                })
                .collect();

            let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

            if let Ok(resampled) = resampler.process(&input_refs, None) {
                for (ch, data) in resampled.into_iter().enumerate() {
                    let output_frames =
                        (remaining * self.target_sample_rate as usize) / source_rate as usize;
                    output[ch].extend(&data[..output_frames.min(data.len())]);
                }
            }
        }

        // Reinterleave
        let output_frames = output[0].len();
        let mut interleaved = Vec::with_capacity(output_frames * 2);
        for frame_idx in 0..output_frames {
            interleaved.push(output[0][frame_idx]);
            interleaved.push(output[1][frame_idx]);
        }

        Ok(interleaved)
    }

    /// Extract metadata from format reader, falling back to the filename
    fn extract_metadata(
        &self,
        format: &mut Box<dyn symphonia::core::formats::FormatReader>,
        path: &Path,
    ) -> TrackMetadata {
        let mut metadata = TrackMetadata {
            title: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            artist: "Unknown".to_string(),
            ..Default::default()
        };

        if let Some(meta) = format.metadata().current() {
            for tag in meta.tags() {
                match tag.std_key {
                    Some(symphonia::core::meta::StandardTagKey::TrackTitle) => {
                        metadata.title = tag.value.to_string();
                    }
                    Some(symphonia::core::meta::StandardTagKey::Artist) => {
                        metadata.artist = tag.value.to_string();
                    }
                    _ => {}
                }
            }
        }

        metadata
    }
}

/// Convert interleaved samples of any channel count to interleaved stereo
///
/// Mono is duplicated into both channels; more than two channels keeps the
/// first pair.
fn to_stereo(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        2 => samples.to_vec(),
        1 => {
            let mut stereo = Vec::with_capacity(samples.len() * 2);
            for &s in samples {
                stereo.push(s);
                stereo.push(s);
            }
            stereo
        }
        n => {
            let n = n as usize;
            let frames = samples.len() / n;
            let mut stereo = Vec::with_capacity(frames * 2);
            for f in 0..frames {
                stereo.push(samples[f * n]);
                stereo.push(samples[f * n + 1]);
            }
            stereo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_duplicates_into_both_channels() {
        let stereo = to_stereo(&[0.1, 0.2, 0.3], 1);
        assert_eq!(stereo, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn stereo_passes_through() {
        let input = vec![0.1, -0.1, 0.2, -0.2];
        assert_eq!(to_stereo(&input, 2), input);
    }

    #[test]
    fn surround_keeps_first_pair() {
        // 5.1: L R C LFE Ls Rs
        let input = vec![0.1, 0.2, 0.9, 0.9, 0.9, 0.9, 0.3, 0.4, 0.9, 0.9, 0.9, 0.9];
        assert_eq!(to_stereo(&input, 6), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let loader = TrackLoader::new();
        let result = loader.load(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn async_load_reports_errors_over_channel() {
        let loader = TrackLoader::new();
        let rx = loader.load_async(PathBuf::from("/nonexistent/track.mp3"));
        let result = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("worker must always report");
        assert!(result.is_err());
    }
}
