//! One-shot sampler - fire-and-forget sound effects on the master bus

use std::sync::Arc;
use tracing::debug;

/// Default sampler bus gain
const DEFAULT_GAIN: f32 = 0.8;

/// One playing sound effect
struct Voice {
    samples: Arc<Vec<f32>>,
    position: usize,
}

impl Voice {
    fn finished(&self) -> bool {
        self.position >= self.samples.len()
    }
}

/// Polyphonic one-shot player sharing a single bus gain
///
/// Every trigger starts an independent voice over a fully decoded buffer;
/// overlapping voices mix freely and clean themselves up once exhausted.
/// No coordination with deck playback is needed.
pub struct Sampler {
    voices: Vec<Voice>,
    gain: f32,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            gain: DEFAULT_GAIN,
        }
    }

    /// Start playback of a decoded buffer (interleaved stereo)
    pub fn trigger(&mut self, samples: Arc<Vec<f32>>) {
        if samples.is_empty() {
            debug!("sampler: ignoring empty one-shot buffer");
            return;
        }
        self.voices.push(Voice {
            samples,
            position: 0,
        });
    }

    /// Number of currently sounding voices
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 2.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Mix all voices into `output` (additive) and drop finished ones
    pub fn mix_into(&mut self, output: &mut [f32]) {
        for voice in &mut self.voices {
            let remaining = voice.samples.len() - voice.position;
            let count = remaining.min(output.len());
            for (out, &sample) in output[..count]
                .iter_mut()
                .zip(voice.samples[voice.position..voice.position + count].iter())
            {
                *out += sample * self.gain;
            }
            voice.position += count;
        }

        self.voices.retain(|v| !v.finished());
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(frames: usize, value: f32) -> Arc<Vec<f32>> {
        Arc::new(vec![value; frames * 2])
    }

    #[test]
    fn overlapping_voices_complete_independently() {
        let mut sampler = Sampler::new();
        sampler.trigger(buffer(64, 0.1));
        sampler.trigger(buffer(128, 0.1));
        sampler.trigger(buffer(256, 0.1));
        assert_eq!(sampler.active_voices(), 3);

        let mut out = vec![0.0; 128];
        sampler.mix_into(&mut out); // 64 frames
        assert_eq!(sampler.active_voices(), 2);

        sampler.mix_into(&mut out);
        assert_eq!(sampler.active_voices(), 1);

        sampler.mix_into(&mut out);
        sampler.mix_into(&mut out);
        assert_eq!(sampler.active_voices(), 0);
    }

    #[test]
    fn voices_sum_through_bus_gain() {
        let mut sampler = Sampler::new();
        sampler.set_gain(0.5);
        sampler.trigger(buffer(4, 1.0));
        sampler.trigger(buffer(4, 1.0));

        let mut out = vec![0.0; 8];
        sampler.mix_into(&mut out);
        for sample in out {
            assert!((sample - 1.0).abs() < 1e-6); // 2 voices * 1.0 * 0.5
        }
    }

    #[test]
    fn empty_buffer_is_ignored() {
        let mut sampler = Sampler::new();
        sampler.trigger(Arc::new(Vec::new()));
        assert_eq!(sampler.active_voices(), 0);
    }

    #[test]
    fn mix_is_additive_over_existing_content() {
        let mut sampler = Sampler::new();
        sampler.set_gain(1.0);
        sampler.trigger(buffer(2, 0.25));

        let mut out = vec![0.5; 4];
        sampler.mix_into(&mut out);
        for sample in out {
            assert!((sample - 0.75).abs() < 1e-6);
        }
    }
}
