//! FFT-based spectrum analyzer producing analyser-style byte bins

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Number of frequency bins exposed to consumers (half the FFT size)
pub const SPECTRUM_BINS: usize = 128;

/// FFT window size
const FFT_SIZE: usize = SPECTRUM_BINS * 2;

/// Magnitude floor in dB (maps to byte 0)
const MIN_DB: f32 = -100.0;
/// Magnitude ceiling in dB (maps to byte 255)
const MAX_DB: f32 = -30.0;

/// One snapshot of frequency-domain data
///
/// Each bin holds a magnitude in 0-255, lowest frequencies first.
#[derive(Clone, Copy, Debug)]
pub struct FrequencyData {
    pub bins: [u8; SPECTRUM_BINS],
}

impl Default for FrequencyData {
    fn default() -> Self {
        Self {
            bins: [0; SPECTRUM_BINS],
        }
    }
}

impl FrequencyData {
    /// Average of the lowest bins, used as a rhythm/bass energy signal
    pub fn bass_energy(&self) -> f32 {
        const BASS_BINS: usize = 5;
        let sum: u32 = self.bins[..BASS_BINS].iter().map(|&b| b as u32).sum();
        sum as f32 / BASS_BINS as f32
    }
}

/// Real-time FFT spectrum analyzer
///
/// Feeds on mono sample buffers and produces smoothed byte magnitudes.
/// Magnitudes are mapped on an absolute dB scale so a quiet signal reads
/// low rather than being rescaled to full range.
pub struct SpectrumAnalyzer {
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    /// Exponential smoothing factor applied to linear magnitudes
    smoothing: f32,
    previous_magnitudes: [f32; SPECTRUM_BINS],
    /// Pre-allocated FFT buffer to avoid allocation in analyze()
    fft_buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// Create a new spectrum analyzer
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            fft,
            window,
            smoothing: 0.8,
            previous_magnitudes: [0.0; SPECTRUM_BINS],
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    /// Analyze a buffer of mono samples and return byte magnitudes per bin
    ///
    /// Uses at most the first FFT_SIZE samples; shorter buffers are
    /// zero-padded.
    pub fn analyze(&mut self, samples: &[f32]) -> FrequencyData {
        let sample_count = samples.len().min(FFT_SIZE);
        for (i, &sample) in samples.iter().enumerate().take(sample_count) {
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }
        for buf in self.fft_buffer.iter_mut().skip(sample_count) {
            *buf = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let mut data = FrequencyData::default();
        for (i, bin) in data.bins.iter_mut().enumerate() {
            // Normalize magnitude by FFT size
            let magnitude = self.fft_buffer[i].norm() / FFT_SIZE as f32;

            // Smooth in the linear domain before converting to dB
            let smoothed = self.previous_magnitudes[i] * self.smoothing
                + magnitude * (1.0 - self.smoothing);
            self.previous_magnitudes[i] = smoothed;

            let db = 20.0 * smoothed.max(1e-10).log10();
            let normalized = ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0);
            *bin = (normalized * 255.0) as u8;
        }

        data
    }

    /// Reset smoothing state (e.g. after the tap's source is replaced)
    pub fn reset(&mut self) {
        self.previous_magnitudes = [0.0; SPECTRUM_BINS];
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A sine landing exactly on `bin`, quiet enough that neither the bin
    /// nor its window-leakage neighbors clip the dB ceiling
    fn sine_at_bin(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn silence_reads_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        let data = analyzer.analyze(&vec![0.0; FFT_SIZE]);
        assert!(data.bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn sine_peaks_in_expected_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        let samples = sine_at_bin(10, 0.05);

        // Run several buffers so smoothing converges
        let mut data = FrequencyData::default();
        for _ in 0..20 {
            data = analyzer.analyze(&samples);
        }

        let peak_bin = data
            .bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 10);
        assert!(data.bins[10] > 200, "tone bin should read hot");
    }

    #[test]
    fn smoothing_rises_gradually() {
        let mut analyzer = SpectrumAnalyzer::new();
        let samples = sine_at_bin(4, 0.05);

        let first = analyzer.analyze(&samples).bins[4];
        let mut last = first;
        for _ in 0..10 {
            last = analyzer.analyze(&samples).bins[4];
        }
        assert!(last >= first, "smoothed magnitude should not decay under a steady signal");
    }

    #[test]
    fn short_buffer_is_zero_padded() {
        let mut analyzer = SpectrumAnalyzer::new();
        // Should not panic with fewer samples than the FFT size
        let data = analyzer.analyze(&[0.5; 64]);
        assert_eq!(data.bins.len(), SPECTRUM_BINS);
    }

    #[test]
    fn bass_energy_averages_low_bins() {
        let mut data = FrequencyData::default();
        for bin in data.bins[..5].iter_mut() {
            *bin = 100;
        }
        assert!((data.bass_energy() - 100.0).abs() < f32::EPSILON);
    }
}
