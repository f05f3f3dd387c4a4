//! 3-band EQ - cascaded shelf and peaking biquad stages

use std::f32::consts::PI;

/// Full-scale EQ range: control value 1.0 maps to +20 dB, -1.0 to -20 dB
pub const EQ_RANGE_DB: f32 = 20.0;

/// Low shelf corner frequency (Hz)
const LOW_SHELF_HZ: f32 = 320.0;
/// Peaking mid center frequency (Hz)
const MID_PEAK_HZ: f32 = 1000.0;
/// Peaking mid Q
const MID_PEAK_Q: f32 = 1.0;
/// High shelf corner frequency (Hz)
const HIGH_SHELF_HZ: f32 = 3200.0;

/// EQ band selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Mid,
    High,
}

/// Filter response shape for one EQ stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    LowShelf,
    Peaking,
    HighShelf,
}

/// One biquad EQ stage with adjustable gain
struct BandFilter {
    shape: Shape,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    gain_db: f32,

    // Biquad coefficients (normalized; a* feedforward, b* feedback)
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,

    // State variables (stereo)
    x1_l: f32,
    x2_l: f32,
    y1_l: f32,
    y2_l: f32,
    x1_r: f32,
    x2_r: f32,
    y1_r: f32,
    y2_r: f32,
}

impl BandFilter {
    fn new(shape: Shape, sample_rate: f32, frequency: f32, q: f32) -> Self {
        let mut filter = Self {
            shape,
            sample_rate,
            frequency,
            q,
            gain_db: 0.0,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            x1_l: 0.0,
            x2_l: 0.0,
            y1_l: 0.0,
            y2_l: 0.0,
            x1_r: 0.0,
            x2_r: 0.0,
            y1_r: 0.0,
            y2_r: 0.0,
        };
        filter.calculate_coefficients();
        filter
    }

    /// Set stage gain in dB and recompute coefficients
    ///
    /// Applied directly, no smoothing: EQ moves are expected to be coarse
    /// knob gestures, unlike the channel gain which rides the crossfader.
    fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        self.calculate_coefficients();
    }

    fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Calculate biquad coefficients based on current parameters
    ///
    /// Standard RBJ audio-EQ forms for low shelf, peaking, and high shelf.
    fn calculate_coefficients(&mut self) {
        let amp = 10.0f32.powf(self.gain_db / 40.0);
        let omega = 2.0 * PI * self.frequency / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();

        match self.shape {
            Shape::Peaking => {
                let alpha = sin_omega / (2.0 * self.q);
                let b0 = 1.0 + alpha * amp;
                let b1 = -2.0 * cos_omega;
                let b2 = 1.0 - alpha * amp;
                let a0 = 1.0 + alpha / amp;
                let a1 = -2.0 * cos_omega;
                let a2 = 1.0 - alpha / amp;

                self.a0 = b0 / a0;
                self.a1 = b1 / a0;
                self.a2 = b2 / a0;
                self.b1 = a1 / a0;
                self.b2 = a2 / a0;
            }
            Shape::LowShelf => {
                // Shelf slope S = 1
                let alpha = sin_omega / 2.0 * std::f32::consts::SQRT_2;
                let beta = 2.0 * amp.sqrt() * alpha;

                let b0 = amp * ((amp + 1.0) - (amp - 1.0) * cos_omega + beta);
                let b1 = 2.0 * amp * ((amp - 1.0) - (amp + 1.0) * cos_omega);
                let b2 = amp * ((amp + 1.0) - (amp - 1.0) * cos_omega - beta);
                let a0 = (amp + 1.0) + (amp - 1.0) * cos_omega + beta;
                let a1 = -2.0 * ((amp - 1.0) + (amp + 1.0) * cos_omega);
                let a2 = (amp + 1.0) + (amp - 1.0) * cos_omega - beta;

                self.a0 = b0 / a0;
                self.a1 = b1 / a0;
                self.a2 = b2 / a0;
                self.b1 = a1 / a0;
                self.b2 = a2 / a0;
            }
            Shape::HighShelf => {
                let alpha = sin_omega / 2.0 * std::f32::consts::SQRT_2;
                let beta = 2.0 * amp.sqrt() * alpha;

                let b0 = amp * ((amp + 1.0) + (amp - 1.0) * cos_omega + beta);
                let b1 = -2.0 * amp * ((amp - 1.0) + (amp + 1.0) * cos_omega);
                let b2 = amp * ((amp + 1.0) + (amp - 1.0) * cos_omega - beta);
                let a0 = (amp + 1.0) - (amp - 1.0) * cos_omega + beta;
                let a1 = 2.0 * ((amp - 1.0) - (amp + 1.0) * cos_omega);
                let a2 = (amp + 1.0) - (amp - 1.0) * cos_omega - beta;

                self.a0 = b0 / a0;
                self.a1 = b1 / a0;
                self.a2 = b2 / a0;
                self.b1 = a1 / a0;
                self.b2 = a2 / a0;
            }
        }
    }

    /// Process a single sample for one channel
    fn process_sample(&mut self, input: f32, is_right: bool) -> f32 {
        let (x1, x2, y1, y2) = if is_right {
            (
                &mut self.x1_r,
                &mut self.x2_r,
                &mut self.y1_r,
                &mut self.y2_r,
            )
        } else {
            (
                &mut self.x1_l,
                &mut self.x2_l,
                &mut self.y1_l,
                &mut self.y2_l,
            )
        };

        let output =
            self.a0 * input + self.a1 * *x1 + self.a2 * *x2 - self.b1 * *y1 - self.b2 * *y2;

        *x2 = *x1;
        *x1 = input;
        *y2 = *y1;
        *y1 = output;

        output
    }

    /// Process interleaved stereo samples in place
    fn process(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_mut(2) {
            if frame.len() == 2 {
                frame[0] = self.process_sample(frame[0], false);
                frame[1] = self.process_sample(frame[1], true);
            }
        }
    }

    fn reset(&mut self) {
        self.x1_l = 0.0;
        self.x2_l = 0.0;
        self.y1_l = 0.0;
        self.y2_l = 0.0;
        self.x1_r = 0.0;
        self.x2_r = 0.0;
        self.y1_r = 0.0;
        self.y2_r = 0.0;
    }
}

/// Fixed 3-band EQ: low shelf -> peaking mid -> high shelf, in series
pub struct ThreeBandEq {
    low: BandFilter,
    mid: BandFilter,
    high: BandFilter,
}

impl ThreeBandEq {
    pub fn new(sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        Self {
            low: BandFilter::new(Shape::LowShelf, sr, LOW_SHELF_HZ, MID_PEAK_Q),
            mid: BandFilter::new(Shape::Peaking, sr, MID_PEAK_HZ, MID_PEAK_Q),
            high: BandFilter::new(Shape::HighShelf, sr, HIGH_SHELF_HZ, MID_PEAK_Q),
        }
    }

    /// Set a band from a control value in [-1, 1]
    ///
    /// The value maps linearly onto +/-20 dB; out-of-range input clamps.
    pub fn set(&mut self, band: Band, value: f32) {
        let gain_db = value.clamp(-1.0, 1.0) * EQ_RANGE_DB;
        self.stage_mut(band).set_gain_db(gain_db);
    }

    /// Current gain of a band in dB
    pub fn gain_db(&self, band: Band) -> f32 {
        self.stage(band).gain_db()
    }

    /// Process interleaved stereo samples through all three stages
    pub fn process(&mut self, samples: &mut [f32]) {
        self.low.process(samples);
        self.mid.process(samples);
        self.high.process(samples);
    }

    /// Clear filter state (on media replacement)
    pub fn reset(&mut self) {
        self.low.reset();
        self.mid.reset();
        self.high.reset();
    }

    fn stage(&self, band: Band) -> &BandFilter {
        match band {
            Band::Low => &self.low,
            Band::Mid => &self.mid,
            Band::High => &self.high,
        }
    }

    fn stage_mut(&mut self, band: Band) -> &mut BandFilter {
        match band {
            Band::Low => &mut self.low,
            Band::Mid => &mut self.mid,
            Band::High => &mut self.high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn stereo_sine(freq: f32, sample_rate: f32, frames: usize) -> Vec<f32> {
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let s = (2.0 * PI * freq * i as f32 / sample_rate).sin() * 0.5;
            samples.push(s);
            samples.push(s);
        }
        samples
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn control_value_maps_linearly_to_db() {
        let mut eq = ThreeBandEq::new(48000);
        for (value, expected) in [(1.0, 20.0), (-1.0, -20.0), (0.5, 10.0), (0.0, 0.0)] {
            eq.set(Band::Mid, value);
            assert_eq!(eq.gain_db(Band::Mid), expected);
        }
    }

    #[test]
    fn out_of_range_values_clamp() {
        let mut eq = ThreeBandEq::new(48000);
        eq.set(Band::Low, 3.0);
        assert_eq!(eq.gain_db(Band::Low), EQ_RANGE_DB);
        eq.set(Band::High, -2.5);
        assert_eq!(eq.gain_db(Band::High), -EQ_RANGE_DB);
    }

    #[test]
    fn flat_eq_is_passthrough() {
        let mut eq = ThreeBandEq::new(48000);
        let original = stereo_sine(440.0, 48000.0, 512);
        let mut samples = original.clone();
        eq.process(&mut samples);

        for (a, b) in samples.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-5, "flat EQ altered the signal");
        }
    }

    #[test]
    fn low_boost_raises_bass_energy() {
        let mut eq = ThreeBandEq::new(48000);
        let original = stereo_sine(80.0, 48000.0, 4096);

        let mut boosted = original.clone();
        eq.set(Band::Low, 1.0);
        eq.process(&mut boosted);

        // Skip the transient at the start of the filter response
        assert!(rms(&boosted[1024..]) > rms(&original[1024..]) * 2.0);
    }

    #[test]
    fn high_cut_attenuates_treble() {
        let mut eq = ThreeBandEq::new(48000);
        let original = stereo_sine(12000.0, 48000.0, 4096);

        let mut cut = original.clone();
        eq.set(Band::High, -1.0);
        eq.process(&mut cut);

        assert!(rms(&cut[1024..]) < rms(&original[1024..]) * 0.5);
    }

    #[test]
    fn bands_are_independent() {
        let mut eq = ThreeBandEq::new(48000);
        eq.set(Band::Low, 0.8);
        assert_eq!(eq.gain_db(Band::Mid), 0.0);
        assert_eq!(eq.gain_db(Band::High), 0.0);
        assert_eq!(eq.gain_db(Band::Low), 0.8 * EQ_RANGE_DB);
    }
}
