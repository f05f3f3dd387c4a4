//! Crossfade gain law and click-free gain smoothing

use std::f32::consts::FRAC_PI_2;

/// Time constant for channel/master gain smoothing (~20ms)
pub const GAIN_SMOOTHING_SECS: f32 = 0.02;

/// Equal-power crossfade gains for a fader position in [0, 1]
///
/// Returns `(gain_a, gain_b)`. 0.0 is full deck A, 1.0 is full deck B;
/// at the midpoint both gains are sqrt(2)/2 so combined power stays
/// constant across the whole travel (a linear crossfade would dip in the
/// middle).
pub fn crossfade_gains(position: f32) -> (f32, f32) {
    let x = position.clamp(0.0, 1.0);
    ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin())
}

/// A gain stage that approaches its target exponentially
///
/// Gains are never set discontinuously; each rendered frame moves the
/// applied value a fixed fraction toward the target, which keeps fader
/// moves and auto-mix steps free of audible clicks.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedGain {
    current: f32,
    target: f32,
    /// Per-frame smoothing coefficient derived from the time constant
    coeff: f32,
}

impl SmoothedGain {
    /// Create a gain stage at `initial`, smoothing over `tau_secs`
    pub fn new(sample_rate: u32, tau_secs: f32, initial: f32) -> Self {
        let coeff = (-1.0 / (tau_secs * sample_rate as f32)).exp();
        Self {
            current: initial,
            target: initial,
            coeff,
        }
    }

    /// Set the value the stage will smooth toward
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Advance one frame and return the gain to apply
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current = self.coeff * self.current + (1.0 - self.coeff) * self.target;
        self.current
    }
}
