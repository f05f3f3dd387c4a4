//! Spectrum analysis for Booth - frequency data for visualization
//!
//! Provides the analyser tap used by each deck chain: an FFT over recent
//! post-gain samples, exposed as byte-per-bin magnitudes suitable for
//! spectrum bars and rhythm graphs.

mod spectrum;

pub use spectrum::{FrequencyData, SpectrumAnalyzer, SPECTRUM_BINS};
