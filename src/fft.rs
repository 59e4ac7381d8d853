//! Interface to realfft.

use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Forward and inverse real FFT plans for one transform size.
///
/// The forward transform maps `size` real samples to `size / 2 + 1`
/// complex bins; bin 0 is DC and bin `size / 2` is Nyquist, both with zero
/// imaginary part. The inverse transform is scaled by `1 / size` so that a
/// forward-inverse round trip reproduces its input.
#[derive(Clone)]
pub struct RealFft {
    size: usize,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    scratch: Vec<Complex32>,
}

impl RealFft {
    /// Create plans for transforms of length `size`.
    /// The length must be a power of two and at least four.
    pub fn new(size: usize) -> Self {
        assert!(size >= 4 && size.is_power_of_two());
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_scratch_len()
            .max(inverse.get_scratch_len());
        Self {
            size,
            forward,
            inverse,
            scratch: vec![Complex32::default(); scratch_len],
        }
    }

    /// Transform length in samples.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of `input` into `spectrum`.
    /// `input` has length `size` and is consumed as scratch space;
    /// `spectrum` has length `size / 2 + 1`.
    pub fn forward(&mut self, input: &mut [f32], spectrum: &mut [Complex32]) {
        self.forward
            .process_with_scratch(input, spectrum, &mut self.scratch)
            .expect("forward FFT buffer lengths");
    }

    /// Inverse transform of `spectrum` into `output`, scaled by `1 / size`.
    /// `spectrum` has length `size / 2 + 1` and is consumed as scratch
    /// space; the DC and Nyquist bins must have zero imaginary part.
    /// `output` has length `size`.
    pub fn inverse(&mut self, spectrum: &mut [Complex32], output: &mut [f32]) {
        self.inverse
            .process_with_scratch(spectrum, output, &mut self.scratch)
            .expect("inverse FFT buffer lengths");
        let norm = 1.0 / self.size as f32;
        for x in output.iter_mut() {
            *x *= norm;
        }
    }
}
