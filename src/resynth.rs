//! Frequency domain resynthesis: phase vocoder stream in, time domain out.

// For more information on this technique, see
// "Fourier analysis and reconstruction of audio signals" at
// http://msp.ucsd.edu/techniques/v0.11/book-html/node172.html

use super::fft::RealFft;
use super::math::wrap_phase;
use super::setting::Setting;
use super::stream::{geometry, PvStream};
use super::window::Windower;
use core::f64::consts::TAU as TAU64;
use log::debug;
use num_complex::Complex32;

/// Streaming phase vocoder synthesizer.
///
/// On every hop signalled by the upstream schedule, each bin's true
/// frequency is converted back to a phase increment and accumulated, the
/// resulting spectrum is inverse transformed, counter-rotated, windowed and
/// overlap-added into an accumulator scaled by `1 / sqrt(olaps)`. Between
/// hops the node emits one finished sample per input sample.
///
/// An analyzer-synthesizer chain reproduces its input one full window of
/// samples late: the analyzer's input latency plus one hop of overlap-add.
/// If the upstream geometry changes between blocks, the synthesizer adopts
/// it at the start of the next block.
#[derive(Clone)]
pub struct PvSynth {
    size: usize,
    olaps: usize,
    wintype: Windower,
    sample_rate: f64,
    hop: usize,
    half: usize,
    latency: usize,
    /// Converts Hz to phase increment per hop.
    factor: f32,
    /// Bin center spacing in Hz.
    scale: f32,
    /// Overlap-add amplitude compensation.
    ampscl: f32,
    window: Vec<f32>,
    sum_phase: Vec<f32>,
    spectrum: Vec<Complex32>,
    outframe: Vec<f32>,
    /// Overlap-add accumulator, one window plus one hop long. Only the
    /// first window span is ever written, so the tail stays zero and
    /// shifting it in clears the freshly exposed span.
    accum: Vec<f32>,
    /// Finished samples for the current hop.
    emit: Vec<f32>,
    fft: RealFft,
    overcount: usize,
}

impl PvSynth {
    /// Create a synthesizer. `size` and `olaps` are starting geometry and
    /// follow the upstream stream thereafter; both round up to powers of
    /// two, `size` is at least four and `olaps` at most `size`.
    pub fn new(sample_rate: f64, size: usize, olaps: usize, wintype: Windower) -> Self {
        let size = geometry("fft size", size).max(4);
        let olaps = geometry("overlaps", olaps).min(size);
        let mut node = Self {
            size,
            olaps,
            wintype,
            sample_rate,
            hop: 0,
            half: 0,
            latency: 0,
            factor: 0.0,
            scale: 0.0,
            ampscl: 0.0,
            window: Vec::new(),
            sum_phase: Vec::new(),
            spectrum: Vec::new(),
            outframe: Vec::new(),
            accum: Vec::new(),
            emit: Vec::new(),
            fft: RealFft::new(size),
            overcount: 0,
        };
        node.allocate();
        node
    }

    /// FFT size in samples.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.size
    }

    /// Overlap count.
    #[inline]
    pub fn olaps(&self) -> usize {
        self.olaps
    }

    /// Window function kind.
    #[inline]
    pub fn wintype(&self) -> Windower {
        self.wintype
    }

    /// Change the window function in place. Phase history is kept.
    pub fn set_wintype(&mut self, wintype: Windower) {
        self.wintype = wintype;
        wintype.fill(&mut self.window);
    }

    /// Set the sample rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.factor = (self.hop as f64 * TAU64 / sample_rate) as f32;
        self.scale = (sample_rate / self.size as f64) as f32;
    }

    /// Apply a setting. Settings for other node kinds are ignored.
    pub fn set(&mut self, setting: Setting) {
        if let Setting::WinType(wintype) = setting {
            self.set_wintype(wintype);
        }
    }

    /// Reset to the initial state without reallocating.
    pub fn reset(&mut self) {
        self.sum_phase.fill(0.0);
        self.outframe.fill(0.0);
        self.accum.fill(0.0);
        self.emit.fill(0.0);
        self.overcount = 0;
    }

    /// Rebuild every geometry-dependent buffer and reset counters.
    fn allocate(&mut self) {
        self.half = self.size / 2;
        self.hop = self.size / self.olaps;
        self.latency = self.size - self.hop;
        self.factor = (self.hop as f64 * TAU64 / self.sample_rate) as f32;
        self.scale = (self.sample_rate / self.size as f64) as f32;
        self.ampscl = 1.0 / (self.olaps as f32).sqrt();
        self.window = vec![0.0; self.size];
        self.wintype.fill(&mut self.window);
        self.sum_phase = vec![0.0; self.half];
        self.spectrum = vec![Complex32::default(); self.half + 1];
        self.outframe = vec![0.0; self.size];
        self.accum = vec![0.0; self.size + self.hop];
        self.emit = vec![0.0; self.hop];
        self.fft = RealFft::new(self.size);
        self.overcount = 0;
    }

    /// Synthesize `size` output samples from `input`, following its
    /// schedule. Adopts the upstream geometry if it changed since the last
    /// block.
    pub fn process(&mut self, size: usize, input: &PvStream, output: &mut [f32]) {
        if input.fft_size() != self.size || input.olaps() != self.olaps {
            debug!(
                "adopting upstream geometry: size {} overlaps {}",
                input.fft_size(),
                input.olaps()
            );
            self.size = input.fft_size();
            self.olaps = input.olaps();
            self.allocate();
        }
        let count = input.count();
        for i in 0..size {
            // A schedule from a producer that has not yet run this session
            // maps outside the hop span; emit silence for those samples.
            output[i] = self
                .emit
                .get(count[i].wrapping_sub(self.latency))
                .copied()
                .unwrap_or(0.0);
            if count[i] == self.size - 1 {
                self.synthesize(input);
            }
        }
    }

    /// One hop: accumulate phases, inverse transform, counter-rotate and
    /// overlap-add.
    fn synthesize(&mut self, input: &PvStream) {
        let magn = input.magn_row(self.overcount);
        let freq = input.freq_row(self.overcount);
        for k in 0..self.half {
            let delta = (freq[k] - k as f32 * self.scale) * self.factor;
            // Wrapping keeps the accumulator small; only the phase modulo
            // 2π is meaningful.
            let phase = wrap_phase(self.sum_phase[k] + delta);
            self.sum_phase[k] = phase;
            let (sin, cos) = phase.sin_cos();
            self.spectrum[k] = Complex32::new(magn[k] * cos, magn[k] * sin);
        }
        self.spectrum[0].im = 0.0;
        self.spectrum[self.half] = Complex32::default();
        self.fft.inverse(&mut self.spectrum, &mut self.outframe);
        let mask = self.size - 1;
        let m = self.hop * self.overcount;
        let ampscl = self.ampscl;
        for k in 0..self.size {
            self.accum[k] += self.outframe[(k + m) & mask] * self.window[k] * ampscl;
        }
        self.emit.copy_from_slice(&self.accum[..self.hop]);
        self.accum.copy_within(self.hop.., 0);
        self.overcount = (self.overcount + 1) % self.olaps;
    }
}
