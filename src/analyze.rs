//! Spectral analysis: time domain in, phase vocoder stream out.

use super::fft::RealFft;
use super::math::wrap_phase;
use super::setting::Setting;
use super::stream::{geometry, PvStream};
use super::window::Windower;
use core::f32::consts::TAU;
use core::f64::consts::TAU as TAU64;
use num_complex::Complex32;

/// Streaming phase vocoder analyzer.
///
/// Samples are appended to a sliding ring of `size` samples. Every
/// `size / olaps` samples the ring is windowed, rotated to a common phase
/// reference and transformed; each bin's magnitude and true frequency
/// (bin deviation recovered from the inter-frame phase difference) are
/// published into one hop slot of the output [`PvStream`].
///
/// The ring starts `size - size / olaps` samples into its span, so the
/// first frame fires after one hop of input; those leading samples read as
/// silence and the first `olaps` frames ramp up from it.
#[derive(Clone)]
pub struct PvAnalyzer {
    size: usize,
    olaps: usize,
    wintype: Windower,
    sample_rate: f64,
    hop: usize,
    half: usize,
    latency: usize,
    /// Converts phase difference per hop to Hz.
    factor: f32,
    /// Expected phase advance of bin 1 per hop.
    scale: f32,
    window: Vec<f32>,
    ring: Vec<f32>,
    inframe: Vec<f32>,
    spectrum: Vec<Complex32>,
    last_phase: Vec<f32>,
    fft: RealFft,
    overcount: usize,
    incount: usize,
    stream: PvStream,
}

impl PvAnalyzer {
    /// Create an analyzer for audio blocks of `block_size` samples.
    /// `size` and `olaps` are rounded up to powers of two; `size` is at
    /// least four and `olaps` at most `size`.
    pub fn new(
        sample_rate: f64,
        block_size: usize,
        size: usize,
        olaps: usize,
        wintype: Windower,
    ) -> Self {
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
            window: Vec::new(),
            ring: Vec::new(),
            inframe: Vec::new(),
            spectrum: Vec::new(),
            last_phase: Vec::new(),
            fft: RealFft::new(size),
            overcount: 0,
            incount: 0,
            stream: PvStream::new(block_size, size, olaps),
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

    /// Input latency in samples: a full window minus one hop.
    #[inline]
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// The spectral output stream.
    #[inline]
    pub fn output(&self) -> &PvStream {
        &self.stream
    }

    /// Set the FFT size. Reallocates and discards phase history.
    pub fn set_size(&mut self, size: usize) {
        self.size = geometry("fft size", size).max(4);
        self.olaps = self.olaps.min(self.size);
        self.allocate();
    }

    /// Set the overlap count. Reallocates and discards phase history.
    pub fn set_olaps(&mut self, olaps: usize) {
        self.olaps = geometry("overlaps", olaps).min(self.size);
        self.allocate();
    }

    /// Change the window function in place. Phase history is kept.
    pub fn set_wintype(&mut self, wintype: Windower) {
        self.wintype = wintype;
        wintype.fill(&mut self.window);
    }

    /// Set the sample rate in Hz. Affects published frequencies only.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.factor = (sample_rate / (self.hop as f64 * TAU64)) as f32;
    }

    /// Apply a setting. Settings for other node kinds are ignored.
    pub fn set(&mut self, setting: Setting) {
        match setting {
            Setting::Size(size) => self.set_size(size),
            Setting::Olaps(olaps) => self.set_olaps(olaps),
            Setting::WinType(wintype) => self.set_wintype(wintype),
            _ => (),
        }
    }

    /// Reset to the initial state without reallocating.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.inframe.fill(0.0);
        self.last_phase.fill(0.0);
        self.stream.clear();
        self.overcount = 0;
        self.incount = self.latency;
    }

    /// Rebuild every geometry-dependent buffer and reset counters.
    fn allocate(&mut self) {
        self.half = self.size / 2;
        self.hop = self.size / self.olaps;
        self.latency = self.size - self.hop;
        self.factor = (self.sample_rate / (self.hop as f64 * TAU64)) as f32;
        self.scale = TAU * self.hop as f32 / self.size as f32;
        self.window = vec![0.0; self.size];
        self.wintype.fill(&mut self.window);
        self.ring = vec![0.0; self.size];
        self.inframe = vec![0.0; self.size];
        self.spectrum = vec![Complex32::default(); self.half + 1];
        self.last_phase = vec![0.0; self.half];
        self.fft = RealFft::new(self.size);
        self.stream.reallocate(self.size, self.olaps);
        self.overcount = 0;
        self.incount = self.latency;
    }

    /// Analyze one block of input samples, publishing the schedule and any
    /// completed hops into the output stream.
    pub fn process(&mut self, input: &[f32]) {
        debug_assert!(input.len() <= self.stream.block_size());
        for (i, &sample) in input.iter().enumerate() {
            self.ring[self.incount] = sample;
            self.stream.set_count(i, self.incount);
            self.incount += 1;
            if self.incount == self.size {
                self.analyze();
                self.incount = self.latency;
            }
        }
    }

    /// One hop: window, rotate, transform, unwrap phases into frequencies.
    fn analyze(&mut self) {
        let mask = self.size - 1;
        // Rotating by the hop offset keeps all slots of the round robin on
        // a common phase reference, so inter-frame deltas need no expected
        // advance subtracted.
        let m = self.hop * self.overcount;
        for k in 0..self.size {
            self.inframe[(k + m) & mask] = self.ring[k] * self.window[k];
        }
        self.fft.forward(&mut self.inframe, &mut self.spectrum);
        let factor = self.factor;
        let scale = self.scale;
        let (magn, freq) = self.stream.rows_mut(self.overcount);
        for k in 0..self.half {
            let bin = self.spectrum[k];
            let mag = (bin.re * bin.re + bin.im * bin.im).sqrt();
            let phase = bin.im.atan2(bin.re);
            let delta = wrap_phase(phase - self.last_phase[k]);
            self.last_phase[k] = phase;
            magn[k] = mag;
            freq[k] = (delta + k as f32 * scale) * factor;
        }
        self.ring.copy_within(self.hop.., 0);
        self.overcount = (self.overcount + 1) % self.olaps;
    }
}
