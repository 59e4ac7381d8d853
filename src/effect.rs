//! Spectral transformers: phase vocoder stream in, phase vocoder stream out.

use super::math::{clamp01, db_amp};
use super::setting::Setting;
use super::shared::Param;
use super::stream::{geometry, PvStream};
use dyn_clone::DynClone;
use log::debug;

/// A spectral stream transformer.
///
/// Transformers consume one stream and produce one stream of the same
/// geometry. The upstream schedule is mirrored through, so consumers of
/// the output see the analyzer's hop timing unchanged, and the round-robin
/// slot is recovered from the schedule rather than shared. Parameters are
/// re-read on every hop.
pub trait PvTransform: DynClone + Send + Sync {
    /// Reset internal state without reallocating.
    fn reset(&mut self);

    /// Apply a setting. Settings for other node kinds are ignored.
    fn set(&mut self, setting: Setting);

    /// Transform `size` samples' worth of schedule from `input`, running
    /// the spectral mapping once per signalled hop. Adopts the upstream
    /// geometry if it changed since the last block.
    fn process(&mut self, size: usize, input: &PvStream);

    /// The transformed output stream.
    fn output(&self) -> &PvStream;
}

dyn_clone::clone_trait_object!(PvTransform);

/// State common to all transformers: the owned output stream and the
/// round-robin hop slot recovered from the upstream schedule.
#[derive(Clone)]
struct TransformCore {
    size: usize,
    olaps: usize,
    half: usize,
    overcount: usize,
    stream: PvStream,
}

impl TransformCore {
    fn new(block_size: usize, size: usize, olaps: usize) -> Self {
        let size = geometry("fft size", size).max(4);
        let olaps = geometry("overlaps", olaps).min(size);
        Self {
            size,
            olaps,
            half: size / 2,
            overcount: 0,
            stream: PvStream::new(block_size, size, olaps),
        }
    }

    /// Adopt the upstream geometry. Returns whether it changed.
    fn adopt(&mut self, input: &PvStream) -> bool {
        if input.fft_size() == self.size && input.olaps() == self.olaps {
            return false;
        }
        debug!(
            "adopting upstream geometry: size {} overlaps {}",
            input.fft_size(),
            input.olaps()
        );
        self.size = input.fft_size();
        self.olaps = input.olaps();
        self.half = self.size / 2;
        self.stream.reallocate(self.size, self.olaps);
        self.overcount = 0;
        true
    }

    #[inline]
    fn advance(&mut self) {
        self.overcount = (self.overcount + 1) % self.olaps;
    }

    fn reset(&mut self) {
        self.stream.clear();
        self.overcount = 0;
    }
}

/// Spectral transposition by a factor.
///
/// Each source bin `k` lands on bin `floor(k * transpo)`; magnitudes of
/// colliding bins accumulate while the frequency of the last writer wins,
/// and bins transposed past the top of the spectrum are dropped.
#[derive(Clone)]
pub struct PvTranspose {
    core: TransformCore,
    transpo: Param,
}

impl PvTranspose {
    pub fn new(
        block_size: usize,
        size: usize,
        olaps: usize,
        transpo: impl Into<Param>,
    ) -> Self {
        Self {
            core: TransformCore::new(block_size, size, olaps),
            transpo: transpo.into(),
        }
    }

    /// Set the transposition factor. Negative factors read as zero.
    pub fn set_transpo(&mut self, transpo: impl Into<Param>) {
        self.transpo = transpo.into();
    }
}

impl PvTransform for PvTranspose {
    fn reset(&mut self) {
        self.core.reset();
    }

    fn set(&mut self, setting: Setting) {
        if let Setting::Transpo(transpo) = setting {
            self.set_transpo(transpo);
        }
    }

    fn process(&mut self, size: usize, input: &PvStream) {
        self.core.adopt(input);
        self.core.stream.mirror_count(input, size);
        for i in 0..size {
            if input.is_hop(i) {
                let transpo = self.transpo.value().max(0.0);
                let row = self.core.overcount;
                let half = self.core.half;
                let magn_in = input.magn_row(row);
                let freq_in = input.freq_row(row);
                self.core.stream.clear_row(row);
                let (magn_out, freq_out) = self.core.stream.rows_mut(row);
                for k in 0..half {
                    let j = (k as f32 * transpo) as usize;
                    if j < half {
                        magn_out[j] += magn_in[k];
                        freq_out[j] = freq_in[k] * transpo;
                    }
                }
                self.core.advance();
            }
        }
    }

    fn output(&self) -> &PvStream {
        &self.core.stream
    }
}

/// Spectral reverberation.
///
/// Rising bin magnitudes are followed instantly; falling magnitudes decay
/// exponentially toward the input, slower for `revtime` near one and, with
/// damping below one, faster toward the top of the spectrum. Frequencies
/// pass through.
#[derive(Clone)]
pub struct PvVerb {
    core: TransformCore,
    revtime: Param,
    damp: Param,
    last_magn: Vec<f32>,
}

impl PvVerb {
    pub fn new(
        block_size: usize,
        size: usize,
        olaps: usize,
        revtime: impl Into<Param>,
        damp: impl Into<Param>,
    ) -> Self {
        let core = TransformCore::new(block_size, size, olaps);
        let half = core.half;
        Self {
            core,
            revtime: revtime.into(),
            damp: damp.into(),
            last_magn: vec![0.0; half],
        }
    }

    /// Set the reverberation time in 0...1.
    pub fn set_revtime(&mut self, revtime: impl Into<Param>) {
        self.revtime = revtime.into();
    }

    /// Set the high frequency damping in 0...1.
    pub fn set_damp(&mut self, damp: impl Into<Param>) {
        self.damp = damp.into();
    }
}

impl PvTransform for PvVerb {
    fn reset(&mut self) {
        self.core.reset();
        self.last_magn.fill(0.0);
    }

    fn set(&mut self, setting: Setting) {
        match setting {
            Setting::RevTime(revtime) => self.set_revtime(revtime),
            Setting::Damp(damp) => self.set_damp(damp),
            _ => (),
        }
    }

    fn process(&mut self, size: usize, input: &PvStream) {
        if self.core.adopt(input) {
            self.last_magn = vec![0.0; self.core.half];
        }
        self.core.stream.mirror_count(input, size);
        for i in 0..size {
            if input.is_hop(i) {
                let decay = 0.75 + 0.25 * clamp01(self.revtime.value());
                let damp = 0.997 + 0.003 * clamp01(self.damp.value());
                let row = self.core.overcount;
                let half = self.core.half;
                let magn_in = input.magn_row(row);
                let freq_in = input.freq_row(row);
                let (magn_out, freq_out) = self.core.stream.rows_mut(row);
                let mut amp = 1.0_f32;
                for k in 0..half {
                    let m = magn_in[k];
                    let out = if m > self.last_magn[k] {
                        m
                    } else {
                        m + (self.last_magn[k] - m) * decay * amp
                    };
                    self.last_magn[k] = out;
                    magn_out[k] = out;
                    freq_out[k] = freq_in[k];
                    amp *= damp;
                }
                self.core.advance();
            }
        }
    }

    fn output(&self) -> &PvStream {
        &self.core.stream
    }
}

/// Spectral gate.
///
/// Bins whose magnitude falls below the threshold are scaled by `damp`;
/// the rest pass unchanged, as do all frequencies.
#[derive(Clone)]
pub struct PvGate {
    core: TransformCore,
    thresh: Param,
    damp: Param,
}

impl PvGate {
    pub fn new(
        block_size: usize,
        size: usize,
        olaps: usize,
        thresh: impl Into<Param>,
        damp: impl Into<Param>,
    ) -> Self {
        Self {
            core: TransformCore::new(block_size, size, olaps),
            thresh: thresh.into(),
            damp: damp.into(),
        }
    }

    /// Set the threshold in dB.
    pub fn set_thresh(&mut self, thresh: impl Into<Param>) {
        self.thresh = thresh.into();
    }

    /// Set the attenuation for gated bins in 0...1.
    pub fn set_damp(&mut self, damp: impl Into<Param>) {
        self.damp = damp.into();
    }
}

impl PvTransform for PvGate {
    fn reset(&mut self) {
        self.core.reset();
    }

    fn set(&mut self, setting: Setting) {
        match setting {
            Setting::Thresh(thresh) => self.set_thresh(thresh),
            Setting::Damp(damp) => self.set_damp(damp),
            _ => (),
        }
    }

    fn process(&mut self, size: usize, input: &PvStream) {
        self.core.adopt(input);
        self.core.stream.mirror_count(input, size);
        for i in 0..size {
            if input.is_hop(i) {
                let thresh = db_amp(self.thresh.value());
                let damp = clamp01(self.damp.value());
                let row = self.core.overcount;
                let half = self.core.half;
                let magn_in = input.magn_row(row);
                let freq_in = input.freq_row(row);
                let (magn_out, freq_out) = self.core.stream.rows_mut(row);
                for k in 0..half {
                    let m = magn_in[k];
                    magn_out[k] = if m < thresh { m * damp } else { m };
                    freq_out[k] = freq_in[k];
                }
                self.core.advance();
            }
        }
    }

    fn output(&self) -> &PvStream {
        &self.core.stream
    }
}
