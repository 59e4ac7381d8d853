//! The shared spectral stream exchanged between phase vocoder nodes.

use super::math::ceil_pow2;
use log::warn;

/// Spectral frames published by a producer node and read by its consumers.
///
/// A stream holds `olaps` hop slots of `bins` magnitudes and true
/// frequencies (Hz) in a round robin, plus a per-sample schedule: for each
/// sample of the current audio block, the producer's input write cursor.
/// A schedule value of `fft_size - 1` marks the sample at which a fresh
/// hop was published; consumers use that signal to recover the round-robin
/// slot themselves, so no mutable index is shared between nodes.
///
/// The producer owns the stream and is its only writer; consumers borrow
/// it for the duration of one block and see a stable snapshot.
#[derive(Clone)]
pub struct PvStream {
    size: usize,
    olaps: usize,
    half: usize,
    magn: Vec<f32>,
    freq: Vec<f32>,
    count: Vec<usize>,
}

impl PvStream {
    pub(crate) fn new(block_size: usize, size: usize, olaps: usize) -> Self {
        let half = size / 2;
        Self {
            size,
            olaps,
            half,
            magn: vec![0.0; olaps * half],
            freq: vec![0.0; olaps * half],
            count: vec![0; block_size],
        }
    }

    /// FFT size of the stream geometry.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.size
    }

    /// Number of overlapping hop slots.
    #[inline]
    pub fn olaps(&self) -> usize {
        self.olaps
    }

    /// Number of bins per hop slot (half the FFT size).
    #[inline]
    pub fn bins(&self) -> usize {
        self.half
    }

    /// Magnitudes of hop slot `row`.
    #[inline]
    pub fn magn_row(&self, row: usize) -> &[f32] {
        &self.magn[row * self.half..(row + 1) * self.half]
    }

    /// True frequencies in Hz of hop slot `row`.
    #[inline]
    pub fn freq_row(&self, row: usize) -> &[f32] {
        &self.freq[row * self.half..(row + 1) * self.half]
    }

    /// Per-sample write cursor schedule of the current block.
    #[inline]
    pub fn count(&self) -> &[usize] {
        &self.count
    }

    /// Whether a fresh hop was published at sample `i` of the current block.
    #[inline]
    pub fn is_hop(&self, i: usize) -> bool {
        self.count[i] == self.size - 1
    }

    /// Length of the audio block this stream is scheduled for.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.count.len()
    }

    /// Reallocate for new geometry and zero all frames and the schedule.
    pub(crate) fn reallocate(&mut self, size: usize, olaps: usize) {
        self.size = size;
        self.olaps = olaps;
        self.half = size / 2;
        self.magn = vec![0.0; olaps * self.half];
        self.freq = vec![0.0; olaps * self.half];
        self.count.fill(0);
    }

    /// Zero all frames and the schedule without reallocating.
    pub(crate) fn clear(&mut self) {
        self.magn.fill(0.0);
        self.freq.fill(0.0);
        self.count.fill(0);
    }

    #[inline]
    pub(crate) fn set_count(&mut self, i: usize, value: usize) {
        self.count[i] = value;
    }

    /// Copy the first `size` schedule entries from `other`.
    #[inline]
    pub(crate) fn mirror_count(&mut self, other: &PvStream, size: usize) {
        self.count[..size].copy_from_slice(&other.count[..size]);
    }

    /// Mutable magnitude and frequency rows of hop slot `row`.
    #[inline]
    pub(crate) fn rows_mut(&mut self, row: usize) -> (&mut [f32], &mut [f32]) {
        let span = row * self.half..(row + 1) * self.half;
        (&mut self.magn[span.clone()], &mut self.freq[span])
    }

    /// Zero hop slot `row`.
    pub(crate) fn clear_row(&mut self, row: usize) {
        let (magn, freq) = self.rows_mut(row);
        magn.fill(0.0);
        freq.fill(0.0);
    }
}

/// Round a geometry parameter up to a power of two, warning on substitution.
pub(crate) fn geometry(label: &str, n: usize) -> usize {
    let p = ceil_pow2(n);
    if p != n {
        warn!("{label} {n} is not a power of two, using {p}");
    }
    p
}
