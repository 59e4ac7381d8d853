//! Streaming phase vocoder processing.
//!
//! A pipeline of nodes analyzes a time domain stream into overlapping
//! spectral frames of magnitude and true frequency per bin ([`analyze`]),
//! transforms the frames in the frequency domain ([`effect`]), and
//! resynthesizes audio from them ([`resynth`]). Nodes exchange frames
//! through a shared spectral stream ([`stream`]) and are driven once per
//! audio block by a network ([`net`]) in wiring order.

#![allow(clippy::many_single_char_names)]

pub mod analyze;
pub mod effect;
pub mod fft;
pub mod math;
pub mod net;
pub mod prelude;
pub mod resynth;
pub mod setting;
pub mod shared;
pub mod stream;
pub mod window;

/// Default sample rate in Hz.
pub const DEFAULT_SR: f64 = 44100.0;

/// Default length of an audio block in samples.
pub const DEFAULT_BLOCK_SIZE: usize = 64;
