//! Settings applied to nodes between audio blocks.

use super::window::Windower;
pub use thingbuf::mpsc::blocking::Sender;

/// A parameter or geometry change for one node.
///
/// Settings are posted through the network's control channel (see
/// [`net::PvNet::control`](super::net::PvNet::control)) and drained at the
/// start of the next audio block, so geometry reallocation never happens
/// inside the per-sample path. Nodes ignore settings that do not apply to
/// them.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Setting {
    /// Ignored by every node.
    #[default]
    Null,
    /// FFT size in samples. Rounded up to a power of two.
    Size(usize),
    /// Overlap count. Rounded up to a power of two.
    Olaps(usize),
    /// Window function kind.
    WinType(Windower),
    /// Transposition factor.
    Transpo(f32),
    /// Reverberation time in 0...1.
    RevTime(f32),
    /// High frequency damping in 0...1.
    Damp(f32),
    /// Gate threshold in dB.
    Thresh(f32),
}
