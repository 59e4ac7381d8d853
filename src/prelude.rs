//! The prelude re-exports the crate surface.

pub use super::analyze::PvAnalyzer;
pub use super::effect::{PvGate, PvTranspose, PvTransform, PvVerb};
pub use super::math::*;
pub use super::net::{NetError, NodeIndex, PvNet};
pub use super::resynth::PvSynth;
pub use super::setting::Setting;
pub use super::shared::{Param, Shared};
pub use super::stream::PvStream;
pub use super::window::Windower;
pub use super::{DEFAULT_BLOCK_SIZE, DEFAULT_SR};
