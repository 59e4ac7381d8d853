//! Window function tables.

use core::f32::consts::{PI, TAU};
use log::warn;

/// Window function kinds.
///
/// Hosts address window kinds by number; the numbering is part of the
/// public contract and [`Windower::from_index`] converts back, falling back
/// to `Hanning` for numbers outside the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Windower {
    Rectangular = 0,
    Hamming = 1,
    #[default]
    Hanning = 2,
    Bartlett = 3,
    Blackman = 4,
    BlackmanHarris4 = 5,
    BlackmanHarris7 = 6,
    Tuckey = 7,
    Sine = 8,
}

impl Windower {
    /// Window kind for numeric index `index`.
    /// Unknown indices fall back to `Hanning` with a warning.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Windower::Rectangular,
            1 => Windower::Hamming,
            2 => Windower::Hanning,
            3 => Windower::Bartlett,
            4 => Windower::Blackman,
            5 => Windower::BlackmanHarris4,
            6 => Windower::BlackmanHarris7,
            7 => Windower::Tuckey,
            8 => Windower::Sine,
            _ => {
                warn!("unknown window kind {index}, using Hanning");
                Windower::Hanning
            }
        }
    }

    /// Fill `table` with this window.
    ///
    /// Windows are periodic (computed over the table length, not length
    /// minus one), which is the form overlap-add resynthesis needs.
    pub fn fill(&self, table: &mut [f32]) {
        let n = table.len() as f32;
        match self {
            Windower::Rectangular => table.fill(1.0),
            Windower::Hamming => {
                for (k, x) in table.iter_mut().enumerate() {
                    *x = 0.54 - 0.46 * (TAU * k as f32 / n).cos();
                }
            }
            Windower::Hanning => {
                for (k, x) in table.iter_mut().enumerate() {
                    *x = 0.5 - 0.5 * (TAU * k as f32 / n).cos();
                }
            }
            Windower::Bartlett => {
                for (k, x) in table.iter_mut().enumerate() {
                    *x = 1.0 - (2.0 * k as f32 / n - 1.0).abs();
                }
            }
            Windower::Blackman => {
                for (k, x) in table.iter_mut().enumerate() {
                    let arg = TAU * k as f32 / n;
                    *x = 0.42 - 0.5 * arg.cos() + 0.08 * (2.0 * arg).cos();
                }
            }
            Windower::BlackmanHarris4 => {
                for (k, x) in table.iter_mut().enumerate() {
                    let arg = TAU * k as f32 / n;
                    *x = 0.35875 - 0.48829 * arg.cos() + 0.14128 * (2.0 * arg).cos()
                        - 0.01168 * (3.0 * arg).cos();
                }
            }
            Windower::BlackmanHarris7 => {
                for (k, x) in table.iter_mut().enumerate() {
                    let arg = TAU * k as f32 / n;
                    *x = 0.2712203606 - 0.4334446123 * arg.cos()
                        + 0.21800412 * (2.0 * arg).cos()
                        - 0.0657853433 * (3.0 * arg).cos()
                        + 0.0107618673 * (4.0 * arg).cos()
                        - 0.0007700127 * (5.0 * arg).cos()
                        + 0.00001368088 * (6.0 * arg).cos();
                }
            }
            Windower::Tuckey => {
                // Tapered cosine with half the span flat.
                let taper = n / 4.0;
                for (k, x) in table.iter_mut().enumerate() {
                    let k = k as f32;
                    *x = if k < taper {
                        0.5 * (1.0 + (PI * (k / taper - 1.0)).cos())
                    } else if k < n - taper {
                        1.0
                    } else {
                        0.5 * (1.0 + (PI * (k - n + taper) / taper).cos())
                    };
                }
            }
            Windower::Sine => {
                for (k, x) in table.iter_mut().enumerate() {
                    *x = (PI * k as f32 / n).sin();
                }
            }
        }
    }
}
