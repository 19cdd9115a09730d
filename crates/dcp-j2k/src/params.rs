//! Encoding parameters derived from a bandwidth budget.

use std::fmt;

/// Digital cinema codestream profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// DCI 2K (`Rsiz = 3`).
    Cinema2k,
    /// DCI 4K (`Rsiz = 4`).
    Cinema4k,
}

impl Profile {
    /// Value of the SIZ marker's `Rsiz` field.
    pub const fn rsiz(&self) -> u16 {
        match self {
            Profile::Cinema2k => 0x0003,
            Profile::Cinema4k => 0x0004,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Cinema2k => f.write_str("Cinema 2K"),
            Profile::Cinema4k => f.write_str("Cinema 4K"),
        }
    }
}

/// Parameters handed to the encoder for one frame.
///
/// # Example
///
/// ```rust
/// use dcp_j2k::{CompressParams, Profile};
///
/// // 250 Mbit/s at 24 fps, stereo
/// let p = CompressParams::new(250_000_000, 24, true, false);
/// assert_eq!(p.max_cs_size, 651_041);
/// assert_eq!(p.profile, Profile::Cinema2k);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    /// Maximum codestream size in bytes.
    pub max_cs_size: i64,
    /// Maximum size of any one component in bytes.
    pub max_comp_size: i64,
    /// Number of resolution levels (decompositions + 1).
    pub numresolution: u32,
    /// Codestream profile.
    pub profile: Profile,
    /// Guard bits.
    pub numgbits: u32,
    /// Quality layers.
    pub tcp_numlayers: u32,
    /// Multi-component transform enabled.
    pub tcp_mct: bool,
}

impl CompressParams {
    /// Derives parameters from a bandwidth in bits per second.
    ///
    /// Each eye of a stereo pair gets half of the bandwidth.
    pub fn new(bandwidth: i64, frames_per_second: i64, threed: bool, fourk: bool) -> Self {
        let mut max_cs_size = (bandwidth / 8) / frames_per_second;
        if threed {
            max_cs_size /= 2;
        }

        Self {
            max_cs_size,
            max_comp_size: (max_cs_size as f64 / 1.25) as i64,
            numresolution: if fourk { 7 } else { 6 },
            profile: if fourk {
                Profile::Cinema4k
            } else {
                Profile::Cinema2k
            },
            numgbits: if fourk { 2 } else { 1 },
            tcp_numlayers: 1,
            tcp_mct: true,
        }
    }
}
