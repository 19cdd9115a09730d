//! RGB to XYZ colour conversion descriptions.
//!
//! A [`ColorConversion`] says how to turn gamma-encoded RGB into DCI XYZ:
//! which transfer function decodes the input, which primaries and white the
//! RGB values are relative to, an optional adjusted white to adapt to, and
//! which transfer function encodes the XYZ output.
//!
//! Matrices are derived on demand and not cached here.

use std::fmt;

use dcp_core::{Error, Result};
use dcp_math::{BRADFORD, BRADFORD_INV, Mat3, adapt_matrix};
use dcp_transfer::TransferFunction;

use crate::Chromaticity;

/// YUV to RGB matrix used when decoding YUV sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum YuvToRgb {
    /// ITU-R BT.601
    Rec601,
    /// ITU-R BT.709
    Rec709,
}

impl fmt::Display for YuvToRgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YuvToRgb::Rec601 => f.write_str("Rec. 601"),
            YuvToRgb::Rec709 => f.write_str("Rec. 709"),
        }
    }
}

/// Everything needed to convert between an RGB space and DCI XYZ.
///
/// # Example
///
/// ```rust
/// use dcp_color::ColorConversion;
///
/// let c = ColorConversion::srgb_to_xyz();
/// let m = c.rgb_to_xyz();
/// let white = m * dcp_math::Vec3::ONE;
/// assert!((white.y - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorConversion {
    /// Decodes input RGB code values to linear light.
    pub input: TransferFunction,
    /// YUV matrix for YUV sources.
    pub yuv_to_rgb: YuvToRgb,
    /// Red primary.
    pub red: Chromaticity,
    /// Green primary.
    pub green: Chromaticity,
    /// Blue primary.
    pub blue: Chromaticity,
    /// White point of the RGB space.
    pub white: Chromaticity,
    /// White to adapt to with a Bradford transform, if any.
    pub adjusted_white: Option<Chromaticity>,
    /// Relates linear XYZ to output code values.
    pub output: TransferFunction,
}

// ============================================================================
// Presets
// ============================================================================

const DCI_GAMMA: TransferFunction = TransferFunction::Gamma(2.6);

const SRGB_PRIMARIES: [Chromaticity; 3] = [
    Chromaticity::new(0.64, 0.33),
    Chromaticity::new(0.3, 0.6),
    Chromaticity::new(0.15, 0.06),
];

const fn preset(
    input: TransferFunction,
    yuv_to_rgb: YuvToRgb,
    primaries: [Chromaticity; 3],
    white: Chromaticity,
    output: TransferFunction,
) -> ColorConversion {
    ColorConversion {
        input,
        yuv_to_rgb,
        red: primaries[0],
        green: primaries[1],
        blue: primaries[2],
        white,
        adjusted_white: None,
        output,
    }
}

static SRGB_TO_XYZ: ColorConversion = preset(
    TransferFunction::ModifiedGamma {
        power: 2.4,
        threshold: 0.04045,
        a: 0.055,
        b: 12.92,
    },
    YuvToRgb::Rec601,
    SRGB_PRIMARIES,
    Chromaticity::D65,
    DCI_GAMMA,
);

static REC601_TO_XYZ: ColorConversion = preset(
    TransferFunction::Gamma(2.2),
    YuvToRgb::Rec601,
    SRGB_PRIMARIES,
    Chromaticity::D65,
    DCI_GAMMA,
);

static REC709_TO_XYZ: ColorConversion = preset(
    TransferFunction::Gamma(2.2),
    YuvToRgb::Rec709,
    SRGB_PRIMARIES,
    Chromaticity::D65,
    DCI_GAMMA,
);

static P3_TO_XYZ: ColorConversion = preset(
    TransferFunction::Gamma(2.6),
    YuvToRgb::Rec709,
    [
        Chromaticity::new(0.68, 0.32),
        Chromaticity::new(0.265, 0.69),
        Chromaticity::new(0.15, 0.06),
    ],
    Chromaticity::new(0.314, 0.351),
    DCI_GAMMA,
);

// Rec. 709 primaries with a 2.4 gamma
static REC1886_TO_XYZ: ColorConversion = preset(
    TransferFunction::Gamma(2.4),
    YuvToRgb::Rec709,
    SRGB_PRIMARIES,
    Chromaticity::D65,
    DCI_GAMMA,
);

static REC2020_TO_XYZ: ColorConversion = preset(
    TransferFunction::Gamma(2.4),
    YuvToRgb::Rec709,
    [
        Chromaticity::new(0.708, 0.292),
        Chromaticity::new(0.170, 0.797),
        Chromaticity::new(0.131, 0.046),
    ],
    Chromaticity::D65,
    DCI_GAMMA,
);

static S_GAMUT3_TO_XYZ: ColorConversion = preset(
    TransferFunction::SGamut3,
    YuvToRgb::Rec709,
    [
        Chromaticity::new(0.73, 0.280),
        Chromaticity::new(0.140, 0.855),
        Chromaticity::new(0.100, -0.050),
    ],
    Chromaticity::D65,
    TransferFunction::Identity,
);

impl ColorConversion {
    /// sRGB (IEC 61966-2-1) to DCI XYZ.
    pub fn srgb_to_xyz() -> &'static Self {
        &SRGB_TO_XYZ
    }

    /// Rec. 601 to DCI XYZ.
    pub fn rec601_to_xyz() -> &'static Self {
        &REC601_TO_XYZ
    }

    /// Rec. 709 to DCI XYZ.
    pub fn rec709_to_xyz() -> &'static Self {
        &REC709_TO_XYZ
    }

    /// DCI-P3 to DCI XYZ.
    pub fn p3_to_xyz() -> &'static Self {
        &P3_TO_XYZ
    }

    /// Rec. 1886 to DCI XYZ.
    pub fn rec1886_to_xyz() -> &'static Self {
        &REC1886_TO_XYZ
    }

    /// Rec. 2020 to DCI XYZ.
    pub fn rec2020_to_xyz() -> &'static Self {
        &REC2020_TO_XYZ
    }

    /// Sony S-Gamut3 / S-Log3 to linear XYZ.
    pub fn s_gamut3_to_xyz() -> &'static Self {
        &S_GAMUT3_TO_XYZ
    }

    /// Every named preset.
    pub fn presets() -> [(&'static str, &'static Self); 7] {
        [
            ("sRGB", &SRGB_TO_XYZ),
            ("Rec. 601", &REC601_TO_XYZ),
            ("Rec. 709", &REC709_TO_XYZ),
            ("P3", &P3_TO_XYZ),
            ("Rec. 1886", &REC1886_TO_XYZ),
            ("Rec. 2020", &REC2020_TO_XYZ),
            ("S-Gamut3/S-Log3", &S_GAMUT3_TO_XYZ),
        ]
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    /// RGB to XYZ matrix derived from the primaries and white point.
    pub fn rgb_to_xyz(&self) -> Mat3 {
        let (r, g, b, w) = (&self.red, &self.green, &self.blue, &self.white);

        let d = (r.x - w.x) * (w.y - b.y) - (w.x - b.x) * (r.y - w.y);
        let e = (w.x - g.x) * (r.y - w.y) - (r.x - w.x) * (w.y - g.y);
        let f = (w.x - g.x) * (w.y - b.y) - (w.x - b.x) * (w.y - g.y);
        let p = r.y + g.y * d / f + b.y * e / f;

        Mat3::from_rows([
            [r.x / p, g.x * d / (f * p), b.x * e / (f * p)],
            [r.y / p, g.y * d / (f * p), b.y * e / (f * p)],
            [r.z() / p, g.z() * d / (f * p), b.z() * e / (f * p)],
        ])
    }

    /// Inverse of [`rgb_to_xyz`](Self::rgb_to_xyz).
    ///
    /// Fails if the primaries are degenerate.
    pub fn xyz_to_rgb(&self) -> Result<Mat3> {
        self.rgb_to_xyz().inverse().ok_or_else(|| {
            Error::Misc(format!(
                "RGB to XYZ matrix for primaries {:?} {:?} {:?} is singular",
                self.red, self.green, self.blue
            ))
        })
    }

    /// Bradford matrix adapting from `white` to `adjusted_white`.
    ///
    /// Identity if there is no adjusted white, or if either of its
    /// coordinates is within 1e-6 of zero.
    pub fn bradford(&self) -> Mat3 {
        match self.adjusted_white {
            Some(adjusted) if adjusted.x.abs() >= 1e-6 && adjusted.y.abs() >= 1e-6 => adapt_matrix(
                BRADFORD,
                BRADFORD_INV,
                self.white.to_xyz(),
                adjusted.to_xyz(),
            ),
            _ => Mat3::IDENTITY,
        }
    }

    /// Returns true if every parameter is within `epsilon` of `other`.
    pub fn about_equal(&self, other: &ColorConversion, epsilon: f64) -> bool {
        if !self.input.about_equal(&other.input, epsilon)
            || self.yuv_to_rgb != other.yuv_to_rgb
            || !self.red.about_equal(&other.red, epsilon)
            || !self.green.about_equal(&other.green, epsilon)
            || !self.blue.about_equal(&other.blue, epsilon)
            || !self.white.about_equal(&other.white, epsilon)
            || !self.output.about_equal(&other.output, epsilon)
        {
            return false;
        }

        match (&self.adjusted_white, &other.adjusted_white) {
            (None, None) => true,
            (Some(a), Some(b)) => a.about_equal(b, epsilon),
            _ => false,
        }
    }
}
