//! Bulk conversion between packed 16-bit RGB and planar 12-bit DCI XYZ.
//!
//! # Pipeline
//!
//! ```text
//! RGB -> XYZ:  u16 >> 4 -> input LUT (12-bit) -> [Bradford * RGB->XYZ * DCI]
//!              -> clamp [0,1] -> inverse output LUT (piecewise) -> 12-bit XYZ
//!
//! XYZ -> RGB:  12-bit XYZ (clamped, noted) -> output LUT (12-bit) -> / DCI
//!              -> XYZ->RGB -> clamp [0,1] -> inverse input LUT (16-bit) -> u16
//! ```
//!
//! RGB buffers hold three little-endian `u16` samples per pixel; `stride` is
//! the distance in bytes between the starts of consecutive rows and may
//! include padding. A buffer that is too small for its size and stride is an
//! error.
//!
//! Out-of-range data is never an error: it is clamped and, when a note
//! handler is given, reported through it.
//!
//! With the `parallel` feature rows are converted on the rayon pool. The
//! result is identical to the sequential path.

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use dcp_core::{Error, NoteHandler, NoteType, PlanarImage, Result, Size};
use dcp_transfer::{PiecewiseLut2, TransferFunction};

use crate::ColorConversion;

/// DCI companding coefficient: 48 cd/m² peak over the 52.37 cd/m² XYZ
/// encoding reference.
pub const DCI_COEFFICIENT: f64 = 48.0 / 52.37;

const RGB_PIXEL_BYTES: usize = 6;
const BGRA_PIXEL_BYTES: usize = 4;
const XYZ_MAX: i32 = 4095;

/// The product of the Bradford transform, the RGB to XYZ matrix and DCI
/// companding, row-major.
pub fn combined_rgb_to_xyz(conversion: &ColorConversion) -> [f64; 9] {
    (conversion.bradford() * conversion.rgb_to_xyz() * DCI_COEFFICIENT).to_array()
}

/// Table for the final linear-to-code step of RGB to XYZ conversion.
///
/// The split point and resolutions keep the error under one code value
/// across the 12-bit output range.
pub fn make_inverse_gamma_lut(function: TransferFunction) -> PiecewiseLut2 {
    PiecewiseLut2::new(function, 0.062, 16, 12, true, 4095)
}

// ============================================================================
// RGB -> XYZ
// ============================================================================

struct ToXyz {
    lut_in: Arc<[f64]>,
    lut_out: PiecewiseLut2,
    matrix: [f64; 9],
}

impl ToXyz {
    fn new(conversion: &ColorConversion) -> Self {
        Self {
            lut_in: conversion.input.double_lut(0.0, 1.0, 12, false),
            lut_out: make_inverse_gamma_lut(conversion.output),
            matrix: combined_rgb_to_xyz(conversion),
        }
    }

    /// Converts one 6-byte pixel, counting clamped samples.
    #[inline]
    fn pixel(&self, px: &[u8], clamped: &mut usize) -> [i32; 3] {
        let sample = |i: usize| {
            let v = u16::from_le_bytes([px[i * 2], px[i * 2 + 1]]) >> 4;
            self.lut_in[v as usize]
        };
        let (r, g, b) = (sample(0), sample(1), sample(2));

        let m = &self.matrix;
        let d = [
            r * m[0] + g * m[1] + b * m[2],
            r * m[3] + g * m[4] + b * m[5],
            r * m[6] + g * m[7] + b * m[8],
        ];

        d.map(|v| {
            let c = v.max(0.0).min(1.0);
            if c != v {
                *clamped += 1;
            }
            self.lut_out.lookup(c)
        })
    }
}

/// Converts packed 16-bit RGB to a 12-bit XYZ image.
///
/// If a note handler is given and any sample had to be clamped after the
/// matrix, one note with the number of clamped samples is sent.
///
/// # Example
///
/// ```rust
/// use dcp_color::{rgb_to_xyz, ColorConversion};
/// use dcp_core::Size;
///
/// let white = [0xffu8; 6];
/// let xyz = rgb_to_xyz(&white, Size::new(1, 1), 6, ColorConversion::srgb_to_xyz(), None).unwrap();
/// assert!(xyz.data(1)[0] > 3900);
/// ```
pub fn rgb_to_xyz(
    rgb: &[u8],
    size: Size,
    stride: usize,
    conversion: &ColorConversion,
    note: Option<NoteHandler<'_>>,
) -> Result<PlanarImage> {
    check_buffer("RGB", rgb.len(), size, stride, RGB_PIXEL_BYTES)?;

    let mut xyz = PlanarImage::new(size);
    if size.area() == 0 {
        return Ok(xyz);
    }

    let conv = ToXyz::new(conversion);
    let width = size.width as usize;
    let [px, py, pz] = xyz.planes_mut();

    let clamped = for_rows3(px, py, pz, width, |row, x, y, z| {
        let start = row * stride;
        let line = &rgb[start..start + width * RGB_PIXEL_BYTES];
        let mut clamped = 0;
        for (i, p) in line.chunks_exact(RGB_PIXEL_BYTES).enumerate() {
            let [cx, cy, cz] = conv.pixel(p, &mut clamped);
            x[i] = cx;
            y[i] = cy;
            z[i] = cz;
        }
        clamped
    });

    report_clamped(clamped, note);
    Ok(xyz)
}

/// Converts packed 16-bit RGB to interleaved XYZ samples.
///
/// `dst` receives `x, y, z` for each pixel in turn; values are 12-bit.
pub fn rgb_to_xyz_interleaved(
    rgb: &[u8],
    dst: &mut [u16],
    size: Size,
    stride: usize,
    conversion: &ColorConversion,
    note: Option<NoteHandler<'_>>,
) -> Result<()> {
    check_buffer("RGB", rgb.len(), size, stride, RGB_PIXEL_BYTES)?;

    let needed = size.area() * 3;
    if dst.len() < needed {
        return Err(Error::Misc(format!(
            "XYZ buffer of {} samples is too small for a {} image (need {})",
            dst.len(),
            size,
            needed
        )));
    }
    if needed == 0 {
        return Ok(());
    }

    let conv = ToXyz::new(conversion);
    let width = size.width as usize;

    let clamped = for_rows(&mut dst[..needed], width * 3, |row, out| {
        let start = row * stride;
        let line = &rgb[start..start + width * RGB_PIXEL_BYTES];
        let mut clamped = 0;
        for (p, o) in line
            .chunks_exact(RGB_PIXEL_BYTES)
            .zip(out.chunks_exact_mut(3))
        {
            let xyz = conv.pixel(p, &mut clamped);
            for (d, v) in o.iter_mut().zip(xyz) {
                *d = v as u16;
            }
        }
        clamped
    });

    report_clamped(clamped, note);
    Ok(())
}

fn report_clamped(clamped: usize, note: Option<NoteHandler<'_>>) {
    if clamped == 0 {
        return;
    }
    debug!(clamped, "clamped XYZ samples");
    if let Some(note) = note {
        note(
            NoteType::Note,
            format!("{} XYZ samples clamped to range", clamped),
        );
    }
}

// ============================================================================
// XYZ -> RGB
// ============================================================================

struct ToRgb {
    lut_in: Arc<[f64]>,
    lut_out: Arc<[f64]>,
    matrix: [f64; 9],
}

impl ToRgb {
    fn new(conversion: &ColorConversion) -> Result<Self> {
        Ok(Self {
            lut_in: conversion.output.double_lut(0.0, 1.0, 12, false),
            lut_out: conversion.input.double_lut(0.0, 1.0, 16, true),
            matrix: conversion.xyz_to_rgb()?.to_array(),
        })
    }

    /// Linear RGB in `[0, 1]` for one XYZ pixel.
    #[inline]
    fn linear(&self, c: [i32; 3]) -> [f64; 3] {
        let [x, y, z] = c.map(|v| self.lut_in[v.clamp(0, XYZ_MAX) as usize] / DCI_COEFFICIENT);
        let m = &self.matrix;
        [
            (x * m[0] + y * m[1] + z * m[2]).min(1.0).max(0.0),
            (x * m[3] + y * m[4] + z * m[5]).min(1.0).max(0.0),
            (x * m[6] + y * m[7] + z * m[8]).min(1.0).max(0.0),
        ]
    }

    /// Encoded value in `[0, 1]` for a linear value in `[0, 1]`.
    #[inline]
    fn encode(&self, v: f64) -> f64 {
        self.lut_out[(v * 65535.0).round_ties_even() as usize]
    }
}

/// Sends one note per out-of-range XYZ sample, in pixel order, X then Y
/// then Z within a pixel.
fn note_out_of_range(xyz: &PlanarImage, mut note: Option<NoteHandler<'_>>) {
    let [x, y, z] = xyz.planes();
    let mut count = 0usize;
    for i in 0..xyz.size().area() {
        for v in [x[i], y[i], z[i]] {
            if !(0..=XYZ_MAX).contains(&v) {
                count += 1;
                if let Some(note) = note.as_deref_mut() {
                    note(NoteType::Note, format!("XYZ value {} out of range", v));
                }
            }
        }
    }
    if count > 0 {
        debug!(count, "out-of-range XYZ samples");
    }
}

/// Converts a 12-bit XYZ image to packed 16-bit RGB.
///
/// Samples outside `[0, 4095]` are clamped, with one note each.
pub fn xyz_to_rgb(
    xyz: &PlanarImage,
    conversion: &ColorConversion,
    rgb: &mut [u8],
    stride: usize,
    note: Option<NoteHandler<'_>>,
) -> Result<()> {
    let size = xyz.size();
    let needed = check_buffer("RGB", rgb.len(), size, stride, RGB_PIXEL_BYTES)?;
    let conv = ToRgb::new(conversion)?;

    note_out_of_range(xyz, note);
    if size.area() == 0 {
        return Ok(());
    }

    let width = size.width as usize;
    let [x, y, z] = xyz.planes();

    for_rows(&mut rgb[..needed], stride, |row, line| {
        let base = row * width;
        for (i, out) in line[..width * RGB_PIXEL_BYTES]
            .chunks_exact_mut(RGB_PIXEL_BYTES)
            .enumerate()
        {
            let j = base + i;
            let d = conv.linear([x[j], y[j], z[j]]);
            for (c, v) in d.into_iter().enumerate() {
                let value = (conv.encode(v) * 65535.0).round_ties_even() as u16;
                out[c * 2..c * 2 + 2].copy_from_slice(&value.to_le_bytes());
            }
        }
        0
    });

    Ok(())
}

/// Converts a 12-bit XYZ image to 8-bit BGRA with opaque alpha.
///
/// Samples outside `[0, 4095]` are clamped, with one note each.
pub fn xyz_to_rgba(
    xyz: &PlanarImage,
    conversion: &ColorConversion,
    bgra: &mut [u8],
    stride: usize,
    note: Option<NoteHandler<'_>>,
) -> Result<()> {
    let size = xyz.size();
    let needed = check_buffer("BGRA", bgra.len(), size, stride, BGRA_PIXEL_BYTES)?;
    let conv = ToRgb::new(conversion)?;

    note_out_of_range(xyz, note);
    if size.area() == 0 {
        return Ok(());
    }

    let width = size.width as usize;
    let [x, y, z] = xyz.planes();

    for_rows(&mut bgra[..needed], stride, |row, line| {
        let base = row * width;
        for (i, out) in line[..width * BGRA_PIXEL_BYTES]
            .chunks_exact_mut(BGRA_PIXEL_BYTES)
            .enumerate()
        {
            let j = base + i;
            let [r, g, b] = conv.linear([x[j], y[j], z[j]]);
            out[0] = (conv.encode(b) * 255.0) as u8;
            out[1] = (conv.encode(g) * 255.0) as u8;
            out[2] = (conv.encode(r) * 255.0) as u8;
            out[3] = 0xff;
        }
        0
    });

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Checks that `len` bytes hold a `size` image at `stride`; returns the
/// number of bytes the image spans.
fn check_buffer(
    what: &str,
    len: usize,
    size: Size,
    stride: usize,
    pixel_bytes: usize,
) -> Result<usize> {
    if size.area() == 0 {
        return Ok(0);
    }

    let row = size.width as usize * pixel_bytes;
    if stride < row {
        return Err(Error::Misc(format!(
            "{} stride of {} bytes is shorter than a {} pixel row ({} bytes)",
            what, stride, size.width, row
        )));
    }

    let needed = (size.height as usize - 1) * stride + row;
    if len < needed {
        return Err(Error::Misc(format!(
            "{} buffer of {} bytes is too small for a {} image with stride {} (need {})",
            what, len, size, stride, needed
        )));
    }

    Ok(needed)
}

/// Runs `f(row, line)` over `stride`-sized chunks of `dst`, summing results.
#[cfg(feature = "parallel")]
fn for_rows<T, F>(dst: &mut [T], stride: usize, f: F) -> usize
where
    T: Send,
    F: Fn(usize, &mut [T]) -> usize + Sync,
{
    dst.par_chunks_mut(stride)
        .enumerate()
        .map(|(row, line)| f(row, line))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn for_rows<T, F>(dst: &mut [T], stride: usize, f: F) -> usize
where
    F: Fn(usize, &mut [T]) -> usize,
{
    dst.chunks_mut(stride)
        .enumerate()
        .map(|(row, line)| f(row, line))
        .sum()
}

/// Runs `f(row, x, y, z)` over matching rows of three planes.
#[cfg(feature = "parallel")]
fn for_rows3<F>(x: &mut [i32], y: &mut [i32], z: &mut [i32], width: usize, f: F) -> usize
where
    F: Fn(usize, &mut [i32], &mut [i32], &mut [i32]) -> usize + Sync,
{
    x.par_chunks_mut(width)
        .zip(y.par_chunks_mut(width))
        .zip(z.par_chunks_mut(width))
        .enumerate()
        .map(|(row, ((x, y), z))| f(row, x, y, z))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn for_rows3<F>(x: &mut [i32], y: &mut [i32], z: &mut [i32], width: usize, f: F) -> usize
where
    F: Fn(usize, &mut [i32], &mut [i32], &mut [i32]) -> usize,
{
    x.chunks_mut(width)
        .zip(y.chunks_mut(width))
        .zip(z.chunks_mut(width))
        .enumerate()
        .map(|(row, ((x, y), z))| f(row, x, y, z))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chromaticity;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_rgb(size: Size, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rgb = Vec::with_capacity(size.area() * RGB_PIXEL_BYTES);
        for _ in 0..size.area() * 3 {
            // A 12-bit value in the top bits
            let v: u16 = rng.gen_range(0..4096u16) << 4;
            rgb.extend_from_slice(&v.to_le_bytes());
        }
        rgb
    }

    fn srgb_decode(c: f64) -> f64 {
        if c < 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    fn read_u16(buf: &[u8], i: usize) -> u16 {
        u16::from_le_bytes([buf[i * 2], buf[i * 2 + 1]])
    }

    #[test]
    fn test_rgb_to_xyz_matches_reference() {
        let size = Size::new(128, 96);
        let rgb = random_rgb(size, 0);
        let xyz = rgb_to_xyz(
            &rgb,
            size,
            size.width as usize * 6,
            ColorConversion::srgb_to_xyz(),
            None,
        )
        .unwrap();

        for i in 0..size.area() {
            let r = srgb_decode(read_u16(&rgb, i * 3) as f64 / 65535.0);
            let g = srgb_decode(read_u16(&rgb, i * 3 + 1) as f64 / 65535.0);
            let b = srgb_decode(read_u16(&rgb, i * 3 + 2) as f64 / 65535.0);

            let expected = [
                r * 0.4124564 + g * 0.3575761 + b * 0.1804375,
                r * 0.2126729 + g * 0.7151522 + b * 0.0721750,
                r * 0.0193339 + g * 0.1191920 + b * 0.9503041,
            ]
            .map(|v| (v * DCI_COEFFICIENT).powf(1.0 / 2.6) * 4095.0);

            for c in 0..3 {
                let got = xyz.data(c)[i] as f64;
                let tolerance = (expected[c] * 0.01).max(2.0);
                assert!(
                    (got - expected[c]).abs() <= tolerance,
                    "pixel {} channel {}: got {} expected {}",
                    i,
                    c,
                    got,
                    expected[c]
                );
            }
        }
    }

    #[test]
    fn test_xyz_to_rgb_clamps_and_notes() {
        let size = Size::new(2, 2);
        let mut xyz = PlanarImage::new(size);
        for c in 0..3 {
            xyz.data_mut(c).copy_from_slice(&[-4, 6901, 0, 4095]);
        }

        let mut notes = Vec::new();
        let mut handler = |kind: NoteType, msg: String| {
            assert_eq!(kind, NoteType::Note);
            notes.push(msg);
        };
        let mut rgb = vec![0u8; 2 * 2 * 6];
        xyz_to_rgb(
            &xyz,
            ColorConversion::srgb_to_xyz(),
            &mut rgb,
            2 * 6,
            Some(&mut handler),
        )
        .unwrap();

        assert_eq!(
            notes,
            vec![
                "XYZ value -4 out of range",
                "XYZ value -4 out of range",
                "XYZ value -4 out of range",
                "XYZ value 6901 out of range",
                "XYZ value 6901 out of range",
                "XYZ value 6901 out of range",
            ]
        );

        // Clamped pixels match the in-range extremes
        for c in 0..3 {
            assert_eq!(read_u16(&rgb, c), read_u16(&rgb, 2 * 3 + c));
            assert_eq!(read_u16(&rgb, 3 + c), read_u16(&rgb, 3 * 3 + c));
        }
    }

    #[test]
    fn test_round_trip() {
        let size = Size::new(64, 48);
        let stride = size.width as usize * 6;
        let rgb = random_rgb(size, 1);
        let conversion = ColorConversion::srgb_to_xyz();

        let xyz = rgb_to_xyz(&rgb, size, stride, conversion, None).unwrap();
        let mut back = vec![0u8; rgb.len()];
        xyz_to_rgb(&xyz, conversion, &mut back, stride, None).unwrap();

        // Compare in linear light; encoded values near black amplify
        // quantisation error.
        for i in 0..size.area() * 3 {
            let a = srgb_decode(read_u16(&rgb, i) as f64 / 65535.0);
            let b = srgb_decode(read_u16(&back, i) as f64 / 65535.0);
            assert!((a - b).abs() < 5e-3, "sample {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let size = Size::new(16, 8);
        let stride = size.width as usize * 6;
        let rgb = random_rgb(size, 2);
        let conversion = ColorConversion::rec709_to_xyz();

        let planar = rgb_to_xyz(&rgb, size, stride, conversion, None).unwrap();
        let mut packed = vec![0u16; size.area() * 3];
        rgb_to_xyz_interleaved(&rgb, &mut packed, size, stride, conversion, None).unwrap();

        for i in 0..size.area() {
            for c in 0..3 {
                assert_eq!(packed[i * 3 + c] as i32, planar.data(c)[i]);
            }
        }
    }

    #[test]
    fn test_padded_stride() {
        let size = Size::new(3, 2);
        let tight = random_rgb(size, 3);
        let stride = 3 * 6 + 10;
        let mut padded = vec![0xaau8; stride * 2];
        padded[..18].copy_from_slice(&tight[..18]);
        padded[stride..stride + 18].copy_from_slice(&tight[18..]);

        let conversion = ColorConversion::srgb_to_xyz();
        let a = rgb_to_xyz(&tight, size, 18, conversion, None).unwrap();
        let b = rgb_to_xyz(&padded, size, stride, conversion, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_buffer_is_error() {
        let size = Size::new(4, 4);
        let rgb = vec![0u8; 4 * 4 * 6 - 1];
        let r = rgb_to_xyz(&rgb, size, 24, ColorConversion::srgb_to_xyz(), None);
        assert!(matches!(r, Err(Error::Misc(_))));

        let xyz = PlanarImage::new(size);
        let mut out = vec![0u8; 10];
        let r = xyz_to_rgb(&xyz, ColorConversion::srgb_to_xyz(), &mut out, 24, None);
        assert!(r.is_err());
    }

    #[test]
    fn test_clamped_samples_are_noted() {
        // White adapted to illuminant A has X > 1 even after companding
        let mut conversion = ColorConversion::srgb_to_xyz().clone();
        conversion.adjusted_white = Some(Chromaticity::new(0.447576324, 0.407443172));

        let rgb = [0xffu8; 6];
        let mut notes = Vec::new();
        let mut handler = |_: NoteType, msg: String| notes.push(msg);
        rgb_to_xyz(&rgb, Size::new(1, 1), 6, &conversion, Some(&mut handler)).unwrap();
        assert_eq!(notes, vec!["1 XYZ samples clamped to range"]);
    }

    #[test]
    fn test_xyz_to_rgba_layout() {
        let size = Size::new(2, 1);
        let mut xyz = PlanarImage::new(size);
        for c in 0..3 {
            xyz.data_mut(c)[1] = 4095;
        }
        let mut bgra = vec![0u8; 8];
        xyz_to_rgba(&xyz, ColorConversion::srgb_to_xyz(), &mut bgra, 8, None).unwrap();
        assert_eq!(&bgra[..4], &[0, 0, 0, 0xff]);
        assert_eq!(bgra[7], 0xff);
        assert!(bgra[4] > 200 && bgra[5] > 200 && bgra[6] > 200, "{:?}", bgra);
    }

    #[test]
    fn test_combined_matrix() {
        let c = ColorConversion::p3_to_xyz();
        let m = combined_rgb_to_xyz(c);
        let expected = c.rgb_to_xyz();
        for i in 0..3 {
            for j in 0..3 {
                assert!((m[i * 3 + j] - expected.m[i][j] * DCI_COEFFICIENT).abs() < 1e-12);
            }
        }
    }
}
