//! The codec seam.
//!
//! The JPEG2000 codec itself is an external collaborator. Anything that can
//! decode a codestream to a planar image and encode a planar image under
//! [`CompressParams`] can sit behind [`J2kCodec`].

use dcp_core::{PlanarImage, Result};

use crate::CompressParams;

/// JP2 signature box: length 12, type `jP  `.
pub const JP2_MAGIC: [u8; 8] = [0x00, 0x00, 0x00, 0x0c, b'j', b'P', 0x20, 0x20];

/// Container of a JPEG2000 bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum J2kFormat {
    /// Raw codestream (what DCP MXF files carry).
    J2k,
    /// JP2 file with box structure.
    Jp2,
}

impl J2kFormat {
    /// Detects the format from the first bytes of `data`.
    pub fn detect(data: &[u8]) -> Self {
        if is_jp2(data) {
            J2kFormat::Jp2
        } else {
            J2kFormat::J2k
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            J2kFormat::J2k => "JPEG2000 codestream",
            J2kFormat::Jp2 => "JP2 file",
        }
    }
}

/// Returns true if `data` starts with the JP2 signature box.
///
/// ```rust
/// use dcp_j2k::{is_jp2, JP2_MAGIC};
///
/// assert!(is_jp2(&JP2_MAGIC));
/// assert!(!is_jp2(&[0xff, 0x4f, 0xff, 0x51]));
/// ```
#[inline]
pub fn is_jp2(data: &[u8]) -> bool {
    data.starts_with(&JP2_MAGIC)
}

/// A JPEG2000 encoder/decoder.
pub trait J2kCodec {
    /// Decodes `data`, discarding the `reduce` highest resolution levels
    /// (each level halves width and height).
    fn decode(&self, data: &[u8], format: J2kFormat, reduce: u32) -> Result<PlanarImage>;

    /// Encodes `image` as a codestream under `params`, embedding `comment`
    /// in a COM marker.
    fn encode(&self, image: &PlanarImage, params: &CompressParams, comment: &str)
    -> Result<Vec<u8>>;
}

impl<C: J2kCodec + ?Sized> J2kCodec for &C {
    fn decode(&self, data: &[u8], format: J2kFormat, reduce: u32) -> Result<PlanarImage> {
        (**self).decode(data, format, reduce)
    }

    fn encode(
        &self,
        image: &PlanarImage,
        params: &CompressParams,
        comment: &str,
    ) -> Result<Vec<u8>> {
        (**self).encode(image, params, comment)
    }
}
