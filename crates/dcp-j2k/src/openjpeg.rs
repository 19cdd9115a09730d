//! OpenJPEG-backed codec (read-only).
//!
//! Decodes through the `jpeg2k` crate. The crate exposes no encoder that
//! takes cinema profile parameters, so [`OpenJpegCodec::encode`] reports
//! [`Error::Unsupported`]; plug a different [`J2kCodec`] in to compress.

use dcp_core::{Error, PlanarImage, Result, Size};
use jpeg2k::{DecodeParameters, Image as J2kImage};
use tracing::trace;

use crate::{CompressParams, J2kCodec, J2kFormat};

/// Decoder backed by OpenJPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenJpegCodec;

impl OpenJpegCodec {
    /// Creates the codec.
    pub fn new() -> Self {
        Self
    }
}

impl J2kCodec for OpenJpegCodec {
    /// jpeg2k sniffs the container itself.
    fn decode(&self, data: &[u8], _format: J2kFormat, reduce: u32) -> Result<PlanarImage> {
        let img = J2kImage::from_bytes_with(data, DecodeParameters::new().reduce(reduce))
            .map_err(|e| Error::Misc(e.to_string()))?;

        let components = img.components();
        if components.len() < 3 {
            return Err(Error::Misc(format!(
                "expected 3 components, found {}",
                components.len()
            )));
        }

        let size = Size::new(components[0].width(), components[0].height());
        let precision = components[0].precision();
        trace!(%size, precision, "decoded JPEG2000 components");

        let plane = |c: usize| -> Result<Vec<i32>> {
            let comp = &components[c];
            if comp.width() != size.width || comp.height() != size.height {
                return Err(Error::Misc(format!(
                    "component {} is {}x{}, expected {}",
                    c,
                    comp.width(),
                    comp.height(),
                    size
                )));
            }
            Ok(comp.data().to_vec())
        };

        PlanarImage::from_planes(size, precision, [plane(0)?, plane(1)?, plane(2)?])
    }

    fn encode(
        &self,
        _image: &PlanarImage,
        params: &CompressParams,
        _comment: &str,
    ) -> Result<Vec<u8>> {
        Err(Error::Unsupported(format!(
            "{} encoding is not available through the OpenJPEG decoder backend",
            params.profile
        )))
    }
}
