//! Decompress and compress entry points.

use dcp_core::{Error, PlanarImage, Result};
use tracing::{debug, warn};

use crate::{CompressParams, J2kCodec, J2kFormat};

/// Decodes a JPEG2000 codestream or JP2 file.
///
/// The container is detected from the data. `reduce` drops that many
/// resolution levels; 0 decodes at full size. Any codec failure becomes
/// [`Error::Read`] naming the number of bytes that were being decoded.
pub fn decompress_j2k<C: J2kCodec>(codec: &C, data: &[u8], reduce: u32) -> Result<PlanarImage> {
    let format = J2kFormat::detect(data);
    debug!(bytes = data.len(), ?format, reduce, "decompressing JPEG2000");

    codec.decode(data, format, reduce).map_err(|e| {
        warn!(bytes = data.len(), error = %e, "JPEG2000 decode failed");
        Error::Read(format!(
            "could not decode {} of {} bytes: {}",
            format.describe(),
            data.len(),
            e
        ))
    })
}

/// Encodes a 12-bit XYZ frame within a bandwidth budget.
///
/// `bandwidth` is in bits per second. `threed` halves the per-frame budget;
/// `fourk` selects the 4K profile. `comment` is written to the codestream and
/// must not be empty: MXF readers reject frames with an empty comment. The
/// check happens before the codec is touched.
pub fn compress_j2k<C: J2kCodec>(
    codec: &C,
    xyz: &PlanarImage,
    bandwidth: i64,
    frames_per_second: i64,
    threed: bool,
    fourk: bool,
    comment: &str,
) -> Result<Vec<u8>> {
    if comment.is_empty() {
        return Err(Error::Misc(
            "compress_j2k comment can not be an empty string".into(),
        ));
    }
    if frames_per_second <= 0 {
        return Err(Error::Misc(format!(
            "compress_j2k needs a positive frame rate, not {}",
            frames_per_second
        )));
    }

    let params = CompressParams::new(bandwidth, frames_per_second, threed, fourk);
    debug!(
        size = %xyz.size(),
        max_cs_size = params.max_cs_size,
        profile = %params.profile,
        "compressing JPEG2000"
    );

    codec.encode(xyz, &params, comment).inspect_err(|e| {
        warn!(error = %e, "JPEG2000 encode failed");
    })
}

/// Maps an error number reported by a failed start of compression.
///
/// Patched OpenJPEG builds report specific causes as `0x615xx`; the low byte
/// is the cause.
pub fn start_compression_error(errno: i32) -> Error {
    if (errno & 0x61500) == 0x61500 {
        Error::StartCompression {
            code: Some(errno & 0xff),
        }
    } else {
        Error::StartCompression { code: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_core::Size;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingCodec {
        decodes: RefCell<Vec<(J2kFormat, u32)>>,
        encodes: Cell<usize>,
        fail: bool,
    }

    impl J2kCodec for RecordingCodec {
        fn decode(&self, _data: &[u8], format: J2kFormat, reduce: u32) -> Result<PlanarImage> {
            self.decodes.borrow_mut().push((format, reduce));
            if self.fail {
                return Err(Error::Misc("tile part truncated".into()));
            }
            Ok(PlanarImage::new(Size::new(2048 >> reduce, 1080 >> reduce)))
        }

        fn encode(
            &self,
            _image: &PlanarImage,
            params: &CompressParams,
            comment: &str,
        ) -> Result<Vec<u8>> {
            self.encodes.set(self.encodes.get() + 1);
            if self.fail {
                return Err(start_compression_error(0x61503));
            }
            let mut out = params.max_cs_size.to_le_bytes().to_vec();
            out.extend_from_slice(comment.as_bytes());
            Ok(out)
        }
    }

    #[test]
    fn test_empty_comment_rejected_before_codec() {
        let codec = RecordingCodec::default();
        let image = PlanarImage::new(Size::new(4, 4));
        let r = compress_j2k(&codec, &image, 100_000_000, 24, false, false, "");
        assert!(matches!(r, Err(Error::Misc(ref m)) if m.contains("empty string")));
        assert_eq!(codec.encodes.get(), 0);
    }

    #[test]
    fn test_compress_passes_params() {
        let codec = RecordingCodec::default();
        let image = PlanarImage::new(Size::new(4, 4));
        let out = compress_j2k(&codec, &image, 100_000_000, 25, true, false, "dcp-rs").unwrap();
        let max_cs = i64::from_le_bytes(out[..8].try_into().unwrap());
        assert_eq!(max_cs, 250_000);
        assert_eq!(&out[8..], b"dcp-rs");
        assert_eq!(codec.encodes.get(), 1);
    }

    #[test]
    fn test_compress_failure_propagates() {
        let codec = RecordingCodec {
            fail: true,
            ..Default::default()
        };
        let image = PlanarImage::new(Size::new(4, 4));
        let r = compress_j2k(&codec, &image, 100_000_000, 24, false, true, "x");
        assert!(matches!(r, Err(Error::StartCompression { code: Some(3) })));
    }

    #[test]
    fn test_decompress_detects_format_and_reduce() {
        let codec = RecordingCodec::default();
        let image = decompress_j2k(&codec, &[0xff, 0x4f, 0xff, 0x51], 1).unwrap();
        assert_eq!(image.size(), Size::new(1024, 540));

        let mut jp2 = crate::JP2_MAGIC.to_vec();
        jp2.extend_from_slice(&[0; 4]);
        decompress_j2k(&codec, &jp2, 0).unwrap();

        assert_eq!(
            *codec.decodes.borrow(),
            vec![(J2kFormat::J2k, 1), (J2kFormat::Jp2, 0)]
        );
    }

    #[test]
    fn test_decompress_error_carries_byte_count() {
        let codec = RecordingCodec {
            fail: true,
            ..Default::default()
        };
        let data = vec![0u8; 1234];
        let err = decompress_j2k(&codec, &data, 0).unwrap_err();
        match err {
            Error::Read(msg) => {
                assert!(msg.contains("1234 bytes"), "{}", msg);
                assert!(msg.contains("codestream"), "{}", msg);
                assert!(msg.contains("tile part truncated"), "{}", msg);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_start_compression_error_codes() {
        assert!(matches!(
            start_compression_error(0x61504),
            Error::StartCompression { code: Some(4) }
        ));
        assert!(matches!(
            start_compression_error(22),
            Error::StartCompression { code: None }
        ));
    }
}
