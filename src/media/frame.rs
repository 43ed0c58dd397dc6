use image::codecs::jpeg::JpegEncoder;

use crate::error::{MockviewError, Result};

use super::backend::VideoFrame;

/// Encode an RGB8 frame as JPEG at the given quality (0-100)
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<Vec<u8>> {
    let expected = (frame.width as usize) * (frame.height as usize) * 3;
    if frame.rgb.len() != expected {
        return Err(MockviewError::FrameEncode {
            message: format!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB8",
                frame.rgb.len(),
                expected,
                frame.width,
                frame.height
            ),
        });
    }

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(&frame.rgb, frame.width, frame.height, image::ColorType::Rgb8)
        .map_err(|e| MockviewError::FrameEncode {
            message: e.to_string(),
        })?;

    Ok(buf)
}
