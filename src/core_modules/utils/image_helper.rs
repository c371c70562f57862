// Frame encoding for the streaming side. The transport that carries the bytes is
// someone else's business.

pub mod image_helper {
    use image::{ExtendedColorType, ImageEncoder, RgbImage};
    use std::path::Path;

    pub const DEFAULT_JPEG_QUALITY: u8 = 80;

    /// Encodes a frame as a baseline JPEG.
    pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder.write_image(frame.as_raw(), frame.width(), frame.height(), ExtendedColorType::Rgb8)?;
        Ok(bytes)
    }

    /// Writes a frame to disk as PNG, for inspecting what the detector saw.
    pub fn save_png(path: impl AsRef<Path>, frame: &RgbImage) -> Result<(), image::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        encoder.write_image(frame.as_raw(), frame.width(), frame.height(), ExtendedColorType::Rgb8)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    #[test]
    fn jpeg_has_start_and_end_markers() {
        let bytes = encode_jpeg(&gradient(64, 48), DEFAULT_JPEG_QUALITY).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn jpeg_decodes_back_to_frame_size() {
        let bytes = encode_jpeg(&gradient(40, 30), 90).expect("encode");
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("frame.png");
        save_png(&path, &gradient(16, 16)).expect("save");
        let reloaded = image::open(&path).expect("open").to_rgb8();
        assert_eq!(reloaded, gradient(16, 16));
    }
}
