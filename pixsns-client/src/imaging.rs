use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage};

/// Longest side, in pixels, of an image once optimised
pub const MAX_DIMENSION: u32 = 1000;

pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("could not decode image {file_name:?}: {message}")]
    Decode { file_name: String, message: String },

    #[error("could not encode image {file_name:?}: {message}")]
    Encode { file_name: String, message: String },
}

/// An image ready to be uploaded
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptimizedImage {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Downscales the image so that its longest side is at most `MAX_DIMENSION`,
/// then re-encodes it as a JPEG.
///
/// Images already small enough keep their size, but are still re-encoded so
/// that what gets uploaded is always the same format.
pub fn optimize_image(file_name: &str, bytes: &[u8]) -> Result<OptimizedImage, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode {
        file_name: file_name.to_string(),
        message: e.to_string(),
    })?;
    let (orig_w, orig_h) = (img.width(), img.height());
    let img = match orig_w.max(orig_h) > MAX_DIMENSION {
        true => img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3),
        false => img,
    };
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(rgb.as_bytes(), width, height, ColorType::Rgb8)
        .map_err(|e| ImageError::Encode {
            file_name: file_name.to_string(),
            message: e.to_string(),
        })?;
    tracing::debug!(
        ?file_name,
        from = ?(orig_w, orig_h),
        to = ?(width, height),
        size = out.get_ref().len(),
        "optimised image"
    );

    Ok(OptimizedImage {
        file_name: jpeg_name(file_name),
        mime: "image/jpeg",
        bytes: out.into_inner(),
        width,
        height,
    })
}

fn jpeg_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = match base.rfind('.') {
        Some(0) | None => base,
        Some(i) => &base[..i],
    };
    match stem.is_empty() {
        true => String::from("image.jpg"),
        false => format!("{stem}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageOutputFormat::Png)
            .expect("encoding test png");
        out.into_inner()
    }

    #[test]
    fn large_images_are_downscaled() {
        let img = optimize_image("photos/wide.png", &png(2000, 500)).expect("optimising");
        assert_eq!((img.width, img.height), (1000, 250));
        assert_eq!(img.file_name, "wide.jpg");
        assert_eq!(img.mime, "image/jpeg");
        let back = image::load_from_memory(&img.bytes).expect("decoding output");
        assert_eq!((back.width(), back.height()), (1000, 250));
    }

    #[test]
    fn small_images_keep_their_size() {
        let img = optimize_image("tiny.png", &png(40, 30)).expect("optimising");
        assert_eq!((img.width, img.height), (40, 30));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            optimize_image("x.png", b"not an image"),
            Err(ImageError::Decode { .. })
        ));
    }

    #[test]
    fn names() {
        assert_eq!(jpeg_name("a.b.png"), "a.b.jpg");
        assert_eq!(jpeg_name(".hidden"), ".hidden.jpg");
        assert_eq!(jpeg_name("dir/"), "image.jpg");
    }
}
