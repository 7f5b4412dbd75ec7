//! EXIF orientation correction for camera and phone photos.
//!
//! Decoders hand back pixels in sensor order; the Orientation tag (0x0112)
//! says how to turn them upright. Values:
//! 1 normal, 2 mirrored, 3 180deg, 4 flipped vertically,
//! 5 mirrored + 90deg CW, 6 90deg CW, 7 mirrored + 270deg CW, 8 270deg CW.

use std::io::Cursor;

use image::DynamicImage;

/// Orientation tag of an encoded image, or 1 when there is no EXIF block
/// or no tag.
pub fn read_exif_orientation(encoded: &[u8]) -> u32 {
    let mut cursor = Cursor::new(encoded);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
        return 1;
    };
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Turns a decoded image upright. Unknown values leave it untouched.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GenericImageView, ImageOutputFormat, Rgb, RgbImage};

    /// Encodes `img` as JPEG and splices an APP1 EXIF segment carrying the
    /// given orientation right after SOI.
    pub(crate) fn jpeg_with_orientation(img: &RgbImage, orientation: u16) -> Vec<u8> {
        let mut jpeg = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut jpeg, ImageOutputFormat::Jpeg(95))
            .unwrap();
        let jpeg = jpeg.into_inner();

        // Big-endian TIFF header, one IFD with a single SHORT entry.
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08");
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let payload_len = (2 + 6 + tiff.len()) as u16;
        let mut out = Vec::with_capacity(jpeg.len() + payload_len as usize + 2);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xff, 0xe1]);
        out.extend_from_slice(&payload_len.to_be_bytes());
        out.extend_from_slice(b"Exif\x00\x00");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn marked() -> DynamicImage {
        // 3x2 with a single red pixel at the top-left corner.
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    fn red_at(img: &DynamicImage) -> (u32, u32) {
        img.pixels()
            .find(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .unwrap()
    }

    #[test]
    fn test_orientation_transforms() {
        assert_eq!(red_at(&apply_orientation(marked(), 1)), (0, 0));
        assert_eq!(red_at(&apply_orientation(marked(), 2)), (2, 0));
        assert_eq!(red_at(&apply_orientation(marked(), 3)), (2, 1));

        let rotated = apply_orientation(marked(), 6);
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(red_at(&rotated), (1, 0));

        let rotated = apply_orientation(marked(), 8);
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(red_at(&rotated), (0, 2));

        assert_eq!(apply_orientation(marked(), 42).dimensions(), (3, 2));
    }

    #[test]
    fn test_reads_orientation_tag() {
        let img = RgbImage::from_pixel(4, 2, Rgb([40, 80, 120]));
        assert_eq!(read_exif_orientation(&jpeg_with_orientation(&img, 6)), 6);
    }

    #[test]
    fn test_missing_exif_means_upright() {
        assert_eq!(read_exif_orientation(b"not an image"), 1);

        let mut png = Cursor::new(Vec::new());
        marked().write_to(&mut png, ImageOutputFormat::Png).unwrap();
        assert_eq!(read_exif_orientation(&png.into_inner()), 1);
    }
}
