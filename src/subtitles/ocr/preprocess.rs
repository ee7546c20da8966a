//! Frame preprocessing for OCR.
//!
//! The bottom band of a frame is cropped, binarized and cleaned with a
//! morphological opening before it is handed to the recognizer. Every step is
//! deterministic.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// Bottom `fraction` of the frame, at least one row tall.
pub fn crop_bottom(frame: &DynamicImage, fraction: f32) -> DynamicImage {
    let (width, height) = (frame.width(), frame.height());
    let band = ((height as f32 * fraction).round() as u32).clamp(1, height.max(1));
    frame.crop_imm(0, height.saturating_sub(band), width, band)
}

/// Inverted binary threshold: pixels brighter than `threshold` become black,
/// everything else white.
pub fn threshold_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn invert(gray: &mut GrayImage) {
    for pixel in gray.pixels_mut() {
        pixel[0] = 255 - pixel[0];
    }
}

/// Morphological opening with a 2x2 square. Anything larger eats the thin
/// strokes of small subtitle glyphs.
///
/// imageproc applies masks unreflected, so the dilation anchors the square at
/// its opposite corner to undo the erosion's shift.
fn open_2x2(image: &GrayImage) -> GrayImage {
    let square = GrayImage::from_pixel(2, 2, Luma([255]));
    let eroded = grayscale_erode(image, &Mask::from_image(&square, 0, 0));
    grayscale_dilate(&eroded, &Mask::from_image(&square, 1, 1))
}

/// Crop, binarize and denoise `frame`.
pub fn prepare(frame: &DynamicImage, fraction: f32, threshold: u8) -> GrayImage {
    let gray = crop_bottom(frame, fraction).to_luma8();
    let binary = threshold_inverted(&gray, threshold);
    let mut opened = open_2x2(&binary);
    invert(&mut opened);
    opened
}

/// Load the frame at `input`, preprocess it and write the result to `output`.
pub fn prepare_file(
    input: &Path,
    output: &Path,
    fraction: f32,
    threshold: u8,
) -> Result<(), image::ImageError> {
    let frame = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    prepare(&frame, fraction, threshold).save(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_bottom_quarter() {
        let frame = DynamicImage::ImageLuma8(GrayImage::from_fn(40, 100, |_, y| Luma([y as u8])));
        let band = crop_bottom(&frame, 0.25).to_luma8();
        assert_eq!(band.dimensions(), (40, 25));
        assert_eq!(band.get_pixel(0, 0)[0], 75);
        assert_eq!(band.get_pixel(0, 24)[0], 99);
    }

    #[test]
    fn test_crop_never_empty() {
        let frame = DynamicImage::ImageLuma8(GrayImage::new(10, 2));
        assert_eq!(crop_bottom(&frame, 0.01).height(), 1);
        assert_eq!(crop_bottom(&frame, 1.0).height(), 2);
    }

    #[test]
    fn test_threshold_inverted() {
        let gray = GrayImage::from_raw(3, 1, vec![10, 150, 200]).unwrap();
        let binary = threshold_inverted(&gray, 150);
        assert_eq!(binary.into_raw(), vec![255, 255, 0]);
    }

    #[test]
    fn test_opening_removes_isolated_speck() {
        // Bright background with one dark pixel: after thresholding the speck
        // is a lone white pixel, which the opening erases.
        let mut gray = GrayImage::from_pixel(9, 9, Luma([220]));
        gray.put_pixel(4, 4, Luma([5]));
        let frame = DynamicImage::ImageLuma8(gray);

        let out = prepare(&frame, 1.0, 150);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_opening_keeps_two_pixel_stroke() {
        let gray = GrayImage::from_fn(9, 9, |x, _| {
            if x == 4 || x == 5 {
                Luma([5])
            } else {
                Luma([220])
            }
        });
        let frame = DynamicImage::ImageLuma8(gray);

        let out = prepare(&frame, 1.0, 150);
        assert_eq!(out.get_pixel(4, 4)[0], 0);
        assert_eq!(out.get_pixel(5, 4)[0], 0);
        assert_eq!(out.get_pixel(3, 4)[0], 255);
        assert_eq!(out.get_pixel(6, 4)[0], 255);
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let frame = DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |x, y| {
            Luma([((x * 7 + y * 13) % 256) as u8])
        }));
        assert_eq!(prepare(&frame, 0.5, 100), prepare(&frame, 0.5, 100));
    }

    #[test]
    fn test_prepare_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frame.png");
        let output = dir.path().join("region.png");
        GrayImage::from_pixel(16, 16, Luma([0])).save(&input).unwrap();

        prepare_file(&input, &output, 0.25, 150).unwrap();
        let region = image::open(&output).unwrap();
        assert_eq!((region.width(), region.height()), (16, 4));
    }
}
