//! Image preprocessing for the visual embedding model.
//!
//! The model was trained on 224x224 RGB input rescaled to [-1, 1]
//! (the EfficientNetV2 scheme). The rescale formula must match the
//! training-time preprocessing exactly or embeddings silently drift;
//! it is a correctness contract, not a style choice.

use image::DynamicImage;
use image::imageops::FilterType;

/// Square input resolution the embedding model expects.
pub const INPUT_SIZE: u32 = 224;

/// Channels in the model input (RGB).
pub const INPUT_CHANNELS: usize = 3;

/// Resize, convert to RGB, and rescale to the model's input tensor.
///
/// Output is channels-last ([height, width, channel] flattened), the
/// layout the exported model takes. One fixed resize filter keeps the
/// pipeline deterministic across calls.
pub fn preprocess(image: &DynamicImage) -> Vec<f32> {
    let resized = image.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut pixels =
        Vec::with_capacity((INPUT_SIZE * INPUT_SIZE) as usize * INPUT_CHANNELS);
    for pixel in rgb.pixels() {
        for channel in 0..INPUT_CHANNELS {
            pixels.push(pixel[channel] as f32 / 127.5 - 1.0);
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn output_has_model_input_shape() {
        let img = DynamicImage::new_rgb8(100, 50);
        let pixels = preprocess(&img);
        assert_eq!(pixels.len(), 224 * 224 * 3);
    }

    #[test]
    fn values_are_rescaled_to_unit_range() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let pixels = preprocess(&img);
        assert!(pixels.iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn black_maps_to_minus_one_white_to_one() {
        let black = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            10,
            10,
            Rgb([0u8, 0u8, 0u8]),
        ));
        assert!(preprocess(&black).iter().all(|&v| v == -1.0));

        let white = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            10,
            10,
            Rgb([255u8, 255u8, 255u8]),
        ));
        assert!(preprocess(&white).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(37, 91, |x, y| {
            Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        }));
        assert_eq!(preprocess(&img), preprocess(&img));
    }

    #[test]
    fn non_rgb_input_is_converted() {
        let gray = DynamicImage::new_luma8(30, 30);
        let pixels = preprocess(&gray);
        assert_eq!(pixels.len(), 224 * 224 * 3);
    }
}
