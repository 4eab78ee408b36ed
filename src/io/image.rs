use crate::core::framebuffer::DEPTH_CLEAR_VALUE;
use image::{GrayImage, ImageBuffer, Rgb};
use log::info;
use std::path::Path;

/// Saves a packed `0xAARRGGBB` buffer. The format follows the file
/// extension (png, bmp, ppm, ...).
pub fn save_argb_image<P: AsRef<Path>>(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: P,
) -> Result<(), String> {
    let path = path.as_ref();
    if buffer.len() != width * height {
        return Err(format!(
            "Buffer holds {} pixels, expected {}x{}",
            buffer.len(),
            width,
            height
        ));
    }

    let img_buf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let argb = buffer[(y as usize) * width + (x as usize)];
        Rgb([
            ((argb >> 16) & 0xFF) as u8,
            ((argb >> 8) & 0xFF) as u8,
            (argb & 0xFF) as u8,
        ])
    });

    img_buf
        .save(path)
        .map_err(|e| format!("Failed to save image to '{}': {}", path.display(), e))?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Maps written depths onto 0..=255, nearest brightest. Cells still holding
/// the clear value come out black.
pub fn normalize_depth(depth: &[f32]) -> Vec<u8> {
    let written = |d: &f32| d.is_finite() && *d > DEPTH_CLEAR_VALUE;
    let (min, max) = depth
        .iter()
        .filter(|d| written(*d))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });
    let range = max - min;

    depth
        .iter()
        .map(|d| {
            if !written(d) {
                0
            } else if range <= f32::EPSILON {
                255
            } else {
                (32.0 + 223.0 * (d - min) / range) as u8
            }
        })
        .collect()
}

pub fn save_depth_image<P: AsRef<Path>>(
    depth: &[f32],
    width: usize,
    height: usize,
    path: P,
) -> Result<(), String> {
    let path = path.as_ref();
    let grey = GrayImage::from_raw(width as u32, height as u32, normalize_depth(depth))
        .ok_or_else(|| format!("Depth buffer does not match {}x{}", width, height))?;

    grey.save(path)
        .map_err(|e| format!("Failed to save depth image to '{}': {}", path.display(), e))?;
    info!("Saved depth map {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_normalisation_keeps_order_and_blanks_clear_cells() {
        let grey = normalize_depth(&[DEPTH_CLEAR_VALUE, 0.1, 0.5, 0.3]);
        assert_eq!(grey[0], 0);
        assert_eq!(grey[1], 32);
        assert_eq!(grey[2], 255);
        assert!(grey[1] < grey[3] && grey[3] < grey[2]);

        assert_eq!(normalize_depth(&[0.2, 0.2]), vec![255, 255]);
    }

    #[test]
    fn saved_image_keeps_pixel_colours() {
        let path = std::env::temp_dir().join(format!("cornell-save-{}.png", std::process::id()));
        let buffer = [0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF, 0xFF000000, 0xFF7D7D7D];
        save_argb_image(&buffer, 3, 2, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(2, 1), &Rgb([125, 125, 125]));
        assert!(save_argb_image(&buffer, 4, 2, &path).is_err());
    }
}
