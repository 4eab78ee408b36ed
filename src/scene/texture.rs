use crate::core::color::Colour;
use crate::core::geometry::TexturePoint;
use image::GenericImageView;
use log::info;
use std::path::Path;

/// A texture flattened into a row-major grid of coloured texture points.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub width: usize,
    pub height: usize,
    pub points: Vec<TexturePoint>,
}

impl TextureMap {
    /// Loads a PPM (or any format `image` decodes) and flattens it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref).map_err(|e| format!("Failed to load texture: {}", e))?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("Texture {:?} is empty", path_ref));
        }

        let rgb = img.to_rgb8();
        let map = Self::from_fn(width as usize, height as usize, |x, y| {
            let px = rgb.get_pixel(x as u32, y as u32);
            Colour::new(px[0], px[1], px[2])
        });

        info!("Loaded texture: {:?} ({}x{})", path_ref, width, height);
        Ok(map)
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        mut colour: impl FnMut(usize, usize) -> Colour,
    ) -> Self {
        let mut points = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                points.push(TexturePoint {
                    x: x as f32,
                    y: y as f32,
                    colour: colour(x, y),
                });
            }
        }
        Self {
            width,
            height,
            points,
        }
    }

    /// Nearest texel: coordinates are truncated and clamped to the edge.
    pub fn colour_at(&self, x: f32, y: f32) -> Colour {
        if self.points.is_empty() {
            return Colour::BLACK;
        }
        let clamp = |v: f32, len: usize| {
            if v.is_nan() || v < 0.0 {
                0
            } else {
                (v as usize).min(len - 1)
            }
        };
        let (tx, ty) = (clamp(x, self.width), clamp(y, self.height));
        self.points[ty * self.width + tx].colour
    }
}
