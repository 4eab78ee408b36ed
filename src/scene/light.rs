use nalgebra::Point3;

/// A point light. `intensity` scales the inverse-square proximity falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Point3<f32>, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.8, 0.0), 1.0)
    }
}
