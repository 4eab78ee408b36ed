use nalgebra::Matrix3;

//=================================
// Rotation Factory
//=================================

/// Builds the 3x3 rotations used by the camera controls.
/// Written out by hand so the sign conventions stay explicit.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Rotation about the X axis (camera tilt).
    pub fn rotation_x(angle_rad: f32) -> Matrix3<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, c,  -s,
            0.0, s,   c,
        )
    }

    /// Rotation about the Y axis (camera pan and orbit).
    pub fn rotation_y(angle_rad: f32) -> Matrix3<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix3::new(
            c,   0.0, s,
            0.0, 1.0, 0.0,
           -s,   0.0, c,
        )
    }

    /// Flips X and Y so camera space matches the projector's screen axes.
    pub fn handedness_flip() -> Matrix3<f32> {
        Matrix3::new(
           -1.0,  0.0, 0.0,
            0.0, -1.0, 0.0,
            0.0,  0.0, 1.0,
        )
    }
}
