use crate::core::math::transform::TransformFactory;
use crate::pipeline::shading::ShadingModel;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which pipeline draws the frame. The tags are the names used in config
/// files and on the command line, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RenderMode {
    Wireframe,
    #[default]
    Rasterise,
    RaytraceProximity,
    RaytraceLighting,
    SphereWireframe,
    SphereGouraud,
    SpherePhong,
    RaytraceTexture,
    RaytraceReflection,
    /// Wireframe, and the camera pose is appended to the recording.
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Wireframe,
    Rasterise,
    Raytrace(ShadingModel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSelection {
    Main,
    Sphere,
}

impl RenderMode {
    pub const ALL: [RenderMode; 10] = [
        RenderMode::Wireframe,
        RenderMode::Rasterise,
        RenderMode::RaytraceProximity,
        RenderMode::RaytraceLighting,
        RenderMode::SphereWireframe,
        RenderMode::SphereGouraud,
        RenderMode::SpherePhong,
        RenderMode::RaytraceTexture,
        RenderMode::RaytraceReflection,
        RenderMode::Record,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            RenderMode::Wireframe => "WIREFRAME",
            RenderMode::Rasterise => "RASTERISE",
            RenderMode::RaytraceProximity => "RAYTRACE_P",
            RenderMode::RaytraceLighting => "RAYTRACE_D",
            RenderMode::SphereWireframe => "SPHERE_W",
            RenderMode::SphereGouraud => "SPHERE_G",
            RenderMode::SpherePhong => "SPHERE_P",
            RenderMode::RaytraceTexture => "RAYTRACE_TM",
            RenderMode::RaytraceReflection => "RAYTRACE_R",
            RenderMode::Record => "RECORD",
        }
    }

    pub fn pipeline(self) -> Pipeline {
        match self {
            RenderMode::Wireframe | RenderMode::SphereWireframe | RenderMode::Record => {
                Pipeline::Wireframe
            }
            RenderMode::Rasterise => Pipeline::Rasterise,
            RenderMode::RaytraceProximity => Pipeline::Raytrace(ShadingModel::Proximity),
            RenderMode::RaytraceLighting => Pipeline::Raytrace(ShadingModel::Lighting),
            RenderMode::SphereGouraud => Pipeline::Raytrace(ShadingModel::Gouraud),
            RenderMode::SpherePhong => Pipeline::Raytrace(ShadingModel::Phong),
            RenderMode::RaytraceTexture => Pipeline::Raytrace(ShadingModel::TextureMapped),
            RenderMode::RaytraceReflection => Pipeline::Raytrace(ShadingModel::Reflective),
        }
    }

    pub fn scene(self) -> SceneSelection {
        match self {
            RenderMode::SphereWireframe | RenderMode::SphereGouraud | RenderMode::SpherePhong => {
                SceneSelection::Sphere
            }
            _ => SceneSelection::Main,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RenderMode::ALL
            .into_iter()
            .find(|mode| mode.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown render mode: {}", s))
    }
}

impl TryFrom<String> for RenderMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RenderMode> for String {
    fn from(mode: RenderMode) -> String {
        mode.tag().to_string()
    }
}

/// Position and orientation of a camera, enough to reproduce a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub orientation: Matrix3<f32>,
}

/// Pinhole camera. `orientation` takes world offsets into camera space,
/// where the camera looks down -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub orientation: Matrix3<f32>,
    pub focal_length: f32,
    pub mode: RenderMode,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 4.0), 2.0)
    }
}

impl Camera {
    pub fn new(position: Point3<f32>, focal_length: f32) -> Self {
        Self {
            position,
            orientation: Matrix3::identity(),
            focal_length,
            mode: RenderMode::default(),
        }
    }

    /// Moves the camera by `-delta`; callers negate for intuitive movement.
    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position -= delta;
    }

    /// Turns about the Y axis, accumulating in the camera's own frame.
    pub fn pan(&mut self, theta: f32) {
        self.orientation *= TransformFactory::rotation_y(theta);
    }

    /// Turns about the camera's X axis.
    pub fn tilt(&mut self, theta: f32) {
        self.orientation *= TransformFactory::rotation_x(theta);
    }

    /// Swings the position around the world Y axis.
    pub fn orbit(&mut self, speed: f32) {
        self.position = Point3::from(TransformFactory::rotation_y(speed) * self.position.coords);
    }

    /// Rebuilds the orientation so the camera faces `target`.
    /// Undefined when the camera sits on `target` or straight above/below it.
    pub fn look_at(&mut self, target: &Point3<f32>) {
        let forward = (self.position - target).normalize();
        let right = forward.cross(&Vector3::y()).normalize();
        let up = -right.cross(&forward).normalize();
        // Rows are the camera axes, so this is the transpose of the
        // camera-to-world basis and maps world offsets into camera space.
        let basis = Matrix3::from_rows(&[right.transpose(), up.transpose(), forward.transpose()]);
        self.orientation = TransformFactory::handedness_flip() * basis;
    }

    #[inline]
    pub fn to_camera_space(&self, p: &Point3<f32>) -> Vector3<f32> {
        self.orientation * (p - self.position)
    }

    /// Camera-to-world rotation. Falls back to the transpose if the matrix
    /// has drifted singular.
    pub fn inverse_orientation(&self) -> Matrix3<f32> {
        self.orientation
            .try_inverse()
            .unwrap_or_else(|| self.orientation.transpose())
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            orientation: self.orientation,
        }
    }

    pub fn set_pose(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.orientation = pose.orientation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_matrix(a: &Matrix3<f32>, b: &Matrix3<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn look_at_origin_from_default_position_is_identity() {
        let mut camera = Camera::default();
        camera.look_at(&Point3::origin());
        assert!(approx_matrix(&camera.orientation, &Matrix3::identity()));
    }

    #[test]
    fn look_at_puts_target_on_negative_z() {
        let mut camera = Camera::new(Point3::new(3.0, 1.0, -2.0), 2.0);
        let target = Point3::new(0.5, 0.0, 0.0);
        camera.look_at(&target);
        let c = camera.to_camera_space(&target);
        assert!(c.x.abs() < 1e-5 && c.y.abs() < 1e-5);
        assert!(c.z < 0.0);
    }

    #[test]
    fn pan_and_tilt_accumulate() {
        let mut camera = Camera::default();
        camera.pan(0.25);
        camera.pan(0.5);
        assert!(approx_matrix(
            &camera.orientation,
            &TransformFactory::rotation_y(0.75)
        ));

        camera.tilt(0.1);
        camera.tilt(-0.1);
        assert!(approx_matrix(
            &camera.orientation,
            &TransformFactory::rotation_y(0.75)
        ));
    }

    #[test]
    fn orbit_keeps_distance_and_height() {
        let mut camera = Camera::new(Point3::new(1.0, 0.5, 4.0), 2.0);
        let radius = camera.position.coords.xz().norm();
        for _ in 0..17 {
            camera.orbit(0.3);
        }
        assert!((camera.position.coords.xz().norm() - radius).abs() < 1e-4);
        assert_eq!(camera.position.y, 0.5);
    }

    #[test]
    fn translate_moves_against_delta() {
        let mut camera = Camera::default();
        camera.translate(Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn modes_parse_from_tags() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.tag().parse::<RenderMode>(), Ok(mode));
        }
        assert_eq!("sphere_p".parse::<RenderMode>(), Ok(RenderMode::SpherePhong));
        assert!("RAYTRACE_X".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::SphereGouraud.scene(), SceneSelection::Sphere);
        assert_eq!(
            RenderMode::RaytraceTexture.pipeline(),
            Pipeline::Raytrace(ShadingModel::TextureMapped)
        );
        assert_eq!(RenderMode::Record.pipeline(), Pipeline::Wireframe);
    }
}
