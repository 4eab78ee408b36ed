use crate::core::color::Colour;
use crate::core::geometry::Material;
use crate::core::math::interpolation::{barycentric, blend_scalar, blend_vector};
use crate::pipeline::intersector::{Intersector, RayTriangleIntersection};
use crate::scene::light::Light;
use crate::scene::texture::TextureMap;
use nalgebra::{Point3, Vector2, Vector3};

/// Distance a secondary ray starts off the surface it leaves.
pub const SURFACE_OFFSET: f32 = 0.001;
/// Specular exponent is `2^SPECULAR_POWER`.
pub const SPECULAR_POWER: i32 = 4;

/// Shadow hits closer than these distances are treated as self-intersection.
const PROXIMITY_SHADOW_EPSILON: f32 = 1e-7;
const OCCLUSION_EPSILON: f32 = 0.01;
/// Diffuse term forced onto occluded points.
const SHADOWED_DIFFUSE: f32 = 0.2;

/// Per-pixel colour rule for the ray-traced modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingModel {
    Proximity,
    Lighting,
    Gouraud,
    Phong,
    TextureMapped,
    Reflective,
}

/// Which normal feeds the lighting terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingModel {
    /// Flat face normal; faces turned away from the viewer get no diffuse light.
    Point,
    /// A smoothed normal supplied by the caller.
    Interpolated,
}

impl LightingModel {
    pub fn ambient(self) -> f32 {
        match self {
            LightingModel::Point => 0.2,
            LightingModel::Interpolated => 0.3,
        }
    }
}

/// Outcome of one shadow ray cast from just above a surface toward the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowProbe {
    pub origin: Point3<f32>,
    pub light_distance: f32,
    pub blocker_distance: Option<f32>,
}

impl ShadowProbe {
    /// Something sits between the surface and the light, further away than `epsilon`.
    pub fn occluded_beyond(&self, epsilon: f32) -> bool {
        self.blocker_distance
            .is_some_and(|d| d > epsilon && d < self.light_distance)
    }
}

/// Blends the proximity, diffuse and specular terms over an ambient floor.
/// `diffuse` is the clamped diffuse term before its square root is taken.
pub fn combine(proximity: f32, diffuse: f32, specular: f32, ambient: f32) -> f32 {
    let pd = proximity * diffuse.sqrt();
    let curve = (1.0 - ambient) * (-(pd * pd) + 2.0 * pd) + ambient;
    0.8 * curve + 0.2 * specular
}

/// Lighting and colour queries against one scene and light.
pub struct ShadingEngine<'a, I: Intersector + ?Sized> {
    pub scene: &'a I,
    pub light: &'a Light,
    pub texture: Option<&'a TextureMap>,
}

impl<'a, I: Intersector + ?Sized> ShadingEngine<'a, I> {
    pub fn new(scene: &'a I, light: &'a Light, texture: Option<&'a TextureMap>) -> Self {
        Self {
            scene,
            light,
            texture,
        }
    }

    pub fn probe(&self, point: &Point3<f32>) -> ShadowProbe {
        let towards = (self.light.position - point).normalize();
        let origin = *point + towards * SURFACE_OFFSET;
        let to_light = self.light.position - origin;
        let light_distance = to_light.norm();
        let blocker_distance = self
            .scene
            .closest_intersection(&origin, &to_light.normalize())
            .map(|hit| hit.distance);

        ShadowProbe {
            origin,
            light_distance,
            blocker_distance,
        }
    }

    /// Inverse-square falloff scaled by the light's intensity. An occluded
    /// point counts as twice as far from the light.
    pub fn proximity(&self, probe: &ShadowProbe) -> f32 {
        let mut distance_sq = probe.light_distance * probe.light_distance;
        if probe.occluded_beyond(PROXIMITY_SHADOW_EPSILON) {
            distance_sq *= 4.0;
        }
        clamp_unit(self.light.intensity / distance_sq)
    }

    pub fn diffuse(
        &self,
        point: &Point3<f32>,
        normal: &Vector3<f32>,
        viewer: &Point3<f32>,
        probe: &ShadowProbe,
        model: LightingModel,
    ) -> f32 {
        if model == LightingModel::Point && (viewer - point).dot(normal) < 0.0 {
            return 0.0;
        }
        let value = if probe.occluded_beyond(OCCLUSION_EPSILON) {
            SHADOWED_DIFFUSE
        } else {
            (self.light.position - point).normalize().dot(normal)
        };
        clamp_unit(value)
    }

    pub fn specular(
        &self,
        point: &Point3<f32>,
        normal: &Vector3<f32>,
        viewer: &Point3<f32>,
        probe: &ShadowProbe,
    ) -> f32 {
        if (viewer - point).dot(normal) < 0.0 || probe.occluded_beyond(OCCLUSION_EPSILON) {
            return 0.0;
        }
        let incident = (point - self.light.position).normalize();
        let reflected = reflect(&incident, normal);
        let alignment = (viewer - point).normalize().dot(&reflected).max(0.0);
        clamp_unit(alignment.powi(2_i32.pow(SPECULAR_POWER as u32)))
    }

    /// Full lighting at a surface point as seen from `viewer`.
    pub fn lighting(
        &self,
        point: &Point3<f32>,
        normal: &Vector3<f32>,
        viewer: &Point3<f32>,
        model: LightingModel,
    ) -> f32 {
        let probe = self.probe(point);
        let proximity = self.proximity(&probe);
        let diffuse = self.diffuse(point, normal, viewer, &probe, model);
        let specular = self.specular(point, normal, viewer, &probe);
        combine(proximity, diffuse, specular, model.ambient())
    }

    /// Lights each vertex with its smoothed normal and blends the results.
    pub fn gouraud(&self, hit: &RayTriangleIntersection<'_>, viewer: &Point3<f32>) -> f32 {
        let triangle = hit.triangle;
        let normals = &triangle.vertex_normals;
        let average = (normals[0] + normals[1] + normals[2])
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| triangle.normal());
        if (viewer - hit.point).dot(&average) < 0.0 {
            return 0.0;
        }

        let vertices = triangle.vertices();
        let values = [0, 1, 2].map(|i| {
            self.lighting(&vertices[i], &normals[i], viewer, LightingModel::Interpolated)
        });
        blend_scalar(&weights(hit), values)
    }

    /// Blends the smoothed normals at the hit and lights once.
    pub fn phong(&self, hit: &RayTriangleIntersection<'_>, viewer: &Point3<f32>) -> f32 {
        let normal = blend_vector(&weights(hit), &hit.triangle.vertex_normals)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| hit.triangle.normal());
        self.lighting(&hit.point, &normal, viewer, LightingModel::Interpolated)
    }

    /// Texel under the hit, for textured triangles when a texture is loaded.
    pub fn texture_colour(&self, hit: &RayTriangleIntersection<'_>) -> Option<Colour> {
        let (Material::Textured(points), Some(texture)) = (&hit.triangle.material, self.texture)
        else {
            return None;
        };
        let w = weights(hit);
        let uv: Vector2<f32> =
            points[0].coords() * w.x + points[1].coords() * w.y + points[2].coords() * w.z;
        Some(texture.colour_at(uv.x, uv.y))
    }

    /// Single bounce: mirrors the view ray about the face normal and lights
    /// whatever it hits, using the mirror point as the viewer. Misses are black.
    pub fn reflection_colour(
        &self,
        hit: &RayTriangleIntersection<'_>,
        viewer: &Point3<f32>,
    ) -> Colour {
        let normal = hit.triangle.normal();
        let incident = (hit.point - viewer).normalize();
        let Some(direction) = reflect(&incident, &normal).try_normalize(f32::EPSILON) else {
            return Colour::BLACK;
        };
        let origin = hit.point + direction * SURFACE_OFFSET;

        match self.scene.closest_intersection(&origin, &direction) {
            Some(bounce) => {
                let lighting = self.lighting(
                    &bounce.point,
                    &bounce.triangle.normal(),
                    &hit.point,
                    LightingModel::Point,
                );
                bounce.triangle.colour * lighting
            }
            None => Colour::BLACK,
        }
    }

    /// Final colour of a primary-ray hit.
    pub fn shade(
        &self,
        hit: &RayTriangleIntersection<'_>,
        viewer: &Point3<f32>,
        model: ShadingModel,
    ) -> Colour {
        let colour = hit.triangle.colour;
        let flat = || {
            self.lighting(&hit.point, &hit.triangle.normal(), viewer, LightingModel::Point)
        };

        match model {
            ShadingModel::Proximity => colour * self.proximity(&self.probe(&hit.point)),
            ShadingModel::Lighting => colour * flat(),
            ShadingModel::Gouraud => colour * self.gouraud(hit, viewer),
            ShadingModel::Phong => colour * self.phong(hit, viewer),
            ShadingModel::TextureMapped => {
                self.texture_colour(hit).unwrap_or(colour) * flat()
            }
            ShadingModel::Reflective => {
                let base = if hit.triangle.is_mirror() {
                    self.reflection_colour(hit, viewer)
                } else {
                    colour
                };
                base * flat()
            }
        }
    }
}

#[inline]
fn reflect(incident: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    incident - normal * 2.0 * incident.dot(normal)
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Barycentric weights of the hit, falling back to the intersector's edge
/// coordinates when the dot-product solve is degenerate.
fn weights(hit: &RayTriangleIntersection<'_>) -> Vector3<f32> {
    barycentric(&hit.point, hit.triangle.vertices())
        .unwrap_or_else(|_| Vector3::new(1.0 - hit.u - hit.v, hit.u, hit.v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{ModelTriangle, TexturePoint};
    use crate::pipeline::intersector::closest_intersection;

    /// Large upward-facing floor at y = 0.
    fn floor(colour: Colour) -> ModelTriangle {
        ModelTriangle::new(
            Point3::new(0.0, 0.0, -3.0),
            Point3::new(-3.0, 0.0, 3.0),
            Point3::new(3.0, 0.0, 3.0),
            colour,
        )
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn diffuse_is_full_directly_under_the_light() {
        let scene = vec![floor(Colour::WHITE)];
        let light = Light::new(Point3::new(0.0, 1.0, 0.0), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);

        let point = Point3::origin();
        let probe = engine.probe(&point);
        assert_eq!(probe.blocker_distance, None);
        let d = engine.diffuse(
            &point,
            &scene[0].normal(),
            &Point3::new(0.0, 2.0, 2.0),
            &probe,
            LightingModel::Point,
        );
        assert!(approx(d, 1.0), "diffuse = {}", d);
    }

    #[test]
    fn proximity_falls_off_away_from_the_light() {
        let scene = vec![floor(Colour::WHITE)];
        let light = Light::new(Point3::new(0.0, 1.5, 0.0), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);

        let values: Vec<f32> = [0.0, 0.4, 0.8, 1.2, 1.6]
            .iter()
            .map(|&x| engine.proximity(&engine.probe(&Point3::new(x, 0.0, 0.0))))
            .collect();
        assert!(values.windows(2).all(|w| w[0] > w[1]), "{:?}", values);
        assert!(values[0] < 1.0);
    }

    #[test]
    fn intensity_scales_proximity() {
        let scene = vec![floor(Colour::WHITE)];
        let dim = Light::new(Point3::new(0.0, 2.0, 0.0), 1.0);
        let bright = Light::new(Point3::new(0.0, 2.0, 0.0), 2.0);
        let point = Point3::new(0.5, 0.0, 0.0);

        let a = ShadingEngine::new(scene.as_slice(), &dim, None);
        let b = ShadingEngine::new(scene.as_slice(), &bright, None);
        let pa = a.proximity(&a.probe(&point));
        let pb = b.proximity(&b.probe(&point));
        assert!(approx(pb, 2.0 * pa));
    }

    #[test]
    fn occluder_darkens_point_below_it() {
        let blocker = ModelTriangle::new(
            Point3::new(0.0, 0.5, -1.0),
            Point3::new(-1.0, 0.5, 1.0),
            Point3::new(1.0, 0.5, 1.0),
            Colour::RED,
        );
        let light = Light::new(Point3::new(0.0, 2.0, 0.0), 1.0);
        let open = vec![floor(Colour::WHITE)];
        let covered = vec![floor(Colour::WHITE), blocker];

        let point = Point3::origin();
        let viewer = Point3::new(0.0, 3.0, 3.0);
        let normal = Vector3::y();

        let lit = ShadingEngine::new(open.as_slice(), &light, None);
        let shaded = ShadingEngine::new(covered.as_slice(), &light, None);
        let lit_probe = lit.probe(&point);
        let shaded_probe = shaded.probe(&point);

        assert!(shaded_probe.occluded_beyond(OCCLUSION_EPSILON));
        assert!(approx(shaded.proximity(&shaded_probe), lit.proximity(&lit_probe) / 4.0));
        assert!(approx(
            shaded.diffuse(&point, &normal, &viewer, &shaded_probe, LightingModel::Point),
            SHADOWED_DIFFUSE
        ));
        assert_eq!(shaded.specular(&point, &normal, &viewer, &shaded_probe), 0.0);
        assert!(
            shaded.lighting(&point, &normal, &viewer, LightingModel::Point)
                < lit.lighting(&point, &normal, &viewer, LightingModel::Point)
        );
    }

    #[test]
    fn back_faces_get_no_point_diffuse() {
        let scene = vec![floor(Colour::WHITE)];
        let light = Light::new(Point3::new(0.0, 1.0, 0.0), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);
        let point = Point3::origin();
        let probe = engine.probe(&point);
        let below = Point3::new(0.0, -2.0, 1.0);
        let normal = Vector3::y();

        assert_eq!(engine.diffuse(&point, &normal, &below, &probe, LightingModel::Point), 0.0);
        assert!(engine.diffuse(&point, &normal, &below, &probe, LightingModel::Interpolated) > 0.9);
        assert_eq!(engine.specular(&point, &normal, &below, &probe), 0.0);
    }

    #[test]
    fn specular_peaks_along_the_mirror_direction() {
        let scene = vec![floor(Colour::WHITE)];
        let light = Light::new(Point3::new(-1.0, 1.0, 0.0), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);
        let point = Point3::origin();
        let probe = engine.probe(&point);
        let normal = Vector3::y();

        let mirror = engine.specular(&point, &normal, &Point3::new(1.0, 1.0, 0.0), &probe);
        let off = engine.specular(&point, &normal, &Point3::new(0.2, 1.0, 0.6), &probe);
        assert!(approx(mirror, 1.0));
        assert!(off < mirror);
    }

    #[test]
    fn combination_curve_hits_known_points() {
        assert!(approx(combine(1.0, 1.0, 0.0, 0.2), 0.8));
        assert!(approx(combine(0.0, 1.0, 1.0, 0.2), 0.8 * 0.2 + 0.2));
        assert!(approx(combine(1.0, 1.0, 1.0, 0.3), 1.0));
    }

    #[test]
    fn phong_on_flat_surface_matches_interpolated_lighting() {
        let mut scene = vec![floor(Colour::WHITE)];
        crate::scene::mesh::smooth_vertex_normals(&mut scene);
        let light = Light::new(Point3::new(0.3, 1.2, 0.2), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);
        let viewer = Point3::new(0.0, 2.0, 2.5);

        let direction = (Point3::origin() - viewer).normalize();
        let hit = closest_intersection(scene.as_slice(), &viewer, &direction)
            .expect("floor hit");
        let expected =
            engine.lighting(&hit.point, &Vector3::y(), &viewer, LightingModel::Interpolated);
        assert!(approx(engine.phong(&hit, &viewer), expected));
        assert!(engine.gouraud(&hit, &viewer) > 0.0);
    }

    #[test]
    fn textured_hit_reads_the_texture() {
        let texture = TextureMap::from_fn(8, 8, |x, y| {
            if x + y < 8 { Colour::YELLOW } else { Colour::BLUE }
        });
        let points = [
            TexturePoint::new(0.0, 0.0),
            TexturePoint::new(0.0, 8.0),
            TexturePoint::new(8.0, 8.0),
        ];
        let scene = vec![floor(Colour::GREEN).with_material(Material::Textured(points))];
        let light = Light::default();
        let engine = ShadingEngine::new(scene.as_slice(), &light, Some(&texture));

        // Close to vertex 0, whose texel is (0, 0).
        let origin = Point3::new(0.0, 1.0, -2.5);
        let hit = scene.closest_intersection(&origin, &-Vector3::y()).expect("hit");
        assert_eq!(engine.texture_colour(&hit), Some(Colour::YELLOW));

        let plain = ShadingEngine::new(scene.as_slice(), &light, None);
        assert_eq!(plain.texture_colour(&hit), None);
    }

    #[test]
    fn mirror_shows_the_wall_it_faces() {
        let mirror = floor(Colour::MAGENTA).with_material(Material::Mirror);
        // Wall at z = -2 facing +z.
        let wall = ModelTriangle::new(
            Point3::new(-3.0, -1.0, -2.0),
            Point3::new(3.0, -1.0, -2.0),
            Point3::new(0.0, 3.0, -2.0),
            Colour::RED,
        );
        assert!(wall.normal().z > 0.0);
        let scene = vec![mirror, wall];
        let light = Light::new(Point3::new(0.0, 1.0, 0.0), 1.0);
        let engine = ShadingEngine::new(scene.as_slice(), &light, None);

        let viewer = Point3::new(0.0, 1.0, 1.0);
        let direction = (Point3::new(0.0, 0.0, -0.5) - viewer).normalize();
        let hit = scene.closest_intersection(&viewer, &direction).expect("mirror hit");
        assert!(hit.triangle.is_mirror());

        let reflected = engine.reflection_colour(&hit, &viewer);
        assert!(reflected.red > 0 && reflected.green == 0 && reflected.blue == 0);

        let shaded = engine.shade(&hit, &viewer, ShadingModel::Reflective);
        assert!(shaded.red > 0 && shaded.blue == 0);
        assert!(engine.shade(&hit, &viewer, ShadingModel::Lighting).blue > 0);
    }
}
