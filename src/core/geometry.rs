use crate::core::color::Colour;
use nalgebra::{Point3, Vector2, Vector3};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Why a primitive was rejected before any pixel was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateGeometry {
    /// All three vertices lie on one line.
    ZeroArea,
    /// All three vertices share a scanline.
    ZeroHeight,
    /// A coordinate is NaN or infinite.
    NonFinite,
    /// A coordinate lies beyond the range pixels can be addressed in.
    OutOfRange,
}

impl fmt::Display for DegenerateGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateGeometry::ZeroArea => write!(f, "triangle has zero area"),
            DegenerateGeometry::ZeroHeight => write!(f, "triangle has zero vertical extent"),
            DegenerateGeometry::NonFinite => write!(f, "triangle has non-finite coordinates"),
            DegenerateGeometry::OutOfRange => write!(f, "triangle lies off the canvas range"),
        }
    }
}

impl std::error::Error for DegenerateGeometry {}

//=================================
// Screen space
//=================================

/// A projected vertex: pixel position, depth proxy (`-1/z`, larger is closer)
/// and an optional texture-space coordinate carried along by interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub texture: Option<Vector2<f32>>,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            depth: 0.0,
            texture: None,
        }
    }

    pub fn with_depth(x: f32, y: f32, depth: f32) -> Self {
        Self {
            x,
            y,
            depth,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Vector2<f32>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Linear interpolation of every attribute. The texture payload survives
    /// only when both ends carry one.
    pub fn lerp(&self, other: &CanvasPoint, t: f32) -> CanvasPoint {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        CanvasPoint {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            depth: mix(self.depth, other.depth),
            texture: match (self.texture, other.texture) {
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                _ => None,
            },
        }
    }

    /// Truncates x and y toward zero, keeping depth and texture.
    pub fn snapped(&self) -> CanvasPoint {
        CanvasPoint {
            x: self.x.trunc(),
            y: self.y.trunc(),
            ..*self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.depth.is_finite()
            && self.texture.is_none_or(|t| t.x.is_finite() && t.y.is_finite())
    }

    /// Same pixel after truncation.
    pub fn same_pixel(&self, other: &CanvasPoint) -> bool {
        self.x.trunc() == other.x.trunc() && self.y.trunc() == other.y.trunc()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasTriangle {
    pub vertices: [CanvasPoint; 3],
}

impl CanvasTriangle {
    pub fn new(v0: CanvasPoint, v1: CanvasPoint, v2: CanvasPoint) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }
}

impl Index<usize> for CanvasTriangle {
    type Output = CanvasPoint;

    fn index(&self, index: usize) -> &CanvasPoint {
        &self.vertices[index]
    }
}

impl IndexMut<usize> for CanvasTriangle {
    fn index_mut(&mut self, index: usize) -> &mut CanvasPoint {
        &mut self.vertices[index]
    }
}

//=================================
// Triangle splitting
//=================================

/// Largest canvas coordinate `split_triangle` accepts. Past 2^24 an f32 no
/// longer holds every whole pixel.
pub const MAX_CANVAS_COORD: f32 = 16_777_216.0;

/// A triangle whose two `base` vertices share a scanline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTriangle {
    pub apex: CanvasPoint,
    pub base: [CanvasPoint; 2],
}

impl FlatTriangle {
    /// Number of scanlines from apex to base, inclusive.
    pub fn rows(&self) -> usize {
        ((self.base[0].y - self.apex.y).abs() as usize).saturating_add(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleSplit {
    Flat(FlatTriangle),
    /// `upper` points its apex up the screen (smaller y), `lower` down.
    Split {
        upper: FlatTriangle,
        lower: FlatTriangle,
    },
}

impl TriangleSplit {
    pub fn halves(&self) -> impl Iterator<Item = &FlatTriangle> {
        let (first, second) = match self {
            TriangleSplit::Flat(flat) => (flat, None),
            TriangleSplit::Split { upper, lower } => (upper, Some(lower)),
        };
        std::iter::once(first).chain(second)
    }
}

/// Snaps the vertices to pixels, orders them by y and cuts the triangle along
/// the middle vertex's scanline. The fourth vertex lies on the top-bottom edge
/// with depth and texture interpolated alongside.
pub fn split_triangle(triangle: &CanvasTriangle) -> Result<TriangleSplit, DegenerateGeometry> {
    if !triangle.vertices.iter().all(CanvasPoint::is_finite) {
        return Err(DegenerateGeometry::NonFinite);
    }
    let in_range =
        |v: &CanvasPoint| v.x.abs() <= MAX_CANVAS_COORD && v.y.abs() <= MAX_CANVAS_COORD;
    if !triangle.vertices.iter().all(in_range) {
        return Err(DegenerateGeometry::OutOfRange);
    }

    let mut sorted = triangle.vertices.map(|v| v.snapped());
    sorted.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal));
    let [top, mid, bottom] = sorted;

    if top.y == bottom.y {
        return Err(DegenerateGeometry::ZeroHeight);
    }
    let cross = (mid.x - top.x) * (bottom.y - top.y) - (mid.y - top.y) * (bottom.x - top.x);
    if cross == 0.0 {
        return Err(DegenerateGeometry::ZeroArea);
    }

    if top.y == mid.y {
        return Ok(TriangleSplit::Flat(FlatTriangle {
            apex: bottom,
            base: [top, mid],
        }));
    }
    if mid.y == bottom.y {
        return Ok(TriangleSplit::Flat(FlatTriangle {
            apex: top,
            base: [mid, bottom],
        }));
    }

    let t = (mid.y - top.y) / (bottom.y - top.y);
    let mut cut = top.lerp(&bottom, t);
    cut.x = cut.x.trunc();
    cut.y = mid.y;

    Ok(TriangleSplit::Split {
        upper: FlatTriangle {
            apex: top,
            base: [mid, cut],
        },
        lower: FlatTriangle {
            apex: bottom,
            base: [mid, cut],
        },
    })
}

//=================================
// World space
//=================================

/// A texel coordinate together with the colour found there.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TexturePoint {
    pub x: f32,
    pub y: f32,
    pub colour: Colour,
}

impl TexturePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            colour: Colour::BLACK,
        }
    }

    pub fn coords(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Material {
    #[default]
    Plain,
    /// Texture coordinates for vertices 0, 1, 2.
    Textured([TexturePoint; 3]),
    Mirror,
}

/// A world-space triangle. The face normal is fixed at construction and
/// follows the vertex winding.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTriangle {
    vertices: [Point3<f32>; 3],
    normal: Vector3<f32>,
    pub colour: Colour,
    pub material: Material,
    /// Smoothed normals, one per vertex. Defaults to the face normal.
    pub vertex_normals: [Vector3<f32>; 3],
}

impl ModelTriangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>, colour: Colour) -> Self {
        let normal = (v0 - v1).cross(&(v0 - v2));
        let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
        Self {
            vertices: [v0, v1, v2],
            normal,
            colour,
            material: Material::Plain,
            vertex_normals: [normal; 3],
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>; 3] {
        &self.vertices
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    pub fn is_textured(&self) -> bool {
        matches!(self.material, Material::Textured(_))
    }

    pub fn is_mirror(&self) -> bool {
        matches!(self.material, Material::Mirror)
    }

    /// True when the vertices are collinear and no normal exists.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector3::zeros()
    }

    pub fn centroid(&self) -> Point3<f32> {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }
}
