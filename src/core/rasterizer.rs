use crate::core::color::Colour;
use crate::core::framebuffer::{DepthBuffer, PixelSink};
use crate::core::geometry::{
    CanvasPoint, CanvasTriangle, DegenerateGeometry, FlatTriangle, split_triangle,
};
use crate::scene::texture::TextureMap;
use nalgebra::Vector2;

/// Draws screen-space primitives into a pixel sink.
///
/// With a depth buffer attached, every pixel goes through
/// `DepthBuffer::write_if_closer`; without one, later writes win.
pub struct Rasterizer<'a, S: PixelSink + ?Sized> {
    sink: &'a S,
    depth: Option<&'a DepthBuffer>,
}

impl<'a, S: PixelSink + ?Sized> Rasterizer<'a, S> {
    pub fn new(sink: &'a S) -> Self {
        Self { sink, depth: None }
    }

    pub fn with_depth(sink: &'a S, depth: &'a DepthBuffer) -> Self {
        Self {
            sink,
            depth: Some(depth),
        }
    }

    /// Parametric line: `|dx| + |dy| + 1` samples between the truncated
    /// endpoints, clipped to the viewport first.
    pub fn draw_line(&self, from: &CanvasPoint, to: &CanvasPoint, colour: Colour) {
        let argb = colour.to_argb();
        self.trace_line(from, to, &|_| argb);
    }

    pub fn draw_stroked_triangle(&self, triangle: &CanvasTriangle, colour: Colour) {
        self.draw_line(&triangle[0], &triangle[1], colour);
        self.draw_line(&triangle[1], &triangle[2], colour);
        self.draw_line(&triangle[0], &triangle[2], colour);
    }

    pub fn draw_filled_triangle(
        &self,
        triangle: &CanvasTriangle,
        colour: Colour,
    ) -> Result<(), DegenerateGeometry> {
        let argb = colour.to_argb();
        self.fill(triangle, &|_| argb)
    }

    /// Fills using each vertex's texture coordinate, sampled nearest-neighbour.
    /// Vertices without a coordinate map to texel (0, 0).
    pub fn draw_textured_triangle(
        &self,
        triangle: &CanvasTriangle,
        texture: &TextureMap,
    ) -> Result<(), DegenerateGeometry> {
        self.fill(triangle, &|p: &CanvasPoint| {
            let uv = p.texture.unwrap_or_else(Vector2::zeros);
            texture.colour_at(uv.x, uv.y).to_argb()
        })
    }

    fn fill(
        &self,
        triangle: &CanvasTriangle,
        shade: &dyn Fn(&CanvasPoint) -> u32,
    ) -> Result<(), DegenerateGeometry> {
        let split = split_triangle(triangle)?;
        for half in split.halves() {
            self.fill_flat(half, shade);
        }
        Ok(())
    }

    /// Walks both edges from the apex to the base one scanline at a time.
    /// Spans collapsing to a single pixel are skipped.
    fn fill_flat(&self, flat: &FlatTriangle, shade: &dyn Fn(&CanvasPoint) -> u32) {
        let rows = flat.rows() as f32;
        let height = self.sink.height() as f32;
        let apex_y = flat.apex.y;
        let downward = flat.base[0].y >= apex_y;

        let (first, last) = if downward {
            ((-apex_y).max(0.0), (height - 1.0 - apex_y).min(rows - 1.0))
        } else {
            ((apex_y - (height - 1.0)).max(0.0), apex_y.min(rows - 1.0))
        };
        if first > last {
            return;
        }

        for i in first as usize..=last as usize {
            let t = if rows > 1.0 { i as f32 / (rows - 1.0) } else { 0.0 };
            let y = if downward { apex_y + i as f32 } else { apex_y - i as f32 };

            let mut left = flat.apex.lerp(&flat.base[0], t);
            let mut right = flat.apex.lerp(&flat.base[1], t);
            left.y = y;
            right.y = y;
            if left.x > right.x {
                std::mem::swap(&mut left, &mut right);
            }
            if left.same_pixel(&right) {
                continue;
            }
            self.trace_line(&left, &right, shade);
        }
    }

    fn trace_line(
        &self,
        from: &CanvasPoint,
        to: &CanvasPoint,
        shade: &dyn Fn(&CanvasPoint) -> u32,
    ) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let Some((from, to)) = self.clip_line(&from.snapped(), &to.snapped()) else {
            return;
        };

        let steps = ((to.x - from.x).abs() + (to.y - from.y).abs()).ceil() as usize + 1;
        if steps == 1 {
            self.plot(&from, shade(&from));
            return;
        }
        let last = (steps - 1) as f32;
        for i in 0..steps {
            let p = from.lerp(&to, i as f32 / last);
            self.plot(&p, shade(&p));
        }
    }

    /// Liang-Barsky against the pixel grid. Segments already inside are
    /// returned untouched.
    fn clip_line(
        &self,
        from: &CanvasPoint,
        to: &CanvasPoint,
    ) -> Option<(CanvasPoint, CanvasPoint)> {
        let x_max = self.sink.width() as f32 - 1.0;
        let y_max = self.sink.height() as f32 - 1.0;
        if x_max < 0.0 || y_max < 0.0 {
            return None;
        }

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;

        for (p, q) in [
            (-dx, from.x),
            (dx, x_max - from.x),
            (-dy, from.y),
            (dy, y_max - from.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let start = if t0 > 0.0 { from.lerp(to, t0) } else { *from };
        let end = if t1 < 1.0 { from.lerp(to, t1) } else { *to };
        Some((start, end))
    }

    #[inline]
    fn plot(&self, p: &CanvasPoint, argb: u32) {
        let (x, y) = (p.x.trunc(), p.y.trunc());
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if !self.sink.in_bounds(x, y) {
            return;
        }
        match self.depth {
            Some(depth) => {
                depth.write_if_closer(x, y, p.depth, || self.sink.set_pixel(x, y, argb));
            }
            None => self.sink.set_pixel(x, y, argb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::framebuffer::FrameBuffer;
    use crate::core::geometry::TexturePoint;

    const W: usize = 40;
    const H: usize = 30;

    fn lit(fb: &FrameBuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..fb.height {
            for x in 0..fb.width {
                if fb.get_pixel(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    fn point(x: f32, y: f32, depth: f32) -> CanvasPoint {
        CanvasPoint::with_depth(x, y, depth)
    }

    #[test]
    fn filled_triangle_ignores_vertex_order() {
        let a = point(3.0, 2.0, 0.5);
        let b = point(30.0, 11.0, 0.5);
        let c = point(12.0, 25.0, 0.5);
        let orders = [[a, b, c], [a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]];

        let mut reference = None;
        for [p, q, r] in orders {
            let fb = FrameBuffer::new(W, H);
            Rasterizer::new(&fb)
                .draw_filled_triangle(&CanvasTriangle::new(p, q, r), Colour::RED)
                .unwrap();
            let pixels = lit(&fb);
            assert!(!pixels.is_empty());
            match &reference {
                None => reference = Some(pixels),
                Some(expected) => assert_eq!(&pixels, expected),
            }
        }
    }

    #[test]
    fn depth_tested_fill_is_idempotent() {
        let fb = FrameBuffer::new(W, H);
        let depth = DepthBuffer::new(W, H);
        let tri = CanvasTriangle::new(
            point(1.0, 1.0, 0.3),
            point(35.0, 4.0, 0.4),
            point(9.0, 28.0, 0.2),
        );

        Rasterizer::with_depth(&fb, &depth)
            .draw_filled_triangle(&tri, Colour::CYAN)
            .unwrap();
        let first = fb.to_argb();
        let first_depth = depth.snapshot();

        fb.clear(0);
        depth.clear();
        Rasterizer::with_depth(&fb, &depth)
            .draw_filled_triangle(&tri, Colour::CYAN)
            .unwrap();
        assert_eq!(fb.to_argb(), first);
        assert_eq!(depth.snapshot(), first_depth);
    }

    #[test]
    fn nearer_triangle_wins_in_either_order() {
        let near = CanvasTriangle::new(
            point(5.0, 5.0, 0.5),
            point(30.0, 8.0, 0.5),
            point(10.0, 25.0, 0.5),
        );
        let far = CanvasTriangle::new(
            point(2.0, 3.0, 0.2),
            point(36.0, 14.0, 0.2),
            point(15.0, 28.0, 0.2),
        );

        let render = |first: (&CanvasTriangle, Colour), second: (&CanvasTriangle, Colour)| {
            let fb = FrameBuffer::new(W, H);
            let depth = DepthBuffer::new(W, H);
            let raster = Rasterizer::with_depth(&fb, &depth);
            raster.draw_filled_triangle(first.0, first.1).unwrap();
            raster.draw_filled_triangle(second.0, second.1).unwrap();
            fb.to_argb()
        };

        let a = render((&near, Colour::RED), (&far, Colour::BLUE));
        let b = render((&far, Colour::BLUE), (&near, Colour::RED));
        assert_eq!(a, b);
        assert!(a.contains(&Colour::RED.to_argb()));
        assert!(a.contains(&Colour::BLUE.to_argb()));
    }

    #[test]
    fn line_covers_both_endpoints() {
        let fb = FrameBuffer::new(W, H);
        Rasterizer::new(&fb).draw_line(
            &point(2.0, 3.0, 0.0),
            &point(20.0, 9.0, 0.0),
            Colour::WHITE,
        );
        let white = Some(Colour::WHITE.to_argb());
        assert_eq!(fb.get_pixel(2, 3), white);
        assert_eq!(fb.get_pixel(20, 9), white);
    }

    #[test]
    fn lines_leaving_the_viewport_are_clipped() {
        let fb = FrameBuffer::new(W, H);
        let raster = Rasterizer::new(&fb);
        raster.draw_line(&point(-50.0, 10.0, 0.0), &point(500.0, 10.0, 0.0), Colour::GREEN);
        raster.draw_line(&point(-5.0, -5.0, 0.0), &point(-1.0, -30.0, 0.0), Colour::GREEN);
        raster.draw_line(&point(f32::NAN, 1.0, 0.0), &point(3.0, 3.0, 0.0), Colour::GREEN);

        let pixels = lit(&fb);
        assert_eq!(pixels.len(), W);
        assert!(pixels.iter().all(|&(_, y)| y == 10));
    }

    #[test]
    fn degenerate_fill_writes_nothing() {
        let fb = FrameBuffer::new(W, H);
        let flat = CanvasTriangle::new(
            point(1.0, 5.0, 0.0),
            point(9.0, 5.0, 0.0),
            point(20.0, 5.0, 0.0),
        );
        assert_eq!(
            Rasterizer::new(&fb).draw_filled_triangle(&flat, Colour::RED),
            Err(DegenerateGeometry::ZeroHeight)
        );
        assert!(lit(&fb).is_empty());
    }

    #[test]
    fn far_off_canvas_vertex_is_rejected_without_drawing() {
        let fb = FrameBuffer::new(W, H);
        let depth = DepthBuffer::new(W, H);
        let tri = CanvasTriangle::new(
            point(5.0, 5.0, 0.5),
            point(30.0, 5.0, 0.5),
            point(10.0, 1e20, 0.5),
        );
        assert_eq!(
            Rasterizer::with_depth(&fb, &depth).draw_filled_triangle(&tri, Colour::RED),
            Err(DegenerateGeometry::OutOfRange)
        );
        assert!(lit(&fb).is_empty());
    }

    #[test]
    fn textured_fill_samples_texels() {
        let texture =
            TextureMap::from_fn(4, 4, |x, _| if x < 2 { Colour::RED } else { Colour::BLUE });
        let fb = FrameBuffer::new(W, H);
        let tri = CanvasTriangle::new(
            point(0.0, 0.0, 0.0).with_texture(TexturePoint::new(0.0, 0.0).coords()),
            point(39.0, 0.0, 0.0).with_texture(Vector2::new(3.9, 0.0)),
            point(0.0, 29.0, 0.0).with_texture(Vector2::new(0.0, 3.9)),
        );
        Rasterizer::new(&fb).draw_textured_triangle(&tri, &texture).unwrap();
        assert_eq!(fb.get_pixel(1, 1), Some(Colour::RED.to_argb()));
        assert_eq!(fb.get_pixel(36, 1), Some(Colour::BLUE.to_argb()));
    }
}
