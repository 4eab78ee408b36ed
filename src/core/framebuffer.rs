use atomic_float::AtomicF32;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// Destination for packed ARGB pixels.
///
/// Implementations must tolerate concurrent `set_pixel` calls and ignore
/// coordinates outside the surface.
pub trait PixelSink: Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn set_pixel(&self, x: usize, y: usize, argb: u32);

    #[inline(always)]
    fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height()
    }
}

/// A 2D colour buffer of packed `0xAARRGGBB` values.
/// Each cell is atomic so rows and triangles can be drawn in parallel.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pixels: Vec<AtomicU32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        pixels.resize_with(width * height, || AtomicU32::new(0));
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn clear(&self, argb: u32) {
        self.pixels
            .par_iter()
            .for_each(|p| p.store(argb, Ordering::Relaxed));
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.pixels[self.index(x, y)].load(Ordering::Relaxed))
    }

    /// Copies the buffer out, row-major.
    pub fn to_argb(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect()
    }
}

impl PixelSink for FrameBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn set_pixel(&self, x: usize, y: usize, argb: u32) {
        if self.in_bounds(x, y) {
            self.pixels[self.index(x, y)].store(argb, Ordering::Relaxed);
        }
    }
}

/// Value every cell holds after `clear`; anything in front of the camera beats it.
pub const DEPTH_CLEAR_VALUE: f32 = -100.0;

/// Per-pixel depth proxy (`-1/z`, larger is closer).
///
/// Depth is stored as atomic floats so it can be read without locking.
/// Writers go through `write_if_closer`, which holds a striped lock for the
/// pixel across compare, store and colour write.
pub struct DepthBuffer {
    pub width: usize,
    pub height: usize,
    depth: Vec<AtomicF32>,
    locks: Vec<Mutex<()>>,
}

impl DepthBuffer {
    const LOCK_COUNT: usize = 1024;

    pub fn new(width: usize, height: usize) -> Self {
        let mut depth = Vec::with_capacity(width * height);
        depth.resize_with(width * height, || AtomicF32::new(DEPTH_CLEAR_VALUE));

        let mut locks = Vec::with_capacity(Self::LOCK_COUNT);
        locks.resize_with(Self::LOCK_COUNT, || Mutex::new(()));

        Self {
            width,
            height,
            depth,
            locks,
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn clear(&self) {
        self.depth
            .par_iter()
            .for_each(|d| d.store(DEPTH_CLEAR_VALUE, Ordering::Relaxed));
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.depth[self.index(x, y)].load(Ordering::Relaxed))
    }

    /// Runs `write` and records `depth` iff it is strictly closer than what the
    /// buffer holds. Returns whether the write happened.
    #[inline]
    pub fn write_if_closer(&self, x: usize, y: usize, depth: f32, write: impl FnOnce()) -> bool {
        if !self.in_bounds(x, y) || depth.is_nan() {
            return false;
        }
        let idx = self.index(x, y);
        let _guard = self.locks[idx % self.locks.len()].lock();

        let cell = &self.depth[idx];
        if cell.load(Ordering::Relaxed) < depth {
            cell.store(depth, Ordering::Relaxed);
            write();
            true
        } else {
            false
        }
    }

    /// Copies the buffer out, row-major.
    pub fn snapshot(&self) -> Vec<f32> {
        self.depth
            .iter()
            .map(|d| d.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let fb = FrameBuffer::new(4, 3);
        fb.set_pixel(4, 0, 0xFFFF_FFFF);
        fb.set_pixel(0, 3, 0xFFFF_FFFF);
        assert!(fb.to_argb().iter().all(|&p| p == 0));
        assert_eq!(fb.get_pixel(4, 0), None);
    }

    #[test]
    fn clear_fills_every_pixel() {
        let fb = FrameBuffer::new(5, 5);
        fb.set_pixel(2, 2, 7);
        fb.clear(0xFF00_0000);
        assert!(fb.to_argb().iter().all(|&p| p == 0xFF00_0000));
    }

    #[test]
    fn depth_write_requires_strictly_closer_value() {
        let depth = DepthBuffer::new(2, 2);
        assert_eq!(depth.get(1, 1), Some(DEPTH_CLEAR_VALUE));

        let mut writes = 0;
        assert!(depth.write_if_closer(1, 1, 0.5, || writes += 1));
        assert!(!depth.write_if_closer(1, 1, 0.5, || writes += 1));
        assert!(!depth.write_if_closer(1, 1, 0.2, || writes += 1));
        assert!(depth.write_if_closer(1, 1, 0.9, || writes += 1));
        assert_eq!(writes, 2);
        assert_eq!(depth.get(1, 1), Some(0.9));

        assert!(!depth.write_if_closer(2, 0, 1.0, || writes += 1));
        assert!(!depth.write_if_closer(0, 0, f32::NAN, || writes += 1));

        depth.clear();
        assert!(depth.snapshot().iter().all(|&d| d == DEPTH_CLEAR_VALUE));
    }
}
