use serde::Serialize;

/// A horizontal strip of the canvas with a fixed height.
///
/// Bins are appended left to right; the cursor `x` never moves back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Shelf {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) free: u32,
}

impl Shelf {
    pub fn new(y: u32, w: u32, h: u32) -> Self {
        Self {
            x: 0,
            y,
            w,
            h,
            free: w,
        }
    }

    /// Reserves `w` pixels at the cursor. Returns the slot's `x` or `None` if
    /// the request is wider than the remaining space or taller than the shelf.
    pub fn alloc(&mut self, w: u32, h: u32) -> Option<u32> {
        if w > self.free || h > self.h {
            return None;
        }
        let x = self.x;
        self.x += w;
        self.free -= w;
        Some(x)
    }

    /// Follows a canvas width change. The caller guarantees `w >= self.x`.
    pub fn resize(&mut self, w: u32) {
        debug_assert!(w >= self.x, "shelf cannot shrink below its cursor");
        self.free = w - self.x;
        self.w = w;
    }

    pub fn x(&self) -> u32 {
        self.x
    }
    pub fn y(&self) -> u32 {
        self.y
    }
    pub fn width(&self) -> u32 {
        self.w
    }
    pub fn height(&self) -> u32 {
        self.h
    }
    pub fn free(&self) -> u32 {
        self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_advances_cursor() {
        let mut sh = Shelf::new(0, 64, 10);
        assert_eq!(sh.alloc(10, 10), Some(0));
        assert_eq!(sh.alloc(10, 8), Some(10));
        assert_eq!(sh.x(), 20);
        assert_eq!(sh.free(), 44);
    }

    #[test]
    fn alloc_rejects_too_wide_or_too_tall() {
        let mut sh = Shelf::new(0, 10, 10);
        assert_eq!(sh.alloc(10, 11), None);
        assert_eq!(sh.alloc(11, 10), None);
        assert_eq!(sh.alloc(10, 10), Some(0));
        assert_eq!(sh.alloc(1, 1), None);
        assert_eq!(sh.free(), 0);
    }

    #[test]
    fn resize_keeps_cursor() {
        let mut sh = Shelf::new(5, 10, 10);
        sh.alloc(10, 10);
        sh.resize(40);
        assert_eq!(sh.width(), 40);
        assert_eq!(sh.free(), 30);
        assert_eq!(sh.alloc(30, 10), Some(10));
        assert_eq!(sh.y(), 5);
        assert_eq!(sh.height(), 10);
    }
}
