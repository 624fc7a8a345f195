//! Geometry APIs
//!
//! DOMRect and the content-box sizes reported to resize observers.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Logical box extents in px (horizontal writing mode)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxSize {
    pub inline_size: f32,
    pub block_size: f32,
}

impl BoxSize {
    pub fn new(inline_size: f32, block_size: f32) -> Self {
        Self { inline_size, block_size }
    }

    /// Whether two sizes differ by more than layout rounding noise
    pub fn differs_from(&self, other: &BoxSize) -> bool {
        (self.inline_size - other.inline_size).abs() > 0.01
            || (self.block_size - other.block_size).abs() > 0.01
    }

    /// As a rect anchored at the origin
    pub fn to_rect(self) -> DOMRect {
        DOMRect::from_xywh(0.0, 0.0, self.inline_size as f64, self.block_size as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differs_ignores_noise() {
        let a = BoxSize::new(300.0, 100.0);
        assert!(!a.differs_from(&BoxSize::new(300.001, 100.0)));
        assert!(a.differs_from(&BoxSize::new(301.0, 100.0)));
        assert!(a.differs_from(&BoxSize::new(300.0, 90.0)));
    }

    #[test]
    fn test_to_rect() {
        let rect = BoxSize::new(450.0, 20.0).to_rect();
        assert_eq!(rect.right(), 450.0);
        assert_eq!(rect.bottom(), 20.0);
    }
}
