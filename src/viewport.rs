use serde::{Deserialize, Serialize};

/// Translate + uniform scale applied to the whole map group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Transform {
    pub const fn identity() -> Self {
        Self { x: 0.0, y: 0.0, k: 1.0 }
    }

    /// Value for the SVG `transform` attribute.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }

    /// Screen position of a point in map coordinates.
    pub fn apply(&self, point: [f64; 2]) -> [f64; 2] {
        [point[0] * self.k + self.x, point[1] * self.k + self.y]
    }

    /// Map coordinates of a screen position.
    pub fn invert(&self, point: [f64; 2]) -> [f64; 2] {
        [(point[0] - self.x) / self.k, (point[1] - self.y) / self.k]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// Drag by a screen-space offset.
    Pan { dx: f64, dy: f64 },
    /// Multiply the scale by `factor`, keeping `anchor` (screen space) fixed.
    Zoom { factor: f64, anchor: [f64; 2] },
}

/// Owns the current pan/zoom transform. Only gesture events change it.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    transform: Transform,
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn apply(&mut self, event: ViewportEvent) -> &Transform {
        match event {
            ViewportEvent::Pan { dx, dy } => {
                if dx.is_finite() && dy.is_finite() {
                    self.transform.x += dx;
                    self.transform.y += dy;
                }
            }
            ViewportEvent::Zoom { factor, anchor } => {
                if factor.is_finite() && factor > 0.0 && anchor.iter().all(|v| v.is_finite()) {
                    let fixed = self.transform.invert(anchor);
                    self.transform.k *= factor;
                    self.transform.x = anchor[0] - fixed[0] * self.transform.k;
                    self.transform.y = anchor[1] - fixed[1] * self.transform.k;
                }
            }
        }
        &self.transform
    }
}
