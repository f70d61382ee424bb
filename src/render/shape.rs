//! Module geometry shared by the raster and SVG back ends
//!
//! Every shape is expressed in module units with the quiet zone already
//! applied, so `(0, 0)` is the top-left corner of the output.

use super::Symbol;
use super::style::ModuleShape;

/// Edge length of a finder pattern, in modules
pub const FINDER_SIZE: usize = 7;

const ROUND_MODULE_RADIUS: f64 = 0.35;
const ROUND_FINDER_RADIUS: f64 = 2.0;
const ROUND_EYE_RADIUS: f64 = 1.0;

/// A filled region in module space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Axis-aligned rectangle with corner radius `r` (0 for sharp corners)
    Rect {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width
        w: f64,
        /// Height
        h: f64,
        /// Corner radius
        r: f64,
    },
    /// Disc
    Circle {
        /// Center x
        cx: f64,
        /// Center y
        cy: f64,
        /// Radius
        r: f64,
    },
    /// Square outline of the given stroke thickness and outer corner radius
    Frame {
        /// Left edge of the outer square
        x: f64,
        /// Top edge of the outer square
        y: f64,
        /// Outer edge length
        size: f64,
        /// Stroke thickness
        thickness: f64,
        /// Outer corner radius
        r: f64,
    },
    /// Circular ring
    Annulus {
        /// Center x
        cx: f64,
        /// Center y
        cy: f64,
        /// Outer radius
        outer: f64,
        /// Inner radius
        inner: f64,
    },
}

impl Primitive {
    /// Whether the point lies inside the shape. Edges are half-open so
    /// adjacent square modules tile without overlap.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match *self {
            Primitive::Rect { x, y, w, h, r } => in_rounded_rect(px, py, x, y, w, h, r),
            Primitive::Circle { cx, cy, r } => dist_sq(px, py, cx, cy) <= r * r,
            Primitive::Frame {
                x,
                y,
                size,
                thickness,
                r,
            } => {
                let inner = size - 2.0 * thickness;
                in_rounded_rect(px, py, x, y, size, size, r)
                    && !in_rounded_rect(
                        px,
                        py,
                        x + thickness,
                        y + thickness,
                        inner,
                        inner,
                        (r - thickness).max(0.0),
                    )
            }
            Primitive::Annulus {
                cx,
                cy,
                outer,
                inner,
            } => {
                let d = dist_sq(px, py, cx, cy);
                d <= outer * outer && d > inner * inner
            }
        }
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match *self {
            Primitive::Rect { x, y, w, h, .. } => (x, y, x + w, y + h),
            Primitive::Circle { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
            Primitive::Frame { x, y, size, .. } => (x, y, x + size, y + size),
            Primitive::Annulus { cx, cy, outer, .. } => {
                (cx - outer, cy - outer, cx + outer, cy + outer)
            }
        }
    }
}

fn dist_sq(px: f64, py: f64, cx: f64, cy: f64) -> f64 {
    (px - cx).powi(2) + (py - cy).powi(2)
}

fn in_rounded_rect(px: f64, py: f64, x: f64, y: f64, w: f64, h: f64, r: f64) -> bool {
    if px < x || py < y || px >= x + w || py >= y + h {
        return false;
    }
    let r = r.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        return true;
    }
    let dx = (x + r - px).max(px - (x + w - r)).max(0.0);
    let dy = (y + r - py).max(py - (y + h - r)).max(0.0);
    dx * dx + dy * dy <= r * r
}

/// Whether module `(x, y)` belongs to one of the three finder patterns.
pub fn in_finder(width: usize, x: usize, y: usize) -> bool {
    let near_start = |v: usize| v < FINDER_SIZE;
    let near_end = |v: usize| v + FINDER_SIZE >= width;
    (near_start(x) && near_start(y))
        || (near_end(x) && near_start(y))
        || (near_start(x) && near_end(y))
}

/// Lay out every dark module of `symbol` as shapes.
///
/// Finder patterns use `corner`; all other dark modules use `pixel`.
pub fn layout(
    symbol: &Symbol,
    margin: u32,
    corner: ModuleShape,
    pixel: ModuleShape,
) -> Vec<Primitive> {
    let width = symbol.width();
    let offset = f64::from(margin);
    let mut shapes = Vec::with_capacity(width * width / 2);

    for (fx, fy) in [
        (0, 0),
        (width - FINDER_SIZE, 0),
        (0, width - FINDER_SIZE),
    ] {
        shapes.extend(finder(offset + fx as f64, offset + fy as f64, corner));
    }

    for y in 0..width {
        for x in 0..width {
            if in_finder(width, x, y) || !symbol.is_dark(x, y) {
                continue;
            }
            shapes.push(module(offset + x as f64, offset + y as f64, pixel));
        }
    }

    shapes
}

fn module(x: f64, y: f64, shape: ModuleShape) -> Primitive {
    match shape {
        ModuleShape::Square => Primitive::Rect {
            x,
            y,
            w: 1.0,
            h: 1.0,
            r: 0.0,
        },
        ModuleShape::Dot => Primitive::Circle {
            cx: x + 0.5,
            cy: y + 0.5,
            r: 0.5,
        },
        ModuleShape::Round => Primitive::Rect {
            x,
            y,
            w: 1.0,
            h: 1.0,
            r: ROUND_MODULE_RADIUS,
        },
    }
}

fn finder(x: f64, y: f64, shape: ModuleShape) -> [Primitive; 2] {
    let size = FINDER_SIZE as f64;
    match shape {
        ModuleShape::Square | ModuleShape::Round => {
            let (outer_r, eye_r) = if shape == ModuleShape::Round {
                (ROUND_FINDER_RADIUS, ROUND_EYE_RADIUS)
            } else {
                (0.0, 0.0)
            };
            [
                Primitive::Frame {
                    x,
                    y,
                    size,
                    thickness: 1.0,
                    r: outer_r,
                },
                Primitive::Rect {
                    x: x + 2.0,
                    y: y + 2.0,
                    w: 3.0,
                    h: 3.0,
                    r: eye_r,
                },
            ]
        }
        ModuleShape::Dot => {
            let center = size / 2.0;
            [
                Primitive::Annulus {
                    cx: x + center,
                    cy: y + center,
                    outer: center,
                    inner: center - 1.0,
                },
                Primitive::Circle {
                    cx: x + center,
                    cy: y + center,
                    r: 1.5,
                },
            ]
        }
    }
}
