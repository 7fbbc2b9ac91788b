// SPDX: CC0-1.0

use crate::{
    geometry::{BoundingBox, Geometry, Label, Line, Weight},
    view::Viewport,
    Axis, Mode, Number, Vec3,
};

/// Half-length of the static scene in space mode.
const SPACE_EXTENT: Number = 10.0;
/// Distance between grid lines in space mode.
const SPACE_SPACING: Number = 0.4;
/// Distance between labels in space mode.
const SPACE_LABEL_STEP: Number = 2.0;

/// Grid or axes geometry and the box it was generated for.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub geometry: Geometry,
    pub bbox: BoundingBox,
}

/// Spacing between major grid lines: a power of two a few steps below the
/// visible half-extent.
pub fn grid_size(visible: [Number; 2]) -> Number {
    let size = visible
        .into_iter()
        .filter(|extent| extent.is_finite() && *extent > 0.0)
        .map(|extent| (extent.log2() - 2.0).floor().exp2())
        .fold(0.0, Number::max);
    if size > 0.0 {
        size
    } else {
        1.0
    }
}

/// The 2D axes of `Mode::Flat`.
const PLANE: [Axis; 2] = [Axis::X, Axis::Y];

fn other(axis: Axis) -> Axis {
    match axis {
        Axis::X => Axis::Y,
        _ => Axis::X,
    }
}

/// The range geometry is generated for along `axis`.
fn generated_span(viewport: &Viewport, axis: Axis, lookahead: Number) -> (Number, Number) {
    let center = viewport.camera[axis];
    let half = viewport.extent(axis) * lookahead;
    (center - half, center + half)
}

/// Number of steps of `step` from `start` that stay at or below `end`.
fn steps_until(start: Number, end: Number, step: Number) -> usize {
    if end < start || step <= 0.0 {
        return 0;
    }
    ((end - start) / step + 1e-9).floor() as usize
}

/// Where the axes cross. Each coordinate is the origin when it is on
/// screen, otherwise it hugs the nearest edge two minor lines in.
pub fn axis_intersection(viewport: &Viewport) -> Vec3 {
    let minor = viewport.grid_size / 10.0;
    let mut ret = Vec3::ZERO;
    for axis in PLANE {
        let (lo, hi) = viewport.span(axis);
        ret[axis] = if lo > 0.0 {
            ((lo + 2.0 * minor) / minor).round() * minor
        } else if hi < 0.0 {
            ((hi - 2.0 * minor) / minor).round() * minor
        } else {
            0.0
        };
    }
    ret
}

/// Formats a tick value, switching to exponential notation strictly between
/// -1 and 1.
pub fn format_label(n: Number) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.abs() < 1.0 {
        format!("{n:e}")
    } else {
        n.to_string()
    }
}

pub fn grid(mode: Mode, viewport: &Viewport, lookahead: Number) -> Layout {
    match mode {
        Mode::Flat => flat_grid(viewport, lookahead),
        Mode::Space => space_grid(),
    }
}

pub fn axes(mode: Mode, viewport: &Viewport, lookahead: Number, intersection: Vec3) -> Layout {
    match mode {
        Mode::Flat => flat_axes(viewport, lookahead, intersection),
        Mode::Space => space_axes(),
    }
}

fn flat_grid(viewport: &Viewport, lookahead: Number) -> Layout {
    let size = viewport.grid_size;
    let minor = size / 10.0;
    let mut lines = Vec::new();
    let mut bbox = BoundingBox::new(Vec3::ZERO, Vec3::ZERO);

    for axis in PLANE {
        let (lo, hi) = generated_span(viewport, axis, lookahead);
        let (across_lo, across_hi) = generated_span(viewport, other(axis), lookahead);
        let start = (lo / size).round() * size;
        for i in 0..=steps_until(start, hi, minor) {
            let val = start + i as Number * minor;
            let mut from = Vec3::ZERO;
            from[axis] = val;
            from[other(axis)] = across_lo;
            let mut to = from;
            to[other(axis)] = across_hi;
            lines.push(Line {
                from,
                to,
                weight: if i % 10 == 0 {
                    Weight::Major
                } else {
                    Weight::Minor
                },
            });
        }

        // the lines only reach as far as the rounded ends, so claim no more
        bbox.min[axis] = start.max(lo);
        bbox.max[axis] = ((hi / size).round() * size).min(hi);
    }

    Layout {
        geometry: Geometry::Lines(lines),
        bbox,
    }
}

fn flat_axes(viewport: &Viewport, lookahead: Number, intersection: Vec3) -> Layout {
    let size = viewport.grid_size;
    let scale = size / 4.0;
    let mut lines = Vec::with_capacity(PLANE.len());
    let mut labels = Vec::new();

    for axis in PLANE {
        let across = other(axis);
        let (lo, hi) = generated_span(viewport, axis, lookahead);

        let mut from = intersection;
        from[axis] = lo;
        let mut to = intersection;
        to[axis] = hi;
        lines.push(Line {
            from,
            to,
            weight: Weight::Axis,
        });

        // labels sit on the side of the axis facing away from the origin
        let offset = if intersection[across] <= 0.0 {
            -scale
        } else {
            scale
        };
        let start = (lo / size).round();
        let half = size / 2.0;
        for i in 0..=steps_until(start * size, hi, half) {
            let val = start * size + i as Number * half;
            if (val - intersection[axis]).abs() < 1e-10 {
                continue;
            }
            let mut anchor = intersection;
            anchor[axis] = val;
            anchor[across] += offset;
            labels.push(Label {
                text: format_label(val),
                anchor,
                scale,
            });
        }
    }

    let lines = Geometry::Lines(lines);
    let bbox = lines.bounding_box();
    Layout {
        geometry: Geometry::Group(vec![lines, Geometry::Labels(labels)]),
        bbox,
    }
}

fn space_grid() -> Layout {
    let count = steps_until(-SPACE_EXTENT, SPACE_EXTENT, SPACE_SPACING);
    let mut lines = Vec::new();
    for axis in Axis::ALL {
        for across in Axis::ALL.into_iter().filter(|&a| a != axis) {
            for i in 0..=count {
                let mut from = Vec3::ZERO;
                from[axis] = -SPACE_EXTENT + i as Number * SPACE_SPACING;
                from[across] = -SPACE_EXTENT;
                let mut to = from;
                to[across] = SPACE_EXTENT;
                // majors land on multiples of 4, counting from the center
                let major = (i as i64 - 5) % 10 == 0;
                lines.push(Line {
                    from,
                    to,
                    weight: if major { Weight::Major } else { Weight::Minor },
                });
            }
        }
    }
    let geometry = Geometry::Lines(lines);
    Layout {
        bbox: geometry.bounding_box(),
        geometry,
    }
}

fn space_axes() -> Layout {
    let mut lines = Vec::with_capacity(3);
    let mut labels = Vec::new();
    let count = steps_until(-SPACE_EXTENT, SPACE_EXTENT, SPACE_LABEL_STEP);
    for axis in Axis::ALL {
        let mut from = Vec3::ZERO;
        from[axis] = -SPACE_EXTENT;
        let mut to = Vec3::ZERO;
        to[axis] = SPACE_EXTENT;
        lines.push(Line {
            from,
            to,
            weight: Weight::Axis,
        });

        for i in 0..=count {
            let mut anchor = Vec3::ZERO;
            anchor[axis] = -SPACE_EXTENT + i as Number * SPACE_LABEL_STEP;
            labels.push(Label {
                text: format_label(anchor[axis]),
                anchor,
                scale: 1.0,
            });
        }
    }
    let lines = Geometry::Lines(lines);
    let bbox = lines.bounding_box();
    Layout {
        geometry: Geometry::Group(vec![lines, Geometry::Labels(labels)]),
        bbox,
    }
}
