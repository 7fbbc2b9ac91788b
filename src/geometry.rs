// SPDX: CC0-1.0

use crate::{Axis, Color, Number, Vec3};

/// Axis-aligned box in world units.
///
/// An empty box has `min > max` on every axis, so extending it with the first
/// point collapses it onto that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3([Number::INFINITY; 3]),
        max: Vec3([Number::NEG_INFINITY; 3]),
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut ret = Self::EMPTY;
        for p in points {
            ret.extend(*p);
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        Axis::ALL
            .into_iter()
            .any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn extend(&mut self, p: Vec3) {
        for axis in Axis::ALL {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn union(mut self, other: &Self) -> Self {
        for axis in Axis::ALL {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
        self
    }

    /// Widens the box along one axis to include `lo..=hi`.
    pub fn include_span(&mut self, axis: Axis, lo: Number, hi: Number) {
        self.min[axis] = self.min[axis].min(lo);
        self.max[axis] = self.max[axis].max(hi);
    }

    /// Whether `lo..=hi` along `axis` lies inside the box.
    pub fn covers(&self, axis: Axis, lo: Number, hi: Number) -> bool {
        !(self.max[axis] < hi || self.min[axis] > lo)
    }
}

/// A line segment of the grid or the axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub from: Vec3,
    pub to: Vec3,
    pub weight: Weight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Minor,
    Major,
    Axis,
}

/// Where a tick label goes; drawing the glyphs is up to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub anchor: Vec3,
    pub scale: Number,
}

/// Indexed triangle mesh over a regular grid of samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
    pub points: Vec<Vec3>,
    pub colors: Vec<Color>,
    pub indices: Vec<[u32; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Independent polylines, split where the curve breaks.
    Polylines(Vec<Vec<Vec3>>),
    Surface(Surface),
    Point(Vec3),
    /// Closed outline; the first vertex is repeated at the end.
    LineLoop(Vec<Vec3>),
    Lines(Vec<Line>),
    Labels(Vec<Label>),
    Group(Vec<Geometry>),
}

impl Geometry {
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Polylines(segments) => BoundingBox::from_points(segments.iter().flatten()),
            Self::Surface(surface) => BoundingBox::from_points(&surface.points),
            Self::Point(p) => BoundingBox::from_points([p]),
            Self::LineLoop(points) => BoundingBox::from_points(points),
            Self::Lines(lines) => {
                BoundingBox::from_points(lines.iter().flat_map(|line| [&line.from, &line.to]))
            }
            Self::Labels(labels) => BoundingBox::from_points(labels.iter().map(|l| &l.anchor)),
            Self::Group(children) => children
                .iter()
                .fold(BoundingBox::EMPTY, |acc, child| acc.union(&child.bounding_box())),
        }
    }

    /// Number of leaf buffers a renderer allocates for this geometry.
    pub fn buffer_count(&self) -> usize {
        match self {
            Self::Polylines(segments) => segments.len(),
            Self::Group(children) => children.iter().map(Geometry::buffer_count).sum(),
            Self::Surface(_)
            | Self::Point(_)
            | Self::LineLoop(_)
            | Self::Lines(_)
            | Self::Labels(_) => 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_box() {
        assert!(BoundingBox::EMPTY.is_empty());
        let b = BoundingBox::from_points(&[Vec3::new(1.0, 2.0, 3.0)]);
        assert!(!b.is_empty());
        assert_eq!(b.min, b.max);
    }

    #[test]
    fn covers_span() {
        let b = BoundingBox::new(Vec3::new(-10.0, -1.0, 0.0), Vec3::new(10.0, 1.0, 0.0));
        assert!(b.covers(Axis::X, -5.0, 5.0));
        assert!(b.covers(Axis::X, -10.0, 10.0));
        assert!(!b.covers(Axis::X, -12.0, 12.0));
        assert!(!b.covers(Axis::X, -5.0, 11.0));
        assert!(!b.covers(Axis::Y, -5.0, 0.0));
    }

    #[test]
    fn group_box_is_union() {
        let g = Geometry::Group(vec![
            Geometry::Point(Vec3::new(-1.0, 0.0, 0.0)),
            Geometry::Polylines(vec![
                vec![Vec3::new(0.0, 5.0, 0.0)],
                vec![Vec3::new(3.0, -2.0, 1.0)],
            ]),
        ]);
        let b = g.bounding_box();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 5.0, 1.0));
        assert_eq!(g.buffer_count(), 3);
    }
}
