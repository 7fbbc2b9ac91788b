// SPDX: CC0-1.0

pub mod dimension;
pub mod eval;
pub mod geometry;
pub mod layout;
pub mod lex;
pub mod parse;
pub mod plotter;
pub mod redraw;
pub mod render;
pub mod sample;
pub mod scope;
pub mod shell;
pub mod statement;
pub mod stdlib;
pub mod text;
pub mod view;

use core::{f64::consts::FRAC_PI_4, fmt, ops::Index, ops::IndexMut};

pub type Number = f64;

/// A coordinate dimension of the plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::X => stdlib::X,
            Self::Y => stdlib::Y,
            Self::Z => stdlib::Z,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.name() == name)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in world space, indexed by [`Axis`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3(pub [Number; 3]);

impl Vec3 {
    pub const ZERO: Self = Self([0.0; 3]);

    #[inline]
    pub const fn new(x: Number, y: Number, z: Number) -> Self {
        Self([x, y, z])
    }

    pub const fn x(&self) -> Number {
        self.0[0]
    }

    pub const fn y(&self) -> Number {
        self.0[1]
    }

    pub const fn z(&self) -> Number {
        self.0[2]
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }

    pub fn dot(self, rhs: Self) -> Number {
        self.0.iter().zip(rhs.0).map(|(a, b)| a * b).sum()
    }

    pub fn length(self) -> Number {
        self.dot(self).sqrt()
    }

    /// Angle in radians between two vectors, zero if either is degenerate.
    pub fn angle_to(self, rhs: Self) -> Number {
        let denom = self.length() * rhs.length();
        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }
        (self.dot(rhs) / denom).clamp(-1.0, 1.0).acos()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl Index<Axis> for Vec3 {
    type Output = Number;

    fn index(&self, axis: Axis) -> &Number {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for Vec3 {
    fn index_mut(&mut self, axis: Axis) -> &mut Number {
        &mut self.0[axis.index()]
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x(), self.y(), self.z())
    }
}

/// Identifies the text field a statement was typed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether the scene is a flat pannable plane or an orbitable volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Flat,
    Space,
}

impl Mode {
    pub const fn axes(self) -> &'static [Axis] {
        match self {
            Self::Flat => &[Axis::X, Axis::Y],
            Self::Space => &[Axis::X, Axis::Y, Axis::Z],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Flat => "2D",
            Self::Space => "3D",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Flat => Self::Space,
            Self::Space => Self::Flat,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An RGB color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub fn lerp(self, other: Self, t: Number) -> Self {
        let t = t.clamp(0.0, 1.0) as f32;
        let mut out = [0.0; 3];
        for (i, c) in out.iter_mut().enumerate() {
            *c = self.0[i] * (1.0 - t) + other.0[i] * t;
        }
        Self(out)
    }
}

/// Which end of the interval a bisection step gives up when the midpoint
/// doesn't lie between the two ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Narrowing {
    /// Replace the end whose output is farther from the midpoint's.
    #[default]
    Farther,
    /// Replace the end whose output is nearer, so the interval keeps the
    /// bigger jump. This finds poles the other rule steps over.
    Nearer,
}

#[derive(Clone, Debug)]
pub struct SamplerConfig {
    /// Angle between consecutive chords above which a step is suspected to
    /// cross a discontinuity.
    pub angle_threshold: Number,
    /// Bisection iterations spent confirming a suspected discontinuity.
    pub bisection_steps: u32,
    pub narrowing: Narrowing,
    /// Geometry is generated for this multiple of the visible half-extent.
    pub lookahead: Number,
    /// Samples per half-axis when sweeping a surface.
    pub surface_steps: u32,
    /// Half-length of the static scene in space mode.
    pub surface_extent: Number,
    /// Surface shading from the lowest to the highest output value.
    pub gradient: [Color; 2],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            angle_threshold: FRAC_PI_4,
            bisection_steps: 10,
            narrowing: Narrowing::default(),
            lookahead: 2.0,
            surface_steps: 32,
            surface_extent: 10.0,
            gradient: [Color([0.1, 0.2, 0.9]), Color([0.9, 0.2, 0.1])],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub sampler: SamplerConfig,
    /// Relative change in camera depth that forces full regeneration.
    pub zoom_ratio: Number,
    pub camera: view::Camera,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            zoom_ratio: 1.2,
            camera: view::Camera::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn axis_names_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_name(axis.name()), Some(axis));
        }
        assert_eq!(Axis::from_name("t"), None);
    }

    #[test]
    fn angle_between_vectors() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 2.0, 0.0);
        assert!((a.angle_to(b) - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(a.angle_to(Vec3::ZERO), 0.0);
    }

    #[test]
    fn color_lerp_clamps() {
        let a = Color([0.0, 0.0, 0.0]);
        let b = Color([1.0, 1.0, 1.0]);
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, 0.5), Color([0.5, 0.5, 0.5]));

        let low = Color([0.1, 0.2, 0.9]);
        let high = Color([0.9, 0.2, 0.1]);
        assert_eq!(low.lerp(high, 0.0), low);
        assert_eq!(low.lerp(high, 1.0), high);
    }
}
