// SPDX: CC0-1.0

use crate::{
    dimension::Dimensions,
    eval::{self, Program},
    geometry::{BoundingBox, Geometry, Surface},
    scope::Binding,
    view::Viewport,
    Axis, Color, Narrowing, Number, SamplerConfig, Vec3,
};
use log::trace;

/// Evenly spaced values along one axis, symmetric around `center`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    pub axis: Axis,
    pub center: Number,
    /// Distance from the center to either end.
    pub half: Number,
    /// Steps from the center to either end.
    pub steps: u32,
}

impl Sweep {
    /// The sweep a curve takes across the current view: `lookahead` times
    /// the visible half-extent either way, stepping by the half-extent over
    /// the pixel width.
    pub fn across(viewport: &Viewport, axis: Axis, lookahead: Number) -> Self {
        let pixels = Number::from(viewport.pixels_along(axis));
        Self {
            axis,
            center: viewport.camera[axis],
            half: viewport.extent(axis) * lookahead,
            steps: (pixels * lookahead).round().max(1.0) as u32,
        }
    }

    /// The fixed sweep a surface takes in space mode.
    pub fn fixed(axis: Axis, half: Number, steps: u32) -> Self {
        Self {
            axis,
            center: 0.0,
            half,
            steps: steps.max(1),
        }
    }

    pub const fn len(&self) -> usize {
        2 * self.steps as usize + 1
    }

    pub fn step(&self) -> Number {
        self.half / Number::from(self.steps.max(1))
    }

    /// The `i`th value; `value(i)` and `value(len - 1 - i)` mirror each other
    /// exactly around the center.
    pub fn value(&self, i: usize) -> Number {
        let offset = i as Number - Number::from(self.steps);
        self.center + self.step() * offset
    }

    pub fn bounds(&self) -> (Number, Number) {
        (self.center - self.half, self.center + self.half)
    }
}

/// Continuity state for one row of samples.
///
/// Only the tail of the open segment is needed to judge the next sample, so
/// the accumulator keeps two points and a count of segments closed so far.
#[derive(Debug, Default)]
struct SegmentAccumulator {
    tail: [Option<Vec3>; 2],
    closed: usize,
}

impl SegmentAccumulator {
    fn push(&mut self, p: Vec3) {
        self.tail = [self.tail[1], Some(p)];
    }

    /// Closes the open segment, if it has any points.
    fn flush(&mut self) {
        if self.tail[1].is_some() {
            self.closed += 1;
        }
        self.tail = [None; 2];
    }

    fn last_two(&self) -> Option<(Vec3, Vec3)> {
        Some((self.tail[0]?, self.tail[1]?))
    }

    /// Index of the open segment.
    const fn segment(&self) -> usize {
        self.closed
    }
}

/// One step of a row: the sample if it was kept, and which segment of the
/// row it belongs to.
type RowSample = Option<(Vec3, usize)>;

/// Evaluates one statement across its input axes.
///
/// Built fresh for every plot; owns the binding and evaluation stack it
/// samples with.
pub struct Sampler<'a, 'b> {
    program: &'a Program,
    binding: Binding<'b>,
    inputs: &'a [Axis],
    output: Axis,
    config: &'a SamplerConfig,
    stack: Vec<Number>,
}

impl<'a, 'b> Sampler<'a, 'b> {
    pub fn new(
        program: &'a Program,
        binding: Binding<'b>,
        dims: &'a Dimensions,
        config: &'a SamplerConfig,
    ) -> Self {
        Self {
            program,
            binding,
            inputs: &dims.inputs,
            output: dims.output,
            config,
            stack: Vec::new(),
        }
    }

    /// Evaluates at the input coordinates of `at`, filling in the output
    /// coordinate. Failed and non-finite samples yield `None`.
    fn sample(&mut self, mut at: Vec3) -> Option<Vec3> {
        for &axis in self.inputs {
            self.binding.bind(axis, at[axis]);
        }
        match eval::eval(self.program, &self.binding, &mut self.stack) {
            Ok(val) if val.is_finite() => {
                at[self.output] = val;
                Some(at)
            }
            Ok(val) => {
                trace!("dropping sample {val} at {at}");
                None
            }
            Err(err) => {
                trace!("dropping sample at {at}: {err}");
                None
            }
        }
    }

    /// Whether the curve runs unbroken from `last` to `next`, given the point
    /// `prev` before them.
    fn continuous(&mut self, prev: Vec3, last: Vec3, next: Vec3, axis: Axis) -> bool {
        let angle = last.sub(prev).angle_to(next.sub(prev));
        if angle <= self.config.angle_threshold {
            return true;
        }

        let out = self.output;
        let (mut lo, mut hi) = (last, next);
        for _ in 0..self.config.bisection_steps {
            let mut mid = lo;
            mid[axis] = (lo[axis] + hi[axis]) / 2.0;
            let Some(mid) = self.sample(mid) else {
                return false;
            };
            let (a, b, m) = (lo[out], hi[out], mid[out]);
            if a.min(b) <= m && m <= a.max(b) {
                return true;
            }
            let lo_farther = (m - a).abs() > (m - b).abs();
            let replace_lo = match self.config.narrowing {
                Narrowing::Farther => lo_farther,
                Narrowing::Nearer => !lo_farther,
            };
            if replace_lo {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        trace!("break between {last} and {next}");
        false
    }

    /// Walks `sweep` starting from `base`, splitting wherever the curve
    /// breaks. Every step of the sweep gets an entry.
    fn walk(&mut self, base: Vec3, sweep: &Sweep) -> Vec<RowSample> {
        let mut acc = SegmentAccumulator::default();
        let mut row = Vec::with_capacity(sweep.len());
        for i in 0..sweep.len() {
            let mut at = base;
            at[sweep.axis] = sweep.value(i);
            let Some(p) = self.sample(at) else {
                acc.flush();
                row.push(None);
                continue;
            };
            if let Some((prev, last)) = acc.last_two() {
                if !self.continuous(prev, last, p, sweep.axis) {
                    acc.flush();
                }
            }
            acc.push(p);
            row.push(Some((p, acc.segment())));
        }
        row
    }

    /// Samples a curve along `sweep`, one polyline per unbroken stretch.
    pub fn curve(&mut self, sweep: &Sweep) -> Vec<Vec<Vec3>> {
        let mut segments: Vec<Vec<Vec3>> = Vec::new();
        let mut open = None;
        for (p, segment) in self.walk(Vec3::ZERO, sweep).into_iter().flatten() {
            if open != Some(segment) {
                segments.push(Vec::new());
                open = Some(segment);
            }
            if let Some(points) = segments.last_mut() {
                points.push(p);
            }
        }
        segments
    }

    /// Samples a surface, walking `inner` once per step of `outer`.
    ///
    /// A grid cell becomes two triangles only when all four corners were kept
    /// and neither of its rows breaks between them.
    pub fn surface(&mut self, outer: &Sweep, inner: &Sweep) -> Surface {
        let mut rows = Vec::with_capacity(outer.len());
        for i in 0..outer.len() {
            let mut base = Vec3::ZERO;
            base[outer.axis] = outer.value(i);
            rows.push(self.walk(base, inner));
        }

        let mut surface = Surface::default();
        let mut index: Vec<Vec<Option<u32>>> = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut row_index = Vec::with_capacity(row.len());
            for sample in row {
                row_index.push(sample.map(|(p, _)| {
                    let idx = surface.points.len() as u32;
                    surface.points.push(p);
                    surface.colors.push(shade(self.config, p[self.output]));
                    idx
                }));
            }
            index.push(row_index);
        }

        // corners of an edge between steps j and j + 1 of a row
        let edge = |row: usize, j: usize| -> Option<(u32, u32)> {
            let (Some((_, s0)), Some((_, s1))) = (rows[row][j], rows[row][j + 1]) else {
                return None;
            };
            if s0 != s1 {
                return None;
            }
            Some((index[row][j]?, index[row][j + 1]?))
        };
        for i in 0..rows.len().saturating_sub(1) {
            for j in 0..inner.len().saturating_sub(1) {
                let (Some((a, b)), Some((c, d))) = (edge(i, j), edge(i + 1, j)) else {
                    continue;
                };
                surface.indices.push([a, c, b]);
                surface.indices.push([b, c, d]);
            }
        }
        surface
    }
}

/// Geometry sampled for one statement and the box it claims.
#[derive(Clone, Debug, PartialEq)]
pub struct Plot {
    pub geometry: Geometry,
    /// Covers the geometry and the whole swept input range.
    pub bbox: BoundingBox,
}

/// Samples `program` for the current view: a curve when one axis is swept,
/// a surface over the fixed extent when two are.
pub fn plot(
    program: &Program,
    binding: Binding<'_>,
    dims: &Dimensions,
    viewport: &Viewport,
    config: &SamplerConfig,
) -> Plot {
    let sweeps: Vec<Sweep> = match dims.inputs.as_slice() {
        [axis] => vec![Sweep::across(viewport, *axis, config.lookahead)],
        axes => axes
            .iter()
            .map(|&axis| Sweep::fixed(axis, config.surface_extent, config.surface_steps))
            .collect(),
    };

    let mut sampler = Sampler::new(program, binding, dims, config);
    let geometry = match sweeps.as_slice() {
        [sweep] => Geometry::Polylines(sampler.curve(sweep)),
        [outer, inner] => Geometry::Surface(sampler.surface(outer, inner)),
        // resolution always leaves one or two inputs
        _ => Geometry::Group(Vec::new()),
    };

    let mut bbox = geometry.bounding_box();
    for sweep in &sweeps {
        let (lo, hi) = sweep.bounds();
        bbox.include_span(sweep.axis, lo, hi);
    }
    Plot { geometry, bbox }
}

/// Picks the gradient color for an output value.
pub fn shade(config: &SamplerConfig, val: Number) -> Color {
    let range = config.surface_extent;
    let [low, high] = config.gradient;
    low.lerp(high, (val + range) / (2.0 * range))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dimension,
        eval::Idents,
        scope::GlobalScope,
        statement::{Statement, StatementKind},
        stdlib, Mode,
    };
    use std::sync::Arc;

    struct Fixture {
        idents: Idents,
        globals: GlobalScope,
        config: SamplerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                idents: stdlib::standard_idents(),
                globals: GlobalScope::new(),
                config: SamplerConfig::default(),
            }
        }

        fn plot(&self, src: &str, mode: Mode, viewport: &Viewport) -> Plot {
            let stmt = Statement::parse(Arc::new(src.to_string()), &self.idents).unwrap();
            let StatementKind::Expression { output, program } = &stmt.kind else {
                panic!("not an expression: {src}");
            };
            let dims = match output {
                Some(axis) => dimension::resolve_with_output(&stmt.free, mode.axes(), *axis),
                None => dimension::resolve(&stmt.free, mode.axes()),
            }
            .unwrap();
            let binding = Binding::new(&self.idents, &self.globals, &stmt.free);
            plot(program, binding, &dims, viewport, &self.config)
        }
    }

    fn viewport(camera_x: Number) -> Viewport {
        Viewport::new([10.0, 10.0], Vec3::new(camera_x, 0.0, 10.0), [100, 100])
    }

    fn segments(plot: &Plot) -> &[Vec<Vec3>] {
        match &plot.geometry {
            Geometry::Polylines(segments) => segments,
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn sweep_is_symmetric() {
        let sweep = Sweep::across(&viewport(0.0), Axis::X, 2.0);
        // a tenth of the half-extent per step
        assert_eq!(sweep.step(), 0.1);
        assert_eq!(sweep.len(), 401);
        assert_eq!(sweep.value(0), -20.0);
        assert_eq!(sweep.value(200), 0.0);
        assert_eq!(sweep.value(400), 20.0);
        for i in 0..sweep.len() {
            assert_eq!(sweep.value(i), -sweep.value(sweep.len() - 1 - i));
        }
        assert_eq!(sweep.bounds(), (-20.0, 20.0));
    }

    #[test]
    fn parabola_is_symmetric_and_unbroken() {
        let fixture = Fixture::new();
        let plot = fixture.plot("y = x^2", Mode::Flat, &viewport(0.0));
        let segs = segments(&plot);
        assert_eq!(segs.len(), 1);
        let points = &segs[0];
        assert_eq!(points.len(), 401);
        for (a, b) in points.iter().zip(points.iter().rev()) {
            assert_eq!(a.x(), -b.x());
            assert!((a.y() - b.y()).abs() <= 1e-9 * a.y().max(1.0));
            assert!((a.y() - a.x() * a.x()).abs() <= 1e-9 * a.y().max(1.0));
        }
    }

    #[test]
    fn reciprocal_splits_at_zero() {
        let fixture = Fixture::new();
        let plot = fixture.plot("1 / x", Mode::Flat, &viewport(0.0));
        let segs = segments(&plot);
        assert_eq!(segs.len(), 2);
        assert!(segs[0].iter().all(|p| p.x() < 0.0));
        assert!(segs[1].iter().all(|p| p.x() > 0.0));
    }

    #[test]
    fn nearer_narrowing_finds_poles_between_samples() {
        let mut fixture = Fixture::new();
        fixture.config.narrowing = Narrowing::Nearer;
        for camera_x in [0.05, -0.13] {
            let plot = fixture.plot("1 / x", Mode::Flat, &viewport(camera_x));
            let segs = segments(&plot);
            assert!(segs.len() >= 2, "camera at {camera_x}: {segs:?}");
            for seg in segs {
                let positive = seg[0].x() > 0.0;
                assert!(
                    seg.iter().all(|p| (p.x() > 0.0) == positive),
                    "segment crosses zero with camera at {camera_x}"
                );
            }
        }
    }

    /// Judges the step from -1/16 to 3/16 on `1 / x`, coming from -5/16.
    fn reciprocal_step(narrowing: Narrowing) -> bool {
        let mut fixture = Fixture::new();
        fixture.config.narrowing = narrowing;
        let stmt = Statement::parse(Arc::new("1 / x".to_string()), &fixture.idents).unwrap();
        let StatementKind::Expression { program, .. } = &stmt.kind else {
            panic!("not an expression");
        };
        let dims = dimension::resolve(&stmt.free, Mode::Flat.axes()).unwrap();
        let binding = Binding::new(&fixture.idents, &fixture.globals, &stmt.free);
        let mut sampler = Sampler::new(program, binding, &dims, &fixture.config);
        let at = |x: Number| Vec3::new(x, 1.0 / x, 0.0);
        sampler.continuous(at(-0.3125), at(-0.0625), at(0.1875), Axis::X)
    }

    #[test]
    fn narrowing_rules_disagree_across_a_pole() {
        // 1/16 gives 16, farther from -16 than from 16/3, so the left end
        // moves there and 1/8 lands between 16 and 16/3
        assert!(reciprocal_step(Narrowing::Farther));
        // the right end moves to 1/16 and the next midpoint is the pole
        assert!(!reciprocal_step(Narrowing::Nearer));
    }

    #[test]
    fn sampling_is_repeatable() {
        let mut fixture = Fixture::new();
        fixture.config.narrowing = Narrowing::Nearer;
        let view = viewport(1.5);
        let a = fixture.plot("tan(x)", Mode::Flat, &view);
        let b = fixture.plot("tan(x)", Mode::Flat, &view);
        assert_eq!(a, b);
        assert!(segments(&a).len() > 1);
    }

    #[test]
    fn failed_samples_are_dropped() {
        let fixture = Fixture::new();
        let plot = fixture.plot("sqrt(x)", Mode::Flat, &viewport(0.0));
        let segs = segments(&plot);
        assert_eq!(segs.len(), 1);
        assert!(segs[0].iter().all(|p| p.x() >= 0.0 && p.is_finite()));

        // the box still claims the whole sweep
        assert_eq!(plot.bbox.min.x(), -20.0);
        assert_eq!(plot.bbox.max.x(), 20.0);
    }

    #[test]
    fn undefined_variable_gives_no_points() {
        let fixture = Fixture::new();
        let plot = fixture.plot("a * x", Mode::Flat, &viewport(0.0));
        assert!(segments(&plot).is_empty());
        assert!(plot.bbox.covers(Axis::X, -20.0, 20.0));
    }

    #[test]
    fn explicit_axis_sweeps_the_other_one() {
        let fixture = Fixture::new();
        let plot = fixture.plot("x = 3", Mode::Flat, &viewport(0.0));
        let segs = segments(&plot);
        assert_eq!(segs.len(), 1);
        assert!(segs[0].iter().all(|p| p.x() == 3.0));
        assert_eq!(segs[0].first().map(Vec3::y), Some(-20.0));
    }

    #[test]
    fn surface_covers_the_grid() {
        let mut fixture = Fixture::new();
        fixture.config.surface_steps = 4;
        let plot = fixture.plot("x + y", Mode::Space, &viewport(0.0));
        let Geometry::Surface(surface) = &plot.geometry else {
            panic!("expected a surface");
        };
        assert_eq!(surface.points.len(), 81);
        assert_eq!(surface.colors.len(), 81);
        assert_eq!(surface.indices.len(), 8 * 8 * 2);
        assert!(surface
            .indices
            .iter()
            .flatten()
            .all(|&i| (i as usize) < surface.points.len()));

        let lowest = surface.points[0];
        assert_eq!(lowest, Vec3::new(-10.0, -10.0, -20.0));
        assert_eq!(surface.colors[0], fixture.config.gradient[0]);
    }

    #[test]
    fn surface_skips_missing_cells() {
        let mut fixture = Fixture::new();
        fixture.config.surface_steps = 4;
        let plot = fixture.plot("z = sqrt(x)", Mode::Space, &viewport(0.0));
        let Geometry::Surface(surface) = &plot.geometry else {
            panic!("expected a surface");
        };
        // only the five columns with x >= 0 survive
        assert_eq!(surface.points.len(), 45);
        assert_eq!(surface.indices.len(), 4 * 8 * 2);
        assert!(surface.points.iter().all(|p| p.x() >= 0.0));
    }

    #[test]
    fn shade_spans_the_gradient() {
        let config = SamplerConfig::default();
        assert_eq!(shade(&config, -10.0), config.gradient[0]);
        assert_eq!(shade(&config, 50.0), config.gradient[1]);
    }
}
