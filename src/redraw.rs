// SPDX: CC0-1.0

use crate::{geometry::BoundingBox, layout, view::Viewport, Axis, Mode, Number, Vec3};
use log::debug;

/// What the redraw engine knows about one input's geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphState {
    /// Points and polygons, which don't depend on the view.
    Literal,
    /// A curve swept along `axis`.
    Sampled { axis: Axis, bbox: BoundingBox },
    /// Nothing the view could invalidate.
    Empty,
}

/// Cached axes: their box and where they crossed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxesState {
    pub bbox: BoundingBox,
    pub intersection: Vec3,
}

/// Which cached geometry must be regenerated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Redraw {
    /// One flag per input, in input order.
    pub graphs: Vec<bool>,
    pub grid: bool,
    pub axes: bool,
    pub zoom: bool,
}

impl Redraw {
    pub fn any(&self) -> bool {
        self.grid || self.axes || self.graphs.iter().any(|&stale| stale)
    }
}

/// Remembers the depth the scene was last fully regenerated at.
#[derive(Clone, Debug)]
pub struct RedrawState {
    last_depth: Option<Number>,
    zoom_ratio: Number,
}

impl RedrawState {
    pub const fn new(zoom_ratio: Number) -> Self {
        Self {
            last_depth: None,
            zoom_ratio,
        }
    }

    pub const fn last_depth(&self) -> Option<Number> {
        self.last_depth
    }

    /// Forgets the zoom reference so the next decision regenerates everything.
    pub fn reset(&mut self) {
        self.last_depth = None;
    }

    fn zoom_triggered(&mut self, depth: Number) -> bool {
        let triggered = match self.last_depth {
            Some(last) if last != 0.0 => {
                depth >= last * self.zoom_ratio || depth <= last / self.zoom_ratio
            }
            _ => true,
        };
        if triggered {
            debug!("zoom triggered at depth {depth} (was {:?})", self.last_depth);
            self.last_depth = Some(depth);
        }
        triggered
    }

    pub fn decide(
        &mut self,
        mode: Mode,
        viewport: &Viewport,
        graphs: &[GraphState],
        grid: Option<&BoundingBox>,
        axes: Option<&AxesState>,
    ) -> Redraw {
        let redraw = match mode {
            Mode::Flat => self.decide_flat(viewport, graphs, grid, axes),
            // the space scene is static
            Mode::Space => Redraw {
                graphs: vec![false; graphs.len()],
                grid: grid.is_none(),
                axes: axes.is_none(),
                zoom: false,
            },
        };
        debug!(
            "redraw: {} of {} graphs, grid {}, axes {}",
            redraw.graphs.iter().filter(|&&stale| stale).count(),
            graphs.len(),
            redraw.grid,
            redraw.axes,
        );
        redraw
    }

    fn decide_flat(
        &mut self,
        viewport: &Viewport,
        graphs: &[GraphState],
        grid: Option<&BoundingBox>,
        axes: Option<&AxesState>,
    ) -> Redraw {
        let zoom = self.zoom_triggered(viewport.depth());

        let covers_view = |bbox: &BoundingBox, axis: Axis| {
            let (lo, hi) = viewport.span(axis);
            bbox.covers(axis, lo, hi)
        };
        let covers_plane =
            |bbox: &BoundingBox| covers_view(bbox, Axis::X) && covers_view(bbox, Axis::Y);

        let graphs = graphs
            .iter()
            .map(|graph| match graph {
                GraphState::Sampled { axis, bbox } => zoom || !covers_view(bbox, *axis),
                GraphState::Literal | GraphState::Empty => false,
            })
            .collect();

        let grid = match grid {
            Some(bbox) => zoom || !covers_plane(bbox),
            None => true,
        };

        let axes = match axes {
            Some(cached) => {
                let moved = layout::axis_intersection(viewport)
                    .sub(cached.intersection)
                    .length()
                    > 1e-9;
                zoom || moved || !covers_plane(&cached.bbox)
            }
            None => true,
        };

        Redraw {
            graphs,
            grid,
            axes,
            zoom,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn viewport(x: Number, half: Number, depth: Number) -> Viewport {
        Viewport::new([half, half], Vec3::new(x, 0.0, depth), [100, 100])
    }

    fn square(half: Number) -> BoundingBox {
        BoundingBox::new(Vec3::new(-half, -half, 0.0), Vec3::new(half, half, 0.0))
    }

    fn sampled(half: Number) -> GraphState {
        GraphState::Sampled {
            axis: Axis::X,
            bbox: square(half),
        }
    }

    fn flat(
        state: &mut RedrawState,
        view: Viewport,
        graphs: &[GraphState],
        grid: Option<&BoundingBox>,
    ) -> Redraw {
        state.decide(Mode::Flat, &view, graphs, grid, None)
    }

    /// A state whose zoom reference is already `depth`.
    fn settled(depth: Number) -> RedrawState {
        let mut state = RedrawState::new(1.2);
        flat(&mut state, viewport(0.0, 1.0, depth), &[], None);
        state
    }

    #[test]
    fn first_decision_regenerates_everything() {
        let mut state = RedrawState::new(1.2);
        let redraw = state.decide(
            Mode::Flat,
            &viewport(0.0, 5.0, 10.0),
            &[sampled(10.0), GraphState::Literal],
            None,
            None,
        );
        assert!(redraw.zoom);
        assert_eq!(redraw.graphs, [true, false]);
        assert!(redraw.grid && redraw.axes);
        assert_eq!(state.last_depth(), Some(10.0));
    }

    #[test]
    fn containment() {
        let mut state = settled(10.0);
        let graphs = [sampled(10.0)];
        let grid = square(10.0);

        let redraw = flat(&mut state, viewport(0.0, 5.0, 10.0), &graphs, Some(&grid));
        assert!(!redraw.zoom);
        assert_eq!(redraw.graphs, [false]);
        assert!(!redraw.grid);
        // no axes cached yet
        assert!(redraw.axes);

        let redraw = flat(&mut state, viewport(0.0, 12.0, 10.0), &graphs, Some(&grid));
        assert_eq!(redraw.graphs, [true]);
        assert!(redraw.grid);

        // panning past the edge
        let redraw = flat(&mut state, viewport(6.0, 5.0, 10.0), &graphs, Some(&grid));
        assert_eq!(redraw.graphs, [true]);
    }

    #[test]
    fn graphs_only_check_their_input_axis() {
        let mut state = settled(10.0);
        let tall = GraphState::Sampled {
            axis: Axis::Y,
            bbox: BoundingBox::new(Vec3::new(0.0, -20.0, 0.0), Vec3::new(0.0, 20.0, 0.0)),
        };
        let redraw = state.decide(Mode::Flat, &viewport(0.0, 5.0, 10.0), &[tall], None, None);
        assert_eq!(redraw.graphs, [false]);
    }

    #[test]
    fn zoom_ratio() {
        let mut state = settled(10.0);
        let graphs = [sampled(100.0), GraphState::Literal, GraphState::Empty];
        let grid = square(100.0);

        let redraw = flat(&mut state, viewport(0.0, 5.0, 11.0), &graphs, Some(&grid));
        assert!(!redraw.zoom);
        assert_eq!(redraw.graphs, [false, false, false]);
        assert_eq!(state.last_depth(), Some(10.0));

        let redraw = flat(&mut state, viewport(0.0, 5.0, 13.0), &graphs, Some(&grid));
        assert!(redraw.zoom);
        assert_eq!(redraw.graphs, [true, false, false]);
        assert!(redraw.grid);
        assert_eq!(state.last_depth(), Some(13.0));

        let redraw = flat(&mut state, viewport(0.0, 5.0, 10.0), &graphs, Some(&grid));
        assert!(redraw.zoom);
    }

    #[test]
    fn axes_follow_the_intersection() {
        let mut state = settled(10.0);
        let view = viewport(0.0, 5.0, 10.0);
        let axes = AxesState {
            bbox: square(10.0),
            intersection: layout::axis_intersection(&view),
        };
        let redraw = state.decide(Mode::Flat, &view, &[], None, Some(&axes));
        assert!(!redraw.axes);

        // the origin leaves the view while the box still covers it
        let axes = AxesState {
            bbox: square(100.0),
            ..axes
        };
        let redraw = state.decide(Mode::Flat, &viewport(7.0, 5.0, 10.0), &[], None, Some(&axes));
        assert!(redraw.axes);
    }

    #[test]
    fn space_is_static() {
        let mut state = RedrawState::new(1.2);
        let graphs = [sampled(1.0), GraphState::Literal];
        let redraw = state.decide(Mode::Space, &viewport(50.0, 5.0, 100.0), &graphs, None, None);
        assert_eq!(redraw.graphs, [false, false]);
        assert!(redraw.grid && redraw.axes && !redraw.zoom);
        assert_eq!(state.last_depth(), None);

        let grid = square(10.0);
        let axes = AxesState {
            bbox: square(10.0),
            intersection: Vec3::ZERO,
        };
        let redraw = state.decide(
            Mode::Space,
            &viewport(50.0, 5.0, 1.0),
            &graphs,
            Some(&grid),
            Some(&axes),
        );
        assert!(!redraw.any());
    }
}
