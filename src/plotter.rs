// SPDX: CC0-1.0

use crate::{
    dimension::{self, ResolveErr},
    eval::{self, EvalErr, EvalErrTyp, Ident, Idents, Program},
    geometry::{BoundingBox, Geometry},
    layout,
    lex::SubStr,
    parse::ParseErr,
    redraw::{AxesState, GraphState, Redraw, RedrawState},
    render::{Layer, Renderer},
    sample,
    scope::{Binding, GlobalScope, Value},
    statement::{PointLiteral, Statement, StatementKind, Vertex},
    stdlib, text,
    view::{Camera, Viewport},
    Config, FieldId, Mode, Number, SamplerConfig, Vec3,
};
use core::fmt;
use log::{debug, info, trace};
use std::{collections::BTreeSet, sync::Arc};

/// Why a field's text was rejected.
#[derive(Clone, Debug)]
pub enum InputErr {
    Parse(ParseErr),
    Resolve(ResolveErr),
    /// The right-hand side of an assignment couldn't be evaluated.
    Assign(EvalErr),
}

impl fmt::Display for InputErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Resolve(err) => write!(f, "{err}"),
            Self::Assign(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InputErr {}

impl InputErr {
    /// The name the error is about, when it's one that wasn't defined.
    pub fn unknown_name(&self) -> Option<&str> {
        match self {
            Self::Assign(EvalErr {
                typ: EvalErrTyp::UndefinedIdent { text } | EvalErrTyp::NullVar { text },
                ..
            }) => Some(text.get()),
            _ => None,
        }
    }
}

/// Geometry handed to the renderer and the box it covers.
#[derive(Debug)]
struct Cached<M> {
    mesh: M,
    bbox: BoundingBox,
}

/// One live text field.
#[derive(Debug)]
pub struct Input<M> {
    owner: FieldId,
    statement: Statement,
    graph: Option<Cached<M>>,
    state: GraphState,
}

impl<M> Input<M> {
    pub const fn owner(&self) -> FieldId {
        self.owner
    }

    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn mesh(&self) -> Option<&M> {
        self.graph.as_ref().map(|graph| &graph.mesh)
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.graph.as_ref().map(|graph| &graph.bbox)
    }

    pub const fn state(&self) -> &GraphState {
        &self.state
    }
}

#[derive(Debug)]
struct CachedAxes<M> {
    mesh: M,
    state: AxesState,
}

/// Keeps the rendered scene in sync with the text fields and the camera.
///
/// Everything runs to completion on the caller's thread; each entry point
/// leaves the renderer holding exactly the geometry of the current state.
pub struct Plotter<R: Renderer> {
    renderer: R,
    config: Config,
    idents: Idents,
    globals: GlobalScope,
    inputs: Vec<Input<R::Mesh>>,
    grid: Option<Cached<R::Mesh>>,
    axes: Option<CachedAxes<R::Mesh>>,
    redraw: RedrawState,
    mode: Mode,
    camera: Camera,
    viewport: Viewport,
}

impl<R: Renderer> Plotter<R> {
    /// Creates a plotter and draws the initial grid and axes.
    pub fn new(renderer: R, config: Config) -> Self {
        let camera = config.camera.clone();
        let viewport = camera.viewport();
        let mut ret = Self {
            renderer,
            redraw: RedrawState::new(config.zoom_ratio),
            config,
            idents: stdlib::standard_idents(),
            globals: GlobalScope::new(),
            inputs: Vec::new(),
            grid: None,
            axes: None,
            mode: Mode::Flat,
            camera,
            viewport,
        };
        ret.refresh();
        ret
    }

    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn idents(&self) -> &Idents {
        &self.idents
    }

    pub const fn globals(&self) -> &GlobalScope {
        &self.globals
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Live inputs in the order their fields were first filled.
    pub fn inputs(&self) -> &[Input<R::Mesh>] {
        &self.inputs
    }

    pub fn input(&self, owner: FieldId) -> Option<&Input<R::Mesh>> {
        self.inputs.iter().find(|input| input.owner == owner)
    }

    fn position(&self, owner: FieldId) -> Option<usize> {
        self.inputs.iter().position(|input| input.owner == owner)
    }

    /// Applies the text of field `owner`, returning the line to display.
    ///
    /// Blank text removes the field. Text that doesn't parse, or an
    /// assignment that can't be evaluated, leaves the field as it was.
    pub fn apply_text(&mut self, owner: FieldId, text: &str) -> Result<String, InputErr> {
        let src = text.trim();
        if src.is_empty() {
            self.remove(owner);
            return Ok(String::new());
        }

        let statement =
            Statement::parse(Arc::new(src.to_string()), &self.idents).map_err(InputErr::Parse)?;
        let bound = match statement.binds() {
            Some(name) => Some((
                name.to_string(),
                bound_value(&statement, &self.idents, &self.globals).map_err(InputErr::Assign)?,
            )),
            None => None,
        };
        debug!("applying {owner}: {src}");

        let idx = self.upsert(owner, statement);
        let changed = match bound {
            Some((name, value)) => self.globals.set(owner, &name, value),
            None => self.globals.unset(owner),
        };
        self.propagate(changed, Some(owner));
        let plotted = self.plot(idx);
        let line = text::value_line(src, self.display_value(idx));

        plotted.map(|()| line).map_err(InputErr::Resolve)
    }

    /// Drops field `owner` and its geometry. Returns whether it existed.
    pub fn remove(&mut self, owner: FieldId) -> bool {
        let Some(idx) = self.position(owner) else {
            return false;
        };
        let input = self.inputs.remove(idx);
        if let Some(graph) = input.graph {
            self.renderer.dispose(graph.mesh);
        }
        debug!("removed {owner}");
        let changed = self.globals.unset(owner);
        self.propagate(changed, None);
        true
    }

    /// Moves the camera, regenerating whatever no longer covers the view.
    pub fn view_changed(&mut self, camera: Camera) -> Redraw {
        self.viewport = camera.viewport();
        self.camera = camera;
        self.refresh()
    }

    /// Advances the clock to `t` seconds and re-plots everything that
    /// depends on it. Returns how many inputs were re-plotted.
    pub fn tick(&mut self, t: Number) -> usize {
        self.globals.set_clock(t);
        self.propagate(vec![stdlib::T.to_string()], None)
    }

    /// Switches between the flat and the space scene.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        info!("switching to {mode}");
        self.mode = mode;
        if let Some(grid) = self.grid.take() {
            self.renderer.dispose(grid.mesh);
        }
        if let Some(axes) = self.axes.take() {
            self.renderer.dispose(axes.mesh);
        }
        self.redraw.reset();

        // without a zoom reference the next decision re-plots every flat
        // curve, so only plot the rest here
        for idx in 0..self.inputs.len() {
            let curve = matches!(self.inputs[idx].state, GraphState::Sampled { .. });
            if mode == Mode::Space || !curve {
                self.replot(idx);
            }
        }
        self.refresh();
    }

    /// Suggests a known name when `err` is about an undefined one.
    pub fn suggestion(&self, err: &InputErr) -> Option<String> {
        let name = err.unknown_name()?;
        // operators are in the table under names nobody types
        let operator = |key: &str| matches!(key, "neg" | "add" | "sub" | "mul" | "div" | "pow");
        let known = self
            .idents
            .iter()
            .filter(|(key, _)| !operator(key.get()))
            .map(|(key, ident)| {
                let kind = match ident {
                    Ident::Var(_) => "variable",
                    Ident::Const(_) => "constant",
                    Ident::Fun(_) => "function",
                };
                (key.get(), kind)
            })
            .chain(self.globals.names().map(|name| {
                let kind = match self.globals.get(name) {
                    Some(Value::Point(_)) => "point",
                    _ => "variable",
                };
                (name, kind)
            }));
        let (similar, kind) = text::similar_name(name, known)?;
        Some(format!("{kind} '{similar}' has a similar name"))
    }

    /// Regenerates whatever the current view has made stale.
    fn refresh(&mut self) -> Redraw {
        let states: Vec<GraphState> = self.inputs.iter().map(|input| input.state).collect();
        let redraw = self.redraw.decide(
            self.mode,
            &self.viewport,
            &states,
            self.grid.as_ref().map(|grid| &grid.bbox),
            self.axes.as_ref().map(|axes| &axes.state),
        );
        for (idx, stale) in redraw.graphs.iter().enumerate() {
            if *stale {
                self.replot(idx);
            }
        }
        if redraw.grid {
            self.draw_grid();
        }
        if redraw.axes {
            self.draw_axes();
        }
        redraw
    }

    fn draw_grid(&mut self) {
        if let Some(grid) = self.grid.take() {
            self.renderer.dispose(grid.mesh);
        }
        let grid = layout::grid(self.mode, &self.viewport, self.config.sampler.lookahead);
        let mesh = self.renderer.submit(Layer::Grid, &grid.geometry);
        self.grid = Some(Cached {
            mesh,
            bbox: grid.bbox,
        });
    }

    fn draw_axes(&mut self) {
        if let Some(axes) = self.axes.take() {
            self.renderer.dispose(axes.mesh);
        }
        let intersection = match self.mode {
            Mode::Flat => layout::axis_intersection(&self.viewport),
            Mode::Space => Vec3::ZERO,
        };
        let axes = layout::axes(
            self.mode,
            &self.viewport,
            self.config.sampler.lookahead,
            intersection,
        );
        let mesh = self.renderer.submit(Layer::Axes, &axes.geometry);
        self.axes = Some(CachedAxes {
            mesh,
            state: AxesState {
                bbox: axes.bbox,
                intersection,
            },
        });
    }

    /// Stores `statement` for `owner`, disposing the geometry of the
    /// statement it replaces. New owners go last.
    fn upsert(&mut self, owner: FieldId, statement: Statement) -> usize {
        match self.position(owner) {
            Some(idx) => {
                let input = &mut self.inputs[idx];
                if let Some(graph) = input.graph.take() {
                    self.renderer.dispose(graph.mesh);
                }
                input.statement = statement;
                input.state = GraphState::Empty;
                idx
            }
            None => {
                self.inputs.push(Input {
                    owner,
                    statement,
                    graph: None,
                    state: GraphState::Empty,
                });
                self.inputs.len() - 1
            }
        }
    }

    /// Replaces the geometry of input `idx`.
    fn plot(&mut self, idx: usize) -> Result<(), ResolveErr> {
        let input = &mut self.inputs[idx];
        if let Some(graph) = input.graph.take() {
            self.renderer.dispose(graph.mesh);
        }
        input.state = GraphState::Empty;

        let generated = generate(
            &input.statement,
            self.mode,
            &self.viewport,
            &self.config.sampler,
            &self.idents,
            &self.globals,
        )?;
        let Some((geometry, state)) = generated else {
            return Ok(());
        };
        let bbox = match state {
            GraphState::Sampled { bbox, .. } => bbox,
            GraphState::Literal | GraphState::Empty => geometry.bounding_box(),
        };
        trace!(
            "plotted {}: {} buffers",
            input.owner,
            geometry.buffer_count()
        );
        let mesh = self.renderer.submit(Layer::Graph, &geometry);
        input.graph = Some(Cached { mesh, bbox });
        input.state = state;
        Ok(())
    }

    fn replot(&mut self, idx: usize) {
        if let Err(err) = self.plot(idx) {
            debug!("{} has no geometry: {err}", self.inputs[idx].owner);
        }
    }

    /// Re-evaluates the value input `idx` binds, if any. Returns the global
    /// names that changed.
    fn rebind(&mut self, idx: usize) -> Vec<String> {
        let owner = self.inputs[idx].owner;
        let statement = &self.inputs[idx].statement;
        let Some(name) = statement.binds() else {
            return Vec::new();
        };
        match bound_value(statement, &self.idents, &self.globals) {
            Ok(value) => {
                let name = name.to_string();
                self.globals.set(owner, &name, value)
            }
            Err(err) => {
                debug!("{owner} no longer has a value: {err}");
                self.globals.unset(owner)
            }
        }
    }

    /// Brings every input that depends on the `changed` names up to date.
    ///
    /// Bindings are re-evaluated round by round until no value changes, and
    /// only then is each affected input re-plotted, once. `skip` was just
    /// applied by the caller and is left alone. Returns how many inputs were
    /// re-plotted.
    fn propagate(&mut self, changed: Vec<String>, skip: Option<FieldId>) -> usize {
        let mut affected: BTreeSet<String> = changed.iter().cloned().collect();
        let mut round = changed;
        // an acyclic chain of bindings settles within this many rounds
        for _ in 0..=self.inputs.len() {
            if round.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for idx in 0..self.inputs.len() {
                let input = &self.inputs[idx];
                if Some(input.owner) == skip
                    || input.statement.binds().is_none()
                    || !round.iter().any(|name| input.statement.depends_on(name))
                {
                    continue;
                }
                next.extend(self.rebind(idx));
            }
            affected.extend(next.iter().cloned());
            round = next;
        }
        if !round.is_empty() {
            debug!("bindings still changing, giving up on {round:?}");
        }

        let mut count = 0;
        for idx in 0..self.inputs.len() {
            let input = &self.inputs[idx];
            if Some(input.owner) == skip
                || !affected.iter().any(|name| input.statement.depends_on(name))
            {
                continue;
            }
            trace!("re-plotting {}", input.owner);
            self.replot(idx);
            count += 1;
        }
        count
    }

    fn display_value(&self, idx: usize) -> Option<Value> {
        let statement = &self.inputs[idx].statement;
        let number = |program: &Program| {
            eval_program(program, statement, &self.idents, &self.globals)
                .ok()
                .map(Value::Number)
        };
        match &statement.kind {
            StatementKind::Expression { program, .. }
            | StatementKind::Assignment { program, .. } => number(program),
            StatementKind::Point { point, .. } => {
                let mut p = Vec3::ZERO;
                for (coord, program) in p.0.iter_mut().zip(&point.coords) {
                    *coord = eval_program(program, statement, &self.idents, &self.globals).ok()?;
                }
                Some(Value::Point(p))
            }
            StatementKind::Function { .. } | StatementKind::Polygon { .. } => None,
        }
    }
}

fn eval_program(
    program: &Program,
    statement: &Statement,
    idents: &Idents,
    globals: &GlobalScope,
) -> Result<Number, EvalErr> {
    let binding = Binding::new(idents, globals, &statement.free);
    eval::eval(program, &binding, &mut Vec::new())
}

/// Evaluates a point literal; coordinates that can't be evaluated are 0.
fn eval_point(
    point: &PointLiteral,
    statement: &Statement,
    idents: &Idents,
    globals: &GlobalScope,
) -> Vec3 {
    let mut ret = Vec3::ZERO;
    for (coord, program) in ret.0.iter_mut().zip(&point.coords) {
        *coord = match eval_program(program, statement, idents, globals) {
            Ok(val) => val,
            Err(err) => {
                debug!("point coordinate defaults to 0: {err}");
                0.0
            }
        };
    }
    ret
}

/// The value a binding statement puts in global scope.
fn bound_value(
    statement: &Statement,
    idents: &Idents,
    globals: &GlobalScope,
) -> Result<Value, EvalErr> {
    match &statement.kind {
        StatementKind::Assignment { program, .. } => {
            eval_program(program, statement, idents, globals).map(Value::Number)
        }
        StatementKind::Point { point, .. } => Ok(Value::Point(eval_point(
            point, statement, idents, globals,
        ))),
        _ => Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        }),
    }
}

/// Builds the geometry for one statement, or nothing for statements that
/// only bind a value.
fn generate(
    statement: &Statement,
    mode: Mode,
    viewport: &Viewport,
    config: &SamplerConfig,
    idents: &Idents,
    globals: &GlobalScope,
) -> Result<Option<(Geometry, GraphState)>, ResolveErr> {
    let candidates = mode.axes();
    let free: &BTreeSet<String> = &statement.free;
    let mut aliases = Vec::new();
    let (program, dims) = match &statement.kind {
        StatementKind::Expression {
            output: Some(axis),
            program,
        } => (
            program,
            dimension::resolve_with_output(free, candidates, *axis)?,
        ),
        StatementKind::Expression {
            output: None,
            program,
        } => (program, dimension::resolve(free, candidates)?),
        StatementKind::Function {
            params, program, ..
        } => {
            let params: Vec<&str> = params.iter().map(SubStr::get).collect();
            let (dims, bound) = dimension::resolve_function(free, &params, candidates)?;
            aliases = bound;
            (program, dims)
        }
        StatementKind::Assignment { .. } => return Ok(None),
        StatementKind::Point { point, .. } => {
            let p = eval_point(point, statement, idents, globals);
            return Ok(Some((Geometry::Point(p), GraphState::Literal)));
        }
        StatementKind::Polygon { vertices } => {
            let mut points = Vec::with_capacity(vertices.len() + 1);
            for vertex in vertices {
                match vertex {
                    Vertex::Named(name) => match globals.point(name.get()) {
                        Some(p) => points.push(p),
                        None => debug!("skipping unknown vertex '{}'", name.get()),
                    },
                    Vertex::Literal(point) => {
                        points.push(eval_point(point, statement, idents, globals))
                    }
                }
            }
            let Some(&first) = points.first() else {
                return Ok(None);
            };
            points.push(first);
            return Ok(Some((Geometry::LineLoop(points), GraphState::Literal)));
        }
    };

    let mut binding = Binding::new(idents, globals, free);
    for (param, axis) in aliases {
        binding.alias(param, axis);
    }
    let plot = sample::plot(program, binding, &dims, viewport, config);
    let state = match dims.inputs.first() {
        Some(&axis) => GraphState::Sampled {
            axis,
            bbox: plot.bbox,
        },
        None => GraphState::Literal,
    };
    Ok(Some((plot.geometry, state)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::Scene;

    fn plotter() -> Plotter<Scene> {
        Plotter::new(Scene::new(), Config::default())
    }

    fn geometry(plotter: &Plotter<Scene>, owner: u32) -> Option<&Geometry> {
        let mesh = plotter.input(FieldId(owner))?.mesh()?;
        plotter.renderer().get(mesh)
    }

    fn curve(plotter: &Plotter<Scene>, owner: u32) -> Vec<Vec3> {
        match geometry(plotter, owner) {
            Some(Geometry::Polylines(segments)) => segments.iter().flatten().copied().collect(),
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn starts_with_grid_and_axes() {
        let plotter = plotter();
        let scene = plotter.renderer();
        assert_eq!(scene.layer(Layer::Grid).count(), 1);
        assert_eq!(scene.layer(Layer::Axes).count(), 1);
        assert_eq!(scene.layer(Layer::Graph).count(), 0);
    }

    #[test]
    fn upsert_disposes_prior_geometry_once() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x^2").unwrap();
        let disposed = plotter.renderer().disposed();
        let len = plotter.renderer().len();

        plotter.apply_text(FieldId(1), "y = x^3").unwrap();
        let scene = plotter.renderer();
        assert_eq!(scene.disposed(), disposed + 1);
        assert_eq!(scene.unknown_disposals(), 0);
        assert_eq!(scene.len(), len);
        assert_eq!(plotter.inputs().len(), 1);
        assert!(curve(&plotter, 1)
            .iter()
            .all(|p| (p.y() - p.x().powi(3)).abs() < 1e-9 * p.y().abs().max(1.0)));
    }

    #[test]
    fn inputs_keep_insertion_order() {
        let mut plotter = plotter();
        for (owner, src) in [(3, "y = x"), (1, "y = 2*x"), (2, "Point(1, 1)")] {
            plotter.apply_text(FieldId(owner), src).unwrap();
        }
        plotter.apply_text(FieldId(1), "y = 3*x").unwrap();
        let owners: Vec<u32> = plotter.inputs().iter().map(|i| i.owner().0).collect();
        assert_eq!(owners, [3, 1, 2]);
    }

    #[test]
    fn point_literal_bypasses_sampling() {
        let mut plotter = plotter();
        let line = plotter.apply_text(FieldId(1), "Punkt(1,2,0)").unwrap();
        assert_eq!(line, "Punkt(1,2,0) = (1, 2, 0)");
        assert_eq!(
            geometry(&plotter, 1),
            Some(&Geometry::Point(Vec3::new(1.0, 2.0, 0.0)))
        );
        assert_eq!(
            plotter.input(FieldId(1)).map(Input::state),
            Some(&GraphState::Literal)
        );

        // unknown coordinates fall back to 0
        plotter.apply_text(FieldId(1), "Point(q, 2)").unwrap();
        assert_eq!(
            geometry(&plotter, 1),
            Some(&Geometry::Point(Vec3::new(0.0, 2.0, 0.0)))
        );
    }

    #[test]
    fn assignment_feeds_dependents() {
        let mut plotter = plotter();
        let line = plotter.apply_text(FieldId(1), "a = 3").unwrap();
        assert_eq!(line, "a = 3 = 3");
        plotter.apply_text(FieldId(2), "y = a*x").unwrap();
        let points = curve(&plotter, 2);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.y() == 3.0 * p.x()));

        // editing the assignment re-plots the dependent
        plotter.apply_text(FieldId(1), "a = 2 * 2").unwrap();
        assert!(curve(&plotter, 2).iter().all(|p| p.y() == 4.0 * p.x()));

        // removing it leaves nothing to plot
        plotter.apply_text(FieldId(1), "").unwrap();
        assert!(curve(&plotter, 2).is_empty());
        assert_eq!(plotter.globals().get("a"), None);
    }

    #[test]
    fn assignments_chain() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "a = 1").unwrap();
        plotter.apply_text(FieldId(2), "b = a + 1").unwrap();
        plotter.apply_text(FieldId(3), "y = b").unwrap();
        assert!(curve(&plotter, 3).iter().all(|p| p.y() == 2.0));

        plotter.apply_text(FieldId(1), "a = 5").unwrap();
        assert_eq!(plotter.globals().number("b"), Some(6.0));
        assert!(curve(&plotter, 3).iter().all(|p| p.y() == 6.0));
    }

    #[test]
    fn dependents_see_every_updated_binding() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "a = 1").unwrap();
        // comes before the binding of `b` it also reads
        plotter.apply_text(FieldId(2), "y = a + b + 0*x").unwrap();
        plotter.apply_text(FieldId(3), "b = a + 1").unwrap();
        assert!(curve(&plotter, 2).iter().all(|p| p.y() == 3.0));

        let disposed = plotter.renderer().disposed();
        plotter.apply_text(FieldId(1), "a = 5").unwrap();
        let points = curve(&plotter, 2);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.y() == 11.0));
        // assignments draw nothing, so only the curve was swapped, once
        assert_eq!(plotter.renderer().disposed(), disposed + 1);
    }

    #[test]
    fn clearing_a_shadowing_assignment_restores_the_other() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "a = 1").unwrap();
        plotter.apply_text(FieldId(2), "a = 2").unwrap();
        plotter.apply_text(FieldId(3), "y = a*x").unwrap();
        assert!(curve(&plotter, 3).iter().all(|p| p.y() == 2.0 * p.x()));

        plotter.apply_text(FieldId(2), "").unwrap();
        assert_eq!(plotter.globals().number("a"), Some(1.0));
        let points = curve(&plotter, 3);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.y() == p.x()));
    }

    #[test]
    fn failed_assignment_changes_nothing() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "a = 3").unwrap();
        let err = plotter.apply_text(FieldId(1), "a = sinn(2)").unwrap_err();
        assert!(matches!(err, InputErr::Assign(_)));
        assert_eq!(err.unknown_name(), Some("sinn"));
        assert_eq!(
            plotter.suggestion(&err).as_deref(),
            Some("function 'sin' has a similar name")
        );
        assert_eq!(plotter.globals().number("a"), Some(3.0));
        assert_eq!(plotter.input(FieldId(1)).unwrap().statement().src.as_str(), "a = 3");
    }

    #[test]
    fn parse_error_keeps_geometry() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x").unwrap();
        let before = geometry(&plotter, 1).cloned();
        let disposed = plotter.renderer().disposed();

        let err = plotter.apply_text(FieldId(1), "y = (x").unwrap_err();
        assert!(matches!(err, InputErr::Parse(_)));
        assert_eq!(
            text::error_line("y = (x", &err),
            "y = (x (mismatched parentheses)"
        );
        assert_eq!(plotter.renderer().disposed(), disposed);
        assert_eq!(geometry(&plotter, 1).cloned(), before);
    }

    #[test]
    fn resolution_error_drops_geometry() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x").unwrap();
        let err = plotter.apply_text(FieldId(1), "x + y").unwrap_err();
        assert!(matches!(err, InputErr::Resolve(ResolveErr::NoOutput)));
        assert_eq!(err.to_string(), "cannot resolve an output axis");
        assert!(geometry(&plotter, 1).is_none());
        assert_eq!(plotter.renderer().layer(Layer::Graph).count(), 0);
    }

    #[test]
    fn polygon_follows_its_points() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "A = Point(0, 0)").unwrap();
        plotter.apply_text(FieldId(2), "B = Point(1, 0)").unwrap();
        plotter.apply_text(FieldId(3), "Polygon(A, B, Point(0, 1), C)").unwrap();
        let expected = |a: Vec3| {
            Geometry::LineLoop(vec![
                a,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                a,
            ])
        };
        assert_eq!(geometry(&plotter, 3), Some(&expected(Vec3::ZERO)));

        plotter.apply_text(FieldId(1), "A = Point(-1, -1)").unwrap();
        assert_eq!(
            geometry(&plotter, 3),
            Some(&expected(Vec3::new(-1.0, -1.0, 0.0)))
        );
        // named points are drawn too
        assert_eq!(
            geometry(&plotter, 1),
            Some(&Geometry::Point(Vec3::new(-1.0, -1.0, 0.0)))
        );
    }

    #[test]
    fn clock_ticks_replot_time_dependent_inputs() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = t*x").unwrap();
        plotter.apply_text(FieldId(2), "y = x").unwrap();
        assert!(curve(&plotter, 1).iter().all(|p| p.y() == 0.0));

        assert_eq!(plotter.tick(2.0), 1);
        assert!(curve(&plotter, 1).iter().all(|p| p.y() == 2.0 * p.x()));
        assert_eq!(plotter.globals().clock(), 2.0);
    }

    #[test]
    fn panning_regenerates_stale_geometry() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x").unwrap();

        // a small pan stays inside the generated range
        let mut camera = plotter.camera().clone();
        camera.position[crate::Axis::X] += 1.0;
        let redraw = plotter.view_changed(camera.clone());
        assert!(!redraw.any());

        camera.position[crate::Axis::X] += 1000.0;
        let redraw = plotter.view_changed(camera);
        assert_eq!(redraw.graphs, [true]);
        assert!(redraw.grid && redraw.axes && !redraw.zoom);
        let points = curve(&plotter, 1);
        assert!(points.iter().any(|p| p.x() > 1000.0));
        assert_eq!(plotter.renderer().len(), 3);
        assert_eq!(plotter.renderer().unknown_disposals(), 0);
    }

    #[test]
    fn zooming_regenerates_everything() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x").unwrap();
        plotter.apply_text(FieldId(2), "Point(1, 1)").unwrap();
        let mut camera = plotter.camera().clone();
        camera.position[crate::Axis::Z] *= 2.0;
        let redraw = plotter.view_changed(camera);
        assert!(redraw.zoom);
        assert_eq!(redraw.graphs, [true, false]);
    }

    #[test]
    fn mode_switch_replots_for_new_axes() {
        let mut plotter = plotter();
        let err = plotter.apply_text(FieldId(1), "z = x").unwrap_err();
        assert!(matches!(
            err,
            InputErr::Resolve(ResolveErr::Unavailable(crate::Axis::Z))
        ));
        plotter.apply_text(FieldId(2), "y = x").unwrap();
        let disposed = plotter.renderer().disposed();

        plotter.set_mode(Mode::Space);
        assert!(matches!(geometry(&plotter, 1), Some(Geometry::Surface(_))));
        assert!(matches!(geometry(&plotter, 2), Some(Geometry::Surface(_))));
        // old grid, old axes, old curve
        assert_eq!(plotter.renderer().disposed(), disposed + 3);
        assert_eq!(plotter.renderer().len(), 4);

        plotter.set_mode(Mode::Flat);
        assert!(geometry(&plotter, 1).is_none());
        assert!(matches!(geometry(&plotter, 2), Some(Geometry::Polylines(_))));
        assert_eq!(plotter.renderer().len(), 3);
        assert_eq!(plotter.renderer().unknown_disposals(), 0);
    }

    #[test]
    fn function_definitions_plot() {
        let mut plotter = plotter();
        let line = plotter.apply_text(FieldId(1), "f(x) = 2*x").unwrap();
        assert_eq!(line, "f(x) = 2*x");
        assert!(curve(&plotter, 1).iter().all(|p| p.y() == 2.0 * p.x()));
    }

    #[test]
    fn function_parameter_is_swept() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "a = 100").unwrap();
        plotter.apply_text(FieldId(2), "f(a) = a^2").unwrap();
        let points = curve(&plotter, 2);
        assert!(!points.is_empty());
        assert!(points
            .iter()
            .all(|p| (p.y() - p.x() * p.x()).abs() < 1e-9 * p.y().max(1.0)));

        let err = plotter.apply_text(FieldId(3), "g(a) = a*x*y").unwrap_err();
        assert_eq!(err.to_string(), "no axis left for parameter 'a'");
    }

    #[test]
    fn constant_expressions_show_their_value() {
        let mut plotter = plotter();
        assert_eq!(plotter.apply_text(FieldId(1), " 1 + 2 ").unwrap(), "1 + 2 = 3");
        assert_eq!(plotter.apply_text(FieldId(2), "y = x^2").unwrap(), "y = x^2");
    }

    #[test]
    fn remove_disposes_geometry() {
        let mut plotter = plotter();
        plotter.apply_text(FieldId(1), "y = x").unwrap();
        let disposed = plotter.renderer().disposed();
        assert!(plotter.remove(FieldId(1)));
        assert!(!plotter.remove(FieldId(1)));
        assert_eq!(plotter.renderer().disposed(), disposed + 1);
        assert_eq!(plotter.renderer().layer(Layer::Graph).count(), 0);
        assert!(plotter.inputs().is_empty());
    }
}
