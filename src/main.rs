// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU32;
use plotter::{
    eval::EvalErrTyp,
    geometry::{Geometry, Label, Weight},
    lex::{LexErrTyp, TokTyp},
    parse::ParseErrTyp,
    plotter::{InputErr, Plotter},
    redraw::Redraw,
    render::{Layer, Scene},
    shell::{self, Command},
    statement::{StatementKind, Vertex},
    text, Axis, Config, FieldId, Mode, Number, Vec3,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    collections::BTreeMap,
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn output_gnuplot_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "gnuplot"
    )
}

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

struct State {
    plotter: Plotter<Scene>,
    /// What each field currently shows.
    lines: BTreeMap<FieldId, String>,
    next_field: u32,
    start: DateTime<Local>,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        plotter: Plotter::new(Scene::new(), Config::default()),
        lines: BTreeMap::new(),
        next_field: 1,
        start: Local::now(),
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    set_field(&mut stdout, &mut state, None, Some("y = sin(x + t)"))?;
    loop {
        writeln!(
            stdout,
            "{mode}, {n} field{s}, t = {t}",
            mode = state.plotter.mode(),
            n = state.lines.len(),
            s = if state.lines.len() == 1 { "" } else { "s" },
            t = state.plotter.globals().clock(),
        )?;

        let line = shell::input(&mut stdout, "> ")?;
        let (try_cmd, arg) = shell::split_command(&line);
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(
                            stdout,
                            "{name}{usage}: {help}",
                            name = c.name(),
                            usage = c.usage(),
                            help = c.help()
                        )?;
                    }
                }

                Command::Quit => break,

                Command::Set => {
                    if arg.is_empty() {
                        set_field(&mut stdout, &mut state, None, None)?;
                    } else if let Some(field) = read_field(&mut stdout, arg)? {
                        set_field(&mut stdout, &mut state, Some(field), None)?;
                    }
                }

                Command::Clear => {
                    if let Some(field) = read_field(&mut stdout, arg)? {
                        if state.plotter.remove(field) {
                            state.lines.remove(&field);
                            writeln!(stdout, "cleared {field}")?;
                        } else {
                            shell::field_undefined(&mut stdout, field)?;
                        }
                    }
                }

                Command::List => list(&mut stdout, &state)?,

                Command::Pan => pan(&mut stdout, &mut state)?,

                Command::Zoom => zoom(&mut stdout, &mut state)?,

                Command::Mode => {
                    let mode = state.plotter.mode().toggled();
                    state.plotter.set_mode(mode);
                    writeln!(stdout, "switched to {mode}")?;
                }

                Command::Tick => tick(&mut stdout, &mut state, arg)?,

                Command::Window => set_window(&mut stdout, &mut state)?,

                Command::Plot => plot_scene(&mut stdout, &mut state)?,

                Command::Prog => {
                    if let Some(field) = read_field(&mut stdout, arg)? {
                        print_programs(&mut stdout, &state, field)?;
                    }
                }
            }
        } else if !try_cmd.is_empty() {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn read_field<W: Write>(mut out: W, arg: &str) -> anyhow::Result<Option<FieldId>> {
    match shell::parse_field(arg) {
        Ok(field) => Ok(Some(field)),
        Err(err) => {
            writeln!(out, "error: expected a field number ({err})")?;
            Ok(None)
        }
    }
}

fn set_field<W: Write>(
    mut out: W,
    state: &mut State,
    field: Option<FieldId>,
    preset: Option<&str>,
) -> anyhow::Result<()> {
    let field = field.unwrap_or(FieldId(state.next_field));
    state.next_field = state.next_field.max(field.0.saturating_add(1));

    let src = match preset {
        Some(src) => src.to_string(),
        None => shell::input(&mut out, format_args!("{field}: "))?,
    };
    match state.plotter.apply_text(field, &src) {
        Ok(line) if line.is_empty() => {
            state.lines.remove(&field);
        }
        Ok(line) => {
            writeln!(out, "{field}: {line}")?;
            state.lines.insert(field, line);
        }
        Err(err) => {
            report(&mut out, &state.plotter, src.trim(), &err)?;
            // the field keeps showing the error until its text is fixed
            if state.plotter.input(field).is_some() {
                state
                    .lines
                    .insert(field, text::error_line(src.trim(), &err));
            }
        }
    }
    Ok(())
}

fn report<W: Write>(
    mut out: W,
    plotter: &Plotter<Scene>,
    src: &str,
    err: &InputErr,
) -> anyhow::Result<()> {
    writeln!(out)?;
    match err {
        InputErr::Parse(err) => shell::underline(&mut out, &err.loc)?,
        InputErr::Assign(err) => {
            if let Some(ref op) = err.op {
                shell::underline(&mut out, &op.loc)?;
            }
        }
        InputErr::Resolve(_) => {}
    }
    writeln!(out, "error: {}", text::error_line(src, err))?;

    match err {
        InputErr::Parse(err) => match &err.typ {
            ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => writeln!(
                out,
                "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/^=,()"
            )?,
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
                TokTyp::XGreater | TokTyp::XLess => {
                    writeln!(out, "note: inequalities can't be plotted")?
                }
                TokTyp::XPipe => writeln!(
                    out,
                    "note: use the 'abs' function to compute absolute value"
                )?,
                _ => {}
            },
            ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,
            ParseErrTyp::Reserved => writeln!(
                out,
                "note: builtins, axes and the clock 't' cannot be redefined"
            )?,
            _ => {}
        },

        InputErr::Assign(assign) => {
            if let EvalErrTyp::StackMismatch { .. } = assign.typ {
                writeln!(
                    out,
                    "note: implicit multiplication is not supported, so for example '5x' would be '5*x'",
                )?;
            }
            if let Some(note) = plotter.suggestion(err) {
                writeln!(out, "note: {note}")?;
            }
        }

        InputErr::Resolve(_) => writeln!(
            out,
            "note: {mode} plots can use the axes {axes}",
            mode = plotter.mode(),
            axes = plotter
                .mode()
                .axes()
                .iter()
                .map(|axis| axis.name())
                .collect::<Vec<_>>()
                .join(", "),
        )?,
    }
    Ok(())
}

fn list<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    if state.lines.is_empty() {
        writeln!(out, "no fields are set")?;
    }
    for (field, line) in &state.lines {
        writeln!(out, "{field}: {line}")?;
    }
    let scene = state.plotter.renderer();
    writeln!(
        out,
        "{live} meshes live ({submitted} submitted, {disposed} disposed)",
        live = scene.len(),
        submitted = scene.submitted(),
        disposed = scene.disposed(),
    )?;
    Ok(())
}

fn describe_redraw<W: Write>(mut out: W, redraw: &Redraw) -> anyhow::Result<()> {
    if !redraw.any() {
        writeln!(out, "nothing to regenerate")?;
        return Ok(());
    }
    let graphs = redraw.graphs.iter().filter(|&&stale| stale).count();
    writeln!(
        out,
        "regenerated {graphs} graph{s}{grid}{axes}{zoom}",
        s = if graphs == 1 { "" } else { "s" },
        grid = if redraw.grid { ", the grid" } else { "" },
        axes = if redraw.axes { ", the axes" } else { "" },
        zoom = if redraw.zoom { " (zoomed)" } else { "" },
    )?;
    Ok(())
}

fn pan<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let mut camera = state.plotter.camera().clone();
    writeln!(out, "note: leave blank to skip")?;
    for axis in [Axis::X, Axis::Y] {
        match shell::read_fromstr::<_, Number>(&mut out, format_args!("?d{axis} = "), true)? {
            Ok(Some(delta)) => camera.position[axis] += delta,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    let redraw = state.plotter.view_changed(camera);
    describe_redraw(&mut out, &redraw)
}

fn zoom<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let mut camera = state.plotter.camera().clone();
    writeln!(out, "note: factors above 1 move the camera away")?;
    match shell::read_fromstr::<_, Number>(&mut out, "?factor = ", true)? {
        Ok(Some(factor)) if factor > 0.0 && factor.is_finite() => {
            camera.position[Axis::Z] *= factor;
        }
        Ok(Some(_)) => {
            writeln!(out, "error: factor must be positive")?;
            return Ok(());
        }
        Ok(None) | Err(_) => return Ok(()),
    }
    let redraw = state.plotter.view_changed(camera);
    describe_redraw(&mut out, &redraw)
}

fn tick<W: Write>(mut out: W, state: &mut State, arg: &str) -> anyhow::Result<()> {
    let t = if arg.is_empty() {
        let elapsed = Local::now().signed_duration_since(state.start);
        elapsed.num_milliseconds() as Number / 1000.0
    } else {
        match arg.parse::<Number>() {
            Ok(t) => t,
            Err(err) => {
                writeln!(out, "error: invalid time ({err})")?;
                return Ok(());
            }
        }
    };
    let n = state.plotter.tick(t);
    writeln!(
        out,
        "t = {t}, re-plotted {n} field{s}",
        s = if n == 1 { "" } else { "s" }
    )?;
    Ok(())
}

fn set_window<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let mut camera = state.plotter.camera().clone();
    writeln!(out, "camera = {camera}")?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let [x, y, z] = &mut camera.position.0;
    for (name, dst) in [("x", x), ("y", y), ("z", z), ("fov", &mut camera.fov)] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: sizes must be nonzero integers")?;
    for (name, dst) in camera.pixels.iter_mut().zip(["width", "height"]).map(|(d, n)| (n, d)) {
        match shell::read_fromstr::<_, NonZeroU32>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new.get(),
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    let redraw = state.plotter.view_changed(camera);
    describe_redraw(&mut out, &redraw)
}

fn print_programs<W: Write>(mut out: W, state: &State, field: FieldId) -> anyhow::Result<()> {
    let Some(input) = state.plotter.input(field) else {
        shell::field_undefined(&mut out, field)?;
        return Ok(());
    };
    match &input.statement().kind {
        StatementKind::Expression { program, .. }
        | StatementKind::Function { program, .. }
        | StatementKind::Assignment { program, .. } => {
            shell::dump_program(&mut out, program, format_args!("program"))?;
        }
        StatementKind::Point { point, .. } => {
            for (axis, program) in Axis::ALL.iter().zip(&point.coords) {
                shell::dump_program(&mut out, program, format_args!("{axis}"))?;
            }
        }
        StatementKind::Polygon { vertices } => {
            for (idx, vertex) in vertices.iter().enumerate() {
                match vertex {
                    Vertex::Named(name) => writeln!(out, "vertex {idx}: '{}'", name.get())?,
                    Vertex::Literal(point) => {
                        for (axis, program) in Axis::ALL.iter().zip(&point.coords) {
                            shell::dump_program(
                                &mut out,
                                program,
                                format_args!("vertex {idx} {axis}"),
                            )?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// How a block of segments is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Style {
    Minor,
    Major,
    Axis,
    Graph,
}

impl Style {
    const fn arrowstyle(self) -> &'static str {
        match self {
            Self::Minor => "nohead lc '#eeeeee'",
            Self::Major => "nohead lc '#cccccc'",
            Self::Axis => "nohead lc '#444444' lw 2",
            Self::Graph => "nohead lw 2",
        }
    }
}

impl From<Weight> for Style {
    fn from(weight: Weight) -> Self {
        match weight {
            Weight::Minor => Self::Minor,
            Weight::Major => Self::Major,
            Weight::Axis => Self::Axis,
        }
    }
}

/// One mesh flattened into what gnuplot can draw.
#[derive(Default)]
struct Export {
    segments: BTreeMap<Style, Vec<(Vec3, Vec3)>>,
    points: Vec<Vec3>,
    labels: Vec<Label>,
}

fn push_path(segments: &mut BTreeMap<Style, Vec<(Vec3, Vec3)>>, style: Style, points: &[Vec3]) {
    segments
        .entry(style)
        .or_default()
        .extend(points.windows(2).map(|pair| (pair[0], pair[1])));
}

impl Export {
    fn add(&mut self, geometry: &Geometry) {
        match geometry {
            Geometry::Polylines(lines) => {
                for line in lines {
                    push_path(&mut self.segments, Style::Graph, line);
                }
            }
            Geometry::LineLoop(points) => push_path(&mut self.segments, Style::Graph, points),
            Geometry::Surface(surface) => {
                for tri in &surface.indices {
                    let corners: Vec<Vec3> = tri
                        .iter()
                        .chain(tri.first())
                        .filter_map(|&idx| surface.points.get(idx as usize).copied())
                        .collect();
                    push_path(&mut self.segments, Style::Graph, &corners);
                }
            }
            Geometry::Lines(lines) => {
                for line in lines {
                    push_path(
                        &mut self.segments,
                        line.weight.into(),
                        &[line.from, line.to],
                    );
                }
            }
            Geometry::Point(p) => self.points.push(*p),
            Geometry::Labels(labels) => self.labels.extend(labels.iter().cloned()),
            Geometry::Group(children) => {
                for child in children {
                    self.add(child);
                }
            }
        }
    }
}

fn write_point<W: Write>(mut out: W, p: Vec3, d: Vec3) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} {} {} {} {}",
        p.x(),
        p.y(),
        p.z(),
        d.x(),
        d.y(),
        d.z()
    )
}

fn plot_scene<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    // set up gnuplot
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }
    let now = Local::now();
    let data_path = output_data_filename(now);
    let gnuplot_path = output_gnuplot_filename(now);
    let svg_path = output_svg_filename(now);
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );
    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    let mode = state.plotter.mode();
    let (command, segment_cols, point_cols) = match mode {
        Mode::Flat => ("plot", "1:2:4:5", "1:2"),
        Mode::Space => ("splot", "1:2:3:4:5:6", "1:2:3"),
    };

    // one data block per style of each mesh
    let mut clauses = Vec::new();
    let mut labels = Vec::new();
    let mut graph = 0;
    for (layer, geometry) in state.plotter.renderer().meshes() {
        let mut export = Export::default();
        export.add(geometry);
        let title = match layer {
            Layer::Graph => {
                graph += 1;
                format!("title 'graph {graph}'")
            }
            Layer::Grid | Layer::Axes => "notitle".to_string(),
        };

        for (style, segments) in &export.segments {
            if segments.is_empty() {
                continue;
            }
            for (from, to) in segments {
                write_point(&mut data, *from, to.sub(*from))
                    .context("failed to write to output data file")?;
            }
            writeln!(data, "\n")?;
            clauses.push(format!(
                "'{data_path}' index {idx} using {segment_cols} with vectors {arrow} {title}",
                idx = clauses.len(),
                arrow = style.arrowstyle(),
            ));
        }
        if !export.points.is_empty() {
            for p in &export.points {
                write_point(&mut data, *p, Vec3::ZERO)
                    .context("failed to write to output data file")?;
            }
            writeln!(data, "\n")?;
            clauses.push(format!(
                "'{data_path}' index {idx} using {point_cols} with points pt 7 {title}",
                idx = clauses.len(),
            ));
        }
        labels.extend(export.labels);
    }

    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);

    if clauses.is_empty() {
        writeln!(out, "nothing to plot")?;
        return Ok(());
    }

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    // set output info
    let [width, height] = OUTPUT_RES;
    writeln!(gnuplot, "set terminal svg size {width},{height} enhanced",)?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    // set window
    let viewport = state.plotter.viewport();
    match mode {
        Mode::Flat => {
            for axis in [Axis::X, Axis::Y] {
                let (min, max) = viewport.span(axis);
                writeln!(gnuplot, "set {axis}range[{min}:{max}]")?;
            }
            writeln!(gnuplot, "set size ratio -1")?;
        }
        Mode::Space => {
            let extent = state.plotter.config().sampler.surface_extent;
            for axis in Axis::ALL {
                writeln!(gnuplot, "set {axis}range[{}:{extent}]", -extent)?;
            }
            writeln!(gnuplot, "set view equal xyz")?;
            writeln!(gnuplot, "set xyplane at 0")?;
        }
    }

    // configure appearence
    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;
    writeln!(gnuplot, "unset border")?;
    writeln!(gnuplot, "unset tics")?;
    writeln!(gnuplot, "set key out vertical top right")?;
    writeln!(gnuplot, r#"set key title "Key""#)?;

    // tick labels come from the scene, not from gnuplot
    for (idx, label) in labels.iter().enumerate() {
        let Vec3([x, y, z]) = label.anchor;
        let at = match mode {
            Mode::Flat => format!("{x},{y}"),
            Mode::Space => format!("{x},{y},{z}"),
        };
        writeln!(
            gnuplot,
            r#"set label {tag} "{text}" at {at} center noenhanced"#,
            tag = idx + 1,
            text = label.text,
        )?;
    }

    writeln!(gnuplot, "{command} \\")?;
    for (idx, clause) in clauses.iter().enumerate() {
        let sep = if idx + 1 == clauses.len() { "" } else { ", \\" };
        writeln!(gnuplot, "  {clause}{sep}")?;
    }

    // display window
    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    // done with the file
    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    // spawn gnuplot and provide the path to the file
    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;
    writeln!(out, "wrote {gnuplot_path} and {data_path}")?;

    state.gnuplot = Some(child);
    Ok(())
}
