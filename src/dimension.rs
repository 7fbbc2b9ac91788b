// SPDX: CC0-1.0

use crate::Axis;
use core::fmt;
use std::collections::BTreeSet;

/// Which axes a statement sweeps and which one it computes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub inputs: Vec<Axis>,
    pub output: Axis,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveErr {
    /// Every candidate axis is already supplied by the statement.
    NoOutput,
    /// The statement names an output axis the current mode doesn't have.
    Unavailable(Axis),
    /// The named output axis also appears on the right-hand side.
    SelfReference(Axis),
    /// A function parameter that can't stand for any free axis.
    NoAxisFor(String),
}

impl fmt::Display for ResolveErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOutput => write!(f, "cannot resolve an output axis"),
            Self::Unavailable(axis) => {
                write!(f, "axis '{axis}' is not available in this mode")
            }
            Self::SelfReference(axis) => {
                write!(f, "axis '{axis}' cannot be computed from itself")
            }
            Self::NoAxisFor(param) => write!(f, "no axis left for parameter '{param}'"),
        }
    }
}

impl std::error::Error for ResolveErr {}

/// Splits `candidates` into the axes the statement supplies values for and
/// the single axis left to compute.
///
/// When more than one axis is left over, all but the last are swept as
/// inputs too, in candidate order.
pub fn resolve(free: &BTreeSet<String>, candidates: &[Axis]) -> Result<Dimensions, ResolveErr> {
    let (mut inputs, mut outputs): (Vec<Axis>, Vec<Axis>) = candidates
        .iter()
        .copied()
        .partition(|axis| free.contains(axis.name()));

    while outputs.len() > 1 {
        inputs.push(outputs.remove(0));
    }
    // keep inputs in candidate order
    inputs.sort_by_key(|axis| candidates.iter().position(|c| c == axis));

    match outputs.pop() {
        Some(output) => Ok(Dimensions { inputs, output }),
        None => Err(ResolveErr::NoOutput),
    }
}

/// Like [`resolve`], but the statement names its output axis explicitly
/// (`y = ...`), so every other candidate axis is an input.
pub fn resolve_with_output(
    free: &BTreeSet<String>,
    candidates: &[Axis],
    output: Axis,
) -> Result<Dimensions, ResolveErr> {
    if !candidates.contains(&output) {
        return Err(ResolveErr::Unavailable(output));
    }
    if free.contains(output.name()) {
        return Err(ResolveErr::SelfReference(output));
    }
    Ok(Dimensions {
        inputs: candidates.iter().copied().filter(|&a| a != output).collect(),
        output,
    })
}

/// Resolves a function definition `f(a, b) = ...`. Each parameter that
/// isn't already an axis name stands for the next candidate axis the
/// definition doesn't otherwise mention; the pairs are returned alongside.
pub fn resolve_function<'a>(
    free: &BTreeSet<String>,
    params: &[&'a str],
    candidates: &[Axis],
) -> Result<(Dimensions, Vec<(&'a str, Axis)>), ResolveErr> {
    let mut spare = candidates
        .iter()
        .copied()
        .filter(|axis| !free.contains(axis.name()) && !params.contains(&axis.name()));
    let mut free = free.clone();
    let mut aliases = Vec::new();
    for &param in params {
        if Axis::from_name(param).is_some() {
            continue;
        }
        let axis = spare
            .next()
            .ok_or_else(|| ResolveErr::NoAxisFor(param.to_string()))?;
        free.remove(param);
        free.insert(axis.name().to_string());
        aliases.push((param, axis));
    }
    Ok((resolve(&free, candidates)?, aliases))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Mode;

    fn free(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_axis_variable_is_the_input() {
        let dims = resolve(&free(&["x"]), Mode::Flat.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::X]);
        assert_eq!(dims.output, Axis::Y);

        let dims = resolve(&free(&["y"]), Mode::Flat.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::Y]);
        assert_eq!(dims.output, Axis::X);

        let dims = resolve(&free(&["y", "a"]), Mode::Space.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::X, Axis::Y]);
        assert_eq!(dims.output, Axis::Z);
    }

    #[test]
    fn non_axis_variables_are_ignored() {
        let dims = resolve(&free(&["a", "t"]), Mode::Flat.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::X]);
        assert_eq!(dims.output, Axis::Y);
    }

    #[test]
    fn leftover_axes_become_inputs_in_order() {
        let dims = resolve(&free(&["z"]), Mode::Space.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::X, Axis::Z]);
        assert_eq!(dims.output, Axis::Y);

        let dims = resolve(&free(&[]), Mode::Space.axes()).unwrap();
        assert_eq!(dims.inputs, [Axis::X, Axis::Y]);
        assert_eq!(dims.output, Axis::Z);
    }

    #[test]
    fn every_axis_bound_is_an_error() {
        for mode in [Mode::Flat, Mode::Space] {
            let names: Vec<&str> = mode.axes().iter().map(|a| a.name()).collect();
            assert_eq!(
                resolve(&free(&names), mode.axes()),
                Err(ResolveErr::NoOutput)
            );
        }
    }

    #[test]
    fn input_count_matches_mode() {
        let cases: [&[&str]; 5] = [&[], &["x"], &["y"], &["z"], &["x", "q"]];
        for mode in [Mode::Flat, Mode::Space] {
            for names in cases {
                if let Ok(dims) = resolve(&free(names), mode.axes()) {
                    assert_eq!(dims.inputs.len() + 1, mode.axes().len());
                }
            }
        }
    }

    #[test]
    fn function_parameters_take_spare_axes() {
        let (dims, aliases) = resolve_function(&free(&["a"]), &["a"], Mode::Flat.axes()).unwrap();
        assert_eq!(aliases, [("a", Axis::X)]);
        assert_eq!(dims.inputs, [Axis::X]);
        assert_eq!(dims.output, Axis::Y);

        // x is taken by the body, so the parameter gets y
        let (dims, aliases) =
            resolve_function(&free(&["u", "x"]), &["u"], Mode::Space.axes()).unwrap();
        assert_eq!(aliases, [("u", Axis::Y)]);
        assert_eq!(dims.inputs, [Axis::X, Axis::Y]);
        assert_eq!(dims.output, Axis::Z);

        // axis parameters are just axes
        let (dims, aliases) = resolve_function(&free(&["x"]), &["x"], Mode::Flat.axes()).unwrap();
        assert!(aliases.is_empty());
        assert_eq!(dims.inputs, [Axis::X]);

        assert_eq!(
            resolve_function(&free(&["x", "y"]), &["a"], Mode::Flat.axes()),
            Err(ResolveErr::NoAxisFor("a".to_string()))
        );
    }

    #[test]
    fn explicit_output() {
        let dims = resolve_with_output(&free(&["x"]), Mode::Flat.axes(), Axis::Y).unwrap();
        assert_eq!(dims.inputs, [Axis::X]);
        assert_eq!(dims.output, Axis::Y);

        // `x = 3` is a vertical line, not a function of x
        let dims = resolve_with_output(&free(&[]), Mode::Flat.axes(), Axis::X).unwrap();
        assert_eq!(dims.inputs, [Axis::Y]);
        assert_eq!(dims.output, Axis::X);

        assert_eq!(
            resolve_with_output(&free(&["x"]), Mode::Flat.axes(), Axis::Z),
            Err(ResolveErr::Unavailable(Axis::Z))
        );
        assert_eq!(
            resolve_with_output(&free(&["y"]), Mode::Flat.axes(), Axis::Y),
            Err(ResolveErr::SelfReference(Axis::Y))
        );
    }
}
