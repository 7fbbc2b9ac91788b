// SPDX: CC0-1.0

use crate::{
    eval::{Ident, Idents, Program},
    lex::{Lexer, SubStr, Tok, TokTyp},
    parse::{self, ParseErr, ParseErrTyp},
    stdlib, Axis,
};
use std::{collections::BTreeSet, sync::Arc};

/// Coordinates of a `Point(x, y[, z])` constructor, one program each.
#[derive(Clone, Debug)]
pub struct PointLiteral {
    pub coords: Vec<Program>,
}

#[derive(Clone, Debug)]
pub enum Vertex {
    /// A point assigned elsewhere, looked up in global scope.
    Named(SubStr),
    Literal(PointLiteral),
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    /// `expr` or `<axis> = expr`.
    Expression {
        output: Option<Axis>,
        program: Program,
    },
    /// `f(a, b) = expr`, plotted over its free variables.
    Function {
        name: SubStr,
        params: Vec<SubStr>,
        program: Program,
    },
    /// `name = expr`, a value in global scope.
    Assignment { name: SubStr, program: Program },
    Point {
        name: Option<SubStr>,
        point: PointLiteral,
    },
    Polygon { vertices: Vec<Vertex> },
}

/// One parsed line of user input. Never mutated; an edit produces a new one.
#[derive(Clone, Debug)]
pub struct Statement {
    pub src: Arc<String>,
    pub kind: StatementKind,
    /// Names looked up in scope, excluding builtins and an explicit output
    /// axis.
    pub free: BTreeSet<String>,
    pub uses_clock: bool,
}

impl Statement {
    pub fn parse(src: Arc<String>, idents: &Idents) -> Result<Self, ParseErr> {
        let toks: Vec<Tok> = Lexer::new(&src).collect::<Result<_, _>>()?;
        if toks.is_empty() {
            return Err(ParseErr {
                typ: ParseErrTyp::Empty,
                loc: SubStr::all(Arc::clone(&src)),
            });
        }

        let mut equals = toks
            .iter()
            .enumerate()
            .filter(|(_, tok)| tok.typ == TokTyp::Equals);
        let split = equals.next().map(|(idx, _)| idx);
        if let Some((_, tok)) = equals.next() {
            return Err(ParseErr {
                typ: ParseErrTyp::MisplacedEquals,
                loc: tok.loc.clone(),
            });
        }

        let kind = match split {
            Some(idx) => {
                let (lhs, rhs) = (&toks[..idx], &toks[idx + 1..]);
                if rhs.is_empty() {
                    return Err(ParseErr {
                        typ: ParseErrTyp::Empty,
                        loc: toks[idx].loc.clone(),
                    });
                }
                parse_definition(lhs, rhs, &toks[idx], idents)?
            }
            None => parse_value(&toks, None, idents)?,
        };

        let mut free = BTreeSet::new();
        kind.collect_free(idents, &mut free);
        let uses_clock = free.contains(stdlib::T);
        Ok(Self {
            src,
            kind,
            free,
            uses_clock,
        })
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.free.contains(name)
    }

    /// The global name this statement binds, if any.
    pub fn binds(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Assignment { name, .. }
            | StatementKind::Point {
                name: Some(name), ..
            } => Some(name.get()),
            _ => None,
        }
    }
}

impl StatementKind {
    fn collect_free(&self, idents: &Idents, free: &mut BTreeSet<String>) {
        let add_program = |prog: &Program, free: &mut BTreeSet<String>| {
            for name in prog.idents() {
                match idents.get(name) {
                    Some(Ident::Fun(_) | Ident::Const(_)) => {}
                    Some(Ident::Var(_)) | None => {
                        free.insert(name.to_string());
                    }
                }
            }
        };
        match self {
            Self::Expression { program, .. }
            | Self::Function { program, .. }
            | Self::Assignment { program, .. } => add_program(program, free),
            Self::Point { point, .. } => {
                for coord in &point.coords {
                    add_program(coord, free);
                }
            }
            Self::Polygon { vertices } => {
                for vertex in vertices {
                    match vertex {
                        Vertex::Named(name) => {
                            free.insert(name.get().to_string());
                        }
                        Vertex::Literal(point) => {
                            for coord in &point.coords {
                                add_program(coord, free);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn program(toks: &[Tok], idents: &Idents) -> Result<Program, ParseErr> {
    parse::parse(toks.iter().cloned().map(Ok), idents)
}

/// Parses the left-hand side of `lhs = rhs`.
fn parse_definition(
    lhs: &[Tok],
    rhs: &[Tok],
    equals: &Tok,
    idents: &Idents,
) -> Result<StatementKind, ParseErr> {
    let invalid = |loc: &SubStr| ParseErr {
        typ: ParseErrTyp::InvalidTarget,
        loc: loc.clone(),
    };
    let Some(first) = lhs.first() else {
        return Err(invalid(&equals.loc));
    };
    if first.typ != TokTyp::Ident {
        return Err(invalid(&first.loc));
    }
    let name = first.loc.clone();

    if lhs.len() == 1 {
        if let Some(axis) = Axis::from_name(name.get()) {
            return Ok(StatementKind::Expression {
                output: Some(axis),
                program: program(rhs, idents)?,
            });
        }
        if stdlib::is_reserved(idents, name.get()) {
            return Err(ParseErr {
                typ: ParseErrTyp::Reserved,
                loc: name,
            });
        }
        return parse_value(rhs, Some(name), idents);
    }

    // f(a, b) = ...
    let Some((fun, args)) = call(lhs) else {
        return Err(invalid(&first.loc));
    };
    if Axis::from_name(fun.loc.get()).is_some() || stdlib::is_reserved(idents, fun.loc.get()) {
        return Err(ParseErr {
            typ: ParseErrTyp::Reserved,
            loc: fun.loc.clone(),
        });
    }
    let mut params = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            [tok] if tok.typ == TokTyp::Ident => params.push(tok.loc.clone()),
            [tok, ..] => return Err(invalid(&tok.loc)),
            [] => return Err(invalid(&fun.loc)),
        }
    }
    Ok(StatementKind::Function {
        name: fun.loc.clone(),
        params,
        program: program(rhs, idents)?,
    })
}

/// Parses a value: a point or polygon constructor, or an expression.
fn parse_value(
    toks: &[Tok],
    name: Option<SubStr>,
    idents: &Idents,
) -> Result<StatementKind, ParseErr> {
    if let Some((fun, args)) = call(toks) {
        if stdlib::POINT.contains(&fun.loc.get()) {
            return Ok(StatementKind::Point {
                name,
                point: point_literal(fun, &args, idents)?,
            });
        }
        if fun.loc.get() == stdlib::POLYGON && name.is_none() {
            if args.is_empty() {
                return Err(ParseErr {
                    typ: ParseErrTyp::Arity {
                        name: stdlib::POLYGON,
                        min: 1,
                        max: usize::MAX,
                        found: 0,
                    },
                    loc: fun.loc.clone(),
                });
            }
            let mut vertices = Vec::with_capacity(args.len());
            for arg in args {
                vertices.push(vertex(fun, arg, idents)?);
            }
            return Ok(StatementKind::Polygon { vertices });
        }
    }

    let program = program(toks, idents)?;
    Ok(match name {
        Some(name) => StatementKind::Assignment { name, program },
        None => StatementKind::Expression {
            output: None,
            program,
        },
    })
}

fn point_literal(fun: &Tok, args: &[&[Tok]], idents: &Idents) -> Result<PointLiteral, ParseErr> {
    if !(2..=3).contains(&args.len()) {
        return Err(ParseErr {
            typ: ParseErrTyp::Arity {
                name: stdlib::POINT[0],
                min: 2,
                max: 3,
                found: args.len(),
            },
            loc: fun.loc.clone(),
        });
    }
    let mut coords = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_empty() {
            return Err(ParseErr {
                typ: ParseErrTyp::Empty,
                loc: fun.loc.clone(),
            });
        }
        coords.push(program(arg, idents)?);
    }
    Ok(PointLiteral { coords })
}

fn vertex(polygon: &Tok, arg: &[Tok], idents: &Idents) -> Result<Vertex, ParseErr> {
    match arg {
        [tok] if tok.typ == TokTyp::Ident => Ok(Vertex::Named(tok.loc.clone())),
        _ => match call(arg) {
            Some((fun, args)) if stdlib::POINT.contains(&fun.loc.get()) => {
                Ok(Vertex::Literal(point_literal(fun, &args, idents)?))
            }
            _ => Err(ParseErr {
                typ: ParseErrTyp::InvalidVertex,
                loc: arg.first().unwrap_or(polygon).loc.clone(),
            }),
        },
    }
}

/// Splits `name(a, b, ...)` spanning all of `toks` into the name token and
/// its top-level arguments.
fn call(toks: &[Tok]) -> Option<(&Tok, Vec<&[Tok]>)> {
    let [fun, open, .., close] = toks else {
        return None;
    };
    if fun.typ != TokTyp::Ident || open.typ != TokTyp::OpenParen || close.typ != TokTyp::CloseParen
    {
        return None;
    }

    let inner = &toks[2..toks.len() - 1];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, tok) in inner.iter().enumerate() {
        match tok.typ {
            TokTyp::OpenParen => depth += 1,
            TokTyp::CloseParen => {
                // the opening paren closes before the end
                depth = depth.checked_sub(1)?;
            }
            TokTyp::Comma if depth == 0 => {
                args.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    if !inner.is_empty() {
        args.push(&inner[start..]);
    }
    Some((fun, args))
}
