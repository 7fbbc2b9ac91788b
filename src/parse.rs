// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, SubStr, Tok, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug, Clone)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    Empty,
    MisplacedEquals,
    InvalidTarget,
    Reserved,
    Arity {
        name: &'static str,
        min: usize,
        max: usize,
        found: usize,
    },
    InvalidVertex,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::Empty => write!(f, "missing expression"),
            Self::MisplacedEquals => write!(f, "unexpected '='"),
            Self::InvalidTarget => write!(f, "cannot assign to this"),
            Self::Reserved => write!(f, "name is reserved"),
            Self::Arity {
                name,
                min,
                max,
                found,
            } => {
                if *max == usize::MAX {
                    write!(f, "'{name}' takes at least {min} arguments, but found {found}")
                } else if min == max {
                    write!(f, "'{name}' takes {min} arguments, but found {found}")
                } else {
                    write!(
                        f,
                        "'{name}' takes {min} to {max} arguments, but found {found}"
                    )
                }
            }
            Self::InvalidVertex => write!(f, "expected the name of a point"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Ident,
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    pub fn precedence(&self) -> i8 {
        match self.typ {
            ShuntOpTyp::Operator(op) => op.precedence(),
            // see https://softwareengineering.stackexchange.com/questions/290043/precedence-of-function-in-shunting-yard-algorithm
            ShuntOpTyp::Ident => i8::MAX,
            ShuntOpTyp::OpenParen => i8::MIN,
        }
    }

    pub fn into_output(self) -> Option<Operation> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Ident => OperationTyp::Ident,
            ShuntOpTyp::OpenParen => return None,
        };
        Some(Operation { typ, loc: self.loc })
    }
}

fn mismatch(loc: SubStr) -> ParseErr {
    ParseErr {
        typ: ParseErrTyp::ParenMismatch,
        loc,
    }
}

pub fn parse<I>(toks: I, idents: &Idents) -> Result<Program, ParseErr>
where
    I: IntoIterator<Item = Result<Tok, LexErr>>,
{
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    // moves operators to the output until an open paren is on top
    fn drain_to_paren(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) {
        while let Some(op) = ops.last() {
            if op.typ == ShuntOpTyp::OpenParen {
                break;
            }
            if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
                out.push(op);
            }
        }
    }

    for tok in toks {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => {
                if let Some(Ident::Fun(_)) = idents.get(tok.loc.get()) {
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Ident,
                        loc: tok.loc,
                    });
                } else {
                    // if we don't know what the identifier is, assume it's a
                    // variable
                    out.push(Operation {
                        typ: OperationTyp::Ident,
                        loc: tok.loc,
                    });
                }
            }

            TokTyp::Op(o1) => {
                while let Some(o2) = ops.last() {
                    if o1.is_prefix() || o2.typ == ShuntOpTyp::OpenParen {
                        break;
                    }
                    if (o2.precedence() > o1.precedence())
                        || ((o1.precedence() == o2.precedence())
                            && (o1.associativity() == Associativity::Left))
                    {
                        if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
                            out.push(op);
                        }
                    } else {
                        break;
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Comma => drain_to_paren(&mut ops, &mut out),

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                drain_to_paren(&mut ops, &mut out);

                if ops.pop().is_none() {
                    return Err(mismatch(tok.loc));
                }

                // handle functions
                if let Some(ShuntOp {
                    typ: ShuntOpTyp::Ident,
                    ..
                }) = ops.last()
                {
                    if let Some(op) = ops.pop().and_then(ShuntOp::into_output) {
                        out.push(op);
                    }
                }
            }

            TokTyp::Equals => {
                return Err(ParseErr {
                    typ: ParseErrTyp::MisplacedEquals,
                    loc: tok.loc,
                })
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => {
                return Err(ParseErr {
                    typ: ParseErrTyp::LexErr(LexErrTyp::Unsupported(tok.typ)),
                    loc: tok.loc,
                })
            }
        }
    }

    while let Some(op) = ops.pop() {
        let loc = op.loc.clone();
        match op.into_output() {
            Some(op) => out.push(op),
            None => return Err(mismatch(loc)),
        }
    }

    Ok(Program::new(out))
}
