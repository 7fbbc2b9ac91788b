// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Number};
use core::{borrow::Borrow, fmt};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    /// Prefix operators take their operand from the right, so they never
    /// pop pending operators off the shunting stack.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg)
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Left,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::Unary(stdlib::neg)),
            Self::Add => ("add", Fun::Binary(stdlib::add)),
            Self::Sub => ("sub", Fun::Binary(stdlib::sub)),
            Self::Mul => ("mul", Fun::Binary(stdlib::mul)),
            Self::Div => ("div", Fun::Binary(stdlib::div)),
            Self::Pow => ("pow", Fun::Binary(stdlib::pow)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Ident,
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Ident => write!(f, "call '{}'", self.loc.get()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    UndefinedIdent {
        text: SubStr,
    },
    NullVar {
        text: SubStr,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                name = name.get(),
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} operation{s} on the stack but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::UndefinedIdent { text } => {
                write!(f, "undefined identifier '{}'", text.get())
            }

            EvalErrTyp::NullVar { text } => {
                write!(
                    f,
                    "variable '{}' is declared but its value is not defined",
                    text.get()
                )
            }
        }
    }
}

impl std::error::Error for EvalErr {}

#[derive(Debug, Clone)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

/// A builtin, called with its arguments straight off the evaluation stack.
#[derive(Clone, Copy, Debug)]
pub enum Fun {
    Unary(fn(Number) -> Number),
    Binary(fn(Number, Number) -> Number),
}

impl Fun {
    pub const fn arity(&self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }

    /// `args` must hold exactly [`Fun::arity`] values.
    fn call(&self, args: &[Number]) -> Number {
        match (self, args) {
            (Self::Unary(fun), &[x]) => fun(x),
            (Self::Binary(fun), &[x, y]) => fun(x, y),
            _ => Number::NAN,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Var(Option<Number>),
    Const(Number),
    Fun(Fun),
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
        }
    }
}

impl Borrow<str> for IdentKey {
    fn borrow(&self) -> &str {
        self.get()
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arc(s) => write!(f, "{s}"),
            Self::Static(s) => write!(f, "{s}"),
        }
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

/// Anything identifiers can be looked up in during evaluation.
pub trait Env {
    fn lookup(&self, name: &str) -> Option<Ident>;
}

impl Env for Idents {
    fn lookup(&self, name: &str) -> Option<Ident> {
        self.get(name).copied()
    }
}

#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Names of every identifier the program looks up, in program order and
    /// possibly repeated.
    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.ops
            .iter()
            .filter(|op| op.typ == OperationTyp::Ident)
            .map(|op| op.loc.get())
    }
}

pub fn eval<E: Env + ?Sized>(
    prog: &Program,
    env: &E,
    stack: &mut Vec<Number>,
) -> Result<Number, EvalErr> {
    fn expect_exactly_n(
        stack: &[Number],
        op: impl Into<Option<Operation>>,
        n: usize,
    ) -> Result<(), EvalErr> {
        let len = stack.len();
        if len == n {
            Ok(())
        } else {
            Err(EvalErr {
                typ: EvalErrTyp::StackMismatch {
                    expected: n,
                    found: len,
                },
                op: op.into(),
            })
        }
    }

    fn eval_fun(
        stack: &mut Vec<Number>,
        op: Operation,
        name: impl Into<IdentKey>,
        fun: &Fun,
    ) -> Result<Number, EvalErr> {
        let arity = fun.arity();
        let Some(start) = stack.len().checked_sub(arity) else {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    name: name.into(),
                    arity,
                    found: stack.len(),
                },
                op: Some(op),
            });
        };
        let val = fun.call(&stack[start..]);
        stack.truncate(start);
        Ok(val)
    }

    let mut prog = prog.ops.iter().peekable();

    if prog.peek().is_none() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    for op in prog {
        match op.typ {
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                let val = eval_fun(stack, op.clone(), name, &fun)?;
                stack.push(val);
            }

            OperationTyp::Val(num) => stack.push(num),

            OperationTyp::Ident => {
                let sym = op.loc.clone();
                if let Some(ident) = env.lookup(sym.get()) {
                    let val = match ident {
                        Ident::Var(None) => {
                            return Err(EvalErr {
                                typ: EvalErrTyp::NullVar { text: sym },
                                op: Some(op.clone()),
                            });
                        }
                        Ident::Var(Some(val)) | Ident::Const(val) => val,
                        Ident::Fun(fun) => eval_fun(stack, op.clone(), sym, &fun)?,
                    };
                    stack.push(val);
                } else {
                    return Err(EvalErr {
                        typ: EvalErrTyp::UndefinedIdent { text: sym },
                        op: Some(op.clone()),
                    });
                }
            }
        }
    }

    expect_exactly_n(stack, None, 1)?;
    match stack.pop() {
        Some(val) => Ok(val),
        None => Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        }),
    }
}
