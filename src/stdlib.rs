// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::collections::HashMap;

pub const X: &str = "x";
pub const Y: &str = "y";
pub const Z: &str = "z";
/// Seconds since the plotter started; rebound on every animation tick.
pub const T: &str = "t";

pub const POINT: [&str; 2] = ["Point", "Punkt"];
pub const POLYGON: &str = "Polygon";

/// Names a statement may not assign to.
pub fn is_reserved(idents: &Idents, name: &str) -> bool {
    name == T || POINT.contains(&name) || name == POLYGON || idents.contains_key(name)
}

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Pow,
    ] {
        let (name, fun) = op.fun();
        ret.insert(name.into(), Ident::Fun(fun));
    }

    let unary: [(&'static str, fn(Number) -> Number); 15] = [
        ("abs", Number::abs),
        ("ln", Number::ln),
        ("exp", Number::exp),
        ("sqrt", Number::sqrt),
        ("floor", Number::floor),
        ("ceil", Number::ceil),
        // trig
        ("sin", Number::sin),
        ("cos", Number::cos),
        ("tan", Number::tan),
        ("asin", Number::asin),
        ("acos", Number::acos),
        ("atan", Number::atan),
        ("arcsin", Number::asin),
        ("arccos", Number::acos),
        ("arctan", Number::atan),
    ];
    for (name, fun) in unary {
        ret.insert(name.into(), Ident::Fun(Fun::Unary(fun)));
    }
    ret.insert("log".into(), Ident::Fun(Fun::Binary(Number::log)));

    ret.insert("pi".into(), Ident::Const(consts::PI));
    ret.insert("tau".into(), Ident::Const(consts::TAU));
    ret.insert("e".into(), Ident::Const(consts::E));
    ret
}

pub fn neg(x: Number) -> Number {
    -x
}

pub fn add(x: Number, y: Number) -> Number {
    x + y
}

pub fn sub(x: Number, y: Number) -> Number {
    x - y
}

pub fn mul(x: Number, y: Number) -> Number {
    x * y
}

pub fn div(x: Number, y: Number) -> Number {
    x / y
}

pub fn pow(x: Number, exp: Number) -> Number {
    x.powf(exp)
}
