// SPDX: CC0-1.0

use crate::{
    eval::{Env, Ident, Idents},
    stdlib, Axis, FieldId, Number, Vec3,
};
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Number(Number),
    Point(Vec3),
}

#[derive(Clone, Copy, Debug)]
struct Global {
    // `None` for the clock, which no field owns
    owner: Option<FieldId>,
    value: Value,
}

/// Values shared by every statement: assignments, named points, the clock.
///
/// Each binding belongs to the field that made it and goes away with that
/// field. When several fields bind the same name, the most recently added
/// binding is visible and the others wait behind it. Sampling never writes
/// here.
#[derive(Clone, Debug, Default)]
pub struct GlobalScope {
    vars: HashMap<String, Vec<Global>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        let mut ret = Self::default();
        ret.set_clock(0.0);
        ret
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name)?.last().map(|global| global.value)
    }

    pub fn number(&self, name: &str) -> Option<Number> {
        match self.get(name)? {
            Value::Number(val) => Some(val),
            Value::Point(_) => None,
        }
    }

    pub fn point(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            Value::Point(p) => Some(p),
            Value::Number(_) => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    fn owned_by(&self, owner: FieldId) -> Vec<String> {
        self.vars
            .iter()
            .filter(|(_, bindings)| bindings.iter().any(|g| g.owner == Some(owner)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Runs `update` and reports which of `names` now look different.
    fn watch(&mut self, names: Vec<String>, update: impl FnOnce(&mut Self)) -> Vec<String> {
        let before: Vec<Option<Value>> = names.iter().map(|name| self.get(name)).collect();
        update(self);
        names
            .into_iter()
            .zip(before)
            .filter(|(name, prev)| self.get(name) != *prev)
            .map(|(name, _)| name)
            .collect()
    }

    fn drop_owner(&mut self, owner: FieldId, keep: Option<&str>) {
        self.vars.retain(|name, bindings| {
            if keep != Some(name.as_str()) {
                bindings.retain(|g| g.owner != Some(owner));
            }
            !bindings.is_empty()
        });
    }

    /// Binds `name` on behalf of `owner`, replacing anything else the owner
    /// had bound. Returns every name whose visible value changed.
    pub fn set(&mut self, owner: FieldId, name: &str, value: Value) -> Vec<String> {
        let mut names = self.owned_by(owner);
        if !names.iter().any(|old| old == name) {
            names.push(name.to_string());
        }
        self.watch(names, |scope| {
            scope.drop_owner(owner, Some(name));
            let bindings = scope.vars.entry(name.to_string()).or_default();
            // re-binding keeps the owner's place among the others
            match bindings.iter_mut().find(|g| g.owner == Some(owner)) {
                Some(global) => global.value = value,
                None => bindings.push(Global {
                    owner: Some(owner),
                    value,
                }),
            }
        })
    }

    /// Drops every binding made by `owner`, returning the names whose
    /// visible value changed.
    pub fn unset(&mut self, owner: FieldId) -> Vec<String> {
        let names = self.owned_by(owner);
        self.watch(names, |scope| scope.drop_owner(owner, None))
    }

    pub fn set_clock(&mut self, t: Number) {
        self.vars.insert(
            stdlib::T.to_string(),
            vec![Global {
                owner: None,
                value: Value::Number(t),
            }],
        );
    }

    pub fn clock(&self) -> Number {
        self.number(stdlib::T).unwrap_or(0.0)
    }
}

/// The flat lookup table one statement is evaluated against.
///
/// Built fresh for each plot pass: every free variable starts undefined, is
/// overridden by its global value if there is one, and the swept axes
/// override both.
#[derive(Debug)]
pub struct Binding<'a> {
    stdlib: &'a Idents,
    vars: HashMap<&'a str, Option<Number>>,
    axes: [Option<Number>; 3],
    // function parameters standing for an axis
    aliases: Vec<(&'a str, Axis)>,
}

impl<'a> Binding<'a> {
    pub fn new(stdlib: &'a Idents, globals: &GlobalScope, free: &'a BTreeSet<String>) -> Self {
        let vars = free
            .iter()
            .map(|name| (name.as_str(), globals.number(name)))
            .collect();
        Self {
            stdlib,
            vars,
            axes: [None; 3],
            aliases: Vec::new(),
        }
    }

    /// Makes `name` read the value swept along `axis`.
    pub fn alias(&mut self, name: &'a str, axis: Axis) {
        self.aliases.push((name, axis));
    }

    #[inline]
    pub fn bind(&mut self, axis: Axis, val: Number) {
        self.axes[axis.index()] = Some(val);
    }
}

impl Env for Binding<'_> {
    fn lookup(&self, name: &str) -> Option<Ident> {
        if let Some(&(_, axis)) = self.aliases.iter().find(|(alias, _)| *alias == name) {
            return Some(Ident::Var(self.axes[axis.index()]));
        }
        if let Some(val) = Axis::from_name(name).and_then(|axis| self.axes[axis.index()]) {
            return Some(Ident::Var(Some(val)));
        }
        if let Some(val) = self.vars.get(name) {
            return Some(Ident::Var(*val));
        }
        self.stdlib.lookup(name)
    }
}
