// SPDX: CC0-1.0

use crate::{eval::Program, lex::SubStr, FieldId};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Set,
    Clear,
    List,
    Pan,
    Zoom,
    Mode,
    Tick,
    Window,
    Plot,
    Prog,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Set,
            Self::Clear,
            Self::List,
            Self::Pan,
            Self::Zoom,
            Self::Mode,
            Self::Tick,
            Self::Window,
            Self::Plot,
            Self::Prog,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Set => "set the text of field <n>, or of a new field",
            Self::Clear => "clear field <n>",
            Self::List => "list every field and what it shows",
            Self::Pan => "move the camera across the plane",
            Self::Zoom => "move the camera towards or away from the plane",
            Self::Mode => "switch between 2D and 3D",
            Self::Tick => "advance the clock 't' to now, or to a given time",
            Self::Window => "set camera parameters",
            Self::Plot => "show the current scene in gnuplot",
            Self::Prog => "print programs compiled from field <n> (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Set => "set",
            Self::Clear => "clear",
            Self::List => "list",
            Self::Pan => "pan",
            Self::Zoom => "zoom",
            Self::Mode => "mode",
            Self::Tick => "tick",
            Self::Window => "window",
            Self::Plot => "plot",
            Self::Prog => "prog",
        }
    }

    pub const fn usage(&self) -> &'static str {
        match self {
            Self::Set => " [n]",
            Self::Clear | Self::Prog => " <n>",
            Self::Tick => " [t]",
            _ => "",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

/// Splits a command line into the command word and its argument.
pub fn split_command(line: &str) -> (String, &str) {
    let (cmd, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    (cmd.to_ascii_lowercase(), arg.trim())
}

/// Reads a field number, accepting an optional leading `#`.
pub fn parse_field(arg: &str) -> Result<FieldId, core::num::ParseIntError> {
    arg.strip_prefix('#').unwrap_or(arg).parse().map(FieldId)
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

pub fn field_undefined<W: Write>(mut out: W, field: FieldId) -> io::Result<()> {
    writeln!(out, "error: field {field} is empty")
}
