// SPDX: CC0-1.0

//! What a field shows after its text is applied.

use crate::scope::Value;
use core::fmt;

/// Names less similar than this aren't worth suggesting.
const SIMILARITY_THRESHOLD: f64 = 0.3;

/// The echoed statement, with its value when it has one.
pub fn value_line(src: &str, value: Option<Value>) -> String {
    match value {
        Some(Value::Number(val)) => format!("{src} = {val}"),
        Some(Value::Point(p)) => format!("{src} = {p}"),
        None => src.to_string(),
    }
}

/// The statement followed by the reason it was rejected.
pub fn error_line(src: &str, err: impl fmt::Display) -> String {
    if src.is_empty() {
        err.to_string()
    } else {
        format!("{src} ({err})")
    }
}

/// The known name closest to `name`, if any is close enough.
///
/// Comparison ignores case; ties go to the alphabetically first name.
pub fn similar_name<'a, T>(
    name: &str,
    known: impl IntoIterator<Item = (&'a str, T)>,
) -> Option<(&'a str, T)> {
    let name = name.to_ascii_lowercase();
    known
        .into_iter()
        .filter(|(other, _)| !other.eq_ignore_ascii_case(&name))
        .map(|(other, kind)| {
            let sim = strsim::normalized_damerau_levenshtein(&name, &other.to_ascii_lowercase());
            (sim, other, kind)
        })
        .filter(|(sim, _, _)| *sim > SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, other, kind)| (other, kind))
}
