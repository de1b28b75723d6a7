//! Compile flag normalization.
//!
//! Language standard selections and position-independence flags are not
//! passed through as raw compiler arguments; they become override options and
//! a boolean target property instead.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::convert::language::Language;

static STD_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:-{1,2}std=|/std:v?)(.*)$").expect("standard flag pattern is valid")
});

const PIC_FLAGS: [&str; 4] = ["-fPIC", "-fpic", "-fPIE", "-fpie"];

/// Flags hoisted out of a compile argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFlags {
    /// Remaining compiler arguments, order preserved.
    pub args: Vec<String>,
    /// `<lang>_std=<value>` entries.
    pub override_options: Vec<String>,
    /// Whether a PIC/PIE flag was present.
    pub position_independent: bool,
}

/// The standard selected by `flag`, if it is a `-std=`, `--std=` or `/std:` flag.
pub fn standard_value(flag: &str) -> Option<&str> {
    STD_FLAG
        .captures(flag)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn is_pic_flag(flag: &str) -> bool {
    PIC_FLAGS.contains(&flag)
}

/// Split standard and PIC flags off `args` for `lang`.
///
/// Languages without a standard flag are returned untouched.
pub fn extract_flags(lang: Language, args: &[String]) -> ExtractedFlags {
    let mut out = ExtractedFlags::default();

    if !lang.has_standard_flag() {
        out.args = args.to_vec();
        return out;
    }

    for arg in args {
        if let Some(std) = standard_value(arg) {
            out.override_options.push(format!("{}_std={}", lang, std));
        } else if is_pic_flag(arg) {
            out.position_independent = true;
        } else {
            out.args.push(arg.clone());
        }
    }

    out
}

/// Append `items` to `list`, skipping entries already present.
pub fn extend_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

/// Merge `items` into an order-preserving set.
pub fn extend_set(set: &mut IndexSet<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        set.insert(item);
    }
}
