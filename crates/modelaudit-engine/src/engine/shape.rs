//! Relative-reference normalization ("formula shapes").
//!
//! Two formulas that were filled across a row differ only by the position of
//! the cell they live in: `=B5*C3` in column D and `=C5*D3` in column E are the
//! same calculation. Rewriting every A1 reference as an offset from its own
//! cell makes them compare equal:
//!
//! - **Shape**: `=B5*$C$3` at D5 becomes `=RC[-2]*R3C3`, `=SUM(C:C)` becomes `=SUM(C[-1]:C[-1])`
//! - **Render**: the inverse, placing a shape at a given cell to get A1 text back
//!
//! String literals (`"..."`) and quoted sheet names (`'...'`) are never rewritten.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;

/// Columns past `XFD` and rows past 1,048,576 are names, not references.
const MAX_COLS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;

fn a1_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?<cell>(?<cd>\$?)(?<cl>[A-Za-z]{1,3})(?<rd>\$?)(?<rn>[0-9]+))",
            r"|(?<cols>(?<c1d>\$?)(?<c1>[A-Za-z]{1,3}):(?<c2d>\$?)(?<c2>[A-Za-z]{1,3}))",
            r"|(?<rows>(?<r1d>\$?)(?<r1>[0-9]+):(?<r2d>\$?)(?<r2>[0-9]+))",
        ))
        .expect("A1 token regex must compile")
    })
}

fn r1c1_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?<cell>R(?<cr>\[-?[0-9]+\]|[0-9]+)?C(?<cc>\[-?[0-9]+\]|[0-9]+)?)",
            r"|(?<rows>R(?<r1>\[-?[0-9]+\]|[0-9]+)?:R(?<r2>\[-?[0-9]+\]|[0-9]+)?)",
            r"|(?<cols>C(?<c1>\[-?[0-9]+\]|[0-9]+)?:C(?<c2>\[-?[0-9]+\]|[0-9]+)?)",
        ))
        .expect("R1C1 token regex must compile")
    })
}

fn anchored(caps: &Captures, name: &str) -> bool {
    caps.name(name).is_some_and(|m| !m.as_str().is_empty())
}

fn a1_col(caps: &Captures, name: &str) -> Option<usize> {
    CellRef::letters_to_col(caps.name(name)?.as_str()).filter(|c| *c < MAX_COLS)
}

fn a1_row(caps: &Captures, name: &str) -> Option<usize> {
    caps.name(name)?
        .as_str()
        .parse::<usize>()
        .ok()?
        .checked_sub(1)
        .filter(|r| *r < MAX_ROWS)
}

/// Rewrite a formula's A1 references relative to the cell at (row, col), 0-based.
///
/// Whole-column (`B:B`) and whole-row (`5:5`) ranges become `C[dc]:C[dc]`
/// and `R[dr]:R[dr]` the same way cell references do.
pub fn formula_shape(formula: &str, row: usize, col: usize) -> String {
    map_outside_literals(formula, |seg| {
        replace_bounded(seg, a1_token_re(), |caps| {
            if caps.name("cell").is_some() {
                let ref_col = a1_col(caps, "cl")?;
                let ref_row = a1_row(caps, "rn")?;
                return Some(format!(
                    "{}{}",
                    r1c1_part('R', ref_row, row, anchored(caps, "rd")),
                    r1c1_part('C', ref_col, col, anchored(caps, "cd"))
                ));
            }
            if caps.name("cols").is_some() {
                let first = a1_col(caps, "c1")?;
                let last = a1_col(caps, "c2")?;
                return Some(format!(
                    "{}:{}",
                    r1c1_part('C', first, col, anchored(caps, "c1d")),
                    r1c1_part('C', last, col, anchored(caps, "c2d"))
                ));
            }
            let first = a1_row(caps, "r1")?;
            let last = a1_row(caps, "r2")?;
            Some(format!(
                "{}:{}",
                r1c1_part('R', first, row, anchored(caps, "r1d")),
                r1c1_part('R', last, row, anchored(caps, "r2d"))
            ))
        })
    })
}

fn part<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

fn render_col((c, absolute): (usize, bool)) -> String {
    format!("{}{}", if absolute { "$" } else { "" }, CellRef::col_to_letters(c))
}

fn render_row((r, absolute): (usize, bool)) -> String {
    format!("{}{}", if absolute { "$" } else { "" }, r + 1)
}

/// Place a shape at the cell (row, col), 0-based, producing A1 formula text.
/// References that land before the first row or column render as `#REF!`.
pub fn render_shape(shape: &str, row: usize, col: usize) -> String {
    map_outside_literals(shape, |seg| {
        replace_bounded(seg, r1c1_token_re(), |caps| {
            let rendered = if caps.name("cell").is_some() {
                resolve_part(part(caps, "cr"), row)
                    .zip(resolve_part(part(caps, "cc"), col))
                    .map(|(r, c)| format!("{}{}", render_col(c), render_row(r)))
            } else if caps.name("rows").is_some() {
                resolve_part(part(caps, "r1"), row)
                    .zip(resolve_part(part(caps, "r2"), row))
                    .map(|(a, b)| format!("{}:{}", render_row(a), render_row(b)))
            } else {
                resolve_part(part(caps, "c1"), col)
                    .zip(resolve_part(part(caps, "c2"), col))
                    .map(|(a, b)| format!("{}:{}", render_col(a), render_col(b)))
            };
            Some(rendered.unwrap_or_else(|| "#REF!".to_string()))
        })
    })
}

fn r1c1_part(axis: char, target: usize, anchor: usize, absolute: bool) -> String {
    if absolute {
        return format!("{}{}", axis, target + 1);
    }
    let delta = target as i64 - anchor as i64;
    if delta == 0 {
        axis.to_string()
    } else {
        format!("{}[{}]", axis, delta)
    }
}

/// Resolve one R1C1 part against an anchor. Returns the 0-based index and
/// whether it was absolute, or None when it falls off the grid.
fn resolve_part(part: Option<&str>, anchor: usize) -> Option<(usize, bool)> {
    match part {
        None => Some((anchor, false)),
        Some(p) if p.starts_with('[') => {
            let delta: i64 = p.trim_start_matches('[').trim_end_matches(']').parse().ok()?;
            let idx = anchor as i64 + delta;
            (idx >= 0).then_some((idx as usize, false))
        }
        Some(p) => {
            let n: usize = p.parse().ok()?;
            Some((n.checked_sub(1)?, true))
        }
    }
}

/// Replace regex matches that stand alone as references: not glued to a
/// preceding identifier and not a function name like `LOG10(`.
/// Matches where `replace` returns None are kept verbatim.
fn replace_bounded<F>(seg: &str, re: &Regex, mut replace: F) -> String
where
    F: FnMut(&Captures) -> Option<String>,
{
    let bytes = seg.as_bytes();
    let mut out = String::with_capacity(seg.len() + 8);
    let mut last = 0usize;

    for caps in re.captures_iter(seg) {
        let Some(m) = caps.get(0) else { continue };
        let before_ok = m.start() == 0 || !is_ident_byte(bytes[m.start() - 1], true);
        let after_ok = m.end() == bytes.len()
            || (!is_ident_byte(bytes[m.end()], false) && bytes[m.end()] != b'(');
        if !before_ok || !after_ok {
            continue;
        }
        if let Some(replacement) = replace(&caps) {
            out.push_str(&seg[last..m.start()]);
            out.push_str(&replacement);
            last = m.end();
        }
    }

    out.push_str(&seg[last..]);
    out
}

fn is_ident_byte(b: u8, leading: bool) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || (leading && (b == b'.' || b == b'$'))
}

/// Apply `f` to every part of `text` outside `"..."` strings and `'...'` sheet names.
/// Doubled quotes inside a literal toggle out and straight back in, so they need no special case.
fn map_outside_literals<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut seg_start = 0usize;
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => {
                out.push_str(&text[seg_start..=i]);
                quote = None;
                seg_start = i + 1;
            }
            Some(_) => {}
            None if b == b'"' || b == b'\'' => {
                out.push_str(&f(&text[seg_start..i]));
                quote = Some(b);
                seg_start = i;
            }
            None => {}
        }
    }

    if seg_start < text.len() {
        if quote.is_some() {
            out.push_str(&text[seg_start..]);
        } else {
            out.push_str(&f(&text[seg_start..]));
        }
    }

    out
}
