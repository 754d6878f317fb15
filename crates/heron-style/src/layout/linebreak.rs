//! Greedy line breaking for proportional text.
//!
//! The break offset is first estimated by linear interpolation over the
//! measured width of the whole remaining run, then pulled back by a small
//! safety margin that grows with the estimate (interpolation error grows
//! with distance in a proportional font), then snapped backward to the
//! nearest break-class character and opportunistically extended forward
//! while the run still fits.

use super::fonts::{FontMetrics, FontSelector};

/// Characters a line may break after.
const BREAK_CLASS: [char; 6] = ['\r', '\n', '\t', '\u{0B}', ' ', '-'];

/// True for characters a line may break after.
#[must_use]
pub fn is_break_char(c: char) -> bool {
    BREAK_CLASS.contains(&c)
}

/// Safety margin in characters subtracted from the interpolated estimate.
///
/// Default policy (any monotonic margin preserving the width invariant is
/// acceptable): 1 char below 33, then 2, 4, and 6 at the 33/99/333
/// thresholds.
const fn safety_margin(estimate: usize) -> usize {
    if estimate >= 333 {
        6
    } else if estimate >= 99 {
        4
    } else if estimate >= 33 {
        2
    } else {
        1
    }
}

/// Find the byte offset at which to split `text` so the head fills but
/// does not exceed `available` width.
///
/// Returns `text.len()` when the whole run fits (or nothing can be
/// split off). The returned offset is never 0 for non-empty input, so
/// callers always make progress.
///
/// Rules, in order:
/// - In preformatted mode an explicit `\r`/`\n` always breaks right
///   after itself, overriding the estimate.
/// - A run that fits is taken whole.
/// - Otherwise the interpolated candidate is searched backward for a
///   break-class character whose head fits, then extended forward while
///   later break points still fit (avoids under-filling the line).
/// - With no fitting break point, the head runs to the first break-class
///   character exclusive: a single unbreakable token, which may
///   overflow.
#[must_use]
pub fn find_break(
    text: &str,
    available: f32,
    font: &FontSelector,
    metrics: &dyn FontMetrics,
    preformatted: bool,
) -> usize {
    if text.is_empty() {
        return 0;
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let offset_after = |i: usize| chars[i].0 + chars[i].1.len_utf8();

    if preformatted {
        if let Some(i) = chars.iter().position(|&(_, c)| c == '\r' || c == '\n') {
            return offset_after(i);
        }
    }

    let full = metrics.line_width(text, font);
    if full <= available {
        return text.len();
    }

    // Candidate offset by linear interpolation, pulled back by the
    // estimation safety margin.
    let count = chars.len();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let estimate = if full > 0.0 {
        ((count as f32) * available / full).floor().max(0.0) as usize
    } else {
        count
    };
    let candidate = estimate
        .saturating_sub(safety_margin(estimate))
        .min(count - 1);

    // Search backward from the candidate for a fitting break point.
    let mut found = None;
    for i in (0..=candidate).rev() {
        if is_break_char(chars[i].1)
            && metrics.line_width(&text[..offset_after(i)], font) <= available
        {
            found = Some(i);
            break;
        }
    }

    if let Some(mut best) = found {
        // Extend forward while the next break point still fits, so the
        // conservative estimate does not under-fill the line.
        let mut probe = best + 1;
        while probe < count {
            if is_break_char(chars[probe].1) {
                if metrics.line_width(&text[..offset_after(probe)], font) <= available {
                    best = probe;
                } else {
                    break;
                }
            }
            probe += 1;
        }
        return offset_after(best);
    }

    // No fitting break point: the head is the first unbreakable token,
    // which is allowed to overflow. Break before the first break-class
    // character so the token stays intact.
    match chars.iter().position(|&(_, c)| is_break_char(c)) {
        Some(0) => offset_after(0),
        Some(k) => chars[k].0,
        None => text.len(),
    }
}
