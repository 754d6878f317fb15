//! Character entity resolution.
//!
//! Decodes named (`&name;`) and numeric (`&#NNN;`, `&#xHH;`) references in
//! text and attribute values. Unresolvable references are left in place and
//! reported as warnings, never errors: the surrounding text still renders.
//!
//! The full HTML entity set defines thousands of names; the table here
//! carries the common ones the dialect encounters in practice. Numeric
//! references are handled algorithmically and cover everything else.

use std::collections::HashMap;
use std::sync::LazyLock;

use heron_common::diagnostics::DiagnosticLog;

/// The named character reference table.
/// Maps entity names (without `&` or `;`) to their replacement strings.
static NAMED_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Markup-significant characters
        ("amp", "&"),
        ("lt", "<"),
        ("gt", ">"),
        ("quot", "\""),
        ("apos", "'"),
        ("nbsp", "\u{00A0}"),
        // Common punctuation and symbols
        ("copy", "\u{00A9}"),   // ©
        ("reg", "\u{00AE}"),    // ®
        ("trade", "\u{2122}"),  // ™
        ("mdash", "\u{2014}"),  // —
        ("ndash", "\u{2013}"),  // –
        ("hellip", "\u{2026}"), // …
        ("bull", "\u{2022}"),   // •
        ("middot", "\u{00B7}"), // ·
        ("lsquo", "\u{2018}"),
        ("rsquo", "\u{2019}"),
        ("ldquo", "\u{201C}"),
        ("rdquo", "\u{201D}"),
        ("laquo", "\u{00AB}"),
        ("raquo", "\u{00BB}"),
        ("sect", "\u{00A7}"),
        ("para", "\u{00B6}"),
        // Currency
        ("cent", "\u{00A2}"),
        ("pound", "\u{00A3}"),
        ("euro", "\u{20AC}"),
        ("yen", "\u{00A5}"),
        // Math symbols
        ("times", "\u{00D7}"),
        ("divide", "\u{00F7}"),
        ("plusmn", "\u{00B1}"),
        ("ne", "\u{2260}"),
        ("le", "\u{2264}"),
        ("ge", "\u{2265}"),
        ("deg", "\u{00B0}"),
        ("frac12", "\u{00BD}"),
        ("frac14", "\u{00BC}"),
        ("frac34", "\u{00BE}"),
        // Arrows
        ("larr", "\u{2190}"),
        ("rarr", "\u{2192}"),
        ("uarr", "\u{2191}"),
        ("darr", "\u{2193}"),
        // Greek letters (commonly used)
        ("alpha", "\u{03B1}"),
        ("beta", "\u{03B2}"),
        ("gamma", "\u{03B3}"),
        ("delta", "\u{03B4}"),
        ("pi", "\u{03C0}"),
        ("sigma", "\u{03C3}"),
        ("omega", "\u{03C9}"),
        // Accented characters (common)
        ("Agrave", "\u{00C0}"),
        ("Aacute", "\u{00C1}"),
        ("Auml", "\u{00C4}"),
        ("agrave", "\u{00E0}"),
        ("aacute", "\u{00E1}"),
        ("auml", "\u{00E4}"),
        ("Eacute", "\u{00C9}"),
        ("egrave", "\u{00E8}"),
        ("eacute", "\u{00E9}"),
        ("iacute", "\u{00ED}"),
        ("oacute", "\u{00F3}"),
        ("ouml", "\u{00F6}"),
        ("uacute", "\u{00FA}"),
        ("uuml", "\u{00FC}"),
        ("ntilde", "\u{00F1}"),
        ("Ntilde", "\u{00D1}"),
        ("ccedil", "\u{00E7}"),
        ("Ccedil", "\u{00C7}"),
        ("szlig", "\u{00DF}"),
    ])
});

/// Entity names that legacy content writes without the trailing semicolon.
const LEGACY_BARE: [&str; 4] = ["amp", "lt", "gt", "quot"];

/// Longest entity name we will attempt to match.
const MAX_NAME_LEN: usize = 32;

/// Look up a named character reference. The `name` excludes `&` and `;`.
#[must_use]
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}

/// Resolve all character references in `input`.
///
/// Unresolvable references are copied through unchanged and recorded as
/// warnings. Bare `&` with no plausible reference after it is plain text
/// and produces no diagnostic.
#[must_use]
pub fn decode_entities(input: &str, log: &mut DiagnosticLog) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let reference = &rest[amp..];
        match decode_one(reference, log) {
            Some((replacement, consumed)) => {
                out.push_str(&replacement);
                rest = &reference[consumed..];
            }
            None => {
                out.push('&');
                rest = &reference[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode a single reference starting at `&`. Returns the replacement and
/// the number of input bytes consumed, or None if this `&` starts no
/// reference at all.
fn decode_one(reference: &str, log: &mut DiagnosticLog) -> Option<(String, usize)> {
    let body = &reference[1..];

    if let Some(numeric) = body.strip_prefix('#') {
        return decode_numeric(numeric, log);
    }

    // Named reference: longest run of alphanumerics after the ampersand.
    let name_len = body
        .char_indices()
        .take_while(|(i, c)| *i < MAX_NAME_LEN && c.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &body[..name_len];
    let terminated = body[name_len..].starts_with(';');

    if terminated {
        if let Some(replacement) = lookup_entity(name) {
            // '&' + name + ';'
            return Some((replacement.to_string(), 1 + name_len + 1));
        }
        log.warning(format!("unresolved entity '&{name};'"));
        return None;
    }

    // Legacy bare forms only; everything else without ';' is plain text.
    if LEGACY_BARE.contains(&name) {
        if let Some(replacement) = lookup_entity(name) {
            return Some((replacement.to_string(), 1 + name_len));
        }
    }
    None
}

/// Decode the digits of a numeric reference (`body` starts after `&#`).
fn decode_numeric(body: &str, log: &mut DiagnosticLog) -> Option<(String, usize)> {
    let (digits, radix, prefix_len) = if body.starts_with('x') || body.starts_with('X') {
        (&body[1..], 16u32, 3) // '&' '#' 'x'
    } else {
        (body, 10u32, 2) // '&' '#'
    };

    let digit_len = digits
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if digit_len == 0 {
        return None;
    }

    let terminated = digits[digit_len..].starts_with(';');
    let consumed = prefix_len + digit_len + usize::from(terminated);

    let Ok(code) = u32::from_str_radix(&digits[..digit_len], radix) else {
        log.warning(format!("numeric entity out of range '&#{digits}'"));
        return None;
    };
    match char::from_u32(code) {
        Some(c) => Some((c.to_string(), consumed)),
        None => {
            log.warning(format!("numeric entity U+{code:04X} is not a character"));
            None
        }
    }
}

/// Escape markup-significant characters so the result survives a parse.
///
/// Inverse of [`decode_entities`] for the three characters that cannot
/// appear literally in prose: `decode(encode(s)) == s`.
#[must_use]
pub fn encode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
