//! Keyword normalisation.
//!
//! Authors type keywords freely, so "Robustness", "robustness!" and
//! "robustness " must land in the same treemap group. The normalised form is
//! the group key.

/// Characters removed from keywords before grouping.
pub const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`',
    '~', '(', ')',
];

/// Whitespace for run collapsing: the ECMAScript `\s` class. It differs from
/// [`char::is_whitespace`] in two code points: U+FEFF counts here, U+0085
/// does not.
pub fn is_keyword_space(c: char) -> bool {
    match c {
        '\u{feff}' => true,
        '\u{85}' => false,
        other => other.is_whitespace(),
    }
}

/// Normalise a raw keyword into its group key.
///
/// Lowercases, strips [`STRIPPED_PUNCTUATION`], then collapses every run of two
/// or more [`is_keyword_space`] characters into a single space. A lone whitespace
/// character is kept as is and nothing is trimmed. The function is pure and
/// idempotent.
pub fn normalize_keyword(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_ws: Option<char> = None;
    let mut run = 0usize;

    let flush = |out: &mut String, pending: &mut Option<char>, run: &mut usize| {
        match (*run, pending.take()) {
            (0, _) | (_, None) => {}
            (1, Some(c)) => out.push(c),
            _ => out.push(' '),
        }
        *run = 0;
    };

    for c in raw.chars().flat_map(char::to_lowercase) {
        if STRIPPED_PUNCTUATION.contains(&c) {
            continue;
        }
        if is_keyword_space(c) {
            if run == 0 {
                pending_ws = Some(c);
            }
            run += 1;
        } else {
            flush(&mut out, &mut pending_ws, &mut run);
            out.push(c);
        }
    }
    flush(&mut out, &mut pending_ws, &mut run);

    out
}
