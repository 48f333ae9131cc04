//! Glyph widths of the standard Helvetica faces, used to measure and wrap
//! text before it is placed on a page.

use super::layout::FontFace;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

/// Advance widths for `' '..='~'` in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for characters outside the table, close to an average
/// lowercase accented letter.
const FALLBACK_WIDTH: u16 = 556;

const ELLIPSIS: &str = "...";

fn char_width(face: FontFace, c: char) -> u16 {
    let table = match face {
        FontFace::Regular => &HELVETICA,
        FontFace::Bold => &HELVETICA_BOLD,
    };
    (c as usize)
        .checked_sub(0x20)
        .and_then(|index| table.get(index))
        .copied()
        .unwrap_or(FALLBACK_WIDTH)
}

/// `text` with every character the WinAnsi fonts cannot show replaced by
/// `?`.
///
/// Layout measures and wraps this form, and the writer encodes it, so the
/// page holds exactly what was measured.
pub(crate) fn to_win_ansi(text: &str) -> Cow<'_, str> {
    let (_, _, had_errors) = WINDOWS_1252.encode(text);
    if !had_errors {
        return Cow::Borrowed(text);
    }

    let mut buf = [0u8; 4];
    text.chars()
        .map(|c| {
            let (_, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
            if unmappable { '?' } else { c }
        })
        .collect::<String>()
        .into()
}

/// Width of `text` in points.
pub(crate) fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(face, c))).sum();
    units as f32 * size / 1000.0
}

/// Break `text` into lines no wider than `max_width`.
///
/// Words longer than a line are split between characters. Always returns at
/// least one line.
pub(crate) fn wrap(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let text = to_win_ansi(text);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if text_width(&candidate, face, size) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if text_width(word, face, size) <= max_width {
                line = word.to_string();
                continue;
            }

            for c in word.chars() {
                line.push(c);
                if text_width(&line, face, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }
        lines.push(line);
    }

    lines
}

/// `text` shortened with an ellipsis so it fits in `max_width`.
pub(crate) fn truncate(text: &str, face: FontFace, size: f32, max_width: f32) -> String {
    let single_line = to_win_ansi(text).replace('\n', " ");
    if text_width(&single_line, face, size) <= max_width {
        return single_line;
    }

    let mut shortened = String::new();
    for c in single_line.chars() {
        shortened.push(c);
        if text_width(&format!("{shortened}{ELLIPSIS}"), face, size) > max_width {
            shortened.pop();
            break;
        }
    }
    format!("{}{ELLIPSIS}", shortened.trim_end())
}
