//! Helvetica metrics for the attribution line
//!
//! The stamp uses the standard Type1 Helvetica font with WinAnsiEncoding,
//! so text is encoded as single bytes and measured with the AFM advance
//! widths (thousandths of the font size).

/// Rendered for characters outside the Latin-1 range
const REPLACEMENT: u8 = b'?';

/// Appended when a line is cut to fit
pub const ELLIPSIS: &str = "...";

/// Width assumed for bytes above 0x7E, close to the Helvetica average
const DEFAULT_WIDTH: u16 = 556;

/// Advance widths for 0x20..=0x7E
#[rustfmt::skip]
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

/// Map one character to its WinAnsi byte
fn encode_char(c: char) -> u8 {
    match c as u32 {
        code @ 0x20..=0x7E => code as u8,
        code @ 0xA0..=0xFF => code as u8,
        _ => REPLACEMENT,
    }
}

fn byte_width(b: u8) -> u16 {
    match b {
        0x20..=0x7E => ASCII_WIDTHS[(b - 0x20) as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// Encode text for a `Tj` operand
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// Rendered width of `text` at `font_size`, in points
pub fn text_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| u32::from(byte_width(encode_char(c))))
        .sum();
    f64::from(units) * font_size / 1000.0
}

/// Cut `text` so it renders within `max_width`, marking the cut with an ellipsis.
///
/// Returns the text unchanged when it already fits and an empty string when
/// not even the ellipsis fits.
pub fn fit_to_width(text: &str, font_size: f64, max_width: f64) -> String {
    if text_width(text, font_size) <= max_width {
        return text.to_string();
    }

    let room = max_width - text_width(ELLIPSIS, font_size);
    if room < 0.0 {
        return String::new();
    }

    let mut used = 0.0;
    let mut kept = String::new();
    for c in text.chars() {
        let w = f64::from(byte_width(encode_char(c))) * font_size / 1000.0;
        if used + w > room {
            break;
        }
        used += w;
        kept.push(c);
    }
    kept.truncate(kept.trim_end().len());
    kept.push_str(ELLIPSIS);
    kept
}
