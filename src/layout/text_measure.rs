//! Text Measurement
//!
//! Label text is measured in character cells and converted to pixels with
//! a fixed cell size. Wide characters (CJK, most emoji) take two cells,
//! control characters none.

/// Width of one character cell in pixels.
pub const CELL_WIDTH: f32 = 8.0;

/// Height of one text line in pixels.
pub const LINE_HEIGHT: f32 = 16.0;

/// Cells occupied by one character.
pub fn char_width(c: char) -> u16 {
    if c.is_ascii() {
        return if c.is_ascii_control() { 0 } else { 1 };
    }

    let code = c as u32;
    if (0x1100..=0x115F).contains(&code)     // Hangul Jamo
        || (0x2E80..=0x9FFF).contains(&code)   // CJK
        || (0xAC00..=0xD7A3).contains(&code)   // Hangul Syllables
        || (0xF900..=0xFAFF).contains(&code)   // CJK Compatibility
        || (0xFE30..=0xFE6F).contains(&code)   // CJK Compatibility Forms
        || (0xFF00..=0xFF60).contains(&code)   // Fullwidth Forms
        || (0x1F300..=0x1F9FF).contains(&code) // Emoji
        || (0x20000..=0x2FFFF).contains(&code) // CJK Extension B-F
    {
        2
    } else {
        1
    }
}

/// Width of the widest line of `s`, in cells.
pub fn string_width(s: &str) -> u16 {
    s.split('\n')
        .map(|line| line.chars().map(char_width).fold(0u16, u16::saturating_add))
        .max()
        .unwrap_or(0)
}

/// Number of lines `text` occupies when wrapped at `available_width` cells.
///
/// Empty text has no lines.
pub fn measure_text_height(text: &str, available_width: u16) -> u16 {
    if text.is_empty() {
        return 0;
    }
    if available_width == 0 {
        return 1;
    }

    let mut lines = 0u16;
    for line in text.split('\n') {
        let mut width = 0u16;
        lines = lines.saturating_add(1);
        for c in line.chars() {
            let cw = char_width(c);
            if width + cw > available_width && width > 0 {
                lines = lines.saturating_add(1);
                width = cw;
            } else {
                width += cw;
            }
        }
    }
    lines
}
