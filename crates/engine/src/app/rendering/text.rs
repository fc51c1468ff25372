use crate::geometry::Rect;

use super::raster::Canvas;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 2;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
pub(crate) const LINE_HEIGHT: i32 = GLYPH_HEIGHT * TEXT_SCALE;
const FALLBACK_GLYPH: u16 = 0o71302;

/// Glyphs are 3x5, one octal digit per row, top row first. Lowercase input
/// is drawn with the uppercase shapes.
fn glyph_rows(ch: char) -> Option<u16> {
    let bits = match ch.to_ascii_uppercase() {
        ' ' => 0,
        'A' => 0o25755,
        'B' => 0o65656,
        'C' => 0o74447,
        'D' => 0o65556,
        'E' => 0o74647,
        'F' => 0o74644,
        'G' => 0o74557,
        'H' => 0o55755,
        'I' => 0o72227,
        'J' => 0o71157,
        'K' => 0o55655,
        'L' => 0o44447,
        'M' => 0o57755,
        'N' => 0o57775,
        'O' | '0' => 0o75557,
        'P' => 0o65644,
        'Q' => 0o75571,
        'R' => 0o65655,
        'S' | '5' => 0o74717,
        'T' => 0o72222,
        'U' => 0o55557,
        'V' => 0o55552,
        'W' => 0o55775,
        'X' => 0o55255,
        'Y' => 0o55222,
        'Z' => 0o71247,
        '1' => 0o26227,
        '2' => 0o71747,
        '3' => 0o71717,
        '4' => 0o55711,
        '6' => 0o74757,
        '7' => 0o71222,
        '8' => 0o75757,
        '9' => 0o75717,
        '!' => 0o22202,
        '"' => 0o55000,
        '\'' => 0o22000,
        '.' => 0o00002,
        ',' => 0o00024,
        ':' => 0o02020,
        '?' => FALLBACK_GLYPH,
        '-' => 0o00700,
        '(' => 0o12221,
        ')' => 0o42224,
        '/' => 0o11244,
        '<' => 0o12421,
        '>' => 0o42124,
        '^' => 0o25000,
        _ => return None,
    };
    Some(bits)
}

pub(crate) fn text_width(text: &str) -> i32 {
    (text.chars().count() as i32).saturating_mul(GLYPH_ADVANCE)
}

pub(crate) fn draw_text(canvas: &mut Canvas<'_>, mut x: i32, y: i32, text: &str, color: [u8; 4]) {
    for ch in text.chars() {
        let rows = glyph_rows(ch).unwrap_or(FALLBACK_GLYPH);
        draw_glyph(canvas, x, y, rows, color);
        x = x.saturating_add(GLYPH_ADVANCE);
    }
}

fn draw_glyph(canvas: &mut Canvas<'_>, x: i32, y: i32, rows: u16, color: [u8; 4]) {
    for row in 0..GLYPH_HEIGHT {
        let row_bits = (rows >> (3 * (GLYPH_HEIGHT - 1 - row))) & 0o7;
        for col in 0..GLYPH_WIDTH {
            if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            canvas.fill_rect(
                Rect::square(
                    x.saturating_add(col * TEXT_SCALE),
                    y.saturating_add(row * TEXT_SCALE),
                    TEXT_SCALE as u32,
                ),
                color,
            );
        }
    }
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line_len == 0 {
                word.len()
            } else {
                line_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_and_dialog_characters_have_glyphs() {
        for ch in "Press F to show \"dialog1\" Explore! This is dialog 4's description.".chars() {
            assert!(glyph_rows(ch).is_some(), "missing glyph for {ch:?}");
        }
    }

    #[test]
    fn unknown_characters_draw_the_fallback() {
        assert_eq!(glyph_rows('é'), None);
        let mut frame = vec![0u8; 16 * 16 * 4];
        let mut canvas = Canvas::new(&mut frame, 16, 16);
        draw_text(&mut canvas, 0, 0, "é", [255; 4]);
        assert!(frame.iter().any(|byte| *byte != 0));
    }

    #[test]
    fn space_draws_nothing() {
        let mut frame = vec![0u8; 16 * 16 * 4];
        let mut canvas = Canvas::new(&mut frame, 16, 16);
        draw_text(&mut canvas, 0, 0, "  ", [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn clipped_text_is_safe() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        draw_text(&mut canvas, -5, -5, "HELLO", [255; 4]);
        draw_text(&mut canvas, i32::MAX - 3, i32::MAX - 3, "HELLO", [255; 4]);
    }

    #[test]
    fn glyph_rows_read_top_to_bottom() {
        // 'L' is a vertical bar with a full bottom row.
        let mut frame = vec![0u8; 6 * 10 * 4];
        let mut canvas = Canvas::new(&mut frame, 6, 10);
        draw_text(&mut canvas, 0, 0, "L", [255; 4]);
        let lit = |x: usize, y: usize| frame[(y * 6 + x) * 4] != 0;
        assert!(lit(0, 0));
        assert!(!lit(5, 0));
        assert!(lit(5, 9));
    }

    #[test]
    fn width_follows_advance() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("abc"), 3 * GLYPH_ADVANCE);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("This is dialog 1's description.", 14),
            vec!["This is dialog", "1's", "description."]
        );
    }

    #[test]
    fn wrap_splits_overlong_words_and_keeps_paragraphs() {
        assert_eq!(
            wrap_text("abcdefgh ij\nk", 3),
            vec!["abc", "def", "gh", "ij", "k"]
        );
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
