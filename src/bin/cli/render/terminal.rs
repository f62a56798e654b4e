/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// `score/total (pct%)`
pub fn score_line(score: u32, total: u32) -> String {
    let pct = if total == 0 {
        0
    } else {
        (u64::from(score) * 100 / u64::from(total)) as u32
    };
    format!("{}/{} ({}%)", score, total, pct)
}

/// Truncate `text` to `width` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}\u{2026}", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_line() {
        assert_eq!(score_line(3, 4), "3/4 (75%)");
        assert_eq!(score_line(0, 0), "0/0 (0%)");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Đúng", 10), "Đúng");
        assert_eq!(truncate("abcdefgh", 4), "abc\u{2026}");
    }

    #[test]
    fn test_paint() {
        assert_eq!(paint("x", Color::RED, false), "x");
        assert_eq!(paint("x", Color::RED, true), "\x1b[31mx\x1b[0m");
    }
}
