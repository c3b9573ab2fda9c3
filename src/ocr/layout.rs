//! Reading-order grouping of recognised tokens.

use crate::ocr::TextToken;
use regex::Regex;
use std::sync::OnceLock;

/// Groups tokens into lines, top to bottom, each line left to right.
///
/// A token joins the current line when its vertical center falls inside the
/// line's vertical extent; otherwise it starts a new line.
pub(crate) fn into_lines(mut tokens: Vec<TextToken>) -> Vec<Vec<TextToken>> {
    tokens.sort_by(|a, b| {
        a.bbox
            .center()
            .y
            .total_cmp(&b.bbox.center().y)
            .then_with(|| a.bbox.x.cmp(&b.bbox.x))
    });

    let mut lines: Vec<Vec<TextToken>> = Vec::new();
    let mut band = (0i64, 0i64);
    for token in tokens {
        let cy = token.bbox.center().y;
        let joins = match lines.last() {
            Some(_) => cy >= band.0 as f64 && cy < band.1 as f64,
            None => false,
        };
        if joins {
            band.0 = band.0.min(i64::from(token.bbox.y));
            band.1 = band.1.max(token.bbox.bottom());
            if let Some(line) = lines.last_mut() {
                line.push(token);
            }
        } else {
            let top = i64::from(token.bbox.y);
            band = (top, token.bbox.bottom().max(top + 1));
            lines.push(vec![token]);
        }
    }

    for line in lines.iter_mut() {
        line.sort_by_key(|t| t.bbox.x);
    }
    lines
}

/// Joins lines into plain text: words separated by a space, lines by `\n`.
pub(crate) fn lines_to_text(lines: &[Vec<TextToken>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapses runs of whitespace into single spaces and trims.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("number pattern is valid"))
}

/// Digit runs, keeping inner `.`/`,` separators (`"1,234.50"` stays whole).
pub(crate) fn numeric_runs(text: &str) -> Vec<String> {
    number_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn token(text: &str, x: i32, y: i32, w: u32, h: u32) -> TextToken {
        TextToken {
            text: text.to_string(),
            bbox: BoundingBox::new(x, y, w, h),
            confidence: 90.0,
        }
    }

    #[test]
    fn tokens_are_grouped_top_down_left_right() {
        let tokens = vec![
            token("world", 60, 12, 50, 20),
            token("second", 0, 50, 60, 20),
            token("hello", 0, 10, 50, 22),
            token("line", 70, 49, 40, 21),
        ];
        let lines = into_lines(tokens);
        assert_eq!(lines_to_text(&lines), "hello world\nsecond line");
    }

    #[test]
    fn numeric_runs_keep_separators_inside_numbers() {
        assert_eq!(
            numeric_runs("Total: 1,234.50 EUR, qty 3. ref 007"),
            vec!["1,234.50", "3", "007"]
        );
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("  Sign \n\t in "), "Sign in");
    }
}
