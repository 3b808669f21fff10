//! Small SVG string-building helpers shared by the charts and the report pages.

use std::fmt::Write as _;

/// Average glyph advance as a fraction of the font size, used to estimate
/// text widths without a font database.
const AVG_CHAR_ADVANCE: f32 = 0.55;

/// Horizontal alignment of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Text starts at the anchor point
    Start,
    /// Text is centred on the anchor point
    Middle,
    /// Text ends at the anchor point
    End,
}

impl Anchor {
    fn as_attr(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Styling of a text run.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    /// Font size in pixels
    pub size: f32,
    /// Font weight, 400 is regular
    pub weight: u16,
    /// Fill colour or theme token
    pub fill: &'a str,
    /// Horizontal alignment
    pub anchor: Anchor,
}

impl<'a> TextStyle<'a> {
    /// Regular weight, left aligned.
    pub fn new(size: f32, fill: &'a str) -> Self {
        Self { size, weight: 400, fill, anchor: Anchor::Start }
    }

    /// Sets the font weight.
    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the horizontal alignment.
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Escapes the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

/// Estimated rendered width of `text` at `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_CHAR_ADVANCE
}

/// Greedy word wrap against an estimated width budget.
///
/// A single word wider than `max_width` is placed on a line by itself.
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

/// Shortens `text` with an ellipsis so it fits `max_width`.
pub fn truncate_to_width(text: &str, size: f32, max_width: f32) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }
    let budget = ((max_width / (size * AVG_CHAR_ADVANCE)).floor() as usize).saturating_sub(1);
    let mut out: String = text.chars().take(budget).collect();
    out.push('…');
    out
}

/// Opens an `<svg>` root of the given size.
pub fn open(out: &mut String, width: f32, height: f32) {
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">",
        w = width,
        h = height
    );
}

/// Closes the `<svg>` root.
pub fn close(out: &mut String) {
    let _ = writeln!(out, "</svg>");
}

/// Single-line text run; content is escaped here.
pub fn text(out: &mut String, x: f32, y: f32, style: TextStyle<'_>, content: &str) {
    let _ = writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{}\">{}</text>",
        x,
        y,
        style.size,
        style.weight,
        style.fill,
        style.anchor.as_attr(),
        escape_xml(content)
    );
}

/// Wrapped paragraph starting with its first baseline at `y`.
/// Returns the baseline a following line would use.
pub fn paragraph(
    out: &mut String,
    x: f32,
    y: f32,
    max_width: f32,
    line_height: f32,
    style: TextStyle<'_>,
    content: &str,
) -> f32 {
    let lines = wrap_text(content, style.size, max_width);
    let mut baseline = y;
    for line in &lines {
        text(out, x, baseline, style, line);
        baseline += line_height;
    }
    baseline
}

/// Filled rectangle with optional stroke and corner radius.
pub fn rect(
    out: &mut String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fill: &str,
    stroke: Option<&str>,
    radius: f32,
) {
    let stroke_attr = match stroke {
        Some(color) => format!(" stroke=\"{color}\" stroke-width=\"1\""),
        None => String::new(),
    };
    let _ = writeln!(
        out,
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\"{} />",
        x,
        y,
        width.max(0.0),
        height.max(0.0),
        fill,
        stroke_attr,
        r = radius
    );
}

/// Straight one pixel line, optionally dashed.
pub fn line(out: &mut String, x1: f32, y1: f32, x2: f32, y2: f32, stroke: &str, dashed: bool) {
    let dash = if dashed { " stroke-dasharray=\"3 3\"" } else { "" };
    let _ = writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"{} />",
        x1, y1, x2, y2, stroke, dash
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_special_characters_are_escaped() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn wrapping_respects_the_width_budget() {
        let lines = wrap_text("one two three four five six", 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 60.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), "one two three four five six");
    }

    #[test]
    fn long_words_get_their_own_line() {
        let lines = wrap_text("supercalifragilistic ok", 10.0, 30.0);
        assert_eq!(lines, vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn truncation_adds_an_ellipsis() {
        let short = truncate_to_width("Price", 10.0, 100.0);
        assert_eq!(short, "Price");
        let cut = truncate_to_width("A very long category name", 10.0, 40.0);
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() < "A very long category name".chars().count());
    }
}
