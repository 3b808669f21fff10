//! Print palette used when capturing report pages.
//!
//! Page markup refers to theme colours as `var(--token)`. The rasterizer
//! only understands static colours, so every token in a colour attribute is
//! substituted with a hex value before mounting.

use crate::error::ExportError;
use std::collections::BTreeMap;

/// Attributes whose values may hold theme tokens.
const COLOR_ATTRIBUTES: [&str; 5] = ["fill", "stroke", "stop-color", "flood-color", "color"];

/// Colour functions the rasterizer cannot evaluate.
const UNSUPPORTED_FUNCTIONS: [&str; 4] = ["oklch(", "oklab(", "color-mix(", "lch("];

/// Static values for every theme token a report page may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintTheme {
    vars: BTreeMap<String, String>,
}

impl Default for PrintTheme {
    fn default() -> Self {
        let vars = [
            ("--background", "#ffffff"),
            ("--foreground", "#0f172a"),
            ("--card", "#ffffff"),
            ("--card-foreground", "#0f172a"),
            ("--popover", "#ffffff"),
            ("--popover-foreground", "#0f172a"),
            ("--primary", "#3b82f6"),
            ("--primary-foreground", "#ffffff"),
            ("--secondary", "#f3f4f6"),
            ("--secondary-foreground", "#1f2937"),
            ("--muted", "#f3f4f6"),
            ("--muted-foreground", "#6b7280"),
            ("--accent", "#f3f4f6"),
            ("--accent-foreground", "#1f2937"),
            ("--destructive", "#ef4444"),
            ("--border", "#e5e7eb"),
            ("--input", "#e5e7eb"),
            ("--ring", "#3b82f6"),
            ("--chart-1", "#3b82f6"),
            ("--chart-2", "#10b981"),
            ("--chart-3", "#f59e0b"),
            ("--chart-4", "#ef4444"),
            ("--chart-5", "#8b5cf6"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { vars }
    }
}

impl PrintTheme {
    /// Static value of `token` (including the leading `--`).
    pub fn get(&self, token: &str) -> Option<&str> {
        self.vars.get(token).map(String::as_str)
    }

    /// Replaces every `var(--token)` in the colour attributes of `markup`
    /// with its static value.
    ///
    /// Only the values of [`COLOR_ATTRIBUTES`] are inspected. Text content
    /// and other attributes pass through unchanged, so escaped user data
    /// that happens to look like a colour expression is left alone.
    ///
    /// # Errors
    ///
    /// [`ExportError::UnresolvedColor`] for a token missing from the palette,
    /// [`ExportError::UnsupportedColorFunction`] if a colour attribute still
    /// holds a function the rasterizer cannot evaluate after substitution.
    pub fn resolve(&self, markup: &str) -> Result<String, ExportError> {
        let mut out = String::with_capacity(markup.len());
        let mut rest = markup;
        while let Some(eq) = rest.find("=\"") {
            let (head, tail) = rest.split_at(eq + 2);
            out.push_str(head);
            let Some(close) = tail.find('"') else {
                rest = tail;
                break;
            };
            let value = &tail[..close];
            if COLOR_ATTRIBUTES.contains(&attribute_name(&head[..eq])) {
                out.push_str(&self.resolve_value(value)?);
            } else {
                out.push_str(value);
            }
            out.push('"');
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn resolve_value(&self, value: &str) -> Result<String, ExportError> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("var(--") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 4..];
            let end = after.find(')').ok_or_else(|| ExportError::UnresolvedColor {
                token: after.chars().take(32).collect(),
            })?;
            // `var(--token, fallback)` uses the fallback only for unknown tokens.
            let (token, fallback) = match after[..end].split_once(',') {
                Some((t, f)) => (t.trim(), Some(f.trim())),
                None => (after[..end].trim(), None),
            };
            match (self.get(token), fallback) {
                (Some(value), _) => out.push_str(value),
                (None, Some(fallback)) if !fallback.is_empty() => out.push_str(fallback),
                _ => return Err(ExportError::UnresolvedColor { token: token.to_string() }),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        let lowered = out.to_ascii_lowercase();
        if let Some(func) = UNSUPPORTED_FUNCTIONS.iter().find(|f| lowered.contains(*f)) {
            return Err(ExportError::UnsupportedColorFunction(func.trim_end_matches('(').to_string()));
        }
        Ok(out)
    }
}

/// Name of the attribute whose `="` opens right after `before`.
fn attribute_name(before: &str) -> &str {
    before.rsplit(char::is_whitespace).next().unwrap_or(before)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_resolve_to_hex() {
        let theme = PrintTheme::default();
        let out = theme
            .resolve(r#"<rect fill="var(--chart-2)" stroke="var(--border)"/>"#)
            .unwrap();
        assert_eq!(out, r##"<rect fill="#10b981" stroke="#e5e7eb"/>"##);
    }

    #[test]
    fn unknown_token_is_an_error() {
        let err = PrintTheme::default().resolve("fill=\"var(--sidebar-x)\"").unwrap_err();
        assert!(matches!(err, ExportError::UnresolvedColor { ref token } if token == "--sidebar-x"));
    }

    #[test]
    fn fallback_is_used_for_unknown_tokens() {
        let out = PrintTheme::default().resolve(r#"<rect fill="var(--nope, #123456)"/>"#).unwrap();
        assert_eq!(out, r##"<rect fill="#123456"/>"##);
    }

    #[test]
    fn modern_colour_functions_are_rejected() {
        let err = PrintTheme::default()
            .resolve(r#"<path stroke="oklch(0.6 0.2 250)"/>"#)
            .unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedColorFunction(ref f) if f == "oklch"));
    }

    #[test]
    fn text_content_is_never_resolved() {
        let svg = r#"<text fill="var(--foreground)">Tip: set color: var(--brand) or color-mix(design)</text>"#;
        let out = PrintTheme::default().resolve(svg).unwrap();
        assert_eq!(
            out,
            r##"<text fill="#0f172a">Tip: set color: var(--brand) or color-mix(design)</text>"##
        );
    }

    #[test]
    fn only_colour_attributes_are_resolved() {
        let svg = r#"<g data-note="var(--brand)" font-family="lch(x)"><rect fill="var(--card)"/></g>"#;
        let out = PrintTheme::default().resolve(svg).unwrap();
        assert_eq!(out, r##"<g data-note="var(--brand)" font-family="lch(x)"><rect fill="#ffffff"/></g>"##);
    }

    #[test]
    fn markup_without_tokens_is_untouched() {
        let svg = "<svg><text>var is a keyword</text></svg>";
        assert_eq!(PrintTheme::default().resolve(svg).unwrap(), svg);
    }
}
