//! CSV serialization of comments and category aggregates.
//!
//! Output is UTF-8 with a leading byte-order mark (so spreadsheet tools pick
//! the right encoding), `\n` line separators and no trailing newline.

use crate::types::{CategoryStat, CommentRecord};

const BOM: char = '\u{feff}';

/// Columns of the comments export.
pub const COMMENT_COLUMNS: [&str; 7] = [
    "comment_id",
    "created_time",
    "sentiment",
    "sentiment_conf",
    "category",
    "category_conf",
    "text",
];

/// Columns of the categories export.
pub const CATEGORY_COLUMNS: [&str; 5] = [
    "category",
    "total_comments",
    "positive_comments",
    "neutral_comments",
    "negative_comments",
];

/// Quotes a field when it contains a comma, quote, CR or LF, doubling any
/// embedded quotes. Everything else is emitted verbatim.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializes a header and rows into BOM-prefixed CSV text.
pub fn serialize<H, R, F>(header: &[H], rows: R) -> String
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<F>>,
    F: AsRef<str>,
{
    let mut lines = vec![join_row(header)];
    lines.extend(rows.into_iter().map(|row| join_row(&row)));

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\n"));
    out
}

fn join_row<F: AsRef<str>>(fields: &[F]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// One row per comment; confidences are printed with four decimals.
pub fn comments_csv(comments: &[CommentRecord]) -> String {
    let rows = comments.iter().map(|c| {
        vec![
            c.comment_id.clone(),
            c.created_time.clone().unwrap_or_default(),
            c.sentiment.clone(),
            format_confidence(c.sentiment_conf),
            c.category.clone(),
            format_confidence(c.category_conf),
            c.text.clone(),
        ]
    });
    serialize(&COMMENT_COLUMNS, rows)
}

/// One row per category aggregate.
pub fn categories_csv(stats: &[CategoryStat]) -> String {
    let rows = stats.iter().map(|s| {
        vec![
            s.category.clone(),
            s.total_comments.to_string(),
            s.positive_comments.to_string(),
            s.neutral_comments.to_string(),
            s.negative_comments.to_string(),
        ]
    });
    serialize(&CATEGORY_COLUMNS, rows)
}

fn format_confidence(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal RFC 4180 reader, enough to check what `serialize` writes.
    fn parse(text: &str) -> Vec<Vec<String>> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut rows = vec![];
        let mut row = vec![];
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match (in_quotes, ch) {
                (true, '"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                (true, '"') => in_quotes = false,
                (true, c) => field.push(c),
                (false, '"') => in_quotes = true,
                (false, ',') => row.push(std::mem::take(&mut field)),
                (false, '\n') => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                (false, c) => field.push(c),
            }
        }
        row.push(field);
        rows.push(row);
        rows
    }

    #[test]
    fn escaping_only_touches_special_fields() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field(""), "");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\r\nbreak"), "\"line\r\nbreak\"");
    }

    #[test]
    fn tricky_text_survives_a_round_trip() {
        let text = "Great, but \"pricey\"\nwould buy again";
        let csv = comments_csv(&[CommentRecord {
            comment_id: "c1".into(),
            text: text.into(),
            sentiment: "positive".into(),
            sentiment_conf: 0.9,
            category: "Price".into(),
            category_conf: 0.123456,
            created_time: None,
        }]);

        assert!(csv.starts_with('\u{feff}'));
        let rows = parse(&csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], COMMENT_COLUMNS.map(String::from).to_vec());
        assert_eq!(
            rows[1],
            vec!["c1", "", "positive", "0.9000", "Price", "0.1235", text]
        );
    }

    #[test]
    fn categories_have_five_columns_and_no_trailing_newline() {
        let csv = categories_csv(&[
            CategoryStat {
                category: "Service".into(),
                total_comments: 10,
                positive_comments: 6,
                neutral_comments: 3,
                negative_comments: 1,
            },
            CategoryStat {
                category: "Price, Value".into(),
                ..Default::default()
            },
        ]);

        assert!(!csv.ends_with('\n'));
        let body = csv.trim_start_matches('\u{feff}');
        let lines: Vec<_> = body.split('\n').collect();
        assert_eq!(
            lines,
            vec![
                "category,total_comments,positive_comments,neutral_comments,negative_comments",
                "Service,10,6,3,1",
                "\"Price, Value\",0,0,0,0",
            ]
        );
    }

    #[test]
    fn empty_input_yields_header_only() {
        assert_eq!(categories_csv(&[]).trim_start_matches('\u{feff}').lines().count(), 1);
    }
}
