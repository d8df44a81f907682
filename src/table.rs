use std::borrow::Cow;
use std::fmt::Write as _;

/// Renders an aligned plain-text table. Cells that parse as numbers (after
/// stripping separators and `%`) are right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut numeric = vec![!rows.is_empty(); column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            if !looks_numeric(cell) {
                numeric[idx] = false;
            }
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(headers, &widths, &numeric);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths, &[]);
    let _ = writeln!(output, "{separator_line}");

    for row in rows {
        let row_line = format_row(row, &widths, &numeric);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let rendered = render_table(headers, rows);
    print!("{rendered}");
}

/// A titled table block, as printed by the report.
pub fn render_section(title: &str, headers: &[String], rows: &[Vec<String>]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{title}");
    output.push_str(&render_table(headers, rows));
    output
}

fn format_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let display = display_width(sanitized.as_ref());
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        let cell = if right_align.get(idx).copied().unwrap_or(false) {
            format!("{}{}", " ".repeat(padding), sanitized)
        } else {
            format!("{}{}", sanitized, " ".repeat(padding))
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn looks_numeric(value: &str) -> bool {
    let stripped = value
        .chars()
        .filter(|c| !matches!(c, ',' | '%'))
        .collect::<String>();
    stripped == crate::data::PLACEHOLDER || stripped.trim().parse::<f64>().is_ok()
}

/// Terminal column count; Hangul, CJK and full-width forms take two cells.
pub fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // Skip ANSI escape sequence (e.g. \x1b[31m)
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else if is_wide(ch) {
            width += 2;
        } else {
            width += 1;
        }
    }
    width
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA960..=0xA97F
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x1F900..=0x1F9FF)
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        let mut sanitized = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\n' | '\r' | '\t' => sanitized.push(' '),
                other => sanitized.push(other),
            }
        }
        Cow::Owned(sanitized)
    } else {
        Cow::Borrowed(value)
    }
}
