use unicode_width::UnicodeWidthStr;

/// Right-pad to `width` display columns. Longer strings are returned whole.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(sw)))
}

/// Widest display width among `items`.
pub(crate) fn max_width<'a>(items: impl IntoIterator<Item = &'a str>) -> usize {
    items.into_iter().map(UnicodeWidthStr::width).max().unwrap_or(0)
}

/// Spreadsheet column letter for a header position (0 -> A, 26 -> AA).
pub(crate) fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Minor units with thousands separators (`-1,234.50`).
pub(crate) fn format_amount(cents: i64) -> String {
    let plain = leadtrace_recon::model::format_cents(cents);
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac}")
}
