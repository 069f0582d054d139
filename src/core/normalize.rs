//! Helpers that turn loosely typed admin input and stored values into the
//! shapes the storefront displays.

/// Splits comma separated form text (`"Black, White,"`) into trimmed,
/// non-empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`split_list`] used to prefill edit forms.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

/// Reads the leading integer of a price string the way the storefront always
/// has: surrounding whitespace and an optional sign are accepted, parsing stops
/// at the first non-digit. `"12.500"` is therefore `12`, and `"Rp 100"` has no
/// amount at all.
pub fn parse_price_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Formats an amount in rupiah with id-ID digit grouping: `Rp1.500.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

/// Lowercased, trimmed search keyword.
pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}
