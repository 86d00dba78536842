/// Shorten a hex address or hash to `0x1234...abcd`.
///
/// Inputs shorter than 10 characters are returned unchanged.
pub fn format_address(address: &str) -> String {
    let len = address.len();
    if len < 10 {
        return address.to_owned();
    }
    match (address.get(..6), address.get(len - 4..)) {
        (Some(head), Some(tail)) => format!("{head}...{tail}"),
        _ => address.to_owned(),
    }
}

/// Format an ETH amount with precision depending on its magnitude.
///
/// `>= 1000` has no decimals, `>= 100` one, anything smaller two.
pub fn format_eth_amount(amount: f64) -> String {
    let decimals = if amount >= 1000.0 {
        0
    } else if amount >= 100.0 {
        1
    } else {
        2
    };
    format!("{} ETH", format_with_commas(amount, decimals))
}

/// Format a gas price in gwei with one decimal.
pub fn format_gwei(gwei: f64) -> String {
    format!("{gwei:.1} gwei")
}

/// Render `value` with `decimals` fractional digits and thousands separators.
pub fn format_with_commas(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
