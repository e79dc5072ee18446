/// Format a float as a yen amount with thousands separators: ¥1,234
/// Fractional yen are rounded away.
pub fn yen(val: f64) -> String {
    let negative = val < 0.0;
    let whole = format!("{:.0}", val.abs());

    let mut with_commas = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-¥{with_commas}")
    } else {
        format!("¥{with_commas}")
    }
}

/// Plain numeric text: integral values without a fractional part, others as-is.
pub fn plain_number(val: f64) -> String {
    if val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        val.to_string()
    }
}
