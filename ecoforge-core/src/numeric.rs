/// Rounds to `digits` significant digits through decimal formatting, so the result is
/// the closest `f64` to the decimal a reader would see.
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    format!("{:.*e}", digits - 1, value)
        .parse()
        .unwrap_or(value)
}
