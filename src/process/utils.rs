/// Largest integer an f64 represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Trim a cell; `None` when absent or blank.
pub fn clean_str(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a trimmed cell as a finite number.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Lenient integer coercion for previously published values: blank or
/// non-numeric → 0, fractions truncate toward zero, magnitude clamps to
/// `MAX_SAFE_INTEGER`.
pub fn to_safe_integer(raw: Option<&str>) -> i64 {
    let Some(s) = raw.map(str::trim) else {
        return 0;
    };
    if s.is_empty() {
        return 0;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_nan() => 0,
        Ok(n) => n.trunc().clamp(-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER) as i64,
        Err(_) => 0,
    }
}
