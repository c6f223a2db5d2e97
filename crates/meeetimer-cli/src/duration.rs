//! Human-friendly duration arguments.

/// Parse `"90"`, `"90s"`, `"5m"`, `"1h30m"` or `"4m30s"` into seconds.
///
/// A bare number is seconds and may be negative, so that validation (not
/// argument parsing) reports a non-positive duration.
pub fn parse_duration(s: &str) -> Result<i64, String> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }

    let mut total: i64 = 0;
    let mut current = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
            continue;
        }
        let unit: i64 = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("invalid character '{ch}' in duration '{s}'")),
        };
        let n: i64 = current
            .parse()
            .map_err(|_| format!("missing number before '{ch}' in duration '{s}'"))?;
        total = n
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("duration '{s}' is too large"))?;
        current.clear();
    }
    if !current.is_empty() {
        return Err(format!("missing unit after '{current}' in duration '{s}'"));
    }
    Ok(total)
}
