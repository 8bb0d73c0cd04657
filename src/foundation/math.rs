pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Percentage of `part` in `total`, clamped to `0..=100`. An empty total counts as done.
pub(crate) fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    ((part as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
