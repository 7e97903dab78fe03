//! Session completion estimates

/// Largest fraction reported while pages remain in unknown-total mode
const UNFINISHED_CEILING: f64 = 1.0 - f64::EPSILON;

/// Estimates how far along a session is, in `[0.0, 1.0]`
///
/// With a known total the fraction is `fetched / total`, capped at 1.0. Without
/// one it is `1 - 1/2^page_index`, which keeps climbing but stays below 1.0 until
/// `finished` is set. A finished session always reports exactly 1.0.
pub fn fraction_complete(
    records_fetched: u64,
    estimated_total: Option<u64>,
    page_index: u32,
    finished: bool,
) -> f64 {
    if finished {
        return 1.0;
    }

    match estimated_total {
        Some(total) if total > 0 => (records_fetched as f64 / total as f64).min(1.0),
        _ => {
            let remaining = 0.5f64.powi(page_index.min(1024) as i32);
            (1.0 - remaining).min(UNFINISHED_CEILING)
        }
    }
}
