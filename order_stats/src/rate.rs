//! Delivery success rate.

/// Percentage (0..=100) of finished orders that were delivered.
///
/// `delivered` is the Collected count and `returned` the Lost count. Pending orders
/// are work in progress and stay out of the denominator. No finished orders -> 0.
pub fn delivery_rate(delivered: u64, returned: u64) -> f64 {
    let finished = delivered + returned;
    if finished == 0 {
        return 0.0;
    }
    delivered as f64 / finished as f64 * 100.0
}
