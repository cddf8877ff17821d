//! Per-token pricing for known models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) USD cost per token for a model.
///
/// Unknown models price at zero rather than guessing.
pub(crate) fn per_token(model: &str) -> (Decimal, Decimal) {
    if model.starts_with("gpt-4o-mini") {
        (dec!(0.00000015), dec!(0.0000006))
    } else if model.starts_with("gpt-4o") {
        (dec!(0.0000025), dec!(0.00001))
    } else if model.contains("claude") && model.contains("sonnet") {
        (dec!(0.000003), dec!(0.000015))
    } else if model.contains("claude") && model.contains("haiku") {
        (dec!(0.0000008), dec!(0.000004))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    }
}
