use rust_decimal::Decimal;
use validator::ValidationError;

/// Digits kept after the decimal point by the `expenses.amount` column
pub const AMOUNT_SCALE: u32 = 2;

/// Digits allowed before the decimal point by `NUMERIC(12, 2)`
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

fn amount_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("invalid_amount");
    error.message = Some(message.into());
    error
}

/// Validates that an amount is positive and fits `NUMERIC(12, 2)`.
///
/// Trailing zeros are ignored, so `3.50` passes while `0.001` does not.
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(amount_error("Amount must be greater than 0"));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(amount_error("Amount must have at most 2 decimal places"));
    }
    if amount.trunc() >= Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Err(amount_error("Amount must have at most 10 integer digits"));
    }
    Ok(())
}

/// Flattens `validator` field errors into a single `field: message` line
pub fn describe_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}
