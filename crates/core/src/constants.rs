/// Decimal places kept in displayed percentages and amounts
pub const DECIMAL_PRECISION: u32 = 2;

/// Upper bound for progress percentages
pub const MAX_PROGRESS_PERCENT: u32 = 100;

/// Format used for `start_month` period identifiers ("YYYY-MM")
pub const MONTH_ID_FORMAT: &str = "%Y-%m";
