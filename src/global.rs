// crate-wide numeric constants

/// Absolute threshold below which a floating-point constant is treated as zero
/// by the simplification and zero-requirement checks.
pub const THRESHOLD: f64 = 1e-12;
