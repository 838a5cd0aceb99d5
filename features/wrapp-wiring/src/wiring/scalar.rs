use crate::errors::CoerceError;

/// A plain value that can be written from its textual form
///
/// Used for map keys and for constants coming from configuration.
/// Implement it for your own types to make them usable in `value` and `map` slots.
pub trait Scalar: Sized {
    fn coerce(raw: &str) -> Result<Self, CoerceError>;
}

macro_rules! scalar_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn coerce(raw: &str) -> Result<Self, CoerceError> {
                    raw.parse::<$ty>().map_err(|e| CoerceError::new::<$ty>(raw, e))
                }
            }
        )*
    };
}

scalar_from_str!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char);

impl Scalar for String {
    fn coerce(raw: &str) -> Result<Self, CoerceError> {
        Ok(raw.to_string())
    }
}

impl Scalar for bool {
    fn coerce(raw: &str) -> Result<Self, CoerceError> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoerceError::new::<bool>(raw, "expected a boolean")),
        }
    }
}
