//! Field value conversion to and from the stored string form.

/// A primitive that can be stored as a single string property.
///
/// `None` on the stored side is an explicit null. Implementations decide how
/// their own empty/absent values map onto it:
///
/// | type           | write                      | read of null  |
/// |----------------|----------------------------|---------------|
/// | `String`       | `""` becomes null          | `""`          |
/// | numbers, bool  | `Display`                  | error         |
/// | `Option<T>`    | `None` becomes null        | `None`        |
pub trait FieldValue: Sized {
    /// Returns the stored form of the value, or `None` for null.
    fn to_field(&self) -> Option<String>;

    /// Rebuilds a value from its stored form.
    ///
    /// # Errors
    ///
    /// Returns a message describing why `raw` is not a valid value.
    fn from_field(raw: Option<&str>) -> Result<Self, String>;
}

impl FieldValue for String {
    fn to_field(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }

    fn from_field(raw: Option<&str>) -> Result<Self, String> {
        Ok(raw.unwrap_or_default().to_owned())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_field(&self) -> Option<String> {
        self.as_ref().and_then(FieldValue::to_field)
    }

    fn from_field(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            Some(raw) => T::from_field(Some(raw)).map(Some),
            None => Ok(None),
        }
    }
}

macro_rules! display_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_field(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn from_field(raw: Option<&str>) -> Result<Self, String> {
                    let raw = raw.ok_or_else(|| "missing value".to_string())?;
                    raw.parse::<$ty>().map_err(|e| format!("{raw:?}: {e}"))
                }
            }
        )*
    };
}

display_field_value!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
