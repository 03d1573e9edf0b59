//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display and FromStr implementations for enums
///
/// Parsing is case-insensitive; the error constructor receives the rejected input.
///
/// # Usage
///
/// ```rust,ignore
/// enum_display_fromstr!(
///     MyEnum,
///     InventoryError::invalid_my_enum,
///     {
///         Variant1 => "variant1",
///         Variant2 => "variant2",
///     }
/// );
/// ```
#[macro_export]
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $error_fn:path,
        { $($variant:ident => $str:literal),+ $(,)? }
    ) => {
        impl $enum_name {
            /// All valid string representations of this enum.
            pub const ALL_STRINGS: &[&str] = &[$($str),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($enum_name::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::InventoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok($enum_name::$variant),)+
                    _ => Err($error_fn(s.to_string())),
                }
            }
        }
    };
}
