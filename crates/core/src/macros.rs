//! Helper macro for string-backed status enums.
//!
//! Each variant maps to the exact lowercase value stored in the `status`,
//! `role` and `meeting_type` TEXT columns and used on the wire.

/// Define a `Copy` enum whose variants round-trip through a fixed string.
///
/// Generates `as_str`, an `ALL` slice in declaration order, `Display`, and a
/// `FromStr` impl that reports unknown values as
/// [`CoreError::Validation`](crate::error::CoreError::Validation).
macro_rules! define_str_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The canonical string value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $val => Ok($name::$variant), )+
                    other => Err($crate::error::CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        stringify!($name),
                        [$( $val ),+].join(", ")
                    ))),
                }
            }
        }
    };
}
