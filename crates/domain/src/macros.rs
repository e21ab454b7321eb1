//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Enums that travel over the wire as fixed strings (entity names, batch
//! operations, quota dimensions) share one mapping for both directions.
//! Parsing is exact: the remote service is case sensitive, so `"customer"`
//! does not parse as `"Customer"`.
//!
//! # Example
//!
//! ```rust
//! use tallyline_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Operation {
//!     Create,
//!     Delete,
//! }
//!
//! impl_wire_name_conversions!(Operation {
//!     Create => "create",
//!     Delete => "delete",
//! });
//!
//! assert_eq!(Operation::Create.to_string(), "create");
//! assert_eq!("delete".parse::<Operation>(), Ok(Operation::Delete));
//! ```

/// Implements `as_str`, Display and FromStr for wire-name enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their wire names
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// The exact name used on the wire.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
