//! Newtype IDs for type-safe entity references.
//!
//! Every stored entity is identified by an opaque string that doubles as its
//! table row key. Use the `define_id!` macro to create wrappers that prevent
//! accidentally mixing IDs from different entity kinds.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `generate()` for fresh random identities, `new()`, `as_str()`
/// - `Display`, `FromStr`, `AsRef<str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use abc_retail_core::define_id;
/// define_id!(InvoiceId);
/// define_id!(ShipmentId);
///
/// let invoice_id = InvoiceId::generate();
/// let shipment_id = ShipmentId::new(invoice_id.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: InvoiceId = shipment_id;
/// # assert_eq!(invoice_id.as_str(), shipment_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identity value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identity (UUID v4).
            ///
            /// Identities are never reused; every call yields a new value.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Get the identity as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(CustomerId);
define_id!(ProductId);
define_id!(OrderId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = CustomerId::generate();
        let b = CustomerId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = OrderId::new("order-1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"order-1\"");
    }

    #[test]
    fn test_display_matches_inner() {
        let id = ProductId::new("p-42");
        assert_eq!(id.to_string(), "p-42");
        assert_eq!(String::from(id), "p-42");
    }
}
