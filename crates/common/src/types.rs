use serde::{Deserialize, Serialize};

macro_rules! storage_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw storage identity.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw storage identity.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

storage_id!(
    /// Storage identity of a customer row.
    CustomerId
);

storage_id!(
    /// Storage identity of a product row.
    ProductId
);

storage_id!(
    /// Storage identity of an order row.
    ///
    /// Identities are assigned in insertion order, so the largest id is
    /// always the most recently created order.
    OrderId
);

storage_id!(
    /// Storage identity of an order line item row.
    OrderItemId
);
