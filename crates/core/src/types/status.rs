//! Enumerations shared by records and the wire format.
//!
//! Each enum carries a stable wire label used for serde, `Display` and
//! `FromStr`, so that CLI arguments and backend payloads agree.

use serde::{Deserialize, Serialize};

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the wire label.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        format!(
                            concat!("invalid ", stringify!($name), ": {}"),
                            s
                        )
                    })
            }
        }
    };
}

labelled_enum! {
    /// Kind of stocked product.
    #[derive(Default)]
    ProductCategory {
        /// Spectacle lenses.
        #[default]
        Lens => "lens",
        /// Spectacle frames.
        Frame => "frame",
        /// Sunglasses.
        Sunglass => "sunglass",
        /// Contact lenses.
        Contact => "contact",
    }
}

labelled_enum! {
    /// Customer gender as recorded on the customer card.
    Gender {
        /// Male.
        Male => "M",
        /// Female.
        Female => "F",
    }
}

labelled_enum! {
    /// What a prescription is for.
    #[derive(Default)]
    PrescriptionType {
        /// Spectacles.
        #[default]
        Specs => "Specs",
        /// Contact lenses.
        Contacts => "Contacts",
    }
}

labelled_enum! {
    /// Sale settlement status.
    #[derive(Default)]
    SaleStatus {
        /// Nothing left to pay.
        Completed => "completed",
        /// Part of the net amount is still due.
        #[default]
        Pending => "pending",
    }
}

labelled_enum! {
    /// How money changed hands.
    #[derive(Default)]
    PaymentMethod {
        /// Cash.
        #[default]
        Cash => "cash",
        /// Card terminal.
        Card => "card",
        /// UPI transfer.
        Upi => "upi",
    }
}

labelled_enum! {
    /// Direction of a cashbook entry.
    #[derive(Default)]
    EntryType {
        /// Money in.
        Credit => "credit",
        /// Money out.
        #[default]
        Debit => "debit",
    }
}
