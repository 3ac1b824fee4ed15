//! Fixed value vocabularies used by the forms and the statistics.
//!
//! Records store these as plain text and the server never rejects a value
//! outside the vocabulary; the enums exist for defaults, pickers and
//! classification.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when text is not one of a vocabulary's values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value: {0}")]
pub struct UnknownValue(pub String);

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every value, in picker order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored text of this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownValue(other.to_string())),
                }
            }
        }
    };
}

vocabulary! {
    /// Sex of an adult bird.
    Sex {
        Male => "ผู้",
        Female => "เมีย",
        Unknown => "ไม่ทราบ",
    }
}

vocabulary! {
    /// Where a bird came from.
    Origin {
        /// Bred in house.
        BredInHouse => "เพาะเอง",
        /// Bought from another farm.
        Bought => "ซื้อมาจากฟาร์ม",
        Collected => "เก็บมา",
        Unknown => "ไม่ทราบ",
    }
}

vocabulary! {
    /// Whether a breeding pair is still together.
    PairStatus {
        Active => "ใช้งาน",
        Ended => "สิ้นสุด",
    }
}

vocabulary! {
    /// Sex of a chick; starts out unchecked.
    ChickSex {
        Unchecked => "ยังไม่ตรวจ",
        Male => "ผู้",
        Female => "เมีย",
    }
}

vocabulary! {
    /// Life status of a chick.
    ChickStatus {
        Alive => "มีชีวิต",
        Sold => "ขายแล้ว",
        Deceased => "เสียชีวิต",
    }
}

/// Display style for a chick's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Danger,
    Warning,
    Success,
    /// Nothing recorded; shown as `-`.
    None,
}

impl ChickStatus {
    /// Badge for a stored status: deceased is danger, sold is warning, any
    /// other non-blank text is success.
    pub fn badge(status: &str) -> Badge {
        if status.trim().is_empty() {
            return Badge::None;
        }
        match status.parse::<ChickStatus>() {
            Ok(ChickStatus::Deceased) => Badge::Danger,
            Ok(ChickStatus::Sold) => Badge::Warning,
            _ => Badge::Success,
        }
    }
}
