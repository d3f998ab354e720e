use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Primary key of a client row.
pub type ClientId = i64;

/// Primary key of a barcode or attendance row.
pub type RecordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// Text enums stored verbatim in SQLite. Each gets as_str / Display / FromStr.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Status of a barcode record.
    ///
    /// `Expired` and `Renewed` are terminal: nothing transitions out of them.
    BarcodeStatus, "barcode status" {
        Active => "active",
        Inactive => "inactive",
        Expired => "expired",
        Renewed => "renewed",
    }
}

impl BarcodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BarcodeStatus::Expired | BarcodeStatus::Renewed)
    }
}

text_enum! {
    /// Membership status of a client.
    ClientStatus, "client status" {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

text_enum! {
    AttendanceStatus, "attendance status" {
        Present => "present",
        Absent => "absent",
    }
}

text_enum! {
    /// Subscription plan a client signed up for.
    SubscriptionType, "subscription type" {
        Daily => "daily",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Semiannual => "semiannual",
        Annual => "annual",
    }
}

/// Where a subscription stands relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubscriptionState {
    Active { days_remaining: i64 },
    EndsToday,
    Lapsed { days_overdue: i64 },
}

impl SubscriptionState {
    pub fn on(end: NaiveDate, today: NaiveDate) -> Self {
        let days = (end - today).num_days();
        match days {
            d if d > 0 => SubscriptionState::Active { days_remaining: d },
            0 => SubscriptionState::EndsToday,
            d => SubscriptionState::Lapsed { days_overdue: -d },
        }
    }

    /// True when the subscription ends within `days` (or already has).
    pub fn ends_within(&self, days: i64) -> bool {
        match self {
            SubscriptionState::Active { days_remaining } => *days_remaining <= days,
            _ => true,
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionState::Active { days_remaining } => {
                write!(f, "valid ({days_remaining} days remaining)")
            }
            SubscriptionState::EndsToday => f.write_str("ends today"),
            SubscriptionState::Lapsed { days_overdue } => {
                write!(f, "lapsed ({days_overdue} days ago)")
            }
        }
    }
}
