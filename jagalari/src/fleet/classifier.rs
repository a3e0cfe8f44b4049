//! Device classification by display name.
//!
//! Rules are checked in order and the first match wins, so a device named
//! "Ambulance Motor 1" is an ambulance.

use std::fmt;

/// Vehicle category derived from a device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ambulance,
    Motorbike,
    Generic,
}

impl Category {
    /// Glyph shown on markers and in the device list.
    pub fn glyph(&self) -> &'static str {
        match self {
            Category::Ambulance => "🚑",
            Category::Motorbike => "🏍️",
            Category::Generic => "📍",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambulance => write!(f, "ambulance"),
            Self::Motorbike => write!(f, "motorbike"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Ordered (needle, category) rules; needles are lowercase.
const RULES: &[(&str, Category)] = &[
    ("ambulance", Category::Ambulance),
    ("motor mobile", Category::Motorbike),
    ("motor", Category::Motorbike),
];

/// Classify a device by case-insensitive substring match.
pub fn classify(name: &str) -> Category {
    let lower = name.to_lowercase();
    RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Generic)
}

/// Only the literal `"online"` is online; anything else is offline.
pub fn is_online(status: &str) -> bool {
    status == "online"
}
