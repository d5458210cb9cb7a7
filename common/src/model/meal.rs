use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three services a dining hall runs each day.
///
/// Stored and serialized in lowercase (`"breakfast"`, `"lunch"`, `"dinner"`).
/// Parsing is case-insensitive so that query strings such as `meal=Dinner`
/// coming from the mobile client are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    /// Every meal, in the order ingestion processes them.
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMeal(pub String);

impl fmt::Display for UnknownMeal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown meal '{}', expected breakfast, lunch or dinner", self.0)
    }
}

impl std::error::Error for UnknownMeal {}

impl FromStr for Meal {
    type Err = UnknownMeal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "dinner" => Ok(Meal::Dinner),
            _ => Err(UnknownMeal(s.to_string())),
        }
    }
}
