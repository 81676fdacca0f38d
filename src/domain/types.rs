//! Shared domain enumerations aligned with persisted column values.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodSpeed {
    Fast,
    Slow,
}

impl FoodSpeed {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodSpeed::Fast => "fast",
            FoodSpeed::Slow => "slow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    Meal,
    Dessert,
}

impl FoodType {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::Meal => "meal",
            FoodType::Dessert => "dessert",
        }
    }
}

/// Which catalog a food reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Standard,
    Custom,
}

impl FoodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodKind::Standard => "standard",
            FoodKind::Custom => "custom",
        }
    }
}

impl FromStr for FoodSpeed {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fast" => Ok(FoodSpeed::Fast),
            "slow" => Ok(FoodSpeed::Slow),
            other => Err(DomainError::unknown_variant("food speed", other)),
        }
    }
}

impl FromStr for FoodType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "meal" => Ok(FoodType::Meal),
            "dessert" => Ok(FoodType::Dessert),
            other => Err(DomainError::unknown_variant("food type", other)),
        }
    }
}

impl FromStr for FoodKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "standard" => Ok(FoodKind::Standard),
            "custom" => Ok(FoodKind::Custom),
            other => Err(DomainError::unknown_variant("food kind", other)),
        }
    }
}

impl fmt::Display for FoodSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A review rating that has passed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(i32);

impl Rating {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i32) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidRating { value })
        }
    }

    /// Accepts an optional raw rating, yielding `None` for absent or out-of-range values.
    pub fn accept(value: Option<i32>) -> Option<Self> {
        value.and_then(|raw| Self::new(raw).ok())
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeDelta {
    Like,
    Unlike,
}

impl LikeDelta {
    pub fn value(self) -> i64 {
        match self {
            LikeDelta::Like => 1,
            LikeDelta::Unlike => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_only_one_through_five() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).map(Rating::get), Ok(1));
        assert_eq!(Rating::new(5).map(Rating::get), Ok(5));
        assert_eq!(Rating::accept(None), None);
        assert_eq!(Rating::accept(Some(-3)), None);
    }

    #[test]
    fn enums_round_trip_through_text() {
        assert_eq!("fast".parse::<FoodSpeed>(), Ok(FoodSpeed::Fast));
        assert_eq!("dessert".parse::<FoodType>(), Ok(FoodType::Dessert));
        assert_eq!(FoodKind::Custom.to_string(), "custom");
        assert!(matches!(
            "brunch".parse::<FoodType>(),
            Err(DomainError::UnknownVariant { kind: "food type", .. })
        ));
    }
}
