//! Enumerations shared across the workspace.

use serde::{Deserialize, Serialize};

/// Meal category for meal records.
///
/// Serialized with capitalized names to match the public API contract
/// (`"Morning"`, `"Lunch"`, `"Dinner"`, `"Snack"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MealType {
    Morning,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Stable string form, used for SQL parameters and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Morning => "Morning",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealType {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Morning" => Ok(MealType::Morning),
            "Lunch" => Ok(MealType::Lunch),
            "Dinner" => Ok(MealType::Dinner),
            "Snack" => Ok(MealType::Snack),
            other => Err(crate::error::ValidationError::InvalidValue {
                field: "meal_type".to_string(),
                reason: format!("unknown meal type '{}'", other),
            }),
        }
    }
}

/// Record kind discriminator for polymorphic references (errors, logging,
/// cache bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RecordKind {
    User,
    BodyRecord,
    Meal,
    Exercise,
    Diary,
    Goal,
    GoalProgress,
}

impl RecordKind {
    /// Snake-case entity name, matching table names.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::BodyRecord => "body_record",
            RecordKind::Meal => "meal",
            RecordKind::Exercise => "exercise",
            RecordKind::Diary => "diary",
            RecordKind::Goal => "goal",
            RecordKind::GoalProgress => "goal_progress",
        }
    }

    /// Human-readable entity name for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordKind::User => "User",
            RecordKind::BodyRecord => "Body record",
            RecordKind::Meal => "Meal",
            RecordKind::Exercise => "Exercise",
            RecordKind::Diary => "Diary",
            RecordKind::Goal => "Goal",
            RecordKind::GoalProgress => "Goal progress",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_round_trip() {
        for meal in [
            MealType::Morning,
            MealType::Lunch,
            MealType::Dinner,
            MealType::Snack,
        ] {
            let parsed: MealType = meal.as_str().parse().unwrap();
            assert_eq!(parsed, meal);
        }
    }

    #[test]
    fn test_meal_type_serde_uses_capitalized_names() {
        let json = serde_json::to_string(&MealType::Lunch).unwrap();
        assert_eq!(json, "\"Lunch\"");
        let back: MealType = serde_json::from_str("\"Snack\"").unwrap();
        assert_eq!(back, MealType::Snack);
    }

    #[test]
    fn test_meal_type_rejects_unknown() {
        assert!("Brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn test_record_kind_names() {
        assert_eq!(RecordKind::BodyRecord.as_str(), "body_record");
        assert_eq!(RecordKind::GoalProgress.display_name(), "Goal progress");
    }
}
