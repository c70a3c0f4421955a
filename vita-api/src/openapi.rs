//! OpenAPI document for the VITA REST API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::body_record::list_body_records,
        crate::routes::body_record::create_body_record,
        crate::routes::body_record::get_body_record,
        crate::routes::body_record::update_body_record,
        crate::routes::body_record::delete_body_record,
        crate::routes::meal::list_meals,
        crate::routes::meal::create_meal,
        crate::routes::meal::get_meal,
        crate::routes::meal::update_meal,
        crate::routes::meal::delete_meal,
        crate::routes::exercise::list_exercises,
        crate::routes::exercise::create_exercise,
        crate::routes::exercise::get_exercise,
        crate::routes::exercise::update_exercise,
        crate::routes::exercise::delete_exercise,
        crate::routes::diary::list_diaries,
        crate::routes::diary::create_diary,
        crate::routes::diary::get_diary,
        crate::routes::diary::update_diary,
        crate::routes::diary::delete_diary,
        crate::routes::goal::list_goals,
        crate::routes::goal::create_goal,
        crate::routes::goal::get_goal,
        crate::routes::goal::update_goal,
        crate::routes::goal::delete_goal,
        crate::routes::goal::list_goal_progress,
        crate::routes::goal::create_goal_progress,
        crate::routes::goal::get_goal_progress,
        crate::routes::goal::update_goal_progress,
        crate::routes::goal::delete_goal_progress,
        crate::routes::stats::get_achievement_rate,
        crate::routes::stats::get_achievement_rate_for_user,
        crate::routes::stats::trigger_achievement_rate,
        crate::routes::health::health,
    ),
    components(schemas(
        vita_core::BodyRecord,
        vita_core::NewBodyRecord,
        vita_core::BodyRecordUpdate,
        vita_core::Meal,
        vita_core::NewMeal,
        vita_core::MealUpdate,
        vita_core::Exercise,
        vita_core::NewExercise,
        vita_core::ExerciseUpdate,
        vita_core::Diary,
        vita_core::NewDiary,
        vita_core::DiaryUpdate,
        vita_core::Goal,
        vita_core::NewGoal,
        vita_core::GoalUpdate,
        vita_core::GoalProgress,
        vita_core::NewGoalProgress,
        vita_core::GoalProgressUpdate,
        vita_core::MealType,
        vita_core::AchievementStat,
        crate::error::ApiError,
        crate::error::ErrorCode,
        crate::types::AchievementRateResponse,
        crate::types::TriggerResponse,
        crate::types::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Body Records", description = "Daily body measurements"),
        (name = "Meals", description = "Meal logging"),
        (name = "Exercises", description = "Exercise logging"),
        (name = "Diaries", description = "Free-text diary entries"),
        (name = "Goals", description = "User goals"),
        (name = "Goal Progress", description = "Progress entries against goals"),
        (name = "Stats", description = "Derived statistics"),
        (name = "Health", description = "Service health"),
    ),
    info(
        title = "VITA API",
        description = "Personal health-tracking backend",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/stats/achievement-rate"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/v1/records/body-records"));
    }
}
