use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::dto::MealSlot;

#[derive(Debug, Clone, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_date: Date,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct MealEntry {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub meal_slot: String,
    pub recipe_id: Uuid,
}

/// Fetch-or-insert the plan for (user, date). The unique constraint makes
/// the insert a no-op when the plan already exists, so two callers racing
/// here still end up with the same row.
pub async fn get_or_create_plan(db: &PgPool, user_id: Uuid, date: Date) -> sqlx::Result<MealPlan> {
    sqlx::query(
        r#"
        INSERT INTO meal_plans (id, user_id, plan_date)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, plan_date) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .execute(db)
    .await?;

    sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT id, user_id, plan_date, created_at
          FROM meal_plans
         WHERE user_id = $1 AND plan_date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await
}

pub async fn find_plan(db: &PgPool, user_id: Uuid, date: Date) -> sqlx::Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(
        r#"
        SELECT id, user_id, plan_date, created_at
          FROM meal_plans
         WHERE user_id = $1 AND plan_date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(db)
    .await
}

/// Wholesale replacement of a plan's entries, in one transaction: delete
/// everything, then insert the supplied pairs. No partial-slot patching.
pub async fn replace_entries(
    db: &PgPool,
    plan_id: Uuid,
    entries: &[(MealSlot, Uuid)],
) -> sqlx::Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM meal_entries WHERE meal_plan_id = $1")
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;

    for (slot, recipe_id) in entries {
        sqlx::query(
            r#"
            INSERT INTO meal_entries (id, meal_plan_id, meal_slot, recipe_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plan_id)
        .bind(slot.as_str())
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn entries_for_plan(db: &PgPool, plan_id: Uuid) -> sqlx::Result<Vec<MealEntry>> {
    sqlx::query_as::<_, MealEntry>(
        r#"
        SELECT id, meal_plan_id, meal_slot, recipe_id
          FROM meal_entries
         WHERE meal_plan_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
}
