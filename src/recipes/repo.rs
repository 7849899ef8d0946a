use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::images::NewImage;

#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub public: bool,
    pub user_id: Uuid,
    pub category_id: Option<i32>,
    pub origin_id: Option<i32>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Step {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub step_number: i32,
    pub name: Option<String>,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub recipe_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
    pub step_id: Option<Uuid>,
}

/// Ingredient row staged for insertion inside the aggregate transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub notes: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub step_number: i32,
    pub name: Option<String>,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

// ---- aggregate write (all take the ambient transaction) ----

pub struct NewRecipe<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub public: bool,
    pub category_id: Option<i32>,
    pub origin_id: Option<i32>,
}

pub async fn insert_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe: &NewRecipe<'_>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipes (id, user_id, name, description, public, category_id, origin_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(recipe.id)
    .bind(recipe.user_id)
    .bind(recipe.name)
    .bind(recipe.description)
    .bind(recipe.public)
    .bind(recipe.category_id)
    .bind(recipe.origin_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Scalar-field update; `user_id` is immutable and never touched.
pub async fn update_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe: &NewRecipe<'_>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE recipes
           SET name = $2, description = $3, public = $4,
               category_id = $5, origin_id = $6, updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(recipe.id)
    .bind(recipe.name)
    .bind(recipe.description)
    .bind(recipe.public)
    .bind(recipe.category_id)
    .bind(recipe.origin_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_ingredient_tx(
    tx: &mut Transaction<'_, Postgres>,
    row: &NewIngredient,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ingredients (id, recipe_id, user_id, name, unit, quantity, notes, public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(row.id)
    .bind(row.recipe_id)
    .bind(row.user_id)
    .bind(&row.name)
    .bind(&row.unit)
    .bind(row.quantity)
    .bind(&row.notes)
    .bind(row.public)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_step_tx(
    tx: &mut Transaction<'_, Postgres>,
    row: &NewStep,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO steps (id, recipe_id, step_number, name, instruction, duration_minutes, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(row.id)
    .bind(row.recipe_id)
    .bind(row.step_number)
    .bind(&row.name)
    .bind(&row.instruction)
    .bind(row.duration_minutes)
    .bind(&row.description)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Postgres>,
    image: &NewImage,
) -> sqlx::Result<()> {
    let (recipe_id, ingredient_id, step_id) = image.owner.columns();
    sqlx::query(
        r#"
        INSERT INTO images (id, url, alt_text, caption, recipe_id, ingredient_id, step_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(image.id)
    .bind(&image.url)
    .bind(&image.alt_text)
    .bind(&image.caption)
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(step_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// URLs of images hanging off the recipe's ingredients and steps. Fetched
/// before a clear-then-recreate so the objects can be cleaned up after
/// commit.
pub async fn child_image_urls_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT url FROM images
         WHERE ingredient_id IN (SELECT id FROM ingredients WHERE recipe_id = $1)
            OR step_id IN (SELECT id FROM steps WHERE recipe_id = $1)
        "#,
    )
    .bind(recipe_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows.into_iter().map(|(url,)| url).collect())
}

/// Delete the recipe's ingredient and step sets wholesale. Their image
/// rows go with them via the FK cascade.
pub async fn delete_children_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM steps WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Drop the recipe-level image rows, returning their URLs for cleanup.
pub async fn delete_recipe_images_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("DELETE FROM images WHERE recipe_id = $1 RETURNING url")
            .bind(recipe_id)
            .fetch_all(&mut **tx)
            .await?;
    Ok(rows.into_iter().map(|(url,)| url).collect())
}

pub async fn delete_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// ---- reads ----

pub async fn get_recipe(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Recipe>> {
    sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, name, description, public, user_id, category_id, origin_id,
               created_at, updated_at
          FROM recipes
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, name, description, public, user_id, category_id, origin_id,
               created_at, updated_at
          FROM recipes
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Recipes the user may see: their own plus anything public.
pub async fn list_visible(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, name, description, public, user_id, category_id, origin_id,
               created_at, updated_at
          FROM recipes
         WHERE public OR user_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn ingredients_for_recipe(db: &PgPool, recipe_id: Uuid) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, recipe_id, name, unit, quantity, notes
          FROM ingredients
         WHERE recipe_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn ingredients_for_recipes(
    db: &PgPool,
    recipe_ids: &[Uuid],
) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, recipe_id, name, unit, quantity, notes
          FROM ingredients
         WHERE recipe_id = ANY($1)
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await
}

pub async fn steps_for_recipe(db: &PgPool, recipe_id: Uuid) -> sqlx::Result<Vec<Step>> {
    sqlx::query_as::<_, Step>(
        r#"
        SELECT id, recipe_id, step_number, name, instruction, duration_minutes, description
          FROM steps
         WHERE recipe_id = $1
         ORDER BY step_number ASC, created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

/// Every image of the aggregate: recipe-owned plus ingredient/step-owned.
pub async fn images_for_recipe(db: &PgPool, recipe_id: Uuid) -> sqlx::Result<Vec<ImageRow>> {
    sqlx::query_as::<_, ImageRow>(
        r#"
        SELECT id, url, alt_text, caption, recipe_id, ingredient_id, step_id
          FROM images
         WHERE recipe_id = $1
            OR ingredient_id IN (SELECT id FROM ingredients WHERE recipe_id = $1)
            OR step_id IN (SELECT id FROM steps WHERE recipe_id = $1)
         ORDER BY created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

/// Same set as [`images_for_recipe`], URLs only, for storage cleanup
/// ahead of a full delete.
pub async fn all_image_urls(db: &PgPool, recipe_id: Uuid) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT url FROM images
         WHERE recipe_id = $1
            OR ingredient_id IN (SELECT id FROM ingredients WHERE recipe_id = $1)
            OR step_id IN (SELECT id FROM steps WHERE recipe_id = $1)
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(url,)| url).collect())
}
