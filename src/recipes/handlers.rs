use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    ImageView, IngredientView, Pagination, RecipeDetails, RecipeSummary, SavedRecipeResponse,
    StepView,
};
use super::{forms, repo, services};
use crate::error::Error;
use crate::identity::AuthUser;
use crate::images::ImageOwner;
use crate::nutrition;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
        .merge(
            Router::new()
                .route("/recipes", post(create_recipe))
                .route("/recipes/:id", put(edit_recipe).delete(delete_recipe))
                .layer(DefaultBodyLimit::max(32 * 1024 * 1024)),
        )
}

#[instrument(skip(state))]
async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<RecipeSummary>>, Error> {
    let recipes = repo::list_by_user(&state.db, user_id, p.limit, p.offset).await?;
    Ok(Json(
        recipes
            .into_iter()
            .map(|r| RecipeSummary {
                id: r.id,
                name: r.name,
                public: r.public,
                created_at: r.created_at,
            })
            .collect(),
    ))
}

#[instrument(skip(state))]
async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetails>, Error> {
    let recipe = repo::get_recipe(&state.db, id).await?.ok_or(Error::NotFound)?;
    // private recipes look like they don't exist to everyone but the owner
    if !recipe.public && recipe.user_id != user_id {
        return Err(Error::NotFound);
    }

    let ingredients = repo::ingredients_for_recipe(&state.db, id).await?;
    let steps = repo::steps_for_recipe(&state.db, id).await?;
    let images = repo::images_for_recipe(&state.db, id).await?;

    let nutrition = nutrition::recipe_totals(
        &state.nutrition,
        ingredients
            .iter()
            .map(|i| (i.name.as_str(), i.quantity, i.unit.as_deref())),
    );

    let images = images
        .into_iter()
        .filter_map(|row| {
            // rows violating the one-owner invariant cannot be attributed
            let owner = ImageOwner::from_columns(row.recipe_id, row.ingredient_id, row.step_id)
                .ok()?;
            Some(ImageView {
                id: row.id,
                url: row.url,
                alt_text: row.alt_text,
                caption: row.caption,
                owner_kind: owner.kind(),
                owner_id: owner.id(),
            })
        })
        .collect();

    Ok(Json(RecipeDetails {
        id: recipe.id,
        name: recipe.name,
        description: recipe.description,
        public: recipe.public,
        user_id: recipe.user_id,
        category_id: recipe.category_id,
        origin_id: recipe.origin_id,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
        ingredients: ingredients
            .into_iter()
            .map(|i| IngredientView {
                id: i.id,
                name: i.name,
                quantity: i.quantity,
                unit: i.unit,
                notes: i.notes,
            })
            .collect(),
        steps: steps
            .into_iter()
            .map(|s| StepView {
                id: s.id,
                step_number: s.step_number,
                name: s.name,
                instruction: s.instruction,
                duration_minutes: s.duration_minutes,
                description: s.description,
            })
            .collect(),
        images,
        nutrition,
    }))
}

#[instrument(skip(state, mp))]
async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<SavedRecipeResponse>), Error> {
    let form = forms::parse_recipe_form(mp).await?;
    let saved = services::create_recipe(&state, user_id, form).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/recipes/{}", saved.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SavedRecipeResponse {
            id: saved.id,
            warnings: saved.warnings,
        }),
    ))
}

#[instrument(skip(state, mp))]
async fn edit_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<SavedRecipeResponse>, Error> {
    let form = forms::parse_recipe_form(mp).await?;
    let saved = services::edit_recipe(&state, user_id, id, form).await?;
    Ok(Json(SavedRecipeResponse {
        id: saved.id,
        warnings: saved.warnings,
    }))
}

#[instrument(skip(state))]
async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    services::delete_recipe(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
