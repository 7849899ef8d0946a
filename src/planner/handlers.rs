use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    DateQuery, EntryView, GoalQuery, GroceryListView, PlanView, SetEntriesRequest, SuggestionView,
    SuggestionsView,
};
use super::{repo, services};
use crate::error::Error;
use crate::identity::AuthUser;
use crate::nutrition::{DietGoal, Macros};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/planner", get(view_plan).put(set_entries))
        .route("/planner/grocery-list", get(grocery_list))
        .route("/planner/suggestions", get(suggestions))
}

#[instrument(skip(state))]
async fn view_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<PlanView>, Error> {
    let date = services::parse_plan_date(q.date.as_deref());
    let Some(plan) = repo::find_plan(&state.db, user_id, date).await? else {
        return Ok(Json(PlanView {
            date: date.to_string(),
            entries: vec![],
            totals: Macros::ZERO,
        }));
    };
    Ok(Json(build_view(&state, date.to_string(), &plan).await?))
}

#[instrument(skip(state, body))]
async fn set_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DateQuery>,
    Json(body): Json<SetEntriesRequest>,
) -> Result<Json<PlanView>, Error> {
    let date = services::parse_plan_date(q.date.as_deref());
    let plan = repo::get_or_create_plan(&state.db, user_id, date).await?;

    let entries: Vec<_> = body
        .entries
        .into_iter()
        .map(|e| (e.slot, e.recipe_id))
        .collect();
    repo::replace_entries(&state.db, plan.id, &entries).await?;

    Ok(Json(build_view(&state, date.to_string(), &plan).await?))
}

#[instrument(skip(state))]
async fn grocery_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<GroceryListView>, Error> {
    let date = services::parse_plan_date(q.date.as_deref());
    let items = match repo::find_plan(&state.db, user_id, date).await? {
        Some(plan) => {
            let contents = services::load_plan_contents(&state, &plan).await?;
            services::grocery_items(
                contents
                    .ingredients
                    .iter()
                    .map(|i| (i.name.as_str(), i.unit.as_deref(), i.quantity)),
            )
        }
        None => vec![],
    };
    Ok(Json(GroceryListView {
        date: date.to_string(),
        items,
    }))
}

#[instrument(skip(state))]
async fn suggestions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<GoalQuery>,
) -> Result<Json<SuggestionsView>, Error> {
    let goal = DietGoal::parse(q.goal.as_deref().unwrap_or_default());
    let ranked = services::suggestions(&state, user_id, goal).await?;
    Ok(Json(SuggestionsView {
        goal: goal.as_str(),
        recipes: ranked
            .into_iter()
            .map(|(recipe, score)| SuggestionView {
                id: recipe.id,
                name: recipe.name,
                score,
            })
            .collect(),
    }))
}

async fn build_view(state: &AppState, date: String, plan: &repo::MealPlan) -> Result<PlanView, Error> {
    let contents = services::load_plan_contents(state, plan).await?;
    let totals = services::daily_totals(state, &contents);
    Ok(PlanView {
        date,
        entries: contents
            .entries
            .iter()
            .map(|(entry, recipe)| EntryView {
                slot: entry.meal_slot.clone(),
                recipe_id: recipe.id,
                recipe_name: recipe.name.clone(),
            })
            .collect(),
        totals,
    })
}
