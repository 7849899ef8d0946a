use std::collections::{BTreeMap, HashMap};

use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::dto::GroceryItem;
use super::repo::{self, MealEntry, MealPlan};
use crate::error::Error;
use crate::nutrition::{self, DietGoal, Macros, TOP_SUGGESTIONS};
use crate::recipes::repo as recipes_repo;
use crate::recipes::repo::{Ingredient, Recipe};
use crate::state::AppState;

/// `YYYY-MM-DD`, falling back to today when absent or malformed.
pub fn parse_plan_date(raw: Option<&str>) -> Date {
    let format = format_description!("[year]-[month]-[day]");
    raw.and_then(|s| Date::parse(s.trim(), &format).ok())
        .unwrap_or_else(|| OffsetDateTime::now_utc().date())
}

/// What the plan's entries resolve to. Entries whose recipe has since been
/// deleted are dropped silently; ingredient lists repeat per entry, so a
/// recipe planned for two slots counts twice in totals and groceries.
pub struct PlanContents {
    pub entries: Vec<(MealEntry, Recipe)>,
    pub ingredients: Vec<Ingredient>,
}

pub async fn load_plan_contents(state: &AppState, plan: &MealPlan) -> Result<PlanContents, Error> {
    let entries = repo::entries_for_plan(&state.db, plan.id).await?;

    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(recipe) = recipes_repo::get_recipe(&state.db, entry.recipe_id).await? {
            resolved.push((entry, recipe));
        }
    }

    let recipe_ids: Vec<Uuid> = resolved.iter().map(|(_, r)| r.id).collect();
    let mut by_recipe: HashMap<Uuid, Vec<Ingredient>> = HashMap::new();
    for ingredient in recipes_repo::ingredients_for_recipes(&state.db, &recipe_ids).await? {
        by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    let mut ingredients = Vec::new();
    for (_, recipe) in &resolved {
        if let Some(rows) = by_recipe.get(&recipe.id) {
            ingredients.extend(rows.iter().cloned());
        }
    }

    Ok(PlanContents {
        entries: resolved,
        ingredients,
    })
}

pub fn daily_totals(state: &AppState, contents: &PlanContents) -> Macros {
    nutrition::recipe_totals(
        &state.nutrition,
        contents
            .ingredients
            .iter()
            .map(|i| (i.name.as_str(), i.quantity, i.unit.as_deref())),
    )
}

/// Union ingredient quantities into buckets keyed by lower-cased trimmed
/// (name, unit); absent quantities count as zero. Output is sorted by the
/// bucket key.
pub fn grocery_items<'a, I>(ingredients: I) -> Vec<GroceryItem>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>, Option<f64>)>,
{
    let mut buckets: BTreeMap<(String, String), f64> = BTreeMap::new();
    for (name, unit, quantity) in ingredients {
        let key = (
            name.trim().to_lowercase(),
            unit.unwrap_or("").trim().to_lowercase(),
        );
        *buckets.entry(key).or_insert(0.0) += quantity.unwrap_or(0.0);
    }
    buckets
        .into_iter()
        .map(|((name, unit), quantity)| GroceryItem {
            name,
            unit,
            quantity,
        })
        .collect()
}

/// Rank the recipes visible to the user against a dietary goal; top 10,
/// stable on score ties.
pub async fn suggestions(
    state: &AppState,
    user_id: Uuid,
    goal: DietGoal,
) -> Result<Vec<(Recipe, f64)>, Error> {
    let recipes = recipes_repo::list_visible(&state.db, user_id).await?;
    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();

    let mut by_recipe: HashMap<Uuid, Vec<Ingredient>> = HashMap::new();
    for ingredient in recipes_repo::ingredients_for_recipes(&state.db, &recipe_ids).await? {
        by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    let scored = recipes
        .into_iter()
        .map(|recipe| {
            let totals = nutrition::recipe_totals(
                &state.nutrition,
                by_recipe
                    .get(&recipe.id)
                    .into_iter()
                    .flatten()
                    .map(|i| (i.name.as_str(), i.quantity, i.unit.as_deref())),
            );
            let score = nutrition::score(totals, goal);
            (recipe, score)
        })
        .collect();

    Ok(nutrition::rank_top(scored, TOP_SUGGESTIONS))
}

#[cfg(test)]
mod planner_tests {
    use super::*;

    #[test]
    fn grocery_buckets_merge_across_recipes() {
        // two recipes both using rice by the cup end up in one bucket
        let items = grocery_items([
            ("Rice", Some("cup"), Some(2.0)),
            ("broccoli", Some("g"), Some(300.0)),
            ("rice ", Some("CUP"), Some(1.5)),
        ]);
        assert_eq!(
            items,
            vec![
                GroceryItem {
                    name: "broccoli".into(),
                    unit: "g".into(),
                    quantity: 300.0,
                },
                GroceryItem {
                    name: "rice".into(),
                    unit: "cup".into(),
                    quantity: 3.5,
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let items = grocery_items([
            ("rice", Some("cup"), Some(1.0)),
            ("rice", Some("g"), Some(200.0)),
        ]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn absent_quantities_count_as_zero() {
        let items = grocery_items([
            ("salt", Some("tsp"), None),
            ("salt", Some("tsp"), Some(0.5)),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 0.5);
    }

    #[test]
    fn missing_unit_buckets_under_the_empty_string() {
        let items = grocery_items([("lemon", None, Some(2.0)), ("lemon", Some(""), Some(1.0))]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3.0);
        assert_eq!(items[0].unit, "");
    }

    #[test]
    fn output_is_sorted_by_bucket_key() {
        let items = grocery_items([
            ("zucchini", Some("pcs"), Some(1.0)),
            ("apple", Some("pcs"), Some(2.0)),
            ("miso", Some("tbsp"), Some(1.0)),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["apple", "miso", "zucchini"]);
    }

    #[tokio::test]
    async fn daily_totals_sum_estimates_over_the_plan_ingredients() {
        let state = AppState::fake();
        let ingredient = |name: &str, quantity, unit: Option<&str>| Ingredient {
            id: Uuid::new_v4(),
            recipe_id: Uuid::new_v4(),
            name: name.into(),
            unit: unit.map(String::from),
            quantity,
            notes: None,
        };
        let contents = PlanContents {
            entries: vec![],
            ingredients: vec![
                ingredient("rice", Some(1.0), Some("cup")),
                ingredient("egg", Some(2.0), Some("pieces")),
            ],
        };
        let totals = daily_totals(&state, &contents);
        assert_eq!(totals.calories, 205.0 + 2.0 * 72.0);

        let empty = PlanContents {
            entries: vec![],
            ingredients: vec![],
        };
        assert_eq!(daily_totals(&state, &empty), Macros::ZERO);
    }

    #[test]
    fn plan_dates_parse_or_fall_back_to_today() {
        let parsed = parse_plan_date(Some("2024-03-09"));
        assert_eq!(parsed.to_string(), "2024-03-09");

        let today = OffsetDateTime::now_utc().date();
        assert_eq!(parse_plan_date(None), today);
        assert_eq!(parse_plan_date(Some("not-a-date")), today);
        assert_eq!(parse_plan_date(Some("2024-13-40")), today);
    }
}
