use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::nutrition::Macros;

/// The three meal slots a plan day carries. Slots without an assignment
/// simply have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoalQuery {
    pub goal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetEntriesRequest {
    pub entries: Vec<EntryAssignment>,
}

#[derive(Debug, Deserialize)]
pub struct EntryAssignment {
    pub slot: MealSlot,
    pub recipe_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub date: String,
    pub entries: Vec<EntryView>,
    /// Heuristic macro totals across the day's recipes.
    pub totals: Macros,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub slot: String,
    pub recipe_id: Uuid,
    pub recipe_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroceryItem {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
}

#[derive(Debug, Serialize)]
pub struct GroceryListView {
    pub date: String,
    pub items: Vec<GroceryItem>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsView {
    pub goal: &'static str,
    pub recipes: Vec<SuggestionView>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionView {
    pub id: Uuid,
    pub name: String,
    pub score: f64,
}
