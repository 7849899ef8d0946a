use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::images::UploadedFile;
use crate::nutrition::Macros;

/// One ingredient record, already zipped out of the wire's parallel
/// arrays. Blank-name records are carried through and dropped by the
/// writer, mirroring the skip rule of the save path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientInput {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInput {
    pub number: Option<i32>,
    pub name: Option<String>,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

/// The whole aggregate-write input, parsed once at the boundary.
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub name: String,
    pub description: Option<String>,
    pub public: bool,
    pub category_id: Option<i32>,
    pub origin_id: Option<i32>,
    pub ingredients: Vec<IngredientInput>,
    pub steps: Vec<StepInput>,
    pub recipe_images: Vec<UploadedFile>,
    /// Sub-attachments keyed by the ingredient/step input index.
    pub ingredient_images: BTreeMap<usize, Vec<UploadedFile>>,
    pub step_images: BTreeMap<usize, Vec<UploadedFile>>,
}

// ---- responses ----

#[derive(Debug, Serialize)]
pub struct SavedRecipeResponse {
    pub id: Uuid,
    /// Per-file upload rejections that did not abort the save.
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct IngredientView {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepView {
    pub id: Uuid,
    pub step_number: i32,
    pub name: Option<String>,
    pub instruction: String,
    pub duration_minutes: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub owner_kind: &'static str,
    pub owner_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub public: bool,
    pub user_id: Uuid,
    pub category_id: Option<i32>,
    pub origin_id: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub ingredients: Vec<IngredientView>,
    pub steps: Vec<StepView>,
    pub images: Vec<ImageView>,
    /// Heuristic estimate, not validated nutrition data.
    pub nutrition: Macros,
}

#[derive(Debug, serde::Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
