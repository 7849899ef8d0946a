mod estimator;
mod score;
mod table;

pub use estimator::estimate;
pub use score::{rank_top, recipe_totals, score, DietGoal, TOP_SUGGESTIONS};
pub use table::{Basis, FoodEntry, Macros, NutritionTable};
