use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::estimator::estimate;
use super::table::{Macros, NutritionTable};

/// How many ranked suggestions callers get back.
pub const TOP_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietGoal {
    HighProtein,
    LowCarb,
    Balanced,
}

impl DietGoal {
    /// Lenient parse for query strings: case-insensitive, spaces collapse
    /// to underscores, anything unrecognized means `Balanced`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().replace(' ', "_").as_str() {
            "high_protein" => Self::HighProtein,
            "low_carb" => Self::LowCarb,
            _ => Self::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighProtein => "high_protein",
            Self::LowCarb => "low_carb",
            Self::Balanced => "balanced",
        }
    }
}

/// Recipe-level totals: the sum of per-ingredient estimates. An empty
/// ingredient list totals to zero.
pub fn recipe_totals<'a, I>(table: &NutritionTable, ingredients: I) -> Macros
where
    I: IntoIterator<Item = (&'a str, Option<f64>, Option<&'a str>)>,
{
    ingredients
        .into_iter()
        .fold(Macros::ZERO, |acc, (name, quantity, unit)| {
            acc + estimate(table, name, quantity, unit)
        })
}

/// Score recipe totals against a goal; higher is always better.
pub fn score(totals: Macros, goal: DietGoal) -> f64 {
    let calories = totals.calories.max(1.0);
    match goal {
        DietGoal::HighProtein => totals.protein / calories * 100.0,
        DietGoal::LowCarb => -(totals.carbs / calories * 100.0),
        DietGoal::Balanced => {
            // only an exactly-zero sum is substituted; tiny sums still
            // divide by their real value
            let sum = match totals.protein + totals.carbs + totals.fats {
                s if s == 0.0 => 1.0,
                s => s,
            };
            let third = 1.0 / 3.0;
            -[totals.protein, totals.carbs, totals.fats]
                .iter()
                .map(|m| (m / sum - third).abs())
                .sum::<f64>()
        }
    }
}

/// Top-`n` candidates descending by score; ties keep their original
/// relative order.
pub fn rank_top<T>(mut scored: Vec<(T, f64)>, n: usize) -> Vec<(T, f64)> {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(n);
    scored
}
