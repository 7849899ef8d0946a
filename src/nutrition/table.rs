use std::ops::{Add, AddAssign};

use serde::Serialize;

/// Macro-nutrient amounts: grams for protein/carbs/fats, kcal for calories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

impl Macros {
    pub const ZERO: Self = Self {
        protein: 0.0,
        carbs: 0.0,
        fats: 0.0,
        calories: 0.0,
    };

    pub const fn new(protein: f64, carbs: f64, fats: f64, calories: f64) -> Self {
        Self {
            protein,
            carbs,
            fats,
            calories,
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fats: self.fats * factor,
            calories: self.calories * factor,
        }
    }
}

impl Add for Macros {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fats: self.fats + rhs.fats,
            calories: self.calories + rhs.calories,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// The basis a table entry's macro values are expressed at. Declaration
/// order is the preference order used when an entry carries several bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    Per100g,
    PerCup,
    PerPiece,
    PerSlice,
    PerTbsp,
}

impl Basis {
    pub const PREFERENCE: [Basis; 5] = [
        Basis::Per100g,
        Basis::PerCup,
        Basis::PerPiece,
        Basis::PerSlice,
        Basis::PerTbsp,
    ];

    /// Unit spellings that count as this basis's natural unit. `Per100g`
    /// is handled separately (grams vs. kilograms vs. servings).
    pub fn natural_units(self) -> &'static [&'static str] {
        match self {
            Basis::Per100g => &[],
            Basis::PerCup => &["cup", "cups"],
            Basis::PerPiece => &["piece", "pieces", "pc", "pcs"],
            Basis::PerSlice => &["slice", "slices"],
            Basis::PerTbsp => &["tbsp", "tablespoon", "tablespoons"],
        }
    }
}

pub struct FoodEntry {
    pub keyword: String,
    pub bases: Vec<(Basis, Macros)>,
}

/// Keyword table behind the estimator. Entry order matters: lookup is
/// first-match by substring, so earlier entries shadow later ones.
/// Immutable once built; inject a synthetic one in tests.
pub struct NutritionTable {
    entries: Vec<FoodEntry>,
}

impl NutritionTable {
    pub fn new(entries: Vec<FoodEntry>) -> Self {
        Self { entries }
    }

    /// First entry whose keyword occurs in the lower-cased name, with the
    /// preferred basis present on that entry.
    pub fn lookup(&self, name: &str) -> Option<(Basis, Macros)> {
        let name = name.to_lowercase();
        let entry = self.entries.iter().find(|e| name.contains(&e.keyword))?;
        Basis::PREFERENCE.iter().find_map(|wanted| {
            entry
                .bases
                .iter()
                .find(|(basis, _)| basis == wanted)
                .copied()
        })
    }

    /// Coarse demo table. Values are approximate and per basis unit; this
    /// is a heuristic, not a validated food database.
    pub fn builtin() -> Self {
        use Basis::*;

        fn e(keyword: &str, bases: &[(Basis, Macros)]) -> FoodEntry {
            FoodEntry {
                keyword: keyword.to_string(),
                bases: bases.to_vec(),
            }
        }

        Self::new(vec![
            e("chicken", &[(Per100g, Macros::new(31.0, 0.0, 3.6, 165.0))]),
            e("beef", &[(Per100g, Macros::new(26.0, 0.0, 15.0, 250.0))]),
            e("tofu", &[(Per100g, Macros::new(8.0, 2.0, 4.0, 76.0))]),
            e("egg", &[(PerPiece, Macros::new(6.0, 0.6, 5.0, 72.0))]),
            e("rice", &[(PerCup, Macros::new(4.3, 45.0, 0.4, 205.0))]),
            e("pasta", &[(PerCup, Macros::new(8.0, 43.0, 1.3, 221.0))]),
            e("bread", &[(PerSlice, Macros::new(3.0, 12.0, 1.0, 66.0))]),
            e("avocado", &[(Per100g, Macros::new(2.0, 9.0, 15.0, 160.0))]),
            e("olive oil", &[(PerTbsp, Macros::new(0.0, 0.0, 14.0, 119.0))]),
            e("banana", &[(PerPiece, Macros::new(1.3, 27.0, 0.4, 105.0))]),
            e("milk", &[(PerCup, Macros::new(8.0, 12.0, 8.0, 150.0))]),
            e("yogurt", &[(PerCup, Macros::new(9.0, 17.0, 4.0, 149.0))]),
            e("peanut", &[(Per100g, Macros::new(26.0, 16.0, 49.0, 567.0))]),
            e("bean", &[(PerCup, Macros::new(15.0, 45.0, 1.0, 240.0))]),
            e("fish", &[(Per100g, Macros::new(22.0, 0.0, 12.0, 206.0))]),
            e("potato", &[(Per100g, Macros::new(2.0, 17.0, 0.1, 77.0))]),
            e(
                "sweet potato",
                &[(Per100g, Macros::new(1.6, 20.0, 0.0, 86.0))],
            ),
            e("quinoa", &[(PerCup, Macros::new(8.0, 39.0, 3.5, 222.0))]),
            e("cheese", &[(Per100g, Macros::new(25.0, 1.3, 33.0, 402.0))]),
            e("spinach", &[(Per100g, Macros::new(2.9, 3.6, 0.4, 23.0))]),
            e("tomato", &[(Per100g, Macros::new(0.9, 3.9, 0.2, 18.0))]),
        ])
    }
}

#[cfg(test)]
mod table_tests {
    use super::*;

    #[test]
    fn lookup_is_first_match_by_substring() {
        // "sweet potato" contains "potato", which sits earlier in the
        // table, so the plain potato entry wins. Documented behavior.
        let table = NutritionTable::builtin();
        let (basis, macros) = table.lookup("mashed sweet potato").unwrap();
        assert_eq!(basis, Basis::Per100g);
        assert_eq!(macros.calories, 77.0);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = NutritionTable::builtin();
        assert!(table.lookup("Grilled CHICKEN breast").is_some());
    }

    #[test]
    fn lookup_misses_return_none() {
        let table = NutritionTable::builtin();
        assert!(table.lookup("xyzzy").is_none());
    }

    #[test]
    fn basis_preference_picks_per_100g_first() {
        let table = NutritionTable::new(vec![FoodEntry {
            keyword: "widget".into(),
            bases: vec![
                (Basis::PerCup, Macros::new(1.0, 1.0, 1.0, 10.0)),
                (Basis::Per100g, Macros::new(2.0, 2.0, 2.0, 20.0)),
            ],
        }]);
        let (basis, macros) = table.lookup("widget").unwrap();
        assert_eq!(basis, Basis::Per100g);
        assert_eq!(macros.calories, 20.0);
    }
}
