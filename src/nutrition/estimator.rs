use super::table::{Basis, Macros, NutritionTable};

/// Best-effort macro estimate for one ingredient. Free-text name is matched
/// against the table by substring; an unknown name yields all zeros rather
/// than an error.
pub fn estimate(
    table: &NutritionTable,
    name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
) -> Macros {
    let Some((basis, base)) = table.lookup(name) else {
        return Macros::ZERO;
    };

    let unit = unit.map(|u| u.trim().to_lowercase()).unwrap_or_default();
    let factor = scale_factor(basis, quantity, &unit);
    base.scale(factor)
}

fn scale_factor(basis: Basis, quantity: Option<f64>, unit: &str) -> f64 {
    match basis {
        Basis::Per100g => match unit {
            "g" | "gram" | "grams" => quantity.unwrap_or(0.0) / 100.0,
            "kg" | "kilogram" | "kilograms" => quantity.unwrap_or(0.0) * 10.0,
            // unknown unit: treat the quantity as a serving count
            _ => quantity.unwrap_or(0.0).max(1.0),
        },
        counted => {
            if counted.natural_units().contains(&unit) {
                // absent (or zeroed) quantity means a single cup/piece/...
                quantity.filter(|q| *q != 0.0).unwrap_or(1.0)
            } else {
                quantity.unwrap_or(0.0).max(1.0)
            }
        }
    }
}

#[cfg(test)]
mod estimator_tests {
    use super::*;
    use crate::nutrition::table::FoodEntry;

    fn table() -> NutritionTable {
        NutritionTable::builtin()
    }

    #[test]
    fn unknown_ingredient_is_all_zero() {
        let got = estimate(&table(), "xyzzy", Some(5.0), Some("g"));
        assert_eq!(got, Macros::ZERO);
    }

    #[test]
    fn grams_scale_against_per_100g_basis() {
        let got = estimate(&table(), "chicken breast", Some(200.0), Some("g"));
        assert_eq!(got.protein, 62.0);
        assert_eq!(got.calories, 330.0);
    }

    #[test]
    fn doubling_a_weight_quantity_doubles_every_macro() {
        let once = estimate(&table(), "beef", Some(150.0), Some("g"));
        let twice = estimate(&table(), "beef", Some(300.0), Some("g"));
        assert_eq!(twice.protein, once.protein * 2.0);
        assert_eq!(twice.carbs, once.carbs * 2.0);
        assert_eq!(twice.fats, once.fats * 2.0);
        assert_eq!(twice.calories, once.calories * 2.0);
    }

    #[test]
    fn kilograms_scale_times_ten() {
        let got = estimate(&table(), "potato", Some(0.5), Some("kg"));
        assert_eq!(got.calories, 77.0 * 5.0);
    }

    #[test]
    fn unknown_unit_falls_back_to_serving_count_floored_at_one() {
        // 0.3 "handful" of cheese still counts as one serving
        let got = estimate(&table(), "cheese", Some(0.3), Some("handful"));
        assert_eq!(got.calories, 402.0);
        // but 3 servings scale
        let got = estimate(&table(), "cheese", Some(3.0), Some("handful"));
        assert_eq!(got.calories, 402.0 * 3.0);
    }

    #[test]
    fn natural_unit_uses_quantity_directly() {
        let got = estimate(&table(), "white rice", Some(2.0), Some("cups"));
        assert_eq!(got.carbs, 90.0);
        assert_eq!(got.calories, 410.0);
    }

    #[test]
    fn natural_unit_with_no_quantity_defaults_to_one() {
        let got = estimate(&table(), "banana", None, Some("piece"));
        assert_eq!(got.calories, 105.0);
    }

    #[test]
    fn plural_and_abbreviated_unit_forms_are_accepted() {
        let pieces = estimate(&table(), "egg", Some(3.0), Some("pcs"));
        assert_eq!(pieces.calories, 72.0 * 3.0);
        let tbsp = estimate(&table(), "olive oil", Some(2.0), Some("tablespoons"));
        assert_eq!(tbsp.fats, 28.0);
    }

    #[test]
    fn macros_never_negative_for_builtin_entries() {
        let t = table();
        for (name, qty, unit) in [
            ("rice", Some(2.0), Some("cups")),
            ("bread", Some(4.0), Some("slices")),
            ("spinach", Some(80.0), Some("g")),
            ("milk", None, None),
        ] {
            let m = estimate(&t, name, qty, unit);
            assert!(m.protein >= 0.0 && m.carbs >= 0.0 && m.fats >= 0.0 && m.calories >= 0.0);
        }
    }

    #[test]
    fn first_matching_keyword_wins_over_later_entries() {
        // synthetic table where the broad keyword precedes the specific one
        let t = NutritionTable::new(vec![
            FoodEntry {
                keyword: "beans".into(),
                bases: vec![(Basis::PerCup, Macros::new(1.0, 0.0, 0.0, 10.0))],
            },
            FoodEntry {
                keyword: "green beans".into(),
                bases: vec![(Basis::PerCup, Macros::new(2.0, 0.0, 0.0, 20.0))],
            },
        ]);
        let got = estimate(&t, "green beans", Some(1.0), Some("cup"));
        assert_eq!(got.calories, 10.0);
    }
}
