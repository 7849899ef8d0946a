use std::collections::HashMap;

use axum::extract::Multipart;

use super::dto::{IngredientInput, RecipeForm, StepInput};
use crate::error::Error;
use crate::images::UploadedFile;

/// Raw multipart payload: scalar fields, `name[]` repeated fields, files.
/// Kept separate from [`RecipeForm`] so the zip logic is testable without
/// a multipart body.
#[derive(Debug, Default)]
pub(crate) struct RawRecipeFields {
    pub scalars: HashMap<String, String>,
    pub arrays: HashMap<String, Vec<String>>,
    pub files: Vec<(String, UploadedFile)>,
}

/// Drain the multipart body into a structured [`RecipeForm`]. The wire
/// contract is index-correlated parallel arrays; they are zipped into
/// per-record structs here, once, so nothing downstream ever touches a
/// bare index again.
pub async fn parse_recipe_form(mut mp: Multipart) -> Result<RecipeForm, Error> {
    let mut raw = RawRecipeFields::default();

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(wire_name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_string) {
            if filename.is_empty() {
                // file input submitted with no file selected
                continue;
            }
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(format!("failed reading {wire_name}: {e}")))?;
            raw.files.push((
                wire_name.trim_end_matches("[]").to_string(),
                UploadedFile {
                    filename,
                    content_type,
                    body,
                },
            ));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| Error::BadRequest(format!("failed reading {wire_name}: {e}")))?;

        if let Some(name) = wire_name.strip_suffix("[]") {
            raw.arrays.entry(name.to_string()).or_default().push(value);
        } else {
            raw.scalars.insert(wire_name, value);
        }
    }

    Ok(assemble(raw))
}

pub(crate) fn assemble(raw: RawRecipeFields) -> RecipeForm {
    let mut form = RecipeForm {
        name: raw
            .scalars
            .get("name")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        description: raw.scalars.get("description").and_then(|s| opt_text(s)),
        public: raw
            .scalars
            .get("public")
            .map(|s| parse_bool(s))
            .unwrap_or(true),
        category_id: raw.scalars.get("category_id").and_then(|s| parse_ref_id(s)),
        origin_id: raw.scalars.get("origin_id").and_then(|s| parse_ref_id(s)),
        ..RecipeForm::default()
    };

    // Ingredient records: one per name cell; shorter sibling arrays
    // default their missing cells to None.
    let names = raw.arrays.get("ingredient_names");
    for (i, name) in names.into_iter().flatten().enumerate() {
        form.ingredients.push(IngredientInput {
            name: name.trim().to_string(),
            quantity: cell(&raw.arrays, "ingredient_quantities", i).and_then(parse_f64),
            unit: cell(&raw.arrays, "ingredient_units", i).and_then(opt_text),
            notes: cell(&raw.arrays, "ingredient_notes", i).and_then(opt_text),
        });
    }

    // Step records: one per instruction cell.
    let instructions = raw.arrays.get("step_instructions");
    for (i, instruction) in instructions.into_iter().flatten().enumerate() {
        form.steps.push(StepInput {
            number: cell(&raw.arrays, "step_numbers", i).and_then(parse_i32),
            name: cell(&raw.arrays, "step_names", i).and_then(opt_text),
            instruction: instruction.trim().to_string(),
            duration_minutes: cell(&raw.arrays, "step_durations", i).and_then(parse_i32),
            description: cell(&raw.arrays, "step_descriptions", i).and_then(opt_text),
        });
    }

    for (field, file) in raw.files {
        if field == "recipe_images" || field == "recipe_image" {
            form.recipe_images.push(file);
        } else if let Some(idx) = indexed_field(&field, "ingredient_image_") {
            form.ingredient_images.entry(idx).or_default().push(file);
        } else if let Some(idx) = indexed_field(&field, "step_image_") {
            form.step_images.entry(idx).or_default().push(file);
        }
        // unknown file fields are dropped
    }

    form
}

fn cell<'a>(arrays: &'a HashMap<String, Vec<String>>, name: &str, i: usize) -> Option<&'a str> {
    arrays.get(name).and_then(|v| v.get(i)).map(String::as_str)
}

fn indexed_field(field: &str, prefix: &str) -> Option<usize> {
    field.strip_prefix(prefix)?.parse().ok()
}

fn opt_text(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Permissive: empty or unparsable numbers become absent, never an error.
fn parse_f64(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse().ok()
}

fn parse_i32(s: &str) -> Option<i32> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse().ok()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "true" | "1" | "on" | "yes" | "y"
    )
}

/// Reference-data selects send 0 for "none selected".
fn parse_ref_id(s: &str) -> Option<i32> {
    parse_i32(s).filter(|id| *id != 0)
}

#[cfg(test)]
mod form_tests {
    use super::*;

    fn arrays(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn scalars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parallel_arrays_zip_into_records() {
        let form = assemble(RawRecipeFields {
            scalars: scalars(&[("name", "Fried rice"), ("public", "on")]),
            arrays: arrays(&[
                ("ingredient_names", &["rice", "egg"]),
                ("ingredient_quantities", &["2", "3"]),
                ("ingredient_units", &["cups", "pcs"]),
                ("ingredient_notes", &["day-old", ""]),
            ]),
            files: vec![],
        });
        assert_eq!(form.name, "Fried rice");
        assert!(form.public);
        assert_eq!(form.ingredients.len(), 2);
        assert_eq!(
            form.ingredients[0],
            IngredientInput {
                name: "rice".into(),
                quantity: Some(2.0),
                unit: Some("cups".into()),
                notes: Some("day-old".into()),
            }
        );
        assert_eq!(form.ingredients[1].notes, None);
    }

    #[test]
    fn shorter_sibling_arrays_default_to_absent() {
        let form = assemble(RawRecipeFields {
            arrays: arrays(&[
                ("ingredient_names", &["rice", "egg", "salt"]),
                ("ingredient_quantities", &["2"]),
            ]),
            ..Default::default()
        });
        assert_eq!(form.ingredients.len(), 3);
        assert_eq!(form.ingredients[0].quantity, Some(2.0));
        assert_eq!(form.ingredients[1].quantity, None);
        assert_eq!(form.ingredients[2].quantity, None);
    }

    #[test]
    fn unparsable_quantities_become_absent_not_errors() {
        let form = assemble(RawRecipeFields {
            arrays: arrays(&[
                ("ingredient_names", &["rice", "egg", "salt"]),
                ("ingredient_quantities", &["two", "", "1.5"]),
            ]),
            ..Default::default()
        });
        assert_eq!(form.ingredients[0].quantity, None);
        assert_eq!(form.ingredients[1].quantity, None);
        assert_eq!(form.ingredients[2].quantity, Some(1.5));
    }

    #[test]
    fn step_records_zip_off_the_instruction_array() {
        let form = assemble(RawRecipeFields {
            arrays: arrays(&[
                ("step_instructions", &["Chop.", "Fry."]),
                ("step_numbers", &["5", "not-a-number"]),
                ("step_durations", &["10"]),
            ]),
            ..Default::default()
        });
        assert_eq!(form.steps.len(), 2);
        assert_eq!(form.steps[0].number, Some(5));
        assert_eq!(form.steps[0].duration_minutes, Some(10));
        assert_eq!(form.steps[1].number, None);
        assert_eq!(form.steps[1].duration_minutes, None);
    }

    #[test]
    fn zero_reference_ids_mean_none_selected() {
        let form = assemble(RawRecipeFields {
            scalars: scalars(&[("category_id", "0"), ("origin_id", "7")]),
            ..Default::default()
        });
        assert_eq!(form.category_id, None);
        assert_eq!(form.origin_id, Some(7));
    }

    #[test]
    fn public_defaults_to_true_when_absent() {
        let form = assemble(RawRecipeFields::default());
        assert!(form.public);
        let form = assemble(RawRecipeFields {
            scalars: scalars(&[("public", "false")]),
            ..Default::default()
        });
        assert!(!form.public);
    }

    #[test]
    fn files_route_by_owner_field_and_index() {
        use bytes::Bytes;
        let file = |name: &str| UploadedFile {
            filename: name.into(),
            content_type: "image/jpeg".into(),
            body: Bytes::from_static(b"x"),
        };
        let form = assemble(RawRecipeFields {
            files: vec![
                ("recipe_images".into(), file("main.jpg")),
                ("ingredient_image_2".into(), file("rice.jpg")),
                ("step_image_0".into(), file("chop.jpg")),
                ("mystery_field".into(), file("dropped.jpg")),
            ],
            ..Default::default()
        });
        assert_eq!(form.recipe_images.len(), 1);
        assert_eq!(form.ingredient_images[&2].len(), 1);
        assert_eq!(form.step_images[&0].len(), 1);
        assert_eq!(form.ingredient_images.len(), 1);
    }
}
