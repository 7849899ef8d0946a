use std::collections::BTreeMap;

use sqlx::{Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use super::dto::{IngredientInput, RecipeForm, StepInput};
use super::repo::{self, NewIngredient, NewRecipe, NewStep};
use crate::error::{Error, FieldErrors};
use crate::images::{self, ImageOwner, UploadedFile};
use crate::state::AppState;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 10_000;

pub struct SavedRecipe {
    pub id: Uuid,
    pub warnings: Vec<String>,
}

/// Create the whole aggregate in one transaction: recipe, then ingredient
/// and step sets, then image attachments. Any failure past `begin` rolls
/// everything back; nothing partially persists.
pub async fn create_recipe(
    state: &AppState,
    user_id: Uuid,
    form: RecipeForm,
) -> Result<SavedRecipe, Error> {
    validate_form(&form)?;

    let recipe_id = Uuid::new_v4();
    let mut tx = state.db.begin().await?;

    repo::insert_recipe_tx(&mut tx, &new_recipe(recipe_id, user_id, &form)).await?;
    let warnings = insert_children(state, &mut tx, recipe_id, user_id, &form).await?;

    tx.commit().await?;
    Ok(SavedRecipe {
        id: recipe_id,
        warnings,
    })
}

/// Edit is replace, not merge: the ingredient and step sets are cleared
/// and rebuilt from the submitted form, so callers must always resend the
/// full set. A newly supplied main image replaces the recipe-level image
/// rows.
pub async fn edit_recipe(
    state: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    form: RecipeForm,
) -> Result<SavedRecipe, Error> {
    // ownership first: a non-owner gets 403/404, never field errors
    authorize_owner(state, user_id, recipe_id).await?;
    validate_form(&form)?;

    let mut tx = state.db.begin().await?;

    repo::update_recipe_tx(&mut tx, &new_recipe(recipe_id, user_id, &form)).await?;

    let mut stale_urls = repo::child_image_urls_tx(&mut tx, recipe_id).await?;
    repo::delete_children_tx(&mut tx, recipe_id).await?;
    if !form.recipe_images.is_empty() {
        stale_urls.extend(repo::delete_recipe_images_tx(&mut tx, recipe_id).await?);
    }

    let warnings = insert_children(state, &mut tx, recipe_id, user_id, &form).await?;

    tx.commit().await?;
    cleanup_stored_objects(state, &stale_urls).await;

    Ok(SavedRecipe {
        id: recipe_id,
        warnings,
    })
}

pub async fn delete_recipe(state: &AppState, user_id: Uuid, recipe_id: Uuid) -> Result<(), Error> {
    authorize_owner(state, user_id, recipe_id).await?;

    let urls = repo::all_image_urls(&state.db, recipe_id).await?;

    let mut tx = state.db.begin().await?;
    repo::delete_recipe_tx(&mut tx, recipe_id).await?;
    tx.commit().await?;

    cleanup_stored_objects(state, &urls).await;
    Ok(())
}

/// Best-effort storage cleanup for rows already removed by a committed
/// transaction. Failures only log; the database is the source of truth.
async fn cleanup_stored_objects(state: &AppState, urls: &[String]) {
    for url in urls {
        if let Err(e) = state.storage.delete(url).await {
            warn!(%url, error = %e, "failed to delete stored object");
        }
    }
}

// ---- pieces ----

pub(crate) fn validate_form(form: &RecipeForm) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    let name_len = form.name.trim().chars().count();
    if name_len < NAME_MIN_CHARS {
        errors.push("name", format!("must be at least {NAME_MIN_CHARS} characters"));
    } else if name_len > NAME_MAX_CHARS {
        errors.push("name", format!("must be at most {NAME_MAX_CHARS} characters"));
    }
    if let Some(description) = &form.description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(
                "description",
                format!("must be at most {DESCRIPTION_MAX_CHARS} characters"),
            );
        }
    }
    errors.into_result()
}

fn new_recipe<'a>(id: Uuid, user_id: Uuid, form: &'a RecipeForm) -> NewRecipe<'a> {
    NewRecipe {
        id,
        user_id,
        name: form.name.trim(),
        description: form.description.as_deref(),
        public: form.public,
        category_id: form.category_id,
        origin_id: form.origin_id,
    }
}

async fn authorize_owner(state: &AppState, user_id: Uuid, recipe_id: Uuid) -> Result<(), Error> {
    let recipe = repo::get_recipe(&state.db, recipe_id)
        .await?
        .ok_or(Error::NotFound)?;
    if recipe.user_id != user_id {
        return Err(Error::Forbidden);
    }
    Ok(())
}

/// Insert ingredient rows, step rows and image attachments for the recipe.
/// Returns the per-file upload warnings collected along the way.
async fn insert_children(
    state: &AppState,
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    user_id: Uuid,
    form: &RecipeForm,
) -> Result<Vec<String>, Error> {
    let ingredients = ingredient_rows(recipe_id, user_id, form.public, &form.ingredients);
    for (_, row) in &ingredients {
        repo::insert_ingredient_tx(tx, row).await?;
    }

    let steps = step_rows(recipe_id, &form.steps);
    for (_, row) in &steps {
        repo::insert_step_tx(tx, row).await?;
    }

    let mut warnings = Vec::new();

    for file in &form.recipe_images {
        attach_file(state, tx, &mut warnings, file, ImageOwner::Recipe(recipe_id)).await?;
    }
    for (idx, row) in &ingredients {
        for file in indexed_files(&form.ingredient_images, *idx) {
            attach_file(state, tx, &mut warnings, file, ImageOwner::Ingredient(row.id)).await?;
        }
    }
    for (idx, row) in &steps {
        for file in indexed_files(&form.step_images, *idx) {
            attach_file(state, tx, &mut warnings, file, ImageOwner::Step(row.id)).await?;
        }
    }

    Ok(warnings)
}

fn indexed_files(map: &BTreeMap<usize, Vec<UploadedFile>>, idx: usize) -> &[UploadedFile] {
    map.get(&idx).map(Vec::as_slice).unwrap_or(&[])
}

/// Validate → store → attach for one file. A validation rejection lands in
/// `warnings` and the save carries on; a storage or database failure is
/// fatal and bubbles up to roll the transaction back.
async fn attach_file(
    state: &AppState,
    tx: &mut Transaction<'_, Postgres>,
    warnings: &mut Vec<String>,
    file: &UploadedFile,
    owner: ImageOwner,
) -> Result<(), Error> {
    if let Err(rejection) = images::validate(file, state.config.max_upload_bytes) {
        warn!(filename = %file.filename, owner = owner.kind(), %rejection, "upload rejected");
        warnings.push(rejection.to_string());
        return Ok(());
    }
    let url = images::store(state.storage.as_ref(), file)
        .await
        .map_err(Error::Storage)?;
    repo::insert_image_tx(tx, &images::attach(url, owner)).await?;
    Ok(())
}

/// Ingredient rows to persist, tagged with their source input index so
/// index-addressed image attachments can find them. Records whose name is
/// blank after trimming are dropped.
pub(crate) fn ingredient_rows(
    recipe_id: Uuid,
    user_id: Uuid,
    public: bool,
    inputs: &[IngredientInput],
) -> Vec<(usize, NewIngredient)> {
    inputs
        .iter()
        .enumerate()
        .filter(|(_, input)| !input.name.trim().is_empty())
        .map(|(idx, input)| {
            (
                idx,
                NewIngredient {
                    id: Uuid::new_v4(),
                    recipe_id,
                    user_id,
                    name: input.name.trim().to_string(),
                    unit: input.unit.clone(),
                    quantity: input.quantity,
                    notes: input.notes.clone(),
                    public,
                },
            )
        })
        .collect()
}

/// Step rows to persist. Records with a blank instruction are dropped;
/// an absent step number falls back to the 1-based input position.
pub(crate) fn step_rows(recipe_id: Uuid, inputs: &[StepInput]) -> Vec<(usize, NewStep)> {
    inputs
        .iter()
        .enumerate()
        .filter(|(_, input)| !input.instruction.trim().is_empty())
        .map(|(idx, input)| {
            (
                idx,
                NewStep {
                    id: Uuid::new_v4(),
                    recipe_id,
                    step_number: input.number.unwrap_or(idx as i32 + 1),
                    name: input.name.clone(),
                    instruction: input.instruction.trim().to_string(),
                    duration_minutes: input.duration_minutes,
                    description: input.description.clone(),
                },
            )
        })
        .collect()
}
