use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageClient;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// One uploaded file, pulled out of the multipart body at the boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Per-file rejection. This is the warning channel: a rejected file is
/// reported against that file only and never aborts the surrounding save.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("{0:?}: file type not allowed (jpg, jpeg, png, gif, webp)")]
    BadExtension(String),
    #[error("{0:?}: file exceeds the {1} byte upload limit")]
    TooLarge(String, u64),
}

/// The entity an image row hangs off. Exactly one owner, enforced by the
/// type rather than by three nullable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwner {
    Recipe(Uuid),
    Ingredient(Uuid),
    Step(Uuid),
}

impl ImageOwner {
    pub fn id(self) -> Uuid {
        match self {
            Self::Recipe(id) | Self::Ingredient(id) | Self::Step(id) => id,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Self::Recipe(_) => "recipe",
            Self::Ingredient(_) => "ingredient",
            Self::Step(_) => "step",
        }
    }

    /// Split into the three nullable columns of the `images` table.
    pub fn columns(self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Recipe(id) => (Some(id), None, None),
            Self::Ingredient(id) => (None, Some(id), None),
            Self::Step(id) => (None, None, Some(id)),
        }
    }

    /// Rebuild the owner from a stored row. A row with zero or multiple
    /// owner references violates the schema invariant and is refused.
    pub fn from_columns(
        recipe_id: Option<Uuid>,
        ingredient_id: Option<Uuid>,
        step_id: Option<Uuid>,
    ) -> Result<Self, InvalidOwner> {
        match (recipe_id, ingredient_id, step_id) {
            (Some(id), None, None) => Ok(Self::Recipe(id)),
            (None, Some(id), None) => Ok(Self::Ingredient(id)),
            (None, None, Some(id)) => Ok(Self::Step(id)),
            _ => Err(InvalidOwner),
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("image row must reference exactly one of recipe, ingredient, step")]
pub struct InvalidOwner;

/// An image row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub owner: ImageOwner,
}

/// Build the row attaching a stored URL to its single owner.
pub fn attach(url: String, owner: ImageOwner) -> NewImage {
    NewImage {
        id: Uuid::new_v4(),
        url,
        alt_text: None,
        caption: None,
        owner,
    }
}

pub fn validate(file: &UploadedFile, max_bytes: u64) -> Result<(), UploadRejection> {
    match extension(&file.filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(UploadRejection::BadExtension(file.filename.clone())),
    }
    if file.body.len() as u64 > max_bytes {
        return Err(UploadRejection::TooLarge(file.filename.clone(), max_bytes));
    }
    Ok(())
}

/// Store a validated file under a fresh key and return its durable URL.
/// A failing collaborator surfaces here and aborts the caller's
/// transaction; it never leaves half-written in-memory state behind.
pub async fn store(storage: &dyn StorageClient, file: &UploadedFile) -> anyhow::Result<String> {
    let ext = extension(&file.filename).unwrap_or_else(|| "bin".into());
    let key = format!("images/{}.{}", Uuid::new_v4(), ext);
    storage.store(&key, file.body.clone(), &file.content_type).await
}

fn extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

#[cfg(test)]
mod image_tests {
    use super::*;

    fn file(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            content_type: "application/octet-stream".into(),
            body: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn allowed_extensions_pass_case_insensitively() {
        for name in ["a.jpg", "b.JPEG", "c.png", "d.gif", "e.WebP"] {
            assert_eq!(validate(&file(name, 10), 1024), Ok(()));
        }
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        for name in ["evil.exe", "doc.pdf", "noext", "archive.tar.gz"] {
            assert!(matches!(
                validate(&file(name, 10), 1024),
                Err(UploadRejection::BadExtension(_))
            ));
        }
    }

    #[test]
    fn oversized_files_are_rejected() {
        assert!(matches!(
            validate(&file("a.jpg", 2048), 1024),
            Err(UploadRejection::TooLarge(_, 1024))
        ));
        // exactly at the limit is fine
        assert_eq!(validate(&file("a.jpg", 1024), 1024), Ok(()));
    }

    #[test]
    fn owner_round_trips_through_columns() {
        let id = Uuid::new_v4();
        for owner in [
            ImageOwner::Recipe(id),
            ImageOwner::Ingredient(id),
            ImageOwner::Step(id),
        ] {
            let (r, i, s) = owner.columns();
            assert_eq!(ImageOwner::from_columns(r, i, s), Ok(owner));
            assert_eq!(
                [r.is_some(), i.is_some(), s.is_some()]
                    .iter()
                    .filter(|set| **set)
                    .count(),
                1
            );
        }
    }

    #[test]
    fn zero_or_multiple_owner_columns_are_refused() {
        let id = Uuid::new_v4();
        assert_eq!(ImageOwner::from_columns(None, None, None), Err(InvalidOwner));
        assert_eq!(
            ImageOwner::from_columns(Some(id), Some(id), None),
            Err(InvalidOwner)
        );
        assert_eq!(
            ImageOwner::from_columns(Some(id), Some(id), Some(id)),
            Err(InvalidOwner)
        );
    }

    #[tokio::test]
    async fn a_failing_collaborator_surfaces_from_store() {
        let storage = crate::state::fake_storage::FakeStorage {
            fail_store: true,
            ..Default::default()
        };
        let err = store(&storage, &file("photo.jpg", 4)).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert!(storage.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_derives_key_from_the_file_extension() {
        let storage = crate::state::fake_storage::FakeStorage::default();
        let url = store(&storage, &file("photo.JPG", 4)).await.unwrap();
        assert!(url.starts_with("https://storage.test/images/"));
        assert!(url.ends_with(".jpg"));
    }
}
