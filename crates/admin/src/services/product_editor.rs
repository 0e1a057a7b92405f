//! Saving the product form: upload images, then write the row.
//!
//! Uploads run one after another, before the row is written. A failed or
//! rejected upload is skipped rather than failing the save; the admin sees
//! the gallery that was actually stored.

use std::future::Future;

use thiserror::Error;
use tracing::instrument;

use fasatina_core::ProductId;

use crate::models::{ImageSet, ProductDraft, ProductFormError, ProductFormInput};
use crate::supabase::{SupabaseClient, SupabaseError, object_name};

/// Content type assumed when the browser sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Where the product form is written.
pub trait ProductStore: Clone + Send + Sync + 'static {
    /// Store one image and return its public URL.
    fn upload_image(
        &self,
        token: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, SupabaseError>> + Send;

    /// Insert a new product row.
    fn insert_product(
        &self,
        token: &str,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;

    /// Overwrite an existing product row.
    fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send;
}

impl ProductStore for SupabaseClient {
    fn upload_image(
        &self,
        token: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, SupabaseError>> + Send {
        Self::upload_image(self, token, object_name, content_type, bytes)
    }

    fn insert_product(
        &self,
        token: &str,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send {
        Self::insert_product(self, token, draft)
    }

    fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<(), SupabaseError>> + Send {
        Self::update_product(self, token, id, draft)
    }
}

/// One file from the form's image input.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Whether the form creates a product or edits one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    New,
    Existing(ProductId),
}

/// Why a save did not go through.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The form failed validation; nothing was uploaded.
    #[error(transparent)]
    Invalid(#[from] ProductFormError),
    /// The database rejected the row. `draft` holds what was attempted,
    /// including images already uploaded.
    #[error("Product write rejected: {source}")]
    Rejected {
        source: SupabaseError,
        draft: Box<ProductDraft>,
    },
}

/// Saves product forms against a store.
#[derive(Clone)]
pub struct ProductEditor<S> {
    store: S,
}

impl<S: ProductStore> ProductEditor<S> {
    /// Create an editor.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the form, upload its images, and write the row.
    ///
    /// `now_millis` prefixes every generated object name.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Invalid`] before any upload if the form does not
    /// validate, and [`SaveError::Rejected`] if the row write fails.
    #[instrument(skip(self, token, input, uploads), fields(files = uploads.len()))]
    pub async fn save(
        &self,
        token: &str,
        target: &SaveTarget,
        input: &ProductFormInput,
        uploads: Vec<ImageUpload>,
        now_millis: i64,
    ) -> Result<ProductDraft, SaveError> {
        let valid = input.validate()?;

        let images = ImageSet {
            kept: input.keep_images.clone(),
            uploaded: self.upload_all(token, uploads, now_millis).await,
        };
        let draft = ProductDraft::new(valid, &images, &input.default_choice());

        let written = match target {
            SaveTarget::New => self.store.insert_product(token, &draft).await,
            SaveTarget::Existing(id) => self.store.update_product(token, id, &draft).await,
        };

        match written {
            Ok(()) => Ok(draft),
            Err(source) => Err(SaveError::Rejected {
                source,
                draft: Box::new(draft),
            }),
        }
    }

    /// Upload each file, keeping its position; `None` marks a skipped file.
    async fn upload_all(
        &self,
        token: &str,
        uploads: Vec<ImageUpload>,
        now_millis: i64,
    ) -> Vec<Option<String>> {
        let mut urls = Vec::with_capacity(uploads.len());

        for upload in uploads {
            if !upload.is_image() {
                tracing::warn!(
                    file_name = %upload.file_name,
                    content_type = %upload.content_type,
                    "Skipping non-image upload"
                );
                urls.push(None);
                continue;
            }

            let name = object_name(&upload.file_name, now_millis);
            match self
                .store
                .upload_image(token, &name, &upload.content_type, upload.bytes)
                .await
            {
                Ok(url) => urls.push(Some(url)),
                Err(e) => {
                    tracing::warn!(error = %e, object = %name, "Image upload failed, skipping");
                    urls.push(None);
                }
            }
        }

        urls
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct MockStore {
        /// Object-name suffix whose uploads fail.
        failing_ext: Option<&'static str>,
        reject_writes: bool,
        uploads: Arc<Mutex<Vec<String>>>,
        inserted: Arc<Mutex<Vec<ProductDraft>>>,
        updated: Arc<Mutex<Vec<(ProductId, ProductDraft)>>>,
    }

    impl ProductStore for MockStore {
        fn upload_image(
            &self,
            _token: &str,
            object_name: &str,
            _content_type: &str,
            _bytes: Vec<u8>,
        ) -> impl Future<Output = Result<String, SupabaseError>> + Send {
            self.uploads.lock().unwrap().push(object_name.to_string());
            let fails = self
                .failing_ext
                .is_some_and(|ext| object_name.ends_with(ext));
            let result = if fails {
                Err(SupabaseError::Api {
                    status: 413,
                    message: "The object exceeded the maximum allowed size".to_string(),
                })
            } else {
                Ok(format!("https://cdn.test/{object_name}"))
            };
            std::future::ready(result)
        }

        fn insert_product(
            &self,
            _token: &str,
            draft: &ProductDraft,
        ) -> impl Future<Output = Result<(), SupabaseError>> + Send {
            self.inserted.lock().unwrap().push(draft.clone());
            std::future::ready(self.write_result())
        }

        fn update_product(
            &self,
            _token: &str,
            id: &ProductId,
            draft: &ProductDraft,
        ) -> impl Future<Output = Result<(), SupabaseError>> + Send {
            self.updated
                .lock()
                .unwrap()
                .push((id.clone(), draft.clone()));
            std::future::ready(self.write_result())
        }
    }

    impl MockStore {
        fn write_result(&self) -> Result<(), SupabaseError> {
            if self.reject_writes {
                Err(SupabaseError::Api {
                    status: 403,
                    message: "new row violates row-level security policy".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn input() -> ProductFormInput {
        ProductFormInput {
            name: "فستان صيفي".to_string(),
            price: "120".to_string(),
            category: "girls".to_string(),
            ..ProductFormInput::default()
        }
    }

    fn upload(file_name: &str, content_type: &str) -> ImageUpload {
        ImageUpload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }

    #[tokio::test]
    async fn test_invalid_form_uploads_nothing() {
        let store = MockStore::default();
        let editor = ProductEditor::new(store.clone());
        let form = ProductFormInput {
            price: String::new(),
            ..input()
        };

        let result = editor
            .save("t", &SaveTarget::New, &form, vec![upload("a.jpg", "image/jpeg")], 1)
            .await;

        assert!(matches!(
            result,
            Err(SaveError::Invalid(ProductFormError::MissingRequired))
        ));
        assert!(store.uploads.lock().unwrap().is_empty());
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_is_skipped() {
        let store = MockStore {
            failing_ext: Some(".png"),
            ..MockStore::default()
        };
        let editor = ProductEditor::new(store.clone());
        let form = ProductFormInput {
            default_image: "new:1".to_string(),
            ..input()
        };
        let files = vec![
            upload("front.jpg", "image/jpeg"),
            upload("back.png", "image/png"),
            upload("notes.pdf", "application/pdf"),
        ];

        let draft = editor
            .save("t", &SaveTarget::New, &form, files, 1_760_000_000_000)
            .await
            .unwrap();

        // The pdf never reaches the store
        assert_eq!(store.uploads.lock().unwrap().len(), 2);
        assert_eq!(draft.images.len(), 1);
        assert!(draft.images[0].starts_with("https://cdn.test/1760000000000_"));
        // Chosen default failed, so the first stored image is primary
        assert_eq!(draft.image_url, draft.images[0]);
        assert_eq!(store.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_keeps_gallery_and_updates() {
        let store = MockStore::default();
        let editor = ProductEditor::new(store.clone());
        let form = ProductFormInput {
            keep_images: vec!["https://cdn.test/old.jpg".to_string()],
            default_image: "new:0".to_string(),
            ..input()
        };

        let draft = editor
            .save(
                "t",
                &SaveTarget::Existing(ProductId::new("p1")),
                &form,
                vec![upload("new.webp", "image/webp")],
                5,
            )
            .await
            .unwrap();

        assert_eq!(draft.images.len(), 2);
        assert_eq!(draft.images[0], "https://cdn.test/old.jpg");
        assert_eq!(draft.image_url, draft.images[1]);

        let updated = store.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, ProductId::new("p1"));
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_write_keeps_uploads() {
        let store = MockStore {
            reject_writes: true,
            ..MockStore::default()
        };
        let editor = ProductEditor::new(store);

        let result = editor
            .save(
                "t",
                &SaveTarget::New,
                &input(),
                vec![upload("a.jpg", "image/jpeg")],
                1,
            )
            .await;

        let Err(SaveError::Rejected { source, draft }) = result else {
            panic!("expected rejection");
        };
        assert_eq!(
            source.provider_message(),
            "new row violates row-level security policy"
        );
        assert_eq!(draft.images.len(), 1);
    }
}
