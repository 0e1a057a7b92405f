//! Object storage for product images.
//!
//! Images go into one public bucket under flat generated names, so the
//! public URL can be derived without asking the service.

use rand::Rng;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;

use super::{SupabaseClient, SupabaseError};

/// Random suffix alphabet, lowercase base 36.
const NAME_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of an object name.
const NAME_RANDOM_LEN: usize = 6;

/// Extension used when the uploaded file name has none.
const FALLBACK_EXTENSION: &str = "bin";

/// File extension of an upload, lowercased and limited to ASCII alphanumerics.
fn extension(file_name: &str) -> String {
    let ext: String = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if ext.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Object name for an upload: `<millis>_<random>.<ext>`.
#[must_use]
pub fn object_name(file_name: &str, timestamp_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..NAME_RANDOM_LEN)
        .map(|_| {
            let idx = rng.random_range(0..NAME_CHARSET.len());
            NAME_CHARSET.get(idx).copied().map_or('0', char::from)
        })
        .collect();

    format!("{timestamp_millis}_{suffix}.{}", extension(file_name))
}

impl SupabaseClient {
    /// Public URL of an object in the image bucket.
    #[must_use]
    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.inner.base_url,
            self.inner.bucket,
            urlencoding::encode(object_name)
        )
    }

    /// Upload an image and return its public URL.
    ///
    /// Existing objects are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the upload is rejected.
    #[instrument(skip(self, token, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        token: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SupabaseError> {
        let path = format!(
            "storage/v1/object/{}/{}",
            self.inner.bucket,
            urlencoding::encode(object_name)
        );
        let request = self
            .request(Method::POST, &path, Some(token))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);

        self.send(request).await?;
        Ok(self.public_url(object_name))
    }
}
