//! Product management route handlers.
//!
//! Create and edit share one multipart form. Validation errors and rejected
//! writes re-render the form with what the admin typed; images that were
//! already uploaded stay in the gallery so a retry does not upload them again.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::instrument;

use fasatina_core::{Category, Product, ProductId};

use crate::{
    error::{AppError, Result},
    middleware::RequireAdminAuth,
    models::{ALL_SIZES, CurrentAdmin, ProductFormInput},
    services::{DEFAULT_CONTENT_TYPE, ImageUpload, ProductEditor, SaveError, SaveTarget},
    state::AppState,
};

use super::{NavLinks, dashboard::AdminUserView, or_empty};

/// Products list path; saves and deletes land here.
pub const PRODUCTS_PATH: &str = "/admin/products";

/// Largest accepted form submission, images included.
pub const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

/// File input name on the product form.
const IMAGES_FIELD: &str = "images";

/// Prefix of the banner shown when the database rejects a write.
const ERROR_PREFIX: &str = "حدث خطأ: ";

/// Product row for the list page.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub cart_count: i64,
    pub image_url: String,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            cart_count: product.cart_count,
            image_url: product.image_url.clone(),
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub nav: NavLinks,
    pub products: Vec<ProductRowView>,
    pub error: Option<String>,
}

/// Category `<option>`.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub slug: String,
    pub name: String,
    pub selected: bool,
}

/// Size checkbox.
#[derive(Debug, Clone)]
pub struct SizeOption {
    pub size: &'static str,
    pub checked: bool,
}

/// Stored gallery image on the edit form.
#[derive(Debug, Clone)]
pub struct GalleryImageView {
    pub url: String,
    pub is_default: bool,
}

/// Category options; the first is preselected when none is chosen.
fn category_options(categories: &[Category], chosen: &str) -> Vec<CategoryOption> {
    let chosen_known = categories.iter().any(|c| c.slug == chosen);
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| CategoryOption {
            slug: c.slug.clone(),
            name: c.name.clone(),
            selected: if chosen_known { c.slug == chosen } else { i == 0 },
        })
        .collect()
}

fn size_options(checked: &[String]) -> Vec<SizeOption> {
    ALL_SIZES
        .iter()
        .map(|&size| SizeOption {
            size,
            checked: checked.iter().any(|s| s == size),
        })
        .collect()
}

fn gallery_views(form: &ProductFormInput) -> Vec<GalleryImageView> {
    form.keep_images
        .iter()
        .map(|url| GalleryImageView {
            url: url.clone(),
            is_default: *url == form.default_image,
        })
        .collect()
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub nav: NavLinks,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: ProductFormInput,
    pub categories: Vec<CategoryOption>,
    pub sizes: Vec<SizeOption>,
    pub gallery: Vec<GalleryImageView>,
    pub error: Option<String>,
}

impl SaveTarget {
    fn heading(&self) -> &'static str {
        match self {
            Self::New => "إضافة منتج",
            Self::Existing(_) => "تعديل المنتج",
        }
    }

    fn submit_label(&self) -> &'static str {
        match self {
            Self::New => "✅ حفظ المنتج",
            Self::Existing(_) => "✅ حفظ التعديلات",
        }
    }

    fn action(&self) -> String {
        match self {
            Self::New => format!("{PRODUCTS_PATH}/new"),
            Self::Existing(id) => {
                format!("{PRODUCTS_PATH}/{}/edit", urlencoding::encode(id.as_str()))
            }
        }
    }
}

/// Render the form, loading the category list.
async fn render_form(
    state: &AppState,
    admin: &CurrentAdmin,
    target: &SaveTarget,
    form: ProductFormInput,
    error: Option<String>,
) -> Html<String> {
    let categories = or_empty(
        state.supabase().list_categories(admin.access_token()).await,
        "categories",
    );

    let template = ProductFormTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: PRODUCTS_PATH.to_string(),
        nav: NavLinks::new(state),
        heading: target.heading(),
        action: target.action(),
        submit_label: target.submit_label(),
        categories: category_options(&categories, &form.category),
        sizes: size_options(&form.sizes),
        gallery: gallery_views(&form),
        form,
        error,
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Render the list page with an optional error banner.
async fn render_index(state: &AppState, admin: &CurrentAdmin, error: Option<String>) -> Html<String> {
    let products = or_empty(
        state.supabase().list_products(admin.access_token()).await,
        "products",
    );

    let template = ProductsIndexTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: PRODUCTS_PATH.to_string(),
        nav: NavLinks::new(state),
        products: products.iter().map(ProductRowView::from).collect(),
        error,
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

fn unreadable(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("unreadable upload: {}", e.body_text()))
}

/// Split a multipart submission into text fields and image files.
///
/// Browsers send an empty file part when no file is chosen; those are
/// dropped.
async fn read_submission(mut multipart: Multipart) -> Result<(ProductFormInput, Vec<ImageUpload>)> {
    let mut form = ProductFormInput::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGES_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();
            let bytes = field.bytes().await.map_err(unreadable)?;
            if bytes.is_empty() {
                continue;
            }
            uploads.push(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(unreadable)?;
            form.set_field(&name, value);
        }
    }

    Ok((form, uploads))
}

/// Shared create/update flow.
async fn save(
    state: &AppState,
    admin: &CurrentAdmin,
    target: SaveTarget,
    multipart: Multipart,
) -> Response {
    let (mut form, uploads) = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product form");
            return e.into_response();
        }
    };

    let editor = ProductEditor::new(state.supabase().clone());
    let result = editor
        .save(
            admin.access_token(),
            &target,
            &form,
            uploads,
            Utc::now().timestamp_millis(),
        )
        .await;

    match result {
        Ok(draft) => {
            tracing::info!(name = %draft.name, images = draft.images.len(), "Product saved");
            Redirect::to(PRODUCTS_PATH).into_response()
        }
        Err(SaveError::Invalid(e)) => {
            render_form(state, admin, &target, form, Some(e.to_string()))
                .await
                .into_response()
        }
        Err(SaveError::Rejected { source, draft }) => {
            tracing::error!(error = %source, "Product write rejected");
            form.keep_images.clone_from(&draft.images);
            form.default_image.clone_from(&draft.image_url);
            let message = format!("{ERROR_PREFIX}{}", source.provider_message());
            render_form(state, admin, &target, form, Some(message))
                .await
                .into_response()
        }
    }
}

/// Products list page handler.
///
/// GET /admin/products
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Html<String> {
    render_index(&state, &admin, None).await
}

/// New product form.
///
/// GET /admin/products/new
#[instrument(skip(admin, state))]
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Html<String> {
    render_form(
        &state,
        &admin,
        &SaveTarget::New,
        ProductFormInput::default(),
        None,
    )
    .await
}

/// Create a product.
///
/// POST /admin/products/new
#[instrument(skip(admin, state, multipart))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    save(&state, &admin, SaveTarget::New, multipart).await
}

/// Edit form, prefilled from the stored product.
///
/// GET /admin/products/{id}/edit
#[instrument(skip(admin, state), fields(product_id = %id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Html<String>> {
    let product = state
        .supabase()
        .get_product(admin.access_token(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let form = ProductFormInput::from(&product);
    Ok(render_form(&state, &admin, &SaveTarget::Existing(id), form, None).await)
}

/// Update a product.
///
/// POST /admin/products/{id}/edit
#[instrument(skip(admin, state, multipart), fields(product_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Response {
    save(&state, &admin, SaveTarget::Existing(id), multipart).await
}

/// Delete a product.
///
/// POST /admin/products/{id}/delete
#[instrument(skip(admin, state), fields(product_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Response {
    match state
        .supabase()
        .delete_product(admin.access_token(), &id)
        .await
    {
        Ok(()) => {
            tracing::info!("Product deleted");
            Redirect::to(PRODUCTS_PATH).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Product delete rejected");
            let message = format!("{ERROR_PREFIX}{}", e.provider_message());
            render_index(&state, &admin, Some(message))
                .await
                .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use axum::http::header;
    use fasatina_core::CategoryId;

    use super::*;

    async fn multipart(body: &'static str) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_read_submission_splits_fields_and_files() {
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            فستان وردي\r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"images\"; filename=\"\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            \r\n\
            --X\r\n\
            Content-Disposition: form-data; name=\"images\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            png\r\n\
            --X--\r\n";

        let (form, uploads) = read_submission(multipart(body).await).await.unwrap();

        assert_eq!(form.name, "فستان وردي");
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "a.png");
        assert_eq!(uploads[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn test_truncated_upload_is_bad_request() {
        let body = "--X\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nفستان";

        let result = read_submission(multipart(body).await).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    fn category(slug: &str, name: &str) -> Category {
        Category {
            id: CategoryId::new(slug),
            name: name.to_string(),
            slug: slug.to_string(),
            icon: "👗".to_string(),
        }
    }

    #[test]
    fn test_first_category_preselected() {
        let cats = [category("girls", "بنات"), category("boys", "أولاد")];

        let fresh = category_options(&cats, "");
        assert!(fresh[0].selected);
        assert!(!fresh[1].selected);

        let chosen = category_options(&cats, "boys");
        assert!(!chosen[0].selected);
        assert!(chosen[1].selected);
    }

    #[test]
    fn test_size_options_follow_fixed_list() {
        let options = size_options(&["2-3Y".to_string()]);
        assert_eq!(options.len(), ALL_SIZES.len());
        assert_eq!(options[0].size, "0-3M");
        assert_eq!(
            options.iter().filter(|o| o.checked).map(|o| o.size).collect::<Vec<_>>(),
            vec!["2-3Y"]
        );
    }

    #[test]
    fn test_gallery_marks_default() {
        let form = ProductFormInput {
            keep_images: vec!["https://cdn.test/a.jpg".to_string(), "https://cdn.test/b.jpg".to_string()],
            default_image: "https://cdn.test/b.jpg".to_string(),
            ..ProductFormInput::default()
        };

        let views = gallery_views(&form);
        assert!(!views[0].is_default);
        assert!(views[1].is_default);
    }

    #[test]
    fn test_form_actions() {
        assert_eq!(SaveTarget::New.action(), "/admin/products/new");
        assert_eq!(
            SaveTarget::Existing(ProductId::new("p 1")).action(),
            "/admin/products/p%201/edit"
        );
    }
}
