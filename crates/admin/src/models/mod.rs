//! Domain models for admin.
//!
//! - [`session`] - Auth tokens kept in the admin session
//! - [`product_form`] - Product create/edit form parsing and the row it writes

pub mod product_form;
pub mod session;

pub use product_form::{
    ALL_SIZES, DefaultImage, ImageSet, ProductDraft, ProductFormError, ProductFormInput,
    ValidProduct,
};
pub use session::{AuthSession, AuthUser, CurrentAdmin, keys as session_keys};
