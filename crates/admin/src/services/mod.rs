//! Business logic services for admin.
//!
//! # Services
//!
//! - `product_editor` - Product form saves: image uploads, then the row write

pub mod product_editor;

pub use product_editor::{
    DEFAULT_CONTENT_TYPE, ImageUpload, ProductEditor, ProductStore, SaveError, SaveTarget,
};
