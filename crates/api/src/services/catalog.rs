//! Catalog service.
//!
//! Public reads over the product list, plus admin mutations that keep
//! the catalog record and its uploaded images in step: create uploads
//! every image, edit diffs the kept set and deletes the rest, delete
//! removes the images before the record.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use atelier_core::{Color, ProductId, Size, StockStatus, UserRole};

use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::models::{Product, ProductImage};
use crate::storage::ObjectStorage;
use crate::store::{NewProduct, ProductStore, ProductUpdate, StoreError};
use crate::validate::Validator;

/// An image payload awaiting upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Input for the create product mutation.
#[derive(Debug)]
pub struct CreateProductInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub colors: Vec<Color>,
    pub sizes: Vec<Size>,
    pub price: Decimal,
    pub category: String,
    pub quantity: u32,
    pub sku: String,
    pub stock_status: StockStatus,
    pub featured: bool,
    pub imgs: Vec<ImageUpload>,
}

/// Input for the edit product mutation.
///
/// `old_imgs` is the set of existing images the client kept; any image
/// currently on the record but absent from it gets deleted from
/// storage. `new_imgs` are uploaded and appended.
#[derive(Debug)]
pub struct EditProductInput {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub colors: Vec<Color>,
    pub sizes: Vec<Size>,
    pub price: Decimal,
    pub category: String,
    pub quantity: u32,
    pub sku: String,
    pub stock_status: StockStatus,
    pub featured: bool,
    pub old_imgs: Vec<ProductImage>,
    pub new_imgs: Vec<ImageUpload>,
}

/// Catalog operations.
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    storage: Arc<dyn ObjectStorage>,
    guard: Guard,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        storage: Arc<dyn ObjectStorage>,
        guard: Guard,
    ) -> Self {
        Self {
            products,
            storage,
            guard,
        }
    }

    /// The whole catalog. Public.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on a store failure.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.products.list().await?)
    }

    /// One product by id. Public.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on a store failure.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        Ok(self.products.find_by_id(id).await?)
    }

    /// Create a product, uploading its images first. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input and
    /// [`ApiError::AlreadyExists`] when the slug is taken.
    #[instrument(skip_all, fields(slug = %input.slug))]
    pub async fn create_product(
        &self,
        token: Option<&str>,
        input: CreateProductInput,
    ) -> Result<Product, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        let mut v = validate_product_fields(
            &input.title,
            &input.slug,
            &input.description,
            &input.colors,
            &input.sizes,
            input.price,
            &input.category,
            input.quantity,
            &input.sku,
        );
        v.require_upload("imgs", &input.imgs);
        v.finish()?;

        let slug = input.slug.to_lowercase();
        if self.products.find_by_slug(&slug).await?.is_some() {
            return Err(ApiError::AlreadyExists("product".to_owned()));
        }

        let imgs = self.upload_all(input.imgs).await?;

        self.products
            .insert(NewProduct {
                title: input.title,
                slug,
                description: input.description,
                colors: input.colors,
                sizes: input.sizes,
                price: input.price,
                category: input.category,
                quantity: input.quantity,
                sku: input.sku,
                stock_status: input.stock_status,
                featured: input.featured,
                imgs,
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ApiError::AlreadyExists("product".to_owned()),
                other => other.into(),
            })
    }

    /// Edit a product, reconciling its image set. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the product does not exist
    /// and [`ApiError::Validation`] on malformed input.
    #[instrument(skip_all, fields(product_id = %input.id))]
    pub async fn edit_product(
        &self,
        token: Option<&str>,
        input: EditProductInput,
    ) -> Result<Product, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        validate_product_fields(
            &input.title,
            &input.slug,
            &input.description,
            &input.colors,
            &input.sizes,
            input.price,
            &input.category,
            input.quantity,
            &input.sku,
        )
        .finish()?;

        let existing = self
            .products
            .find_by_id(&input.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("product".to_owned()))?;

        // Images dropped by the client get removed from storage.
        for img in &existing.imgs {
            if !input.old_imgs.iter().any(|kept| kept.id == img.id) {
                self.storage
                    .delete(&img.id)
                    .await
                    .map_err(|err| ApiError::Internal(err.to_string()))?;
            }
        }

        let mut imgs = input.old_imgs;
        imgs.extend(self.upload_all(input.new_imgs).await?);

        self.products
            .update(
                &input.id,
                ProductUpdate {
                    title: input.title,
                    slug: input.slug.to_lowercase(),
                    description: input.description,
                    colors: input.colors,
                    sizes: input.sizes,
                    price: input.price,
                    category: input.category,
                    quantity: input.quantity,
                    sku: input.sku,
                    stock_status: input.stock_status,
                    featured: input.featured,
                    imgs,
                },
            )
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ApiError::AlreadyExists("product".to_owned()),
                StoreError::NotFound => ApiError::NotFound("product".to_owned()),
                other => other.into(),
            })
    }

    /// Delete a product and its stored images. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the product does not exist.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn delete_product(&self, token: Option<&str>, id: &ProductId) -> Result<bool, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;

        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("product".to_owned()))?;

        for img in &product.imgs {
            self.storage
                .delete(&img.id)
                .await
                .map_err(|err| ApiError::Internal(err.to_string()))?;
        }

        Ok(self.products.delete(id).await?)
    }

    async fn upload_all(&self, uploads: Vec<ImageUpload>) -> Result<Vec<ProductImage>, ApiError> {
        let mut imgs = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let stored = self
                .storage
                .upload(&upload.filename, upload.bytes)
                .await
                .map_err(|err| ApiError::Internal(err.to_string()))?;
            imgs.push(ProductImage {
                id: stored.id,
                url: stored.url,
            });
        }
        Ok(imgs)
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_product_fields(
    title: &str,
    slug: &str,
    description: &str,
    colors: &[Color],
    sizes: &[Size],
    price: Decimal,
    category: &str,
    quantity: u32,
    sku: &str,
) -> Validator {
    let mut v = Validator::new();
    v.require("title", title)
        .require("slug", slug)
        .require("description", description)
        .require_choice("colors", colors)
        .require_choice("sizes", sizes)
        .require_positive_amount("price", price)
        .require("category", category)
        .require_positive("quantity", quantity)
        .require("sku", sku);
    v
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use atelier_core::UserId;

    use crate::config::JwtConfig;
    use crate::error::ErrorCode;
    use crate::services::token::TokenService;
    use crate::storage::MemoryObjectStorage;
    use crate::store::MemoryStore;

    use super::*;

    struct Fixture {
        service: CatalogService,
        storage: Arc<MemoryObjectStorage>,
        admin: String,
        customer: String,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryObjectStorage::new());
        let tokens = TokenService::new(&JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        });
        let admin = tokens
            .issue_pair(&UserId::new("root"), UserRole::Admin)
            .unwrap()
            .access;
        let customer = tokens
            .issue_pair(&UserId::new("cust"), UserRole::Customer)
            .unwrap()
            .access;
        let guard = Guard::new(Arc::new(tokens));
        Fixture {
            service: CatalogService::new(
                store as Arc<dyn ProductStore>,
                Arc::clone(&storage) as Arc<dyn ObjectStorage>,
                guard,
            ),
            storage,
            admin,
            customer,
        }
    }

    fn create_input(slug: &str) -> CreateProductInput {
        CreateProductInput {
            title: "Wool Coat".to_owned(),
            slug: slug.to_owned(),
            description: "A heavy coat".to_owned(),
            colors: vec![Color::Black],
            sizes: vec![Size::M, Size::L],
            price: Decimal::new(120_00, 2),
            category: "coats".to_owned(),
            quantity: 10,
            sku: "WC-001".to_owned(),
            stock_status: StockStatus::InStock,
            featured: false,
            imgs: vec![ImageUpload {
                filename: "front.jpg".to_owned(),
                bytes: vec![1, 2, 3],
            }],
        }
    }

    fn edit_input(product: &Product) -> EditProductInput {
        EditProductInput {
            id: product.id.clone(),
            title: product.title.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            price: product.price,
            category: product.category.clone(),
            quantity: product.quantity,
            sku: product.sku.clone(),
            stock_status: product.stock_status,
            featured: product.featured,
            old_imgs: product.imgs.clone(),
            new_imgs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_product_uploads_images_and_lowercases_slug() {
        let f = fixture();
        let product = f
            .service
            .create_product(Some(&f.admin), create_input("Wool-Coat"))
            .await
            .unwrap();
        assert_eq!(product.slug, "wool-coat");
        assert_eq!(product.imgs.len(), 1);
        assert!(product.imgs[0].url.ends_with("/front.jpg"));
        assert_eq!(f.storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_product_is_admin_only() {
        let f = fixture();
        let err = f
            .service
            .create_product(Some(&f.customer), create_input("wool-coat"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_product_duplicate_slug() {
        let f = fixture();
        f.service
            .create_product(Some(&f.admin), create_input("wool-coat"))
            .await
            .unwrap();
        let err = f
            .service
            .create_product(Some(&f.admin), create_input("WOOL-COAT"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_product_requires_images_and_choices() {
        let f = fixture();
        let mut input = create_input("wool-coat");
        input.imgs.clear();
        input.colors.clear();
        let err = f
            .service
            .create_product(Some(&f.admin), input)
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["imgs"], "Please upload imgs.");
        assert_eq!(fields["colors"], "Please choose colors.");
    }

    #[tokio::test]
    async fn test_edit_product_deletes_dropped_images_and_uploads_new() {
        let f = fixture();
        let product = f
            .service
            .create_product(Some(&f.admin), create_input("wool-coat"))
            .await
            .unwrap();

        let mut input = edit_input(&product);
        // Drop the existing image and add a fresh one.
        input.old_imgs.clear();
        input.new_imgs.push(ImageUpload {
            filename: "back.jpg".to_owned(),
            bytes: vec![4, 5, 6],
        });

        let updated = f.service.edit_product(Some(&f.admin), input).await.unwrap();
        assert_eq!(updated.imgs.len(), 1);
        assert!(updated.imgs[0].url.ends_with("/back.jpg"));
        // The dropped image is gone from storage; only the new remains.
        assert_eq!(f.storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_edit_missing_product_is_not_found() {
        let f = fixture();
        let product = f
            .service
            .create_product(Some(&f.admin), create_input("wool-coat"))
            .await
            .unwrap();
        let mut input = edit_input(&product);
        input.id = ProductId::new("missing");
        let err = f
            .service
            .edit_product(Some(&f.admin), input)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_delete_product_removes_images_and_record() {
        let f = fixture();
        let product = f
            .service
            .create_product(Some(&f.admin), create_input("wool-coat"))
            .await
            .unwrap();

        assert!(
            f.service
                .delete_product(Some(&f.admin), &product.id)
                .await
                .unwrap()
        );
        assert!(f.storage.is_empty().await);
        assert!(f.service.product(&product.id).await.unwrap().is_none());

        let err = f
            .service
            .delete_product(Some(&f.admin), &product.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
