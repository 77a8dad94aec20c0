//! Product catalogue commands.
//!
//! # Usage
//!
//! ```bash
//! abc-cli product add --name Mug --description "Ceramic mug" --price 7.50 --stock 12 \
//!     --image ./mug.png
//! abc-cli product update <id> --stock 20
//! abc-cli product update <id> --name "Large mug" --description "Stoneware, 450 ml"
//! abc-cli product list
//! abc-cli product remove <id>
//! ```

use std::path::Path;

use abc_retail_core::{Price, Product, TableEntity};
use abc_retail_storage::StorageService;
use abc_retail_storage::resources::{PRODUCT_IMAGES_CONTAINER, PRODUCTS_TABLE};
use bytes::Bytes;

use super::{CommandResult, file_name_of};

/// Details for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
}

/// Changes to an existing product; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<u32>,
}

/// Add a product, uploading its image first when one is given.
///
/// # Errors
///
/// Returns an error if the image cannot be read or uploaded, or the write fails.
pub async fn add(
    storage: &StorageService,
    details: NewProduct,
    image: Option<&Path>,
) -> CommandResult<Product> {
    let mut product = Product::new(details.name, details.description, details.price, details.stock);
    if let Some(path) = image {
        product.image_url = upload_image(storage, path).await?;
    }
    storage.upsert_entity(PRODUCTS_TABLE, &mut product).await?;

    tracing::info!("Product created: {} ({})", product.product_name, product.id);
    Ok(product)
}

/// Change a product's details, price, stock or image.
///
/// The write is conditional on the version read, so a concurrent change is
/// reported as a conflict instead of being overwritten.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such product exists.
/// Returns `StorageError::Conflict` if the product changed since it was read.
pub async fn update(
    storage: &StorageService,
    id: &str,
    changes: ProductChanges,
    image: Option<&Path>,
) -> CommandResult<Product> {
    let mut product: Product = storage
        .get_entity(PRODUCTS_TABLE, Product::PARTITION, id)
        .await?;

    if let Some(name) = changes.name {
        product.product_name = name;
    }
    if let Some(description) = changes.description {
        product.description = description;
    }
    if let Some(price) = changes.price {
        product.price = price;
    }
    if let Some(stock) = changes.stock {
        product.stock_available = stock;
    }
    let replaced_image = match image {
        Some(path) => {
            let url = upload_image(storage, path).await?;
            Some(std::mem::replace(&mut product.image_url, url))
        }
        None => None,
    };
    storage.upsert_entity(PRODUCTS_TABLE, &mut product).await?;

    if let Some(name) = replaced_image.as_deref().and_then(blob_name_of) {
        // The product already points at the new image.
        if let Err(e) = storage.delete_blob(name, PRODUCT_IMAGES_CONTAINER).await {
            tracing::warn!("Old image {name} not removed: {e}");
        }
    }

    tracing::info!(
        "Product updated: {} (price {}, stock {})",
        product.id,
        product.price,
        product.stock_available
    );
    Ok(product)
}

/// List every product.
///
/// # Errors
///
/// Returns an error if the table cannot be read.
pub async fn list(storage: &StorageService) -> CommandResult<Vec<Product>> {
    let products: Vec<Product> = storage
        .list_entities(PRODUCTS_TABLE, Some(Product::PARTITION))
        .await?;

    tracing::info!("{} product(s)", products.len());
    for p in &products {
        tracing::info!(
            "  {}  {}  {}  stock {}",
            p.id,
            p.product_name,
            p.price,
            p.stock_available
        );
    }
    Ok(products)
}

/// Remove a product. Orders referencing it are left untouched.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such product exists.
pub async fn remove(storage: &StorageService, id: &str) -> CommandResult<()> {
    storage
        .delete_entity(PRODUCTS_TABLE, Product::PARTITION, id)
        .await?;
    tracing::info!("Product removed: {id}");
    Ok(())
}

async fn upload_image(storage: &StorageService, path: &Path) -> CommandResult<String> {
    let file_name = file_name_of(path)?;
    let data = tokio::fs::read(path).await?;
    let url = storage
        .upload_file(Bytes::from(data), file_name, PRODUCT_IMAGES_CONTAINER)
        .await?;
    tracing::info!("Image uploaded: {url}");
    Ok(url.into())
}

/// Last path segment of an image reference, if it has one.
fn blob_name_of(image_url: &str) -> Option<&str> {
    image_url
        .rsplit_once('/')
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}
