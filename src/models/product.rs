//! Product-related models

use serde::Deserialize;

/// A ride product available at a location
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<u32>,
    /// Body as received, for detail output
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl Product {
    pub fn from_value(raw: serde_json::Value) -> serde_json::Result<Self> {
        let mut product: Self = serde_json::from_value(raw.clone())?;
        product.raw = raw;
        Ok(product)
    }
}

/// Response of the products listing
#[derive(Debug, Clone, Default)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Deserialize)]
struct RawProducts {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

impl ProductsResponse {
    pub fn from_value(raw: serde_json::Value) -> serde_json::Result<Self> {
        let listing: RawProducts = serde_json::from_value(raw)?;
        let products = listing
            .products
            .into_iter()
            .map(Product::from_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self { products })
    }
}
