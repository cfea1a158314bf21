//! Product create/update request validation.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{NewProduct, ProductPatch};

const REQUIRED_FIELDS: &str = "Name, price, and category are required";

/// Largest price `NUMERIC(10,2)` can hold.
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// `POST /products` body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

/// `PATCH /products/:id` body. Omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

impl CreateProductRequest {
    /// Validate and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if name, price or category is missing,
    /// or price or stock is out of range.
    pub fn validate(self) -> Result<NewProduct, AppError> {
        let name = non_blank(self.name);
        let category = non_blank(self.category);
        let (Some(name), Some(price), Some(category)) = (name, self.price, category) else {
            return Err(AppError::BadRequest(REQUIRED_FIELDS.to_string()));
        };

        check_price(price)?;
        let stock = self.stock.unwrap_or(0);
        check_stock(stock)?;

        Ok(NewProduct {
            name,
            description: self.description.unwrap_or_default(),
            price,
            category,
            images: self.images.unwrap_or_default(),
            stock,
            featured: self.featured.unwrap_or(false),
        })
    }
}

impl UpdateProductRequest {
    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if name or category is blank, or price or
    /// stock is out of range.
    pub fn validate(self) -> Result<ProductPatch, AppError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty())
            || self.category.as_deref().is_some_and(|c| c.trim().is_empty())
        {
            return Err(AppError::BadRequest(REQUIRED_FIELDS.to_string()));
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.stock {
            check_stock(stock)?;
        }

        Ok(ProductPatch {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            price: self.price,
            category: self.category.map(|c| c.trim().to_string()),
            images: self.images,
            stock: self.stock,
            featured: self.featured,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::BadRequest(
            "Price must be a non-negative number".to_string(),
        ));
    }
    if price.round_dp(2) > MAX_PRICE {
        return Err(AppError::BadRequest("Price is too large".to_string()));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), AppError> {
    if stock < 0 {
        return Err(AppError::BadRequest(
            "Stock must be a non-negative integer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create(body: serde_json::Value) -> Result<NewProduct, AppError> {
        serde_json::from_value::<CreateProductRequest>(body)
            .expect("deserializes")
            .validate()
    }

    fn update(body: serde_json::Value) -> Result<ProductPatch, AppError> {
        serde_json::from_value::<UpdateProductRequest>(body)
            .expect("deserializes")
            .validate()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn test_max_price_matches_column() {
        assert_eq!(MAX_PRICE, dec("99999999.99"));
    }

    #[test]
    fn test_create_applies_defaults() {
        let product = create(json!({
            "name": "Terracotta Planter",
            "price": "34.50",
            "category": "planters"
        }))
        .expect("valid");

        assert_eq!(product.name, "Terracotta Planter");
        assert_eq!(product.price, dec("34.50"));
        assert_eq!(product.description, "");
        assert!(product.images.is_empty());
        assert_eq!(product.stock, 0);
        assert!(!product.featured);
    }

    #[test]
    fn test_create_requires_name_price_category() {
        for body in [
            json!({ "price": 10, "category": "mugs" }),
            json!({ "name": "Mug", "category": "mugs" }),
            json!({ "name": "Mug", "price": 10 }),
            json!({ "name": "  ", "price": 10, "category": "mugs" }),
        ] {
            let err = create(body).expect_err("rejected");
            assert!(matches!(err, AppError::BadRequest(ref m) if m == REQUIRED_FIELDS));
        }
    }

    #[test]
    fn test_create_rejects_negative_price_and_stock() {
        assert!(create(json!({ "name": "Mug", "price": -1, "category": "mugs" })).is_err());
        assert!(
            create(json!({ "name": "Mug", "price": 1, "category": "mugs", "stock": -2 }))
                .is_err()
        );
        assert!(
            create(json!({ "name": "Mug", "price": "100000000", "category": "mugs" })).is_err()
        );
        assert!(create(json!({ "name": "Mug", "price": 0, "category": "mugs" })).is_ok());
    }

    #[test]
    fn test_update_keeps_omitted_fields() {
        let patch = update(json!({ "price": "12.00" })).expect("valid");
        assert_eq!(
            patch,
            ProductPatch {
                price: Some(dec("12.00")),
                ..ProductPatch::default()
            }
        );
    }

    #[test]
    fn test_update_validates_present_fields() {
        assert!(update(json!({ "price": -5 })).is_err());
        assert!(update(json!({ "stock": -1 })).is_err());
        assert!(update(json!({ "name": "" })).is_err());
        assert!(update(json!({ "featured": true, "stock": 0 })).is_ok());
    }
}
