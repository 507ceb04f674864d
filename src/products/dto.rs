use rust_decimal::Decimal;
use serde::Deserialize;

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_fields(
    name: Option<&str>,
    description: Option<&str>,
    price: Option<Decimal>,
    image_url: Option<&str>,
    stock: Option<i32>,
) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(name) = name {
        if name.chars().count() < 3 {
            errors.push("product name must be at least 3 characters".to_string());
        }
    }
    if let Some(description) = description {
        if description.chars().count() < 10 {
            errors.push("product description must be at least 10 characters".to_string());
        }
    }
    if let Some(price) = price {
        if price <= Decimal::ZERO {
            errors.push("price must be a positive number".to_string());
        }
    }
    if let Some(url) = image_url {
        if !is_http_url(url) {
            errors.push("invalid image URL".to_string());
        }
    }
    if let Some(stock) = stock {
        if stock < 0 {
            errors.push("stock must be a non-negative integer".to_string());
        }
    }
    errors
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Vec<String> {
        validate_fields(
            Some(self.name.as_str()),
            self.description.as_deref(),
            Some(self.price),
            self.image_url.as_deref(),
            Some(self.stock),
        )
    }
}

/// Partial update; only supplied fields are checked and written.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub stock: Option<i32>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Vec<String> {
        validate_fields(
            self.name.as_deref(),
            self.description.as_deref(),
            self.price,
            self.image_url.as_deref(),
            self.stock,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Linen Shirt".into(),
            description: Some("A light summer linen shirt".into()),
            price: Decimal::new(4990, 2),
            image_url: Some("https://cdn.example.com/shirt.jpg".into()),
            category: Some("shirts".into()),
            size: Some("M".into()),
            color: Some("white".into()),
            stock: 5,
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(base_request().validate().is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let request = CreateProductRequest {
            name: "ab".into(),
            description: Some("short".into()),
            price: Decimal::ZERO,
            image_url: Some("ftp://nope".into()),
            stock: -1,
            ..base_request()
        };
        assert_eq!(request.validate().len(), 5);
    }

    #[test]
    fn update_skips_absent_fields() {
        let request = UpdateProductRequest {
            name: None,
            description: None,
            price: Some(Decimal::new(100, 2)),
            image_url: None,
            category: None,
            size: None,
            color: None,
            stock: None,
        };
        assert!(request.validate().is_empty());
    }

    #[test]
    fn negative_price_rejected_on_update() {
        let request = UpdateProductRequest {
            name: None,
            description: None,
            price: Some(Decimal::new(-100, 2)),
            image_url: None,
            category: None,
            size: None,
            color: None,
            stock: None,
        };
        let errors = request.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("positive"));
    }
}
