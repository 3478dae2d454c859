use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{category, importation, product};
use crate::error::FieldErrors;
use crate::extractors::query::lenient_u64;

pub use super::shared::{Pagination, Redirect};

/// Where clients land after a product action.
pub const PRODUCTS_INDEX: &str = "/api/v1/products";

pub const PRODUCT_CREATED: &str = "Product created";
pub const PRODUCT_UPDATED: &str = "Product updated";
pub const PRODUCT_DELETED: &str = "Product deleted";
pub const IMPORT_ACCEPTED: &str =
    "File uploaded. You will be notified by email when importation finish";

pub const NAME_MAX_CHARS: usize = 255;
pub const CATEGORY_INVALID: &str = "The selected category is invalid.";

/// Largest magnitude a `NUMERIC(12, 2)` price column holds.
const PRICE_LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 2);

/// Product fields as submitted by a form or JSON client.
///
/// Fields stay loosely typed so each one can be checked and reported on its own.
#[derive(Deserialize, Default, Debug, utoipa::ToSchema)]
pub struct ProductForm {
    #[schema(value_type = Option<String>, example = "Desk lamp")]
    pub name: Option<Value>,
    /// Number or numeric string.
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<Value>,
    /// Category ID, as an integer or a digit string.
    #[schema(value_type = Option<i32>, example = 3)]
    pub category: Option<Value>,
    #[schema(value_type = Option<String>, example = "Adjustable LED lamp")]
    pub description: Option<Value>,
}

/// Per-field outcome of checking a `ProductForm`. A field is `Some` when it passed.
#[derive(Debug, Default, PartialEq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<i32>,
    pub description: Option<String>,
}

/// A fully validated product write.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub category_id: i32,
    pub description: String,
}

impl ProductForm {
    /// Run the stateless rules. Category existence is left to the caller.
    pub fn check(&self) -> (ProductFields, FieldErrors) {
        let mut errors = FieldErrors::new();
        let fields = ProductFields {
            name: check_name(self.name.as_ref(), &mut errors),
            price: check_price(self.price.as_ref(), &mut errors),
            category_id: check_category(self.category.as_ref(), &mut errors),
            description: check_description(self.description.as_ref(), &mut errors),
        };
        (fields, errors)
    }
}

impl ProductFields {
    pub fn into_input(self) -> Option<ProductInput> {
        Some(ProductInput {
            name: self.name?,
            price: self.price?,
            category_id: self.category_id?,
            description: self.description?,
        })
    }
}

fn required(field: &str) -> String {
    format!("The {field} field is required.")
}

/// A present, non-blank string, trimmed. Records errors otherwise.
fn check_string(field: &str, value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            errors.add(field, required(field));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add(field, required(field));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.add(field, format!("The {field} must be a string."));
            None
        }
    }
}

fn check_name(value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    let name = check_string("name", value, errors)?;
    if name.chars().count() > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("The name may not be greater than {NAME_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(name)
}

fn check_description(value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    check_string("description", value, errors)
}

fn check_price(value: Option<&Value>, errors: &mut FieldErrors) -> Option<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => {
            errors.add("price", required("price"));
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add("price", required("price"));
            return None;
        }
        Some(Value::String(s)) => parse_numeric(s),
        Some(Value::Number(n)) => parse_numeric(&n.to_string()),
        Some(_) => None,
    };

    let Some(price) = parsed else {
        errors.add("price", "The price must be a number.");
        return None;
    };

    let price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if price.abs() >= PRICE_LIMIT {
        errors.add("price", "The price must be less than 10000000000.");
        return None;
    }
    Some(price)
}

/// Plain decimal or scientific notation, surrounding whitespace allowed.
pub fn parse_numeric(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() || s.contains('_') {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn check_category(value: Option<&Value>, errors: &mut FieldErrors) -> Option<i32> {
    let parsed: Option<i64> = match value {
        None | Some(Value::Null) => {
            errors.add("category", required("category"));
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add("category", required("category"));
            return None;
        }
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        Some(_) => None,
    };

    let Some(id) = parsed else {
        errors.add("category", "The category must be an integer.");
        return None;
    };

    // An integer no row can have.
    match i32::try_from(id) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add("category", CATEGORY_INVALID);
            None
        }
    }
}

/// Category as embedded in product payloads and form views.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct CategorySummary {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Electronics")]
    pub name: String,
}

impl From<category::Model> for CategorySummary {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    /// Decimal string with two fractional digits.
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub description: String,
    pub category: CategorySummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn new(m: product::Model, category: CategorySummary) -> Self {
        Self {
            id: m.id,
            name: m.name,
            price: m.price,
            description: m.description,
            category,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// 1-based page number. Default: 1.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    /// Items per page. Default: 15, max: 100.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub per_page: Option<u64>,
}

/// Data needed to render the product creation form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateFormResponse {
    pub categories: Vec<CategorySummary>,
}

/// Data needed to render the product edit form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EditFormResponse {
    pub product: ProductResponse,
    pub categories: Vec<CategorySummary>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportationResponse {
    pub id: i32,
    /// Path of the stored file relative to the storage root.
    #[schema(example = "app/upload/importations/0b6f1c9e-3a52-4d1e-9f7a-2c4b8e6d1a30.csv")]
    pub path: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<importation::Model> for ImportationResponse {
    fn from(m: importation::Model) -> Self {
        Self {
            id: m.id,
            path: m.path,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportationListResponse {
    pub data: Vec<ImportationResponse>,
    pub total: u64,
}
