//! The catalog resource and its schema validator.
//!
//! Incoming payloads arrive as loosely-typed JSON objects (request bodies,
//! CSV rows turned into mappings, merged PATCH documents). [`validate`] is the
//! single gate that turns such a mapping into a well-typed [`Resource`], with
//! error texts that existing clients match on verbatim.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::identifier::derive_id;

/// Storage-assigned key, in its string form. Never shown to clients.
pub type SurrogateId = String;

/// Fields that cannot change once a resource exists. Update payloads that
/// carry them have these keys dropped before merging.
pub const IMMUTABLE_FIELDS: [&str; 4] = ["id", "sku", "seller", "campaign_code"];

/// A validated catalog resource.
///
/// Serializes to the client-facing shape: the surrogate key is skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(skip_serializing)]
    pub surrogate_id: Option<SurrogateId>,
    pub id: String,
    pub sku: String,
    pub seller: String,
    pub campaign_code: String,
    pub product_name: String,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub size: String,
    pub list_price: f64,
    pub price: f64,
}

impl Resource {
    /// Render the resource as a raw field mapping, the same shape [`validate`]
    /// accepts. The surrogate key is not part of it.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("sku".into(), Value::String(self.sku.clone()));
        map.insert("seller".into(), Value::String(self.seller.clone()));
        map.insert("campaign_code".into(), Value::String(self.campaign_code.clone()));
        map.insert("product_name".into(), Value::String(self.product_name.clone()));
        map.insert("brand".into(), Value::String(self.brand.clone()));
        map.insert("category".into(), Value::String(self.category.clone()));
        map.insert("subcategory".into(), Value::String(self.subcategory.clone()));
        map.insert("size".into(), Value::String(self.size.clone()));
        map.insert("list_price".into(), Value::from(self.list_price));
        map.insert("price".into(), Value::from(self.price));
        map
    }

    /// Replace every mutable field with the one from `incoming`, keeping this
    /// resource's identity (`surrogate_id`, `id`, `sku`, `seller`,
    /// `campaign_code`).
    pub fn with_mutable_fields_of(&self, incoming: &Resource) -> Resource {
        Resource {
            surrogate_id: self.surrogate_id.clone(),
            id: self.id.clone(),
            sku: self.sku.clone(),
            seller: self.seller.clone(),
            campaign_code: self.campaign_code.clone(),
            product_name: incoming.product_name.clone(),
            brand: incoming.brand.clone(),
            category: incoming.category.clone(),
            subcategory: incoming.subcategory.clone(),
            size: incoming.size.clone(),
            list_price: incoming.list_price,
            price: incoming.price,
        }
    }

    /// Overlay a sparse payload onto this resource's mapping. Immutable and
    /// storage keys in the payload are dropped; the result still needs
    /// [`validate`].
    pub fn overlay(&self, payload: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.to_mapping();
        for (key, value) in strip_immutable(payload) {
            merged.insert(key, value);
        }
        merged
    }
}

/// Keys owned by the store. Clients can never set them.
pub const STORAGE_FIELDS: [&str; 3] = ["_id", "created_at", "updated_at"];

/// Drop the immutable and storage keys from an update payload.
pub fn strip_immutable(payload: &Map<String, Value>) -> Map<String, Value> {
    payload
        .iter()
        .filter(|(key, _)| {
            !IMMUTABLE_FIELDS.contains(&key.as_str()) && !STORAGE_FIELDS.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// A field-level schema violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// One or more required keys are absent, sorted by name.
    #[error("{}", missing_keys_message(.0))]
    MissingKeys(Vec<&'static str>),

    /// A string field holds a non-string JSON value.
    #[error("{value} should be instance of 'str'")]
    NotAString { field: &'static str, value: String },

    /// A price field is not a number greater than zero.
    #[error("{label} should be greater than 0")]
    NotPositive {
        field: &'static str,
        label: &'static str,
    },
}

fn missing_keys_message(keys: &[&'static str]) -> String {
    let quoted: Vec<String> = keys.iter().map(|key| format!("'{key}'")).collect();
    let plural = if keys.len() > 1 { "s" } else { "" };
    format!("Missing key{plural}: {}", quoted.join(", "))
}

/// Validate and coerce a raw field mapping into a [`Resource`].
///
/// Present fields are checked in declaration order and the first violation
/// wins; missing keys are reported only once every present field passed.
/// Unknown keys, storage keys included, are ignored: the result never has a
/// surrogate key. When `id` is absent it is derived from the identifying
/// triple.
pub fn validate(raw: &Map<String, Value>) -> Result<Resource, ValidationError> {
    let mut missing = Vec::new();

    let id = match raw.get("id") {
        Some(value) => Some(as_string("id", value)?),
        None => None,
    };

    let sku = string_field(raw, "sku", &mut missing)?;
    let seller = string_field(raw, "seller", &mut missing)?;
    let campaign_code = string_field(raw, "campaign_code", &mut missing)?;
    let product_name = string_field(raw, "product_name", &mut missing)?;
    let brand = string_field(raw, "brand", &mut missing)?;
    let category = string_field(raw, "category", &mut missing)?;
    let subcategory = string_field(raw, "subcategory", &mut missing)?;
    let size = string_field(raw, "size", &mut missing)?;
    let list_price = price_field(raw, "list_price", "List price", &mut missing)?;
    let price = price_field(raw, "price", "Price", &mut missing)?;

    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(ValidationError::MissingKeys(missing));
    }

    let id = id.unwrap_or_else(|| derive_id(&sku, &seller, &campaign_code));

    Ok(Resource {
        surrogate_id: None,
        id,
        sku,
        seller,
        campaign_code,
        product_name,
        brand,
        category,
        subcategory,
        size,
        list_price,
        price,
    })
}

fn as_string(field: &'static str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ValidationError::NotAString {
            field,
            value: repr(other),
        }),
    }
}

/// Render a JSON value as a Python literal.
fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".into(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), repr(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Single-quote a string, falling back to double quotes when that avoids
/// escaping.
pub(crate) fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\");
    if value.contains('\'') && !value.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}

/// Absent keys are recorded in `missing` and yield a placeholder that is
/// never observed, since validation fails once `missing` is non-empty.
fn string_field(
    raw: &Map<String, Value>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Result<String, ValidationError> {
    match raw.get(field) {
        Some(value) => as_string(field, value),
        None => {
            missing.push(field);
            Ok(String::new())
        }
    }
}

fn price_field(
    raw: &Map<String, Value>,
    field: &'static str,
    label: &'static str,
    missing: &mut Vec<&'static str>,
) -> Result<f64, ValidationError> {
    let Some(value) = raw.get(field) else {
        missing.push(field);
        return Ok(0.0);
    };
    coerce_price(value).ok_or(ValidationError::NotPositive { field, label })
}

/// Numbers and numeric strings coerce; the result must be finite and > 0.
fn coerce_price(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number > 0.0).then_some(number)
}
