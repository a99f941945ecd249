//! Business identifier derivation.
//!
//! A resource is identified by its `(sku, seller, campaign_code)` triple.
//! The derived id is what clients address in URLs and what the bulk
//! importer upserts on, so the same triple must always produce the same id.

/// Derive the business id of a resource from its identifying triple.
///
/// Convention: `{sku}-{seller}-{campaign_code}`
///
/// # Examples
///
/// ```
/// use catalog_core::identifier::derive_id;
///
/// assert_eq!(
///     derive_id("ME888SHM70XSB", "mega_boots", "90"),
///     "ME888SHM70XSB-mega_boots-90"
/// );
/// ```
pub fn derive_id(sku: &str, seller: &str, campaign_code: &str) -> String {
    format!("{sku}-{seller}-{campaign_code}")
}
