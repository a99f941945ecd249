//! Single-resource lifecycle: create, retrieve, list, update, patch, delete.
//!
//! The service holds no state beyond the injected store handle. Each
//! operation works on a request-local copy of the resource and issues
//! separate store calls; there is no transaction spanning the existence
//! check and the write.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::identifier::derive_id;
use crate::resource::{validate, Resource};
use crate::search::{ListQuery, ResourceFilter};
use crate::store::{ResourceStore, COLLECTION};

#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn ResourceStore>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Validate a full payload, derive its id, and persist it.
    ///
    /// Any `id` in the payload is replaced by the derived one. Fails with
    /// [`CoreError::Conflict`] when a resource with that id already exists.
    pub async fn create(&self, payload: &Map<String, Value>) -> Result<Resource, CoreError> {
        let mut resource = validate(payload)?;
        resource.id = derive_id(&resource.sku, &resource.seller, &resource.campaign_code);
        resource.surrogate_id = None;

        if self
            .store
            .get(&ResourceFilter::by_id(&resource.id))
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict { id: resource.id });
        }

        tracing::info!(id = %resource.id, collection = COLLECTION, "Saving new resource");
        let surrogate_id = self.store.insert(&resource).await?;
        resource.surrogate_id = Some(surrogate_id);
        Ok(resource)
    }

    /// Fetch a resource by business id.
    pub async fn retrieve(&self, id: &str) -> Result<Resource, CoreError> {
        self.store
            .get(&ResourceFilter::by_id(id))
            .await?
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })
    }

    /// One page of resources matching the query's filter.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Resource>, CoreError> {
        let resources = self
            .store
            .list(&query.filter, query.skip(), Some(query.limit))
            .await?;
        Ok(resources)
    }

    /// Every resource, unpaginated.
    pub async fn list_all(&self) -> Result<Vec<Resource>, CoreError> {
        Ok(self.store.list(&ResourceFilter::new(), 0, None).await?)
    }

    /// Replace every mutable field of an existing resource.
    ///
    /// The payload must validate as a complete resource; its `id`, `sku`,
    /// `seller`, and `campaign_code` are ignored.
    pub async fn update(
        &self,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Resource, CoreError> {
        let existing = self.retrieve(id).await?;
        let incoming = validate(payload)?;
        let updated = existing.with_mutable_fields_of(&incoming);
        self.persist(&updated).await?;
        Ok(updated)
    }

    /// Merge a sparse payload onto an existing resource and re-validate the
    /// result as a whole. Immutable and storage keys in the payload are
    /// dropped; the write always targets the existing record.
    pub async fn patch(
        &self,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Resource, CoreError> {
        let existing = self.retrieve(id).await?;
        let updated = Resource {
            surrogate_id: existing.surrogate_id.clone(),
            ..validate(&existing.overlay(payload))?
        };
        self.persist(&updated).await?;
        Ok(updated)
    }

    /// Physically delete an existing resource.
    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let existing = self.retrieve(id).await?;
        let surrogate_id = surrogate_of(&existing)?;
        tracing::warn!(id = %existing.id, collection = COLLECTION, "Removing resource");
        self.store.delete(surrogate_id).await?;
        Ok(())
    }

    /// Number of resources matching a filter.
    pub async fn count(&self, filter: &ResourceFilter) -> Result<u64, CoreError> {
        Ok(self.store.count(filter).await?)
    }

    async fn persist(&self, resource: &Resource) -> Result<(), CoreError> {
        let surrogate_id = surrogate_of(resource)?;
        tracing::info!(id = %resource.id, collection = COLLECTION, "Editing resource");
        self.store.update(surrogate_id, resource).await?;
        Ok(())
    }
}

/// Stores always populate the surrogate key on reads; a resource without
/// one did not come from the store.
fn surrogate_of(resource: &Resource) -> Result<&str, CoreError> {
    resource.surrogate_id.as_deref().ok_or_else(|| {
        CoreError::Store(crate::store::StoreError::MalformedKey(format!(
            "resource {} has no surrogate key",
            resource.id
        )))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::resource::ValidationError;
    use crate::search::ResourceField;
    use crate::store::MemoryResourceStore;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn resource_payload() -> Map<String, Value> {
        object(json!({
            "id": "ME888SHM70XSB-mega_boots-90",
            "sku": "ME888SHM70XSB",
            "seller": "mega_boots",
            "campaign_code": "90",
            "product_name": "Bota Coturno em Couro Mega Boots 6017 Preto",
            "brand": "Mega Boots",
            "category": "calcados",
            "subcategory": "calcados-masculinos",
            "size": "40",
            "list_price": 199.9,
            "price": 149.9
        }))
    }

    fn service() -> (ResourceService, Arc<MemoryResourceStore>) {
        let store = Arc::new(MemoryResourceStore::new());
        (ResourceService::new(store.clone()), store)
    }

    async fn save_many(service: &ResourceService) {
        for i in 0..20 {
            for seller in ["dafiti", "kanui", "tricae"] {
                let mut payload = resource_payload();
                payload.insert("sku".into(), json!(format!("XPTO{i}")));
                payload.insert("seller".into(), json!(seller));
                service.create(&payload).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn create_then_conflict() {
        let (service, _) = service();
        let created = service.create(&resource_payload()).await.unwrap();
        assert_eq!(created.id, "ME888SHM70XSB-mega_boots-90");
        assert!(created.surrogate_id.is_some());

        let err = service.create(&resource_payload()).await.unwrap_err();
        assert_matches!(err, CoreError::Conflict { ref id } if id == "ME888SHM70XSB-mega_boots-90");
        assert_eq!(
            err.to_string(),
            "It was not possible to create a resource ME888SHM70XSB-mega_boots-90 that already exists"
        );
    }

    #[tokio::test]
    async fn create_ignores_payload_id() {
        let (service, _) = service();
        let mut payload = resource_payload();
        payload.insert("id".into(), json!("something-else"));
        let created = service.create(&payload).await.unwrap();
        assert_eq!(created.id, "ME888SHM70XSB-mega_boots-90");
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let (service, store) = service();
        let mut payload = resource_payload();
        payload.remove("brand");
        let err = service.create(&payload).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(ValidationError::MissingKeys(_)));
        assert_eq!(store.count(&ResourceFilter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn retrieve_missing_is_not_found() {
        let (service, _) = service();
        let err = service.retrieve("ME888SHM70XSB-mega_boots-90").await.unwrap_err();
        assert_eq!(err.to_string(), "Resource ME888SHM70XSB-mega_boots-90 not found");
    }

    #[tokio::test]
    async fn pages_over_sixty_resources() {
        let (service, _) = service();
        save_many(&service).await;

        let first = service.list(&ListQuery::default()).await.unwrap();
        assert_eq!(first.len(), 20);

        let second = service
            .list(&ListQuery::from_params(&HashMap::from([(
                "page".to_string(),
                "2".to_string(),
            )])))
            .await
            .unwrap();
        assert_eq!(second.len(), 20);
        assert_ne!(first[0].id, second[0].id);

        let sixth = service
            .list(&ListQuery::from_params(&HashMap::from([
                ("page".to_string(), "6".to_string()),
                ("limit".to_string(), "5".to_string()),
            ])))
            .await
            .unwrap();
        let expected = service
            .store
            .list(&ResourceFilter::new(), 25, Some(5))
            .await
            .unwrap();
        assert_eq!(
            sixth.iter().map(|r| &r.id).collect::<Vec<_>>(),
            expected.iter().map(|r| &r.id).collect::<Vec<_>>()
        );
        assert_eq!(sixth.len(), 5);
    }

    #[tokio::test]
    async fn seller_filter_is_substring() {
        let (service, _) = service();
        save_many(&service).await;

        let query = ListQuery::from_params(&HashMap::from([(
            "seller".to_string(),
            "dafiti".to_string(),
        )]));
        let page = service.list(&query).await.unwrap();
        assert_eq!(page.len(), 20);
        assert!(page.iter().all(|r| r.seller.contains("dafiti")));

        let query = ListQuery::from_params(&HashMap::from([
            ("seller".to_string(), "anu".to_string()),
            ("sku".to_string(), "0".to_string()),
        ]));
        let page = service.list(&query).await.unwrap();
        // XPTO0 and XPTO10 for kanui
        assert_eq!(page.len(), 2);
        assert_eq!(
            service
                .count(&ResourceFilter::new().contains(ResourceField::Seller, "anu"))
                .await
                .unwrap(),
            20
        );
    }

    #[tokio::test]
    async fn update_replaces_mutable_fields_only() {
        let (service, _) = service();
        service.create(&resource_payload()).await.unwrap();

        let mut payload = resource_payload();
        payload.insert("product_name".into(), json!("Camisa estampa XPTO"));
        payload.insert("list_price".into(), json!(49.9));
        payload.insert("seller".into(), json!("someone_else"));
        let updated = service
            .update("ME888SHM70XSB-mega_boots-90", &payload)
            .await
            .unwrap();
        assert_eq!(updated.seller, "mega_boots");

        let stored = service.retrieve("ME888SHM70XSB-mega_boots-90").await.unwrap();
        assert_eq!(stored.product_name, "Camisa estampa XPTO");
        assert_eq!(stored.list_price, 49.9);
        assert_eq!(stored.seller, "mega_boots");
    }

    #[tokio::test]
    async fn update_requires_complete_payload() {
        let (service, _) = service();
        service.create(&resource_payload()).await.unwrap();

        let mut payload = resource_payload();
        payload.remove("sku");
        let err = service
            .update("ME888SHM70XSB-mega_boots-90", &payload)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing key: 'sku'");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (service, _) = service();
        let err = service
            .update("ME888SHM70XSB-mega_boots-90", &resource_payload())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn patch_changes_only_the_given_field() {
        let (service, _) = service();
        let created = service.create(&resource_payload()).await.unwrap();

        let patch = object(json!({"brand": "Fulano", "sku": "NOPE", "id": "NOPE", "campaign_code": "1"}));
        let patched = service
            .patch("ME888SHM70XSB-mega_boots-90", &patch)
            .await
            .unwrap();

        assert_eq!(patched.brand, "Fulano");
        assert_eq!(
            Resource {
                brand: created.brand.clone(),
                ..patched.clone()
            },
            created
        );
        let stored = service.retrieve("ME888SHM70XSB-mega_boots-90").await.unwrap();
        assert_eq!(stored, patched);
    }

    #[tokio::test]
    async fn patch_cannot_redirect_to_another_record() {
        let (service, store) = service();
        service.create(&resource_payload()).await.unwrap();
        let mut other = resource_payload();
        other.insert("sku".into(), json!("OTHER"));
        let other = service.create(&other).await.unwrap();

        for key in [json!(other.surrogate_id.clone().unwrap()), json!("abc")] {
            let patch = object(json!({"_id": key, "brand": "X"}));
            let patched = service
                .patch("ME888SHM70XSB-mega_boots-90", &patch)
                .await
                .unwrap();
            assert_eq!(patched.brand, "X");
        }

        assert_eq!(store.count(&ResourceFilter::new()).await.unwrap(), 2);
        let untouched = service.retrieve("OTHER-mega_boots-90").await.unwrap();
        assert_eq!(untouched, other);
        let stored = service.retrieve("ME888SHM70XSB-mega_boots-90").await.unwrap();
        assert_eq!(stored.brand, "X");
    }

    #[tokio::test]
    async fn patch_revalidates_merged_resource() {
        let (service, _) = service();
        service.create(&resource_payload()).await.unwrap();

        let err = service
            .patch("ME888SHM70XSB-mega_boots-90", &object(json!({"price": null})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Price should be greater than 0");

        let stored = service.retrieve("ME888SHM70XSB-mega_boots-90").await.unwrap();
        assert_eq!(stored.price, 149.9);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let (service, store) = service();
        service.create(&resource_payload()).await.unwrap();

        service.delete("ME888SHM70XSB-mega_boots-90").await.unwrap();
        assert_eq!(store.count(&ResourceFilter::new()).await.unwrap(), 0);

        let err = service.delete("ME888SHM70XSB-mega_boots-90").await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }
}
