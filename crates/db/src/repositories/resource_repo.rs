//! Repository for the `resources` table.

use catalog_core::resource::Resource;
use catalog_core::search::{Match, ResourceFilter};
use sqlx::{PgExecutor, PgPool};

use crate::models::resource::ResourceRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "_id, id, sku, seller, campaign_code, product_name, brand, category, \
                       subcategory, size, list_price, price, created_at, updated_at";

/// Provides CRUD operations for resources.
pub struct ResourceRepo;

impl ResourceRepo {
    /// Insert a new resource, returning its surrogate key.
    pub async fn insert<'e, E>(executor: E, input: &Resource) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO resources
                (id, sku, seller, campaign_code, product_name, brand, category,
                 subcategory, size, list_price, price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING _id",
        )
        .bind(&input.id)
        .bind(&input.sku)
        .bind(&input.seller)
        .bind(&input.campaign_code)
        .bind(&input.product_name)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.subcategory)
        .bind(&input.size)
        .bind(input.list_price)
        .bind(input.price)
        .fetch_one(executor)
        .await
    }

    /// Overwrite the business columns of one row. Returns `true` if a row
    /// was updated.
    pub async fn update(pool: &PgPool, surrogate_id: i64, input: &Resource) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resources SET
                id = $2, sku = $3, seller = $4, campaign_code = $5,
                product_name = $6, brand = $7, category = $8, subcategory = $9,
                size = $10, list_price = $11, price = $12, updated_at = NOW()
             WHERE _id = $1",
        )
        .bind(surrogate_id)
        .bind(&input.id)
        .bind(&input.sku)
        .bind(&input.seller)
        .bind(&input.campaign_code)
        .bind(&input.product_name)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.subcategory)
        .bind(&input.size)
        .bind(input.list_price)
        .bind(input.price)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite every row carrying this business id, or insert one when
    /// none exists.
    ///
    /// Runs in one transaction holding an advisory lock on the business id,
    /// so concurrent upserts of the same id never both insert.
    pub async fn upsert_by_business_id(pool: &PgPool, input: &Resource) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&input.id)
            .execute(&mut *tx)
            .await?;

        let updated = Self::update_by_business_id(&mut *tx, input).await?;
        if updated == 0 {
            Self::insert(&mut *tx, input).await?;
        }

        tx.commit().await
    }

    /// Overwrite every row carrying this business id. Returns the number of
    /// rows touched.
    pub async fn update_by_business_id<'e, E>(
        executor: E,
        input: &Resource,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE resources SET
                sku = $2, seller = $3, campaign_code = $4,
                product_name = $5, brand = $6, category = $7, subcategory = $8,
                size = $9, list_price = $10, price = $11, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(&input.id)
        .bind(&input.sku)
        .bind(&input.seller)
        .bind(&input.campaign_code)
        .bind(&input.product_name)
        .bind(&input.brand)
        .bind(&input.category)
        .bind(&input.subcategory)
        .bind(&input.size)
        .bind(input.list_price)
        .bind(input.price)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete a row. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, surrogate_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE _id = $1")
            .bind(surrogate_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// First row matching the filter, in insertion order.
    pub async fn find_one(
        pool: &PgPool,
        filter: &ResourceFilter,
    ) -> Result<Option<ResourceRow>, sqlx::Error> {
        let (where_clause, bind_values, _) = build_filter(filter);
        let query = format!("SELECT {COLUMNS} FROM resources {where_clause} ORDER BY _id ASC LIMIT 1");

        let mut q = sqlx::query_as::<_, ResourceRow>(&query);
        for value in &bind_values {
            q = q.bind(value.as_str());
        }
        q.fetch_optional(pool).await
    }

    /// Rows matching the filter in insertion order. A `limit` of `None`
    /// returns every row after `offset`.
    pub async fn list(
        pool: &PgPool,
        filter: &ResourceFilter,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ResourceRow>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_filter(filter);

        let query = format!(
            "SELECT {COLUMNS} FROM resources {where_clause} \
             ORDER BY _id ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, ResourceRow>(&query);
        for value in &bind_values {
            q = q.bind(value.as_str());
        }
        // `LIMIT NULL` is the same as no limit.
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count rows matching the filter.
    pub async fn count(pool: &PgPool, filter: &ResourceFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM resources {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for value in &bind_values {
            q = q.bind(value.as_str());
        }
        q.fetch_one(pool).await
    }
}

/// Build a WHERE clause for a resource filter.
///
/// Returns the clause, the text values to bind in order, and the next free
/// parameter index. Substring conditions use `strpos` so the term is taken
/// literally.
fn build_filter(filter: &ResourceFilter) -> (String, Vec<String>, usize) {
    let mut conditions = Vec::new();
    let mut bind_values = Vec::new();
    let mut bind_idx = 1usize;

    for (field, condition) in filter.conditions() {
        let column = field.as_str();
        match condition {
            Match::Exact(value) => {
                conditions.push(format!("{column} = ${bind_idx}"));
                bind_values.push(value.clone());
            }
            Match::Contains(value) => {
                conditions.push(format!("strpos({column}, ${bind_idx}) > 0"));
                bind_values.push(value.clone());
            }
        }
        bind_idx += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

#[cfg(test)]
mod tests {
    use catalog_core::search::ResourceField;

    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (clause, values, next) = build_filter(&ResourceFilter::new());
        assert_eq!(clause, "");
        assert!(values.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn conditions_are_numbered_in_order() {
        let filter = ResourceFilter::new()
            .contains(ResourceField::Seller, "dafiti")
            .exact(ResourceField::Id, "A-dafiti-90");
        let (clause, values, next) = build_filter(&filter);
        assert_eq!(clause, "WHERE strpos(seller, $1) > 0 AND id = $2");
        assert_eq!(values, vec!["dafiti".to_string(), "A-dafiti-90".to_string()]);
        assert_eq!(next, 3);
    }
}
