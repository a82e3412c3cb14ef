//! `PostgreSQL` catalog repository.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

use chrono::NaiveDate;
use olivo_market_core::{Category, CategoryId, CategoryWithCount, Price, Product, ProductId, Slug};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{CatalogRepository, ProductIdentities, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.price, p.price_original, p.image, p.description,
           p.stock, p.featured, p.gallery, p.features, p.view_count, p.order_clicks,
           p.created_at,
           COALESCE(array_agg(c.name ORDER BY c.name) FILTER (WHERE c.name IS NOT NULL), '{}')
               AS categories
    FROM catalog.product p
    LEFT JOIN catalog.product_category pc ON pc.product_id = p.id
    LEFT JOIN catalog.category c ON c.id = pc.category_id
";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, is_active";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    price: Decimal,
    price_original: Option<Decimal>,
    image: String,
    description: String,
    stock: i32,
    featured: bool,
    gallery: Vec<String>,
    features: Vec<String>,
    view_count: i64,
    order_clicks: i64,
    created_at: NaiveDate,
    categories: Vec<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, detail: String| {
            RepositoryError::DataCorruption(format!("product {}: {field}: {detail}", row.id))
        };
        let slug = Slug::from_name(&row.slug).map_err(|e| corrupt("slug", e.to_string()))?;
        let price = Price::new(row.price).map_err(|e| corrupt("price", e.to_string()))?;
        let price_original = row
            .price_original
            .map(Price::new)
            .transpose()
            .map_err(|e| corrupt("price_original", e.to_string()))?;
        let stock = u32::try_from(row.stock).map_err(|e| corrupt("stock", e.to_string()))?;
        let view_count = u64::try_from(row.view_count).map_err(|e| corrupt("view_count", e.to_string()))?;
        let order_clicks =
            u64::try_from(row.order_clicks).map_err(|e| corrupt("order_clicks", e.to_string()))?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug,
            price,
            price_original,
            image: row.image,
            description: row.description,
            categories: row.categories.into_iter().collect(),
            stock,
            featured: row.featured,
            created_at: row.created_at,
            gallery: row.gallery,
            features: row.features,
            view_count,
            order_clicks,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    image: Option<String>,
    is_active: bool,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::from_name(&row.slug)
            .map_err(|e| RepositoryError::DataCorruption(format!("category {}: slug: {e}", row.id)))?;
        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug,
            description: row.description,
            image: row.image,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    products_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    slug: String,
    name: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Catalog stored in the `catalog` schema.
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message());
    }
    RepositoryError::Database(err)
}

fn to_i32(value: u32, field: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|_| RepositoryError::DataCorruption(format!("{field} out of range: {value}")))
}

fn to_i64(value: u64, field: &str) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|_| RepositoryError::DataCorruption(format!("{field} out of range: {value}")))
}

impl CatalogRepository for PgCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} GROUP BY p.id ORDER BY p.created_at DESC, p.name");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.slug = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn product_identities(&self) -> Result<ProductIdentities, RepositoryError> {
        let rows = sqlx::query_as::<_, IdentityRow>("SELECT slug, name FROM catalog.product")
            .fetch_all(&self.pool)
            .await?;
        let mut identities = ProductIdentities::default();
        for row in rows {
            let slug = Slug::from_name(&row.slug)
                .map_err(|e| RepositoryError::DataCorruption(format!("product slug {}: {e}", row.slug)))?;
            identities.insert(&slug, &row.name);
        }
        Ok(identities)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.product
                (id, name, slug, price, price_original, image, description, stock, featured,
                 gallery, features, view_count, order_clicks, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.price.amount())
        .bind(product.price_original.map(|p| p.amount()))
        .bind(&product.image)
        .bind(&product.description)
        .bind(to_i32(product.stock, "stock")?)
        .bind(product.featured)
        .bind(&product.gallery)
        .bind(&product.features)
        .bind(to_i64(product.view_count, "view_count")?)
        .bind(to_i64(product.order_clicks, "order_clicks")?)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("product slug already exists: {}", product.slug)))?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.product
            SET name = $2, slug = $3, price = $4, price_original = $5, image = $6,
                description = $7, stock = $8, featured = $9, gallery = $10, features = $11,
                view_count = $12, order_clicks = $13
            WHERE id = $1
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.price.amount())
        .bind(product.price_original.map(|p| p.amount()))
        .bind(&product.image)
        .bind(&product.description)
        .bind(to_i32(product.stock, "stock")?)
        .bind(product.featured)
        .bind(&product.gallery)
        .bind(&product.features)
        .bind(to_i64(product.view_count, "view_count")?)
        .bind(to_i64(product.order_clicks, "order_clicks")?)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("product slug already exists: {}", product.slug)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            r"
            SELECT c.id, c.name, c.slug, c.description, c.image, c.is_active,
                   COUNT(pc.product_id) AS products_count
            FROM catalog.category c
            LEFT JOIN catalog.product_category pc ON pc.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let products_count = u64::try_from(row.products_count)
                    .map_err(|e| RepositoryError::DataCorruption(format!("products_count: {e}")))?;
                Ok(CategoryWithCount {
                    category: row.category.try_into()?,
                    products_count,
                })
            })
            .collect()
    }

    async fn find_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM catalog.category WHERE id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM catalog.category WHERE lower(name) = lower($1)");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM catalog.category WHERE slug = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.category (id, name, slug, description, image, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(&category.description)
        .bind(category.image.as_deref())
        .bind(category.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("category with same name or slug already exists: {}", category.name)
            })
        })?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.category
            SET name = $2, slug = $3, description = $4, image = $5, is_active = $6
            WHERE id = $1
            ",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(&category.description)
        .bind(category.image.as_deref())
        .bind(category.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("category with same name or slug already exists: {}", category.name)
            })
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(format!("category {id} still has products"));
                }
                RepositoryError::Database(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_category(&self, product_id: &ProductId, category_id: &CategoryId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.product_category (product_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    async fn clear_categories(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM catalog.product_category WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_products_in_category(&self, id: &CategoryId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM catalog.product_category WHERE category_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        u64::try_from(count).map_err(|e| RepositoryError::DataCorruption(format!("count: {e}")))
    }
}
