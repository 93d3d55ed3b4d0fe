use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{NewProduct, Product};

pub async fn fetch_products(product_ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in product_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
    trace!("📦️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

/// Adds a product to the catalog. The gateway itself never edits the catalog; this exists for seeding.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let mut products = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, image_url, is_available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.image_url)
    .bind(product.is_available)
    .fetch_all(conn)
    .await?;
    products.pop().ok_or(sqlx::Error::RowNotFound)
}
