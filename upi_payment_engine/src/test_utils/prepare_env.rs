use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use upg_common::Paise;

use crate::{
    db_types::{NewProduct, NewUser, Product, User},
    traits::AuthManagement,
    SqliteDatabase,
};

/// Creates a fresh database at `url`, runs the migrations, and returns a connection to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    run_migrations(&db).await;
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/upg_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(db: &SqliteDatabase) {
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Database {url} was not dropped: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub async fn drop_database(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        warn!("Failed to close database {url}: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Failed to drop database {url}: {e}");
    }
}

/// A customer with a complete shipping profile.
pub async fn seed_customer(db: &SqliteDatabase, email: &str) -> User {
    let user = NewUser {
        email: email.to_string(),
        full_name: "Asha Rao".to_string(),
        phone: Some("9876543210".to_string()),
        shipping_address: Some("14 MG Road, Bengaluru 560001".to_string()),
    };
    db.insert_user(user).await.expect("Error creating customer")
}

/// A customer who has not given an address or phone number yet.
pub async fn seed_customer_without_profile(db: &SqliteDatabase, email: &str) -> User {
    let user = NewUser { email: email.to_string(), full_name: "Ravi Kumar".to_string(), phone: None, shipping_address: None };
    db.insert_user(user).await.expect("Error creating customer")
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, price: Paise) -> Product {
    db.insert_product(NewProduct::new(name, price)).await.expect("Error creating product")
}
