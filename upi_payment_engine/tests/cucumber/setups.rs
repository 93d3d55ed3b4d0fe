use cucumber::given;
use upg_common::Paise;
use upi_payment_engine::test_utils::prepare_env::{seed_customer, seed_customer_without_profile, seed_product};

use crate::{
    cucumber::UpgWorld,
    support::{rupees, TestSystem},
};

#[given("a fresh install")]
async fn fresh_database(world: &mut UpgWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "the catalog lists {string} at {word} rupees")]
async fn catalog_product(world: &mut UpgWorld, name: String, price: String) {
    let price = Paise::try_from_decimal(rupees(&price)).expect("Not a valid price");
    let product = seed_product(&world.system().db, &name, price).await;
    world.products.insert(name, product);
}

#[given(expr = "customer {string} has a complete shipping profile")]
async fn customer_with_profile(world: &mut UpgWorld, email: String) {
    let user = seed_customer(&world.system().db, &email).await;
    world.customers.insert(email, user);
}

#[given(expr = "customer {string} has not filled in a shipping profile")]
async fn customer_without_profile(world: &mut UpgWorld, email: String) {
    let user = seed_customer_without_profile(&world.system().db, &email).await;
    world.customers.insert(email, user);
}
