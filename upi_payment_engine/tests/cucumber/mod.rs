mod setups;
mod steps;

pub use upg_world::UpgWorld;
