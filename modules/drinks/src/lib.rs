//! Drinks catalog: domain model, in-memory storage and the REST API.
//!
//! Reading the public short listing needs no credentials. Every other
//! operation requires a bearer token carrying the matching permission scope;
//! see [`scopes`].

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;
pub mod scopes;

pub use config::DrinksConfig;
pub use domain::error::DomainError;
pub use domain::model::{Drink, DrinkPatch, Ingredient, NewDrink};
pub use domain::repo::DrinkRepository;
pub use domain::service::DrinkService;
pub use infra::storage::memory_repo::InMemoryDrinkRepository;
pub use module::DrinksModule;
