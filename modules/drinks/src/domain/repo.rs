use async_trait::async_trait;

use super::error::DomainError;
use super::model::{Drink, NewDrink};

/// Storage for drinks. Titles are unique across the store.
#[async_trait]
pub trait DrinkRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Drink>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, DomainError>;

    /// Store a new drink and assign its id.
    async fn insert(&self, drink: NewDrink) -> Result<Drink, DomainError>;

    /// Replace a stored drink. Fails with `NotFound` if the id is unknown.
    async fn update(&self, drink: Drink) -> Result<Drink, DomainError>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
}
