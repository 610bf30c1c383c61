use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::error::DomainError;
use crate::domain::model::{Drink, NewDrink};
use crate::domain::repo::DrinkRepository;

#[derive(Default)]
struct Store {
    last_id: i64,
    drinks: BTreeMap<i64, Drink>,
}

impl Store {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

/// Process-local drink store; ids start at 1 and are never reused.
#[derive(Default)]
pub struct InMemoryDrinkRepository {
    store: RwLock<Store>,
}

impl InMemoryDrinkRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkRepository for InMemoryDrinkRepository {
    async fn find_all(&self) -> Result<Vec<Drink>, DomainError> {
        Ok(self.store.read().drinks.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, DomainError> {
        Ok(self.store.read().drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, DomainError> {
        let mut store = self.store.write();
        if store.title_taken(&drink.title, None) {
            return Err(DomainError::conflict(drink.title));
        }
        store.last_id += 1;
        let stored = Drink {
            id: store.last_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        store.drinks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, drink: Drink) -> Result<Drink, DomainError> {
        let mut store = self.store.write();
        if !store.drinks.contains_key(&drink.id) {
            return Err(DomainError::not_found(drink.id));
        }
        if store.title_taken(&drink.title, Some(drink.id)) {
            return Err(DomainError::conflict(drink.title));
        }
        store.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.store.write().drinks.remove(&id).is_some())
    }
}
