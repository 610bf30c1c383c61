use std::sync::Arc;

use axum::Router;
use drinks_auth::AuthorizationGate;
use tracing::info;

use crate::api::rest::routes;
use crate::config::DrinksConfig;
use crate::domain::error::DomainError;
use crate::domain::model::{Ingredient, NewDrink};
use crate::domain::repo::DrinkRepository;
use crate::domain::service::DrinkService;
use crate::infra::storage::memory_repo::InMemoryDrinkRepository;

/// Wires storage, service and REST routes for the drinks catalog.
pub struct DrinksModule {
    service: Arc<DrinkService>,
}

impl DrinksModule {
    /// Build the module over the in-memory store.
    ///
    /// # Errors
    /// Fails only if seeding the demo drink fails.
    pub async fn init(config: DrinksConfig) -> Result<Self, DomainError> {
        Self::with_repository(Arc::new(InMemoryDrinkRepository::new()), config).await
    }

    /// Build the module over a caller-supplied repository.
    ///
    /// # Errors
    /// Fails only if seeding the demo drink fails.
    pub async fn with_repository(
        repo: Arc<dyn DrinkRepository>,
        config: DrinksConfig,
    ) -> Result<Self, DomainError> {
        if config.seed_demo_drink && repo.find_all().await?.is_empty() {
            let water = repo.insert(demo_drink()).await?;
            info!(drink_id = water.id, "seeded demo drink");
        }
        info!(
            max_title_length = config.max_title_length,
            "drinks module initialized"
        );
        Ok(Self {
            service: Arc::new(DrinkService::new(repo, config)),
        })
    }

    #[must_use]
    pub fn service(&self) -> Arc<DrinkService> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn router(&self, gate: Arc<AuthorizationGate>) -> Router {
        routes::router(self.service(), gate)
    }
}

fn demo_drink() -> NewDrink {
    NewDrink {
        title: "water".to_owned(),
        recipe: vec![Ingredient {
            name: "water".to_owned(),
            color: "blue".to_owned(),
            parts: 1,
        }],
    }
}
