use std::sync::Arc;

use super::error::DomainError;
use super::model::{Drink, DrinkPatch, Ingredient, NewDrink};
use super::repo::DrinkRepository;
use crate::config::DrinksConfig;

pub struct DrinkService {
    repo: Arc<dyn DrinkRepository>,
    config: DrinksConfig,
}

impl DrinkService {
    #[must_use]
    pub fn new(repo: Arc<dyn DrinkRepository>, config: DrinksConfig) -> Self {
        Self { repo, config }
    }

    /// # Errors
    /// Propagates repository failures.
    pub async fn list(&self) -> Result<Vec<Drink>, DomainError> {
        self.repo.find_all().await
    }

    /// # Errors
    /// `Validation` for bad input, `Conflict` for a duplicate title.
    pub async fn create(&self, new: NewDrink) -> Result<Drink, DomainError> {
        let new = NewDrink {
            title: self.validate_title(&new.title)?,
            recipe: new.recipe,
        };
        validate_recipe(&new.recipe)?;

        let drink = self.repo.insert(new).await?;
        tracing::info!(drink_id = drink.id, title = %drink.title, "drink created");
        Ok(drink)
    }

    /// # Errors
    /// `NotFound` for an unknown id, otherwise as [`DrinkService::create`].
    pub async fn update(&self, id: i64, patch: DrinkPatch) -> Result<Drink, DomainError> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(id))?;

        let patch = DrinkPatch {
            title: patch
                .title
                .map(|t| self.validate_title(&t))
                .transpose()?,
            recipe: patch.recipe,
        };
        if let Some(recipe) = &patch.recipe {
            validate_recipe(recipe)?;
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let drink = self.repo.update(patch.apply(current)).await?;
        tracing::info!(drink_id = drink.id, "drink updated");
        Ok(drink)
    }

    /// Returns the id of the deleted drink.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn delete(&self, id: i64) -> Result<i64, DomainError> {
        if !self.repo.delete(id).await? {
            return Err(DomainError::not_found(id));
        }
        tracing::info!(drink_id = id, "drink deleted");
        Ok(id)
    }

    fn validate_title(&self, title: &str) -> Result<String, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > self.config.max_title_length {
            return Err(DomainError::validation(
                "title",
                format!(
                    "exceeds maximum length of {}",
                    self.config.max_title_length
                ),
            ));
        }
        Ok(title.to_owned())
    }
}

fn validate_recipe(recipe: &[Ingredient]) -> Result<(), DomainError> {
    if recipe.is_empty() {
        return Err(DomainError::validation(
            "recipe",
            "must contain at least one ingredient",
        ));
    }
    for ingredient in recipe {
        if ingredient.name.trim().is_empty() {
            return Err(DomainError::validation(
                "recipe.name",
                "must not be empty",
            ));
        }
        if ingredient.parts == 0 {
            return Err(DomainError::validation(
                "recipe.parts",
                "must be at least 1",
            ));
        }
    }
    Ok(())
}
