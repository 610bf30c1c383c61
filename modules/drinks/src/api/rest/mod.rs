pub mod dto;
pub mod error;
pub mod handlers;
mod mappers;
pub mod routes;

pub use dto::{
    CreateDrinkRequest, DeletedResponse, DrinksResponse, IngredientDto, LongDrinkDto,
    RecipeInput, ShortDrinkDto, ShortIngredientDto, UpdateDrinkRequest,
};
