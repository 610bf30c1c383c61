use crate::api::rest::dto::{
    CreateDrinkRequest, IngredientDto, LongDrinkDto, ShortDrinkDto, ShortIngredientDto,
    UpdateDrinkRequest,
};
use crate::domain::model::{Drink, DrinkPatch, Ingredient, NewDrink};

impl From<Drink> for ShortDrinkDto {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink
                .recipe
                .into_iter()
                .map(|i| ShortIngredientDto {
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

impl From<Drink> for LongDrinkDto {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Ingredient> for IngredientDto {
    fn from(i: Ingredient) -> Self {
        Self {
            name: i.name,
            color: i.color,
            parts: i.parts,
        }
    }
}

impl From<IngredientDto> for Ingredient {
    fn from(dto: IngredientDto) -> Self {
        Self {
            name: dto.name,
            color: dto.color,
            parts: dto.parts,
        }
    }
}

impl From<CreateDrinkRequest> for NewDrink {
    fn from(req: CreateDrinkRequest) -> Self {
        Self {
            title: req.title,
            recipe: req.recipe.into_vec().into_iter().map(Into::into).collect(),
        }
    }
}

impl From<UpdateDrinkRequest> for DrinkPatch {
    fn from(req: UpdateDrinkRequest) -> Self {
        Self {
            title: req.title,
            recipe: req
                .recipe
                .map(|r| r.into_vec().into_iter().map(Into::into).collect()),
        }
    }
}
