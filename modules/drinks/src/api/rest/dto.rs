use serde::{Deserialize, Serialize};

/// Full recipe line, as shown in the long view and accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDto {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Recipe line in the public short view: no ingredient names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIngredientDto {
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortDrinkDto {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredientDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongDrinkDto {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientDto>,
}

/// Clients send either a single ingredient object or an array of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    One(IngredientDto),
    Many(Vec<IngredientDto>),
}

impl RecipeInput {
    #[must_use]
    pub fn into_vec(self) -> Vec<IngredientDto> {
        match self {
            Self::One(ingredient) => vec![ingredient],
            Self::Many(ingredients) => ingredients,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

/// `{"success": true, "drinks": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    #[must_use]
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// `{"success": true, "deleted": <id>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i64,
}
