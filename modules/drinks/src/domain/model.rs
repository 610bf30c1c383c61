/// One line of a recipe: how many parts of which ingredient, and its color in
/// the drink graphic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// A drink that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl DrinkPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }

    /// Apply the patch on top of an existing drink.
    #[must_use]
    pub fn apply(self, mut drink: Drink) -> Drink {
        if let Some(title) = self.title {
            drink.title = title;
        }
        if let Some(recipe) = self.recipe {
            drink.recipe = recipe;
        }
        drink
    }
}
