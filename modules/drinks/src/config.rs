use serde::{Deserialize, Serialize};

fn default_max_title_length() -> usize {
    80
}

/// Drinks module settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DrinksConfig {
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,

    /// Start with a single "water" drink in an otherwise empty store.
    #[serde(default)]
    pub seed_demo_drink: bool,
}

impl Default for DrinksConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            seed_demo_drink: false,
        }
    }
}
