use super::Recipe;
use crate::yaml::load_from_yaml_array_str;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use tracing::debug;

const BUILTIN_RECIPES: &[&str] = &[include_str!("yml/denim.yml")];

/// The set of recipes known to the pipeline generator.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    /// Recipes embedded in the binary.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::default();
        for yaml in BUILTIN_RECIPES {
            catalog
                .extend_from_yaml_str(yaml)
                .context("failed to load embedded recipes")?;
        }
        Ok(catalog)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut catalog = Self::default();
        catalog.extend_from_yaml_str(yaml)?;
        Ok(catalog)
    }

    fn extend_from_yaml_str(&mut self, yaml: &str) -> Result<()> {
        let recipes: Vec<Recipe> = load_from_yaml_array_str(yaml, "recipes")?;
        let mut names: HashSet<String> = self.recipes.iter().map(|r| r.name.clone()).collect();
        for recipe in recipes {
            if !names.insert(recipe.name.clone()) {
                bail!("recipe {} is declared more than once", recipe.name);
            }
            debug!(
                "Loaded recipe {} with {} processes",
                recipe.name,
                recipe.processes.len()
            );
            self.recipes.push(recipe);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
