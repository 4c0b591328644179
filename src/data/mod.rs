//! Remote recipe data
//!
//! This module contains the recipe record type and the TheMealDB API client.

pub mod meals;
pub mod recipe;

pub use meals::{related_from, MealClient, NetworkError, MEALDB_BASE_URL};
pub use recipe::Recipe;
