//! TheMealDB API client
//!
//! This module builds requests against the read-only TheMealDB JSON API and
//! decodes the `{ "meals": [...] | null }` envelope every endpoint returns.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::Recipe;
use crate::resilience::TimedOut;

/// Base URL for the public TheMealDB API
pub const MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Errors that can occur when calling the remote API
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or the connection failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP error! Status: {0}")]
    Status(StatusCode),

    /// The response body was not the expected JSON document
    #[error("Failed to decode API response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The call did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimedOut> for NetworkError {
    fn from(e: TimedOut) -> Self {
        NetworkError::Timeout(e.0)
    }
}

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
struct MealsResponse {
    #[serde(default)]
    meals: Option<Vec<Recipe>>,
}

/// Client for fetching recipes from TheMealDB
#[derive(Debug, Clone)]
pub struct MealClient {
    http_client: Client,
    base_url: String,
}

impl Default for MealClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MealClient {
    /// Creates a client for the public API
    pub fn new() -> Self {
        Self::with_base_url(MEALDB_BASE_URL)
    }

    /// Creates a client for a custom base URL (mirrors, local test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are built from
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Searches recipes by (partial) name
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<Recipe>, NetworkError> {
        self.get_meals("search.php", &[("s", query)]).await
    }

    /// Looks up a single recipe by its id
    pub async fn lookup_by_id(&self, id: &str) -> Result<Option<Recipe>, NetworkError> {
        let meals = self.get_meals("lookup.php", &[("i", id)]).await?;
        Ok(meals.into_iter().next())
    }

    /// Lists recipes whose name starts with the first character of `letter`
    pub async fn search_by_first_letter(&self, letter: &str) -> Result<Vec<Recipe>, NetworkError> {
        let first: String = letter.chars().take(1).collect();
        self.get_meals("search.php", &[("f", first.as_str())]).await
    }

    /// Lists recipes using an ingredient (partial records)
    pub async fn filter_by_ingredient(&self, ingredient: &str) -> Result<Vec<Recipe>, NetworkError> {
        self.get_meals("filter.php", &[("i", ingredient)]).await
    }

    /// Lists recipes in a category (partial records)
    pub async fn filter_by_category(&self, category: &str) -> Result<Vec<Recipe>, NetworkError> {
        self.get_meals("filter.php", &[("c", category)]).await
    }

    /// Fetches one random recipe
    pub async fn random(&self) -> Result<Option<Recipe>, NetworkError> {
        let meals = self.get_meals("random.php", &[]).await?;
        Ok(meals.into_iter().next())
    }

    /// Other recipes from the same category, at most `limit`
    ///
    /// A recipe without a category has no related recipes.
    pub async fn related_recipes(
        &self,
        recipe: &Recipe,
        limit: usize,
    ) -> Result<Vec<Recipe>, NetworkError> {
        let Some(category) = recipe.category.as_deref() else {
            return Ok(Vec::new());
        };
        let meals = self.filter_by_category(category).await?;
        Ok(related_from(meals, &recipe.id, limit))
    }

    /// Sends a GET to `{base_url}/{endpoint}` and unwraps the `meals` envelope
    async fn get_meals(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Recipe>, NetworkError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "requesting");

        let response = self.http_client.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(NetworkError::Status(response.status()));
        }

        let body = response
            .json::<MealsResponse>()
            .await
            .map_err(NetworkError::Decode)?;
        Ok(body.meals.unwrap_or_default())
    }
}

/// Drops the recipe itself from a category listing and truncates to `limit`
pub fn related_from(meals: Vec<Recipe>, own_id: &str, limit: usize) -> Vec<Recipe> {
    meals
        .into_iter()
        .filter(|meal| meal.id != own_id)
        .take(limit)
        .collect()
}
