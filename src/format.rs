//! Plain-text rendering of recipes for the terminal

use crate::data::Recipe;

/// Renders a full recipe: header, metadata, ingredients and instructions
pub fn format_recipe(recipe: &Recipe) -> String {
    let title = format!("{} (ID: {})", recipe.name, recipe.id);
    let underline = "=".repeat(title.chars().count());
    let mut lines = vec![title, underline];

    match (recipe.category.as_deref(), recipe.area.as_deref()) {
        (Some(category), Some(area)) => {
            lines.push(format!("Category: {} | Cuisine: {}", category, area))
        }
        (Some(category), None) => lines.push(format!("Category: {}", category)),
        (None, Some(area)) => lines.push(format!("Cuisine: {}", area)),
        (None, None) => {}
    }

    let tags = recipe.tag_list();
    if !tags.is_empty() {
        lines.push(format!("Tags: {}", tags.join(", ")));
    }

    let ingredients = recipe.ingredients();
    if !ingredients.is_empty() {
        lines.push(String::new());
        lines.push("Ingredients:".to_string());
        lines.extend(ingredients.iter().map(|(ingredient, measure)| {
            if measure.is_empty() {
                format!("  - {}", ingredient)
            } else {
                format!("  - {} {}", measure, ingredient)
            }
        }));
    }

    if let Some(instructions) = recipe.instructions.as_deref().map(str::trim) {
        if !instructions.is_empty() {
            lines.push(String::new());
            lines.push("Instructions:".to_string());
            lines.push(instructions.to_string());
        }
    }

    if let Some(video) = recipe.youtube.as_deref().filter(|v| !v.is_empty()) {
        lines.push(String::new());
        lines.push(format!("Video: {}", video));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Renders a numbered list, one recipe per line
pub fn format_recipe_list(recipes: &[Recipe]) -> String {
    if recipes.is_empty() {
        return "No recipes found.".to_string();
    }

    recipes
        .iter()
        .enumerate()
        .map(|(i, recipe)| format!("{}. {} (ID: {})", i + 1, recipe.name, recipe.id))
        .collect::<Vec<_>>()
        .join("\n")
}
