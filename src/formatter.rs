use crate::model::{MacroNutrients, Recipe};
use log::{debug, error, info};
use serde::Serialize;
use std::fmt::Write;

/// Frontmatter keys, in the order they are rendered
#[derive(Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prep_time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cook_time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cuisine: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_ingredient: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    servings: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calories_per_serving: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    macros: Option<&'a MacroNutrients>,
    created: String,
}

/// Renders recipes as Markdown with a YAML frontmatter block
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn format(&self, recipe: &Recipe) -> String {
        debug!("Formatting recipe: {}", recipe.title());

        let markdown = format!(
            "---\n{}---\n\n{}",
            self.frontmatter(recipe),
            self.body(recipe)
        );

        info!("Formatted recipe: {}", recipe.title());
        markdown
    }

    fn frontmatter(&self, recipe: &Recipe) -> String {
        let meta = &recipe.metadata;
        let frontmatter = Frontmatter {
            title: &meta.title,
            prep_time: meta.prep_time.as_deref(),
            cook_time: meta.cook_time.as_deref(),
            cuisine: meta.cuisine.as_deref(),
            url: meta.url.as_ref().map(|u| u.as_str()),
            main_ingredient: meta.main_ingredient.as_deref(),
            servings: meta.servings,
            calories_per_serving: meta.calories_per_serving,
            macros: meta.macros.as_ref(),
            created: meta.created.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        };

        // Only strings, numbers and one flat map are serialized here
        serde_yaml::to_string(&frontmatter).unwrap_or_else(|e| {
            error!("Failed to serialize frontmatter: {}", e);
            format!("title: {}\n", meta.title)
        })
    }

    fn body(&self, recipe: &Recipe) -> String {
        let mut body = format!("# {}\n\n## Ingredients\n\n", recipe.title());
        for ingredient in &recipe.ingredients {
            let _ = writeln!(body, "- {ingredient}");
        }

        body.push_str("\n## Instructions\n\n");
        for (i, instruction) in recipe.instructions.iter().enumerate() {
            let _ = writeln!(body, "{}. {}", i + 1, instruction);
        }

        if let Some(notes) = recipe.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            let _ = write!(body, "\n## Notes\n\n{notes}\n");
        }

        body
    }
}
