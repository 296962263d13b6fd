//! Heuristics that recover title, ingredients and instructions from the source text
//! when the model leaves them out.
//!
//! Each field has an ordered list of named strategies. They are tried in order and the
//! first one that produces something wins. None of them fail; finding nothing is a valid
//! outcome.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// One named way of recovering a field from text
pub trait FallbackStrategy: Sync {
    type Output;

    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// Title strategies, in priority order
pub static TITLE_STRATEGIES: &[&(dyn FallbackStrategy<Output = String>)] =
    &[&FirstLineTitle, &PatternTitle];

/// Ingredient strategies, in priority order
pub static INGREDIENT_STRATEGIES: &[&(dyn FallbackStrategy<Output = Vec<String>>)] =
    &[&IngredientsSection, &QuantityLines];

/// Instruction strategies, in priority order
pub static INSTRUCTION_STRATEGIES: &[&(dyn FallbackStrategy<Output = Vec<String>>)] =
    &[&InstructionsSection, &NumberedLines];

/// Run `strategies` in order and return the first result along with the strategy's name.
pub fn first_match<T>(
    strategies: &[&(dyn FallbackStrategy<Output = T>)],
    text: &str,
) -> Option<(&'static str, T)> {
    strategies.iter().find_map(|strategy| {
        let found = strategy.extract(text)?;
        debug!("Fallback strategy '{}' matched", strategy.name());
        Some((strategy.name(), found))
    })
}

const SECTION_KEYWORDS: &[&str] = &[
    "ingredients",
    "instructions",
    "directions",
    "prep",
    "cook",
    "serves",
    "makes",
];

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[-•*]|\d+[.)])").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-•*]\s*").unwrap());
static NUMBERING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());

static TITLE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // "Grandma's Lasagna Recipe"
        Regex::new(r"(?im)^([^:\n]{5,80}?)\s*recipe").unwrap(),
        // "Recipe: Grandma's Lasagna"
        Regex::new(r"(?i)recipe:\s*([^:\n]{5,80})").unwrap(),
        // A capitalized line on its own
        Regex::new(r"(?m)^([A-Z][^:\n]{4,79})$").unwrap(),
    ]
});

static INGREDIENT_SECTIONS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)ingredients?[:\s]*\n((?:[-•*][ \t]*.+\n?)+)").unwrap(),
        Regex::new(r"(?i)ingredients?[:\s]*\n((?:\d+[.)]?[ \t]*.+\n?)+)").unwrap(),
    ]
});

static INSTRUCTION_SECTIONS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:instructions?|directions?|steps?|method)[:\s]*\n((?:[-•*][ \t]*.+\n?)+)")
            .unwrap(),
        Regex::new(
            r"(?i)(?:instructions?|directions?|steps?|method)[:\s]*\n((?:\d+[.)]?[ \t]*.+\n?)+)",
        )
        .unwrap(),
    ]
});

static QUANTITY_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*(cup|tbsp|tsp|oz|lb|g|kg|ml|l|gram|pound|ounce)").unwrap()
});

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+[.)][ \t]*(.+)$").unwrap());

/// First non-empty line, if it is short and does not open a section or list
pub struct FirstLineTitle;

impl FallbackStrategy for FirstLineTitle {
    type Output = String;

    fn name(&self) -> &'static str {
        "first_line"
    }

    fn extract(&self, text: &str) -> Option<String> {
        let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
        let lower = line.to_lowercase();

        if line.chars().count() >= 100
            || SECTION_KEYWORDS.iter().any(|k| lower.starts_with(k))
            || LIST_MARKER.is_match(line)
        {
            return None;
        }
        Some(line.to_string())
    }
}

/// "<text> recipe", "recipe: <text>" or a capitalized line, capped at 80 characters
pub struct PatternTitle;

impl FallbackStrategy for PatternTitle {
    type Output = String;

    fn name(&self) -> &'static str {
        "title_pattern"
    }

    fn extract(&self, text: &str) -> Option<String> {
        TITLE_PATTERNS.iter().find_map(|pattern| {
            let title = pattern.captures(text)?.get(1)?.as_str().trim();
            (!title.is_empty()).then(|| title.to_string())
        })
    }
}

/// Bulleted or numbered lines under an "Ingredients" heading
pub struct IngredientsSection;

impl FallbackStrategy for IngredientsSection {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "ingredients_section"
    }

    fn extract(&self, text: &str) -> Option<Vec<String>> {
        section_items(&INGREDIENT_SECTIONS[..], text)
    }
}

/// Any short line that mentions a quantity with a unit
pub struct QuantityLines;

impl FallbackStrategy for QuantityLines {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "quantity_lines"
    }

    fn extract(&self, text: &str) -> Option<Vec<String>> {
        let items: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.chars().count() <= 100)
            .filter(|line| QUANTITY_UNIT.is_match(line))
            .map(|line| BULLET.replace(line, "").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        non_empty(items)
    }
}

/// Bulleted or numbered lines under an instructions/directions/steps/method heading
pub struct InstructionsSection;

impl FallbackStrategy for InstructionsSection {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "instructions_section"
    }

    fn extract(&self, text: &str) -> Option<Vec<String>> {
        section_items(&INSTRUCTION_SECTIONS[..], text)
    }
}

/// Every "1. ..." style line in the text
pub struct NumberedLines;

impl FallbackStrategy for NumberedLines {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "numbered_lines"
    }

    fn extract(&self, text: &str) -> Option<Vec<String>> {
        let items: Vec<String> = NUMBERED_LINE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        non_empty(items)
    }
}

fn section_items(patterns: &[Regex], text: &str) -> Option<Vec<String>> {
    patterns.iter().find_map(|pattern| {
        let block = pattern.captures(text)?.get(1)?.as_str();
        non_empty(block.lines().filter_map(strip_marker).collect())
    })
}

fn strip_marker(line: &str) -> Option<String> {
    let line = line.trim();
    let line = BULLET.replace(line, "");
    let line = NUMBERING.replace(&line, "");
    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTION: &str = "Creamy Garlic Pasta\n\nIngredients:\n- 200g pasta\n- 2 cloves garlic\n- 1 cup cream\n\nInstructions:\n1. Boil the pasta.\n2. Fry the garlic.\n3. Stir in cream.";

    #[test]
    fn test_first_line_title() {
        assert_eq!(
            FirstLineTitle.extract(CAPTION).as_deref(),
            Some("Creamy Garlic Pasta")
        );
    }

    #[test]
    fn test_first_line_rejects_keywords_and_markers() {
        assert_eq!(FirstLineTitle.extract("Ingredients:\n- flour"), None);
        assert_eq!(FirstLineTitle.extract("Serves 4"), None);
        assert_eq!(FirstLineTitle.extract("- 2 eggs"), None);
        assert_eq!(FirstLineTitle.extract("1. Preheat oven"), None);
        assert_eq!(FirstLineTitle.extract(&"x".repeat(100)), None);
    }

    #[test]
    fn test_first_line_skips_blank_lines() {
        assert_eq!(
            FirstLineTitle.extract("\n\n  Banana Bread  \nmore").as_deref(),
            Some("Banana Bread")
        );
    }

    #[test]
    fn test_pattern_title_recipe_suffix() {
        let text = format!("{}\nMy Famous Chili Recipe\nmore", "y".repeat(120));
        assert_eq!(
            PatternTitle.extract(&text).as_deref(),
            Some("My Famous Chili")
        );
    }

    #[test]
    fn test_pattern_title_recipe_prefix() {
        let text = format!("{} recipe: Lemon Tart", "z".repeat(120));
        assert_eq!(PatternTitle.extract(&text).as_deref(), Some("Lemon Tart"));
    }

    #[test]
    fn test_pattern_title_capitalized_line() {
        let text = "ingredients first\n- flour\nBanana Bread\n";
        assert_eq!(PatternTitle.extract(text).as_deref(), Some("Banana Bread"));
    }

    #[test]
    fn test_title_strategies_give_up() {
        assert_eq!(first_match(TITLE_STRATEGIES, "- flour\n- sugar"), None);
    }

    #[test]
    fn test_ingredients_section_bullets() {
        assert_eq!(
            IngredientsSection.extract(CAPTION).unwrap(),
            vec!["200g pasta", "2 cloves garlic", "1 cup cream"]
        );
    }

    #[test]
    fn test_ingredients_section_numbered() {
        let text = "Ingredients\n1. 2 eggs\n2) 1 cup flour\n";
        assert_eq!(
            IngredientsSection.extract(text).unwrap(),
            vec!["2 eggs", "1 cup flour"]
        );
    }

    #[test]
    fn test_quantity_lines() {
        let text = "Quick snack\n2 tbsp peanut butter\nspread on toast\n* 1 cup milk";
        assert_eq!(
            QuantityLines.extract(text).unwrap(),
            vec!["2 tbsp peanut butter", "1 cup milk"]
        );
    }

    #[test]
    fn test_ingredient_strategy_order() {
        let (name, items) = first_match(INGREDIENT_STRATEGIES, CAPTION).unwrap();
        assert_eq!(name, "ingredients_section");
        assert_eq!(items.len(), 3);

        let (name, _) = first_match(INGREDIENT_STRATEGIES, "mix 500g flour with water").unwrap();
        assert_eq!(name, "quantity_lines");

        assert_eq!(first_match(INGREDIENT_STRATEGIES, "just vibes"), None);
    }

    #[test]
    fn test_instructions_section() {
        assert_eq!(
            InstructionsSection.extract(CAPTION).unwrap(),
            vec!["Boil the pasta.", "Fry the garlic.", "Stir in cream."]
        );
    }

    #[test]
    fn test_method_heading_with_bullets() {
        let text = "Method:\n- Chop\n- Fry\n";
        assert_eq!(InstructionsSection.extract(text).unwrap(), vec!["Chop", "Fry"]);
    }

    #[test]
    fn test_numbered_lines_anywhere() {
        let text = "Soup\nfirst you need stuff\n1. Chop onions\nthen\n2) Simmer";
        assert_eq!(
            NumberedLines.extract(text).unwrap(),
            vec!["Chop onions", "Simmer"]
        );
    }

    #[test]
    fn test_instruction_strategies_give_up() {
        assert_eq!(first_match(INSTRUCTION_STRATEGIES, "nothing here"), None);
    }
}
