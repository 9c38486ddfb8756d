//! Offline template responder.
//!
//! When no chat provider is configured (or the provider call fails), the
//! gateway answers with a canned, lightly personalized code snippet chosen
//! by keyword. Classification is an ordered rule table: the first rule whose
//! keyword appears in the lower-cased message wins, there is no scoring.
//!
//! Everything here is a pure function of the input string.

mod templates;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Template category a message resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    React,
    Css,
    JavaScript,
    Html,
    /// No keyword matched.
    Fallback,
}

impl Category {
    /// All categories in precedence order.
    pub const ALL: &'static [Category] = &[
        Category::React,
        Category::Css,
        Category::JavaScript,
        Category::Html,
        Category::Fallback,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::React => "React",
            Category::Css => "CSS",
            Category::JavaScript => "JavaScript",
            Category::Html => "HTML",
            Category::Fallback => "Fallback",
        }
    }

    /// Name used when the message carries no usable identifier.
    /// `None` for categories whose template has no name slot.
    pub fn default_identifier(self) -> Option<&'static str> {
        match self {
            Category::React => Some("MyComponent"),
            Category::JavaScript => Some("myFunction"),
            Category::Css | Category::Html | Category::Fallback => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Rule table ───────────────────────────────────────────────────

struct Rule {
    keywords: &'static [&'static str],
    category: Category,
}

/// Evaluated top to bottom; order is the precedence.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["react", "component"],
        category: Category::React,
    },
    Rule {
        keywords: &["css", "style"],
        category: Category::Css,
    },
    Rule {
        // "function" keeps "write a function for X" in this category
        keywords: &["javascript", "js", "function"],
        category: Category::JavaScript,
    },
    Rule {
        keywords: &["html"],
        category: Category::Html,
    },
];

/// Classify a message into exactly one category.
pub fn classify(message: &str) -> Category {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
        .map_or(Category::Fallback, |rule| rule.category)
}

// ── Identifier extraction ────────────────────────────────────────

// NOTE: expect() is acceptable on literal patterns compiled once.
static REACT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)create.*?component.*?\bfor\s+(\w+)")
            .expect("Invalid regex: create-component-for pattern"),
        Regex::new(r"(?i)component.*?\bfor\s+(\w+)")
            .expect("Invalid regex: component-for pattern"),
    ]
});

static JAVASCRIPT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)function.*?\bfor\s+(\w+)")
            .expect("Invalid regex: function-for pattern"),
        Regex::new(r"(?i)create.*?function\s+(\w+)")
            .expect("Invalid regex: create-function pattern"),
    ]
});

fn first_capture(patterns: &[Regex], message: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Identifier to substitute into the category's template.
///
/// Returns `None` for categories without a name slot. For React and
/// JavaScript this is always `Some`, falling back to the default name.
pub fn extract_identifier(category: Category, message: &str) -> Option<String> {
    let default = category.default_identifier()?;
    let extracted = match category {
        Category::React => first_capture(&REACT_PATTERNS, message).map(|w| format!("{w}Component")),
        Category::JavaScript => first_capture(&JAVASCRIPT_PATTERNS, message),
        _ => None,
    };
    Some(extracted.unwrap_or_else(|| default.to_string()))
}

// ── Rendering ────────────────────────────────────────────────────

/// Render the template for `category`, substituting `identifier` where the
/// template expects a name. A missing identifier uses the category default.
pub fn render(category: Category, identifier: Option<&str>) -> String {
    let name = identifier
        .or_else(|| category.default_identifier())
        .unwrap_or_default();
    match category {
        Category::React => templates::react(name),
        Category::Css => templates::CSS.to_string(),
        Category::JavaScript => templates::javascript(name),
        Category::Html => templates::HTML.to_string(),
        Category::Fallback => templates::FALLBACK.to_string(),
    }
}

/// Produce the offline response for a chat message. Never fails.
pub fn dispatch(message: &str) -> String {
    let category = classify(message);
    let identifier = extract_identifier(category, message);
    render(category, identifier.as_deref())
}
