//! Prompt rendering for the search agent using Handlebars

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::Category;
use crate::error::{ResearchError, Result};

const PROMPT_NAME: &str = "prompt";

/// Built-in prompt; the topic format it asks for is what `parse_topics` reads.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Today is {{date}}. Research the {{topics_count}} most recent and notable items about {{query}}.
Gather from both Japanese and English sources and write each summary in Japanese.

Use exactly this format, separating topics with ---:

### Title
Summary (100-200 characters)
Source: URL

---

### Title
Summary
Source: URL
";

#[derive(Serialize)]
struct PromptContext<'a> {
    date: String,
    topics_count: usize,
    query: &'a str,
    name: &'a str,
    id: &'a str,
}

/// Compiled agent prompt template
pub struct PromptTemplate {
    handlebars: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a template; `{{date}}`, `{{topics_count}}`, `{{query}}`, `{{name}}`
    /// and `{{id}}` are available.
    pub fn new(template: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Prompts are plain text
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(PROMPT_NAME, template)
            .map_err(|e| ResearchError::Render(format!("Failed to register prompt template: {}", e)))?;
        Ok(Self { handlebars })
    }

    /// Compile the configured template, or the built-in one
    pub fn from_config(template: Option<&str>) -> Result<Self> {
        Self::new(template.unwrap_or(DEFAULT_PROMPT_TEMPLATE))
    }

    pub fn render(&self, category: &Category, date: NaiveDate, topics_count: usize) -> Result<String> {
        let context = PromptContext {
            date: date.format("%Y-%m-%d").to_string(),
            topics_count,
            query: &category.query,
            name: &category.name,
            id: &category.id,
        };
        self.handlebars
            .render(PROMPT_NAME, &context)
            .map_err(|e| ResearchError::Render(format!("Failed to render prompt: {}", e)))
    }
}
