//! Markdown topic parser
//!
//! The agent is asked to answer in this shape, one block per topic,
//! blocks separated by `---`:
//!
//! ```text
//! ### Title
//! One or more summary lines
//! Source: https://example.com/article
//! ```

use crate::domain::Topic;

const SOURCE_LABELS: [&str; 3] = ["Source", "ソース", "出典"];

/// Parse the agent's markdown answer into topics.
///
/// Text before the first `### ` heading is ignored, as are sections whose
/// heading is empty.
pub fn parse_topics(markdown: &str) -> Vec<Topic> {
    let mut topics = Vec::new();
    let mut current: Option<SectionBuilder> = None;

    for line in markdown.lines() {
        if let Some(title) = line.strip_prefix("### ") {
            if let Some(section) = current.take() {
                section.finish_into(&mut topics);
            }
            current = Some(SectionBuilder::new(title));
            continue;
        }

        if let Some(section) = current.as_mut() {
            section.push_line(line);
        }
    }

    if let Some(section) = current {
        section.finish_into(&mut topics);
    }

    topics
}

struct SectionBuilder {
    title: String,
    summary: Vec<String>,
    source: Option<String>,
}

impl SectionBuilder {
    fn new(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            summary: Vec::new(),
            source: None,
        }
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line == "---" {
            return;
        }

        if let Some(url) = labelled_source(line).or_else(|| markdown_link_source(line)) {
            self.source = Some(url.to_string());
        } else {
            self.summary.push(line.to_string());
        }
    }

    fn finish_into(self, topics: &mut Vec<Topic>) {
        if self.title.is_empty() {
            return;
        }
        topics.push(Topic {
            title: self.title,
            summary: self.summary.join(" "),
            source: self.source,
        });
    }
}

/// `Source: https://...` (ASCII or full-width colon)
fn labelled_source(line: &str) -> Option<&str> {
    let rest = SOURCE_LABELS.iter().find_map(|label| line.strip_prefix(label))?;
    let rest = rest.strip_prefix(':').or_else(|| rest.strip_prefix('：'))?;
    let url = rest.split_whitespace().next()?;
    is_http(url).then_some(url)
}

/// `[text](https://...)`, optionally as a list item
fn markdown_link_source(line: &str) -> Option<&str> {
    let line = line.strip_prefix('-').unwrap_or(line).trim_start();
    let rest = line.strip_prefix('[')?;
    let close = rest.find("](")?;
    let after = &rest[close + 2..];
    let end = after.find(')')?;
    let url = &after[..end];
    is_http(url).then_some(url)
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
