//! Health topic tracking across a conversation
//!
//! Words from recorded exchanges that mention a health keyword are kept so
//! the UI can warn before the user asks about the same thing again.

use std::collections::BTreeSet;

const HEALTH_KEYWORDS: [&str; 15] = [
    "exercise",
    "diet",
    "sleep",
    "stress",
    "nutrition",
    "fitness",
    "mental",
    "physical",
    "health",
    "wellness",
    "symptoms",
    "pain",
    "medicine",
    "doctor",
    "treatment",
];

#[derive(Debug, Clone, Default)]
pub struct TopicTracker {
    topics: BTreeSet<String>,
}

impl TopicTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect topic words from a completed exchange
    pub fn record(&mut self, message: &str, response: &str) {
        let words = message.split_whitespace().chain(response.split_whitespace());
        for word in words {
            let word = normalize(word);
            if !word.is_empty() && HEALTH_KEYWORDS.iter().any(|k| word.contains(k)) {
                self.topics.insert(word);
            }
        }
    }

    /// Whether `draft` mentions a topic that was already discussed
    pub fn is_recent(&self, draft: &str) -> bool {
        let draft = draft.to_lowercase();
        self.topics.iter().any(|topic| draft.contains(topic.as_str()))
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().cloned().collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
