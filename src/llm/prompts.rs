//! Prompt templates for flashcard generation

use std::collections::HashMap;

use crate::models::GradeLevel;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables in a single pass. Values are
    /// inserted verbatim; placeholders inside them are not expanded.
    /// Unknown placeholders are left as written.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                result.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let name = &after[..close];
            match values.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(name);
                    result.push_str("}}");
                }
            }
            rest = &after[close + 2..];
        }
        result.push_str(rest);
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Flashcard prompt templates
pub struct FlashcardPrompts;

impl FlashcardPrompts {
    /// Main generation prompt
    #[must_use]
    pub fn generation() -> PromptTemplate {
        PromptTemplate::new(
            r#"Generate {{count}} clear, concise flashcards about {{topic}}. Use the most up-to-date information available.

{{grade_instructions}}

IMPORTANT: Do NOT enumerate or number the flashcards in your response. Return the data in the requested JSON format.

Each flashcard should contain:
- A term or concept as the "word" field
- A concise 1-2 sentence explanation as the "definition" field"#,
        )
    }

    /// Audience instructions for a grade level
    #[must_use]
    pub fn grade_instructions(level: GradeLevel) -> &'static str {
        match level {
            GradeLevel::Elementary => "Target these flashcards for elementary school students (grades 1-5). Use simple language, short sentences, and basic concepts. Definitions should be easy to understand with common vocabulary.",
            GradeLevel::Middle => "Target these flashcards for middle school students (grades 6-8). Use clear language with some subject-specific vocabulary, but explain any complex terms. Definitions should be straightforward but can introduce more nuanced concepts.",
            GradeLevel::HighSchool => "Target these flashcards for high school students (grades 9-12). Use appropriate academic language and subject-specific terminology. Definitions can include more complex concepts and relationships between ideas.",
            GradeLevel::College => "Target these flashcards for college-level students. Use precise academic language and discipline-specific terminology. Definitions should be comprehensive and can include theoretical frameworks and advanced concepts.",
            GradeLevel::Advanced => "Target these flashcards for advanced or professional-level users. Use specialized terminology, technical language, and sophisticated concepts. Definitions can include detailed explanations of complex topics and references to current research or advanced applications.",
        }
    }

    /// Instructions for a raw grade value; anything unrecognized is treated as middle school
    #[must_use]
    pub fn grade_instructions_for(raw: &str) -> &'static str {
        Self::grade_instructions(GradeLevel::from_str_lenient(raw))
    }
}

/// Build the full prompt for `count` cards about `topic`
#[must_use]
pub fn build_flashcard_prompt(topic: &str, count: u32, level: GradeLevel) -> String {
    let mut values = HashMap::new();
    values.insert("count", count.to_string());
    values.insert("topic", topic.to_string());
    values.insert(
        "grade_instructions",
        FlashcardPrompts::grade_instructions(level).to_string(),
    );
    FlashcardPrompts::generation().render(&values)
}
