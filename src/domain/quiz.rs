use std::fmt;

use rand::Rng;

use super::errors::GenerationError;

/// Every MCQ carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

/// Field names shared with the vocabulary store schema. Changing any of these
/// breaks existing note types, so they are pinned here in one place.
pub mod fields {
    pub const WORD: &str = "Word";
    pub const SENTENCE: &str = "SentenceBlank";
    pub const OPTIONS: [&str; super::OPTION_COUNT] =
        ["OptionA", "OptionB", "OptionC", "OptionD"];
    pub const ANSWER: &str = "Answer";
}

/// CEFR difficulty scale. One level is drawn uniformly per generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DifficultyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl DifficultyLevel {
    pub const ALL: [Self; 6] = [Self::A1, Self::A2, Self::B1, Self::B2, Self::C1, Self::C2];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound generation call: target word, drawn level, rendered prompt.
/// Built per call and discarded with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub word: String,
    pub level: DifficultyLevel,
    pub rendered_prompt: String,
}

impl GenerationRequest {
    pub fn render(
        template: &str,
        word: &str,
        level: DifficultyLevel,
    ) -> Result<Self, GenerationError> {
        let rendered_prompt = render_template(template, word, level)?;
        Ok(Self {
            word: word.to_string(),
            level,
            rendered_prompt,
        })
    }
}

/// Substitutes `{word}` and `{level}` into the prompt template. `{{` and `}}`
/// are literal braces. Any other placeholder, or an unbalanced brace, is an
/// `InvalidTemplate` error and is never retried.
fn render_template(
    template: &str,
    word: &str,
    level: DifficultyLevel,
) -> Result<String, GenerationError> {
    let mut rendered = String::with_capacity(template.len() + word.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    rendered.push('{');
                    continue;
                }

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(inner) => name.push(inner),
                        None => {
                            return Err(GenerationError::invalid_template(
                                "unterminated '{' in template",
                            ));
                        }
                    }
                }

                match name.as_str() {
                    "word" => rendered.push_str(word),
                    "level" => rendered.push_str(level.as_str()),
                    other => {
                        return Err(GenerationError::invalid_template(format!(
                            "unknown placeholder '{{{other}}}'"
                        )));
                    }
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    rendered.push('}');
                } else {
                    return Err(GenerationError::invalid_template(
                        "unmatched '}' in template",
                    ));
                }
            }
            other => rendered.push(other),
        }
    }

    Ok(rendered)
}

/// Terminal artifact of one processed item, handed to the vocabulary store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqRecord {
    pub word: String,
    pub sentence_with_blank: String,
    pub options: [String; OPTION_COUNT],
    pub answer: String,
}

impl McqRecord {
    /// Maps the record onto the store's field-name contract.
    pub fn store_fields(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(OPTION_COUNT + 2);
        pairs.push((fields::SENTENCE, self.sentence_with_blank.clone()));
        for (name, option) in fields::OPTIONS.iter().zip(self.options.iter()) {
            pairs.push((*name, option.clone()));
        }
        pairs.push((fields::ANSWER, self.answer.clone()));
        pairs
    }
}
