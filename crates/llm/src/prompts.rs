//! Prompt templates sent to the model.

/// Style critique prompt. `{text}` is replaced with the scene's plain text.
pub const STYLE_ANALYSIS_TEMPLATE: &str = "\
You are a professional Italian editor with expertise in literary fiction. Analyze this text:

### Text:
{text}

### Analysis Guidelines:
1. Language Quality:
   - Grammar/syntax errors
   - Awkward phrasing
   - Register consistency

2. Narrative Flow:
   - Pacing issues
   - Paragraph structure
   - Transition smoothness

3. Style Evaluation:
   - Word repetition
   - Sentence rhythm
   - Show vs. tell balance

4. Specific Suggestions:
   - Provide concrete examples
   - Suggest improvements
   - Note positive aspects

Format your response with clear section headings.
";

/// Structured summary prompt. The model is asked for a JSON object with
/// the keys of [`crate::summary::SceneSummary`].
pub const SUMMARY_TEMPLATE: &str = r#"
Create a concise summary of this literary text in Italian. Include:

1. Key events (3-5 bullet points)
2. Character development aspects
3. Important details
4. Style characteristics

Return as JSON with these keys:
"events", "character_dev", "details", "style"

### Text:
{text}
"#;

/// Italian to English literary translation prompt.
pub const TRANSLATION_TEMPLATE: &str = "
Translate this Italian literary text to English while:

1. Preserving the original style and voice
2. Maintaining natural dialogue flow
3. Adapting idioms appropriately
4. Keeping cultural references intact

Return only the translation without additional commentary.

### Italian Text:
{text}

### English Translation:
";

/// Build the style critique prompt for `text`.
pub fn style_analysis_prompt(text: &str) -> String {
    STYLE_ANALYSIS_TEMPLATE.replace("{text}", text)
}

/// Build the summary prompt for `text`.
pub fn summary_prompt(text: &str) -> String {
    SUMMARY_TEMPLATE.replace("{text}", text)
}

/// Build the translation prompt for `text`.
pub fn translation_prompt(text: &str) -> String {
    TRANSLATION_TEMPLATE.replace("{text}", text)
}
