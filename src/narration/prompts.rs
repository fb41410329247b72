/*!
 * Prompt template for audience-specific slide narration.
 */

/// Prompt template sent to the generative provider for one segment.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default narration coach prompt.
    pub const PRESENTATION_COACH: &'static str = r#"You are an expert presentation coach and content strategist. Transform the following slide content into a compelling, audience-specific narrative that captures key insights and actionable takeaways.

Requirements:
- Create a concise 2-3 sentence summary that highlights the most important points
- Use language and tone appropriate for {audience} audience
- Include specific examples or analogies when helpful
- Focus on clarity and memorability
- Make it sound natural and conversational, not robotic
- If the slide has data or statistics, emphasize the key insight or implication
- If the slide has a process or concept, explain the "why" behind it

Slide content: {slide_text}

Transform this into an engaging narrative:"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default presentation coach template.
    pub fn presentation_coach() -> Self {
        Self::new(Self::PRESENTATION_COACH)
    }

    /// Render the template for one segment.
    ///
    /// The audience is substituted first so slide text containing a literal
    /// `{audience}` is left untouched.
    pub fn render(&self, audience: &str, slide_text: &str) -> String {
        self.template
            .replace("{audience}", audience)
            .replace("{slide_text}", slide_text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::presentation_coach()
    }
}
