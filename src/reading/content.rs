//! Generated reading content and the generation collaborator
//!
//! Content generation is an external concern: the core only requires a
//! [`ContentGenerator`] that is deterministic for a given input. The
//! built-in [`TemplateGenerator`] renders the narrative templates; a future
//! model-backed generator plugs in behind the same trait.

use serde::{Deserialize, Serialize};

use super::input::{PersonInput, ReadingInput};

/// Free preview-tier content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewReading {
    /// Headline naming both persons
    pub title: String,
    /// Short narrative summary
    pub summary: String,
    /// Bullet highlights
    pub highlights: Vec<String>,
    /// Upsell line pointing at the full reading
    pub upgrade_hint: String,
}

/// Paid full-tier content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullReading {
    /// Headline naming both persons
    pub title: String,
    /// Opening narrative
    pub overview: String,
    /// Relationship strengths
    pub strengths: Vec<String>,
    /// Tension triggers
    pub tensions: Vec<String>,
    /// Practical guidance steps
    pub guidance: Vec<String>,
    /// Closing message
    pub final_message: String,
}

/// Content-generation collaborator
///
/// Implementations must be deterministic for a given input: the reconciler
/// relies on "generate again" being safe. Errors are retryable: a failed
/// full-content generation leaves the durable pending marker in place and
/// the recovery sweep tries again.
pub trait ContentGenerator: Send + Sync {
    /// Render preview-tier content
    fn preview(&self, input: &ReadingInput) -> anyhow::Result<PreviewReading>;

    /// Render full-tier content
    fn full(&self, input: &ReadingInput) -> anyhow::Result<FullReading>;
}

/// Deterministic template-based generator
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

fn display_name<'a>(person: &'a PersonInput, fallback: &'a str) -> &'a str {
    if person.name.is_empty() {
        fallback
    } else {
        &person.name
    }
}

impl ContentGenerator for TemplateGenerator {
    fn preview(&self, input: &ReadingInput) -> anyhow::Result<PreviewReading> {
        let a = display_name(&input.person_a, "Person A");
        let b = display_name(&input.person_b, "Person B");

        Ok(PreviewReading {
            title: format!("{a} & {b}: Relationship Preview"),
            summary: format!(
                "{a} and {b} show a strong pull between emotional expression and practical \
                 stability. The connection has real momentum, but timing and communication \
                 style need alignment."
            ),
            highlights: vec![
                "Natural attraction forms quickly when both feel heard.".to_string(),
                "Most friction comes from different pace, not lack of care.".to_string(),
            ],
            upgrade_hint: "Unlock the full reading to see detailed strengths, tension \
                           triggers, and a practical plan."
                .to_string(),
        })
    }

    fn full(&self, input: &ReadingInput) -> anyhow::Result<FullReading> {
        let a = display_name(&input.person_a, "Person A");
        let b = display_name(&input.person_b, "Person B");

        Ok(FullReading {
            title: format!("{a} & {b}: Full Relationship Reading"),
            overview: format!(
                "{a} tends to process feelings through reflection, while {b} often seeks \
                 quick clarity. This pairing can be deeply supportive when both sides \
                 define expectations early."
            ),
            strengths: vec![
                "Strong potential for mutual growth through honest feedback.".to_string(),
                "Complementary emotional and practical instincts.".to_string(),
                "High resilience when conflicts are addressed early.".to_string(),
            ],
            tensions: vec![
                "Misread silence as rejection during stress cycles.".to_string(),
                "Different conflict styles can escalate small issues.".to_string(),
                "Overgiving without boundaries leads to burnout.".to_string(),
            ],
            guidance: vec![
                "Set a weekly 20-minute check-in with one clear agenda.".to_string(),
                "Name the issue before discussing solutions.".to_string(),
                "Use time-boxed pauses during heated conversations.".to_string(),
                "Define one non-negotiable and one compromise from each side.".to_string(),
                "Track wins to prevent a negativity-only pattern.".to_string(),
            ],
            final_message: "This relationship works best when clarity is treated as care, \
                            not criticism. Progress comes from consistency."
                .to_string(),
        })
    }
}
