//! Prompt construction from a brief.

use crate::model::{Brief, Tone};
use crate::render::format_currency;

/// Section headings requested from the model, in order.
pub const DEFAULT_SECTIONS: [&str; 7] = [
    "Executive Summary",
    "Project Mission",
    "Solution Concept",
    "Methodology",
    "Timeline",
    "Financial Justification",
    "Payment Terms",
];

/// Builds the generation prompt for a brief.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    sections: Vec<String>,
    table_guidance: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            table_guidance: true,
        }
    }
}

impl PromptBuilder {
    /// Create a builder with the default sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the requested sections.
    pub fn with_sections<S: Into<String>>(mut self, sections: impl IntoIterator<Item = S>) -> Self {
        self.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    /// Include or omit the table descriptor instructions.
    pub fn with_table_guidance(mut self, enabled: bool) -> Self {
        self.table_guidance = enabled;
        self
    }

    /// Build the prompt text.
    pub fn build(&self, brief: &Brief) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are a professional proposal writer. Write a business proposal ");
        prompt.push_str("for the client described below.\n\n");

        prompt.push_str("Input:\n");
        push_field(&mut prompt, "client_name", &brief.client_name);
        if let Some(provider) = &brief.provider_name {
            push_field(&mut prompt, "provider_name", provider);
        }
        push_field(&mut prompt, "project_goal", &brief.project_goal);
        push_field(&mut prompt, "scope", &brief.scope);
        if !brief.technologies.is_empty() {
            push_field(&mut prompt, "technologies", &brief.technologies.join(", "));
        }
        if let Some(deadline) = brief.deadline {
            push_field(&mut prompt, "deadline", &deadline.format("%Y-%m-%d").to_string());
        }
        if let Some(audience) = &brief.audience {
            push_field(&mut prompt, "audience", audience);
        }
        if let Some(notes) = &brief.additional_notes {
            push_field(&mut prompt, "additional_notes", notes);
        }
        push_field(&mut prompt, "tone", brief.tone.as_str());
        if !brief.deliverables.is_empty() {
            let titles: Vec<&str> = brief.deliverables.iter().map(|d| d.title.as_str()).collect();
            push_field(&mut prompt, "deliverables", &titles.join("; "));
        }
        if !brief.phases.is_empty() {
            let weeks: u32 = brief.phases.iter().map(|p| p.duration_weeks).sum();
            push_field(
                &mut prompt,
                "timeline",
                &format!("{} phases, {} weeks in total", brief.phases.len(), weeks),
            );
        }
        if let Some(financials) = &brief.financials {
            push_field(
                &mut prompt,
                "total_investment",
                &format_currency(financials.total()),
            );
        }

        prompt.push_str("\nFormat:\n");
        prompt.push_str("- Use \"## \" for section headings and \"### \" for sub-headings.\n");
        prompt.push_str("- Use \"- \" for bullet points and \"1. \" for numbered steps.\n");
        prompt.push_str("- Use **bold** and _italic_ for emphasis; no other markup, no HTML.\n");
        if self.table_guidance {
            prompt.push_str("- For tables, put a single JSON object on its own line: ");
            prompt.push_str(
                "{\"table\": \"<name>\", \"columns\": [\"A\", \"B\"], \"rows\": [[\"a1\", \"b1\"]]}\n",
            );
            prompt.push_str("  Every row must have as many cells as there are columns.\n");
        }
        prompt.push_str("- Do not wrap the answer in a code block.\n");

        if !self.sections.is_empty() {
            prompt.push_str("\nSections, in this order:\n");
            for section in &self.sections {
                prompt.push_str("## ");
                prompt.push_str(section);
                prompt.push('\n');
            }
        }

        prompt.push_str("\nInstruction:\n");
        prompt.push_str(tone_instruction(brief.tone));
        prompt.push('\n');

        prompt
    }
}

fn push_field(prompt: &mut String, name: &str, value: &str) {
    prompt.push_str("- ");
    prompt.push_str(name);
    prompt.push_str(": \"");
    // Keep the value on one line so it cannot open a new prompt section.
    prompt.push_str(&value.split_whitespace().collect::<Vec<_>>().join(" "));
    prompt.push_str("\"\n");
}

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "Use a formal, professional tone.",
        Tone::Marketing => {
            "Use a persuasive marketing tone that highlights benefits and outcomes for the client."
        }
    }
}
