//! The proposal brief received from the caller.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::terms::{Deliverable, Financials, Phase, Signature};
use crate::error::{Error, FieldError, Result};

/// Field names a JSON error message may point at.
const FIELD_NAMES: &[&str] = &[
    "client_name",
    "provider_name",
    "project_goal",
    "scope",
    "technologies",
    "deadline",
    "tone",
    "audience",
    "contact_email",
    "additional_notes",
    "title",
    "proposal_date",
    "valid_until_date",
    "deliverables",
    "phases",
    "financials",
    "client_signature_name",
    "client_signature_date",
    "provider_signature_name",
    "provider_signature_date",
];

/// Nested field names and the brief field they belong to.
const NESTED_FIELD_NAMES: &[(&str, &str)] = &[
    ("description", "deliverables"),
    ("acceptance_criteria", "deliverables"),
    ("duration_weeks", "phases"),
    ("tasks", "phases"),
];

/// Longest deliverable or phase list rendered into a document.
const MAX_LIST_ITEMS: usize = 200;

/// Structured input describing the client and the project.
///
/// A brief is immutable once received and lives for a single generation
/// request. Unknown JSON fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    /// Client name (1-120 characters)
    #[serde(alias = "client_company_name")]
    pub client_name: String,

    /// Provider company name (up to 200 characters)
    #[serde(default, alias = "provider_company_name")]
    pub provider_name: Option<String>,

    /// What the project should achieve (1-2000 characters)
    pub project_goal: String,

    /// Project scope (1-5000 characters)
    pub scope: String,

    /// Technologies, in the order given
    #[serde(default, deserialize_with = "deserialize_technologies")]
    pub technologies: Vec<String>,

    /// Project deadline
    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Writing tone
    #[serde(default)]
    pub tone: Tone,

    /// Target audience (up to 200 characters)
    #[serde(default)]
    pub audience: Option<String>,

    /// Contact e-mail address
    #[serde(default)]
    pub contact_email: Option<String>,

    /// Free-form notes (up to 4000 characters)
    #[serde(default)]
    pub additional_notes: Option<String>,

    /// Proposal title (up to 255 characters)
    #[serde(default, alias = "proposal_title")]
    pub title: Option<String>,

    /// Date the proposal is issued
    #[serde(default)]
    pub proposal_date: Option<NaiveDate>,

    /// Last day the offer holds (not before `proposal_date`)
    #[serde(default)]
    pub valid_until_date: Option<NaiveDate>,

    /// Deliverables, in order
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,

    /// Timeline phases, in order
    #[serde(default)]
    pub phases: Vec<Phase>,

    /// Cost breakdown
    #[serde(default)]
    pub financials: Option<Financials>,

    #[serde(default)]
    pub client_signature_name: Option<String>,

    #[serde(default)]
    pub client_signature_date: Option<NaiveDate>,

    #[serde(default)]
    pub provider_signature_name: Option<String>,

    #[serde(default)]
    pub provider_signature_date: Option<NaiveDate>,
}

impl Brief {
    /// Create a brief with the required fields and defaults elsewhere.
    pub fn new(
        client_name: impl Into<String>,
        project_goal: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            provider_name: None,
            project_goal: project_goal.into(),
            scope: scope.into(),
            technologies: Vec::new(),
            deadline: None,
            tone: Tone::default(),
            audience: None,
            contact_email: None,
            additional_notes: None,
            title: None,
            proposal_date: None,
            valid_until_date: None,
            deliverables: Vec::new(),
            phases: Vec::new(),
            financials: None,
            client_signature_name: None,
            client_signature_date: None,
            provider_signature_name: None,
            provider_signature_date: None,
        }
    }

    /// Parse a brief from JSON and validate it.
    ///
    /// Malformed JSON, a missing required field or a value of the wrong
    /// type is reported as [`Error::InvalidBrief`], like any other field
    /// failure.
    pub fn from_json(json: &str) -> Result<Self> {
        let brief: Brief = serde_json::from_str(json)
            .map_err(|e| Error::InvalidBrief(vec![json_field_error(&e)]))?;
        brief.validate()?;
        Ok(brief)
    }

    /// Set the technologies and return self.
    pub fn with_technologies<S: Into<String>>(mut self, techs: impl IntoIterator<Item = S>) -> Self {
        self.technologies = techs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the deadline and return self.
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the tone and return self.
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Set the audience and return self.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the contact e-mail and return self.
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// Set the additional notes and return self.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.additional_notes = Some(notes.into());
        self
    }

    /// Set the title and return self.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the provider company name and return self.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider_name = Some(provider.into());
        self
    }

    /// Set the issue date and the validity end date and return self.
    pub fn with_validity(mut self, proposal_date: NaiveDate, valid_until: NaiveDate) -> Self {
        self.proposal_date = Some(proposal_date);
        self.valid_until_date = Some(valid_until);
        self
    }

    /// Add a deliverable and return self.
    pub fn with_deliverable(mut self, deliverable: Deliverable) -> Self {
        self.deliverables.push(deliverable);
        self
    }

    /// Add a phase and return self.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Set the cost breakdown and return self.
    pub fn with_financials(mut self, financials: Financials) -> Self {
        self.financials = Some(financials);
        self
    }

    /// Set the client signature and return self.
    pub fn with_client_signature(mut self, name: impl Into<String>, date: NaiveDate) -> Self {
        self.client_signature_name = Some(name.into());
        self.client_signature_date = Some(date);
        self
    }

    /// Set the provider signature and return self.
    pub fn with_provider_signature(mut self, name: impl Into<String>, date: NaiveDate) -> Self {
        self.provider_signature_name = Some(name.into());
        self.provider_signature_date = Some(date);
        self
    }

    pub fn client_signature(&self) -> Signature {
        Signature {
            name: self.client_signature_name.clone(),
            date: self.client_signature_date,
        }
    }

    pub fn provider_signature(&self) -> Signature {
        Signature {
            name: self.provider_signature_name.clone(),
            date: self.provider_signature_date,
        }
    }

    /// Title used for the `{{title}}` placeholder.
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Proposal for {}", self.client_name.trim()),
        }
    }

    /// Check every field constraint, collecting all failures.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        check_required(&mut errors, "client_name", &self.client_name, 120);
        check_required(&mut errors, "project_goal", &self.project_goal, 2000);
        check_required(&mut errors, "scope", &self.scope, 5000);
        check_optional(&mut errors, "audience", self.audience.as_deref(), 200);
        check_optional(
            &mut errors,
            "additional_notes",
            self.additional_notes.as_deref(),
            4000,
        );
        check_optional(&mut errors, "title", self.title.as_deref(), 255);
        check_optional(&mut errors, "provider_name", self.provider_name.as_deref(), 200);
        check_optional(
            &mut errors,
            "client_signature_name",
            self.client_signature_name.as_deref(),
            200,
        );
        check_optional(
            &mut errors,
            "provider_signature_name",
            self.provider_signature_name.as_deref(),
            200,
        );

        if let (Some(issued), Some(until)) = (self.proposal_date, self.valid_until_date) {
            if until < issued {
                errors.push(FieldError::new(
                    "valid_until_date",
                    "must not be before proposal_date",
                ));
            }
        }

        check_deliverables(&mut errors, &self.deliverables);
        check_phases(&mut errors, &self.phases);
        if let Some(financials) = &self.financials {
            for (field, cost) in financials.items() {
                if cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
                    errors.push(FieldError::new(field, "must be a non-negative amount"));
                }
            }
        }

        if let Some(email) = self.contact_email.as_deref() {
            if !email_regex().is_match(email.trim()) {
                errors.push(FieldError::new("contact_email", "is not a valid e-mail address"));
            }
        }

        if self.technologies.iter().any(|t| t.trim().is_empty()) {
            errors.push(FieldError::new("technologies", "must not contain empty entries"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidBrief(errors))
        }
    }
}

fn check_required(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    } else {
        check_length(errors, field, value, max);
    }
}

fn check_deliverables(errors: &mut Vec<FieldError>, deliverables: &[Deliverable]) {
    if deliverables.len() > MAX_LIST_ITEMS {
        errors.push(FieldError::new(
            "deliverables",
            format!("must have at most {} items", MAX_LIST_ITEMS),
        ));
    }
    for (i, d) in deliverables.iter().enumerate() {
        let fields = [
            ("title", d.title.as_str(), 200),
            ("description", d.description.as_str(), 2000),
            ("acceptance_criteria", d.acceptance_criteria.as_str(), 1000),
        ];
        for (name, value, max) in fields {
            if let Some(problem) = text_problem(value, max) {
                errors.push(FieldError::new(
                    "deliverables",
                    format!("item {} {} {}", i + 1, name, problem),
                ));
            }
        }
    }
}

fn check_phases(errors: &mut Vec<FieldError>, phases: &[Phase]) {
    if phases.len() > MAX_LIST_ITEMS {
        errors.push(FieldError::new(
            "phases",
            format!("must have at most {} items", MAX_LIST_ITEMS),
        ));
    }
    for (i, p) in phases.iter().enumerate() {
        if !(1..=52).contains(&p.duration_weeks) {
            errors.push(FieldError::new(
                "phases",
                format!("item {} duration_weeks must be between 1 and 52", i + 1),
            ));
        }
        if let Some(problem) = text_problem(&p.tasks, 3000) {
            errors.push(FieldError::new(
                "phases",
                format!("item {} tasks {}", i + 1, problem),
            ));
        }
    }
}

fn text_problem(value: &str, max: usize) -> Option<String> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        Some("must not be empty".to_string())
    } else if len > max {
        Some(format!("must be at most {} characters (got {})", max, len))
    } else {
        None
    }
}

/// Name the field a serde error is about, falling back to `brief`.
fn json_field_error(e: &serde_json::Error) -> FieldError {
    let message = e.to_string();
    let field = FIELD_NAMES
        .iter()
        .copied()
        .find(|name| message.contains(&format!("`{}`", name)))
        .or_else(|| {
            NESTED_FIELD_NAMES
                .iter()
                .find(|(name, _)| message.contains(&format!("`{}`", name)))
                .map(|(_, parent)| *parent)
        })
        .or_else(|| message.contains("unknown tone").then_some("tone"))
        .unwrap_or("brief");
    FieldError::new(field, message)
}

fn check_optional(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        check_length(errors, field, value, max);
    }
}

fn check_length(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("e-mail pattern is valid")
    })
}

/// Accept either a JSON list of strings or a comma-separated string.
fn deserialize_technologies<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Technologies {
        List(Vec<String>),
        Text(String),
    }

    let techs = match Option::<Technologies>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Technologies::List(list)) => list,
        Some(Technologies::Text(text)) => text.split(',').map(str::to_string).collect(),
    };

    Ok(techs
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// Writing tone of the proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Tone {
    /// Formal, professional register
    #[default]
    Formal,
    /// Persuasive marketing register
    Marketing,
}

impl Tone {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "Formal",
            Tone::Marketing => "Marketing",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "marketing" => Ok(Tone::Marketing),
            other => Err(format!(
                "unknown tone '{}', expected Formal or Marketing",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Tone {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
