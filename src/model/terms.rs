//! Commercial terms carried by a brief: deliverables, phases, costs and
//! signatures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One item the provider commits to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    /// Short title (up to 200 characters)
    pub title: String,

    /// What is delivered (up to 2000 characters)
    pub description: String,

    /// How the client accepts it (up to 1000 characters)
    pub acceptance_criteria: String,
}

impl Deliverable {
    /// Create a deliverable.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        acceptance_criteria: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            acceptance_criteria: acceptance_criteria.into(),
        }
    }
}

/// One phase of the project timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Length in weeks (1-52)
    pub duration_weeks: u32,

    /// Key tasks (up to 3000 characters)
    pub tasks: String,
}

impl Phase {
    /// Create a phase.
    pub fn new(duration_weeks: u32, tasks: impl Into<String>) -> Self {
        Self {
            duration_weeks,
            tasks: tasks.into(),
        }
    }

    /// Duration as shown in the document, e.g. `6 weeks`.
    pub fn duration_label(&self) -> String {
        if self.duration_weeks == 1 {
            "1 week".to_string()
        } else {
            format!("{} weeks", self.duration_weeks)
        }
    }
}

/// Cost breakdown. Absent items count as zero in the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    #[serde(default)]
    pub development_cost: Option<f64>,

    #[serde(default)]
    pub licenses_cost: Option<f64>,

    #[serde(default)]
    pub support_cost: Option<f64>,
}

impl Financials {
    /// Cost items with their JSON names.
    pub fn items(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("development_cost", self.development_cost),
            ("licenses_cost", self.licenses_cost),
            ("support_cost", self.support_cost),
        ]
    }

    /// Sum of the present items.
    pub fn total(&self) -> f64 {
        self.items().iter().filter_map(|(_, cost)| *cost).sum()
    }
}

/// A signature block: who signs and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
}
