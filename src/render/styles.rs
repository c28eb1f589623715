//! Style roles and the role → style id registry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic role of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleRole {
    /// Document title paragraph
    Title,
    /// Level-1 heading
    Section,
    /// Level-2 heading
    Subsection,
    /// Body paragraph
    Body,
    /// Bullet list item
    Bullet,
    /// Numbered list item
    Numbered,
    /// Table style
    Table,
    /// Header-row cell paragraph
    TableHeader,
    /// Data cell paragraph
    TableCell,
}

impl StyleRole {
    /// Every role, in declaration order.
    pub const ALL: [StyleRole; 9] = [
        StyleRole::Title,
        StyleRole::Section,
        StyleRole::Subsection,
        StyleRole::Body,
        StyleRole::Bullet,
        StyleRole::Numbered,
        StyleRole::Table,
        StyleRole::TableHeader,
        StyleRole::TableCell,
    ];

    /// Snake-case name, as used in registry JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleRole::Title => "title",
            StyleRole::Section => "section",
            StyleRole::Subsection => "subsection",
            StyleRole::Body => "body",
            StyleRole::Bullet => "bullet",
            StyleRole::Numbered => "numbered",
            StyleRole::Table => "table",
            StyleRole::TableHeader => "table_header",
            StyleRole::TableCell => "table_cell",
        }
    }

    /// Style id used by the built-in template.
    pub fn default_style_id(&self) -> &'static str {
        match self {
            StyleRole::Title => "Title",
            StyleRole::Section => "Heading1",
            StyleRole::Subsection => "Heading2",
            StyleRole::Body => "Normal",
            StyleRole::Bullet => "ListBullet",
            StyleRole::Numbered => "ListNumber",
            StyleRole::Table => "TableGrid",
            StyleRole::TableHeader => "TableHeader",
            StyleRole::TableCell => "TableCell",
        }
    }
}

impl fmt::Display for StyleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed mapping from role to a template style id.
///
/// Built once at startup and shared read-only. The default registry maps
/// every role to the style ids of the built-in template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleRegistry {
    styles: BTreeMap<StyleRole, String>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let styles = StyleRole::ALL
            .iter()
            .map(|role| (*role, role.default_style_id().to_string()))
            .collect();
        Self { styles }
    }
}

impl StyleRegistry {
    /// Create a registry with the built-in style ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with no mappings at all.
    pub fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }

    /// Load a registry from JSON such as `{"section": "Heading1", ...}`.
    ///
    /// Roles missing from the JSON keep their built-in style ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: BTreeMap<StyleRole, String> = serde_json::from_str(json)?;
        let mut registry = Self::default();
        for (role, style) in overrides {
            registry = registry.with_style(role, style);
        }
        Ok(registry)
    }

    /// Map a role to a style id and return self.
    pub fn with_style(mut self, role: StyleRole, style_id: impl Into<String>) -> Self {
        self.styles.insert(role, style_id.into());
        self
    }

    /// Remove the mapping for a role and return self.
    pub fn without_style(mut self, role: StyleRole) -> Self {
        self.styles.remove(&role);
        self
    }

    /// Look up the style id for a role.
    pub fn style_for(&self, role: StyleRole) -> Result<&str> {
        self.styles
            .get(&role)
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::MissingStyle(role))
    }

    /// Check that every role has a non-empty style id.
    pub fn validate(&self) -> Result<()> {
        for role in StyleRole::ALL {
            self.style_for(role)?;
        }
        Ok(())
    }

    /// Iterate over the mappings in role order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleRole, &str)> {
        self.styles.iter().map(|(role, id)| (*role, id.as_str()))
    }
}
