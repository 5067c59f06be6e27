use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// One result of a person-name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSuggestion {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

impl UserSuggestion {
    /// `userName`, else `firstName lastName`.
    pub fn display_name(&self) -> String {
        match self.user_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }

    /// What the field shows once a suggestion is picked.
    pub fn label(&self) -> String {
        format!(
            "{} ({} & {})",
            self.display_name(),
            self.department.as_deref().unwrap_or("N/A"),
            self.designation.as_deref().unwrap_or("N/A")
        )
    }
}

/// Anything that can answer a person-name prefix lookup.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<UserSuggestion>, ClientError>;
}

/// Strip a trailing ` (Department & Designation)` annotation, leaving the name.
pub fn canonical_name(typed: &str) -> &str {
    match typed.find('(') {
        Some(idx) if typed.trim_end().ends_with(')') => typed[..idx].trim(),
        _ => typed.trim(),
    }
}

/// Tracks whether a typeahead field's text is bound to a confirmed suggestion.
///
/// Editing the text invalidates the binding; only picking a suggestion or a
/// lookup that returns an exact (case-insensitive) match confirms it.
#[derive(Debug, Clone, Default)]
pub struct SuggestionBinding {
    selected: Option<UserSuggestion>,
}

impl SuggestionBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_confirmed(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&UserSuggestion> {
        self.selected.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.selected = None;
    }

    /// Pick a suggestion; returns the text the field should now show.
    pub fn select(&mut self, suggestion: UserSuggestion) -> String {
        let label = suggestion.label();
        self.selected = Some(suggestion);
        label
    }

    /// Look the typed text up and confirm it if one result matches exactly.
    pub async fn confirm(
        &mut self,
        source: &dyn SuggestionSource,
        typed: &str,
    ) -> Result<bool, ClientError> {
        self.invalidate();

        let name = canonical_name(typed);
        if name.is_empty() {
            return Ok(false);
        }

        let suggestions = source.suggest(name).await?;
        let wanted = name.to_lowercase();
        self.selected = suggestions
            .into_iter()
            .find(|s| s.display_name().to_lowercase() == wanted);

        tracing::debug!("Person name '{}' confirmed: {}", name, self.is_confirmed());
        Ok(self.is_confirmed())
    }
}
