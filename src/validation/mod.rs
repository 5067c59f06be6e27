//! Client-side form validation.
//!
//! One rule table keyed by field name ([`rules`]), parameterised per form by
//! which fields are required ([`forms`]), plus the typeahead binding used by
//! person-name fields ([`suggestions`]).

pub mod forms;
pub mod rules;
pub mod suggestions;

pub use forms::{FieldErrors, FormSchema, FormValues, PRE_APPROVAL, SPOT_ENTRY, SPOT_ENTRY_WITH_DRIVER};
pub use rules::{validate_field, ValidationContext};
pub use suggestions::{SuggestionBinding, SuggestionSource, UserSuggestion};
