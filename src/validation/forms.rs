use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;

use super::rules::{validate_field, ValidationContext};
use crate::notify::Toast;

pub type FormValues = BTreeMap<String, String>;

/// Which fields a form submits and which of them are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSchema {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub required: &'static [&'static str],
}

pub const PRE_APPROVAL: FormSchema = FormSchema {
    name: "pre-approval",
    fields: &["firstname", "lastname", "gender", "contactnumber", "email", "date", "time"],
    required: &["firstname", "lastname", "gender", "contactnumber", "email", "date", "time"],
};

pub const SPOT_ENTRY: FormSchema = FormSchema {
    name: "spot-entry",
    fields: &[
        "firstname",
        "lastname",
        "gender",
        "contactnumber",
        "email",
        "date",
        "time",
        "nationalid",
        "visit",
        "personname",
        "department",
        "durationunit",
        "durationtime",
        "visitortype",
        "notes",
    ],
    required: &[
        "firstname",
        "lastname",
        "gender",
        "contactnumber",
        "email",
        "date",
        "time",
        "nationalid",
        "visit",
        "personname",
        "department",
        "durationunit",
        "durationtime",
        "visitortype",
    ],
};

pub const SPOT_ENTRY_WITH_DRIVER: FormSchema = FormSchema {
    name: "spot-entry-driver",
    fields: &[
        "firstname",
        "lastname",
        "gender",
        "contactnumber",
        "email",
        "date",
        "time",
        "nationalid",
        "visit",
        "personname",
        "department",
        "durationunit",
        "durationtime",
        "visitortype",
        "notes",
        "drivername",
        "drivermobile",
        "drivernationalid",
        "vehicletype",
        "vehiclenumber",
    ],
    required: &[
        "firstname",
        "lastname",
        "gender",
        "contactnumber",
        "email",
        "date",
        "time",
        "nationalid",
        "visit",
        "personname",
        "department",
        "durationunit",
        "durationtime",
        "visitortype",
        "drivername",
        "drivermobile",
        "drivernationalid",
        "vehicletype",
        "vehiclenumber",
    ],
};

/// Every failing field of one submission, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors {
    pub errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The single aggregate notification raised for a rejected submission.
    pub fn toast(&self) -> Toast {
        Toast::error(format!(
            "Please correct {} highlighted field(s) before submitting",
            self.errors.len()
        ))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl FormSchema {
    fn context<'a>(
        &self,
        values: &'a FormValues,
        now: NaiveDateTime,
        person_name_confirmed: bool,
    ) -> ValidationContext<'a> {
        ValidationContext::new(now)
            .with_required(self.required)
            .with_date(values.get("date").map(String::as_str))
            .with_person_name_confirmed(person_name_confirmed)
    }

    /// Live feedback for one field as it is edited.
    pub fn validate_live(
        &self,
        field: &str,
        values: &FormValues,
        now: NaiveDateTime,
        person_name_confirmed: bool,
    ) -> String {
        let value = values.get(field).map(String::as_str).unwrap_or("");
        validate_field(field, value, &self.context(values, now, person_name_confirmed))
    }

    /// Validate every field at once; all failures are reported together.
    pub fn validate(
        &self,
        values: &FormValues,
        now: NaiveDateTime,
        person_name_confirmed: bool,
    ) -> Result<(), FieldErrors> {
        let ctx = self.context(values, now, person_name_confirmed);
        let errors: BTreeMap<String, String> = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = values.get(*field).map(String::as_str).unwrap_or("");
                let error = validate_field(field, value, &ctx);
                (!error.is_empty()).then(|| (field.to_string(), error))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!("{} form rejected with {} error(s)", self.name, errors.len());
            Err(FieldErrors { errors })
        }
    }

    /// Validate only the fields present in `values`, as for a partial update.
    /// Required-field checks do not apply to absent fields.
    pub fn validate_present(
        &self,
        values: &FormValues,
        now: NaiveDateTime,
        person_name_confirmed: bool,
    ) -> Result<(), FieldErrors> {
        let ctx = self.context(values, now, person_name_confirmed);
        let errors: BTreeMap<String, String> = values
            .iter()
            .filter(|(field, _)| self.fields.contains(&field.as_str()))
            .filter_map(|(field, value)| {
                let error = validate_field(field, value, &ctx);
                (!error.is_empty()).then(|| (field.clone(), error))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors { errors })
        }
    }

    /// Trimmed values for the fields this form submits.
    pub fn payload(&self, values: &FormValues) -> FormValues {
        self.fields
            .iter()
            .filter_map(|field| {
                values
                    .get(*field)
                    .map(|v| (field.to_string(), v.trim().to_string()))
            })
            .collect()
    }
}
