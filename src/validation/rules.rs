use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static PERSON_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s]{2,}$").expect("valid regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{4,}$").expect("valid regex"));
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,3}|[0-9]{1,2}:[0-5][0-9])$").expect("valid regex")
});
static VEHICLE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{6,12}$").expect("valid regex"));

const NOTES_MAX_CHARS: usize = 500;
const VEHICLE_TYPE_CHARS: std::ops::RangeInclusive<usize> = 2..=20;

/// The rule applied to a field, looked up by field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    PersonName,
    Phone,
    Email,
    Date,
    Time,
    NationalId,
    Duration,
    Notes,
    VehicleNumber,
    VehicleType,
    /// Dropdown; the payload is the noun used in "Please select a ...".
    Select(&'static str),
    /// Typeahead field that must match a confirmed suggestion.
    Suggestion,
    Free,
}

pub fn rule_for(field: &str) -> FieldRule {
    match field {
        "firstname" | "lastname" | "drivername" => FieldRule::PersonName,
        "contactnumber" | "drivermobile" => FieldRule::Phone,
        "email" => FieldRule::Email,
        "date" => FieldRule::Date,
        "time" => FieldRule::Time,
        "nationalid" | "drivernationalid" => FieldRule::NationalId,
        "durationtime" => FieldRule::Duration,
        "notes" => FieldRule::Notes,
        "vehiclenumber" => FieldRule::VehicleNumber,
        "vehicletype" => FieldRule::VehicleType,
        "gender" => FieldRule::Select("gender"),
        "visitortype" => FieldRule::Select("visitor type"),
        "visit" => FieldRule::Select("purpose of visit"),
        "department" => FieldRule::Select("department"),
        "durationunit" => FieldRule::Select("duration unit"),
        "personname" => FieldRule::Suggestion,
        _ => FieldRule::Free,
    }
}

pub fn label(field: &str) -> String {
    let known = match field {
        "firstname" => "First name",
        "lastname" => "Last name",
        "contactnumber" => "Contact number",
        "email" => "Email",
        "date" => "Date",
        "time" => "Time",
        "nationalid" => "National ID",
        "personname" => "Person name",
        "department" => "Department",
        "visit" => "Purpose of visit",
        "durationunit" => "Duration unit",
        "durationtime" => "Duration",
        "visitortype" => "Visitor type",
        "drivername" => "Driver name",
        "drivermobile" => "Driver mobile",
        "drivernationalid" => "Driver national ID",
        "vehiclenumber" => "Vehicle number",
        "vehicletype" => "Vehicle type",
        "gender" => "Gender",
        "notes" => "Notes",
        _ => "",
    };

    if !known.is_empty() {
        return known.to_string();
    }

    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Inputs a rule may depend on besides the field's own value.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub now: NaiveDateTime,
    /// Paired date value for time fields (`YYYY-MM-DD`).
    pub date: Option<&'a str>,
    /// Fields the current form requires.
    pub required: &'a [&'a str],
    /// Whether the typeahead lookup confirmed the person name.
    pub person_name_confirmed: bool,
}

impl<'a> ValidationContext<'a> {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            date: None,
            required: &[],
            person_name_confirmed: false,
        }
    }

    pub fn at_local_now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn with_date(mut self, date: Option<&'a str>) -> Self {
        self.date = date;
        self
    }

    pub fn with_required(mut self, required: &'a [&'a str]) -> Self {
        self.required = required;
        self
    }

    pub fn with_person_name_confirmed(mut self, confirmed: bool) -> Self {
        self.person_name_confirmed = confirmed;
        self
    }

    fn is_required(&self, field: &str) -> bool {
        self.required.contains(&field)
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Validate one field. Returns an empty string when valid, otherwise a
/// human-readable message suitable for the field's error slot.
pub fn validate_field(field: &str, value: &str, ctx: &ValidationContext) -> String {
    let value = value.trim();
    let rule = rule_for(field);

    if value.is_empty() {
        if !ctx.is_required(field) {
            return String::new();
        }
        return match rule {
            FieldRule::Select(noun) => format!("Please select a {}", noun),
            FieldRule::Suggestion => "Person name must be selected from suggestions".to_string(),
            _ => format!("{} is required", label(field)),
        };
    }

    check(field, rule, value, ctx).unwrap_or_default()
}

fn check(field: &str, rule: FieldRule, value: &str, ctx: &ValidationContext) -> Option<String> {
    match rule {
        FieldRule::PersonName if !PERSON_NAME.is_match(value) => Some(format!(
            "{} must be at least 2 characters and contain only letters",
            label(field)
        )),
        FieldRule::Phone if !DIGITS.is_match(value) => {
            Some("Phone number must contain only digits".to_string())
        }
        FieldRule::Email if !EMAIL.is_match(value) => {
            Some("Please enter a valid email address".to_string())
        }
        FieldRule::Date => match parse_date(value) {
            None => Some("Please enter a valid date".to_string()),
            Some(date) if date < ctx.now.date() => Some("Date must be today or later".to_string()),
            Some(_) => None,
        },
        FieldRule::Time => check_time(value, ctx),
        FieldRule::NationalId if !NATIONAL_ID.is_match(value) => Some(format!(
            "{} must be at least 4 characters (letters and numbers allowed)",
            label(field)
        )),
        FieldRule::Duration if !DURATION.is_match(value) => Some(
            "Duration must be in minutes (e.g. 90) or HH:MM format (e.g. 01:30)".to_string(),
        ),
        FieldRule::Notes => {
            if value.chars().count() > NOTES_MAX_CHARS {
                Some(format!("Notes must be at most {} characters", NOTES_MAX_CHARS))
            } else if value.to_lowercase().contains("<script") {
                Some("Notes must not contain script tags".to_string())
            } else {
                None
            }
        }
        FieldRule::VehicleNumber if !VEHICLE_NUMBER.is_match(value) => {
            Some("Vehicle number must be 6 to 12 letters or digits".to_string())
        }
        FieldRule::VehicleType if !VEHICLE_TYPE_CHARS.contains(&value.chars().count()) => {
            Some("Vehicle type must be 2 to 20 characters".to_string())
        }
        FieldRule::Suggestion if !ctx.person_name_confirmed => {
            Some("Person name must be selected from suggestions".to_string())
        }
        _ => None,
    }
}

fn check_time(value: &str, ctx: &ValidationContext) -> Option<String> {
    let Some(time) = parse_time(value) else {
        return Some("Please enter a valid time".to_string());
    };

    // Only constrained when the paired date is today
    let is_today = ctx
        .date
        .and_then(parse_date)
        .map(|date| date == ctx.now.date())
        .unwrap_or(false);
    if !is_today {
        return None;
    }

    let now = ctx.now.time();
    let current_minute = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)?;
    if time < current_minute {
        Some("Time cannot be in the past for today".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(12, 30, 15)
            .unwrap()
    }

    fn ctx() -> ValidationContext<'static> {
        ValidationContext::new(noon())
    }

    #[test]
    fn test_email() {
        assert!(!validate_field("email", "not-an-email", &ctx()).is_empty());
        assert_eq!(validate_field("email", "a@b.co", &ctx()), "");
    }

    #[test]
    fn test_date_not_before_today() {
        let today = noon().date();
        let yesterday = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
        let tomorrow = (today + Duration::days(1)).format("%Y-%m-%d").to_string();

        assert!(!validate_field("date", &yesterday, &ctx()).is_empty());
        assert_eq!(validate_field("date", &today.format("%Y-%m-%d").to_string(), &ctx()), "");
        assert_eq!(validate_field("date", &tomorrow, &ctx()), "");
        assert_eq!(validate_field("date", "14/03/2025", &ctx()), "Please enter a valid date");
    }

    #[test]
    fn test_time_only_constrained_today() {
        let today = ctx().with_date(Some("2025-03-14"));
        assert!(!validate_field("time", "12:29", &today).is_empty());
        assert_eq!(validate_field("time", "12:30", &today), "");
        assert_eq!(validate_field("time", "18:00", &today), "");

        let later = ctx().with_date(Some("2025-03-15"));
        assert_eq!(validate_field("time", "08:00", &later), "");

        let undated = ctx();
        assert_eq!(validate_field("time", "08:00", &undated), "");
    }

    #[test]
    fn test_names_and_numbers() {
        assert!(!validate_field("firstname", "J", &ctx()).is_empty());
        assert!(!validate_field("lastname", "O'Brien", &ctx()).is_empty());
        assert_eq!(validate_field("firstname", "Mary Ann", &ctx()), "");

        assert!(!validate_field("contactnumber", "+1 555", &ctx()).is_empty());
        assert_eq!(validate_field("contactnumber", "5550100", &ctx()), "");

        assert!(!validate_field("nationalid", "A1b", &ctx()).is_empty());
        assert_eq!(validate_field("nationalid", "AB1234", &ctx()), "");
        assert!(validate_field("drivernationalid", "A-12", &ctx()).starts_with("Driver national ID"));
    }

    #[test]
    fn test_duration_formats() {
        assert_eq!(validate_field("durationtime", "90", &ctx()), "");
        assert_eq!(validate_field("durationtime", "01:30", &ctx()), "");
        assert!(!validate_field("durationtime", "1:75", &ctx()).is_empty());
        assert!(!validate_field("durationtime", "1000", &ctx()).is_empty());
    }

    #[test]
    fn test_required_fields() {
        let required: &[&str] = &["firstname", "gender", "personname"];
        let ctx = ctx().with_required(required);

        assert_eq!(validate_field("firstname", "  ", &ctx), "First name is required");
        assert_eq!(validate_field("gender", "", &ctx), "Please select a gender");
        assert_eq!(
            validate_field("personname", "", &ctx),
            "Person name must be selected from suggestions"
        );
        // Optional and empty is fine
        assert_eq!(validate_field("email", "", &ctx), "");
    }

    #[test]
    fn test_person_name_needs_confirmation() {
        let unconfirmed = ctx();
        assert!(!validate_field("personname", "Jane Doe", &unconfirmed).is_empty());

        let confirmed = ctx().with_person_name_confirmed(true);
        assert_eq!(validate_field("personname", "Jane Doe", &confirmed), "");
    }

    #[test]
    fn test_notes_limits() {
        assert_eq!(validate_field("notes", "Bring laptop", &ctx()), "");
        assert!(!validate_field("notes", "<SCRIPT>alert(1)</script>", &ctx()).is_empty());
        assert!(!validate_field("notes", &"x".repeat(501), &ctx()).is_empty());
    }

    #[test]
    fn test_unknown_field_label() {
        assert_eq!(label("company"), "Company");
        assert_eq!(rule_for("company"), FieldRule::Free);
    }
}
