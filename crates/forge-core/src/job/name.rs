use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::JOB_NAME_PATTERN;
use crate::errors::RunnerError;

static JOB_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(JOB_NAME_PATTERN).expect("JOB_NAME_PATTERN compiles"));

/// Valida `value` contra la gramática de `job_name`.
pub fn validate_job_name(value: &str) -> Result<(), RunnerError> {
    if JOB_NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(RunnerError::InvalidJobName { value: value.to_string() })
    }
}

/// Nombre de job que ya pasó la validación. Sólo se construye vía
/// `JobName::new` / `FromStr` / `TryFrom`, por lo que un `JobName` siempre
/// cumple la gramática.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    pub fn new(value: impl Into<String>) -> Result<Self, RunnerError> {
        let value = value.into();
        validate_job_name(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobName {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for JobName {
    type Error = RunnerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobName> for String {
    fn from(value: JobName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        let longest = "a".repeat(63);
        for name in ["valid-job", "valid_job", "a", longest.as_str(), "x0-_9"] {
            let parsed = JobName::new(name).unwrap_or_else(|e| panic!("{name} should be valid: {e}"));
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn rejects_invalid_names_with_exact_message() {
        let too_long = "a".repeat(64);
        for name in ["", too_long.as_str(), "invali/d", "1valid-job", "-valid-job", "Valid-Job"] {
            let err = JobName::new(name).unwrap_err();
            assert_eq!(err.to_string(),
                       format!("job_name must match the regex ^[a-z][-_0-9a-z]{{0,62}}$, instead found {name}"));
        }
    }

    #[test]
    fn rejects_trailing_newline() {
        assert!(JobName::new("valid-job\n").is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: JobName = serde_json::from_str("\"special-name-for-job\"").unwrap();
        assert_eq!(ok.as_str(), "special-name-for-job");
        assert!(serde_json::from_str::<JobName>("\"Bad\"").is_err());
    }
}
