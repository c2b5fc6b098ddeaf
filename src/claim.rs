//! Claims carried by a license, and the rules that admit them

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while validating claims against a license type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("unknown license type: {0}")]
    UnknownLicenseType(String),

    #[error("duplicate claim: {0}")]
    DuplicateClaim(String),

    #[error("missing required claim: {0}")]
    MissingRequiredClaim(String),

    #[error("unsupported claim: {0}")]
    UnsupportedClaim(String),

    #[error("claim {code} failed validation: {reason}")]
    ContentValidation { code: String, reason: String },
}

/// One authorization claim
///
/// `expired_at` is unix seconds; 0 means the claim never expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Claim {
    pub code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub expired_at: i64,
    pub remark: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Claim {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_expiry(mut self, expired_at: i64) -> Self {
        self.expired_at = expired_at;
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// True if the claim carries an expiry at or before `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expired_at != 0 && self.expired_at <= now
    }
}

/// Custom content check: receives the normalized content and expiry
pub type CheckFn = Arc<dyn Fn(&str, i64) -> Result<(), String> + Send + Sync>;

/// How one claim code is validated and normalized
#[derive(Clone)]
pub struct ClaimRule {
    pub code: String,
    pub required: bool,
    pub require_content: bool,
    pub require_expiry: bool,
    /// Injected into the issued claim, overriding the caller's value
    pub name: String,
    /// Injected into the issued claim, overriding the caller's value
    pub remark: String,
    pub pattern: Option<Regex>,
    pub check: Option<CheckFn>,
    pub example: String,
    pub tip: String,
}

impl ClaimRule {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            required: false,
            require_content: false,
            require_expiry: false,
            name: String::new(),
            remark: String::new(),
            pattern: None,
            check: None,
            example: String::new(),
            tip: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn require_content(mut self) -> Self {
        self.require_content = true;
        self
    }

    pub fn require_expiry(mut self) -> Self {
        self.require_expiry = true;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Content must match `pattern`. The tip defaults to the pattern source.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        if self.tip.is_empty() {
            self.tip = pattern.as_str().to_string();
        }
        self.pattern = Some(pattern);
        self
    }

    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str, i64) -> Result<(), String> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = tip.into();
        self
    }

    /// Validate one supplied claim and produce the issued form
    pub(crate) fn apply(&self, claim: &Claim) -> Result<Claim, ClaimError> {
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&claim.content) {
                return Err(ClaimError::ContentValidation {
                    code: claim.code.clone(),
                    reason: format!("content does not match {}", pattern.as_str()),
                });
            }
        }

        let issued = Claim {
            code: claim.code.clone(),
            name: self.name.clone(),
            content: if self.require_content {
                claim.content.clone()
            } else {
                String::new()
            },
            expired_at: if self.require_expiry { claim.expired_at } else { 0 },
            remark: self.remark.clone(),
        };

        if self.require_content || self.require_expiry {
            if let Some(check) = &self.check {
                check(&issued.content, issued.expired_at).map_err(|reason| {
                    ClaimError::ContentValidation {
                        code: issued.code.clone(),
                        reason,
                    }
                })?;
            }
        }

        Ok(issued)
    }
}

impl fmt::Debug for ClaimRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimRule")
            .field("code", &self.code)
            .field("required", &self.required)
            .field("require_content", &self.require_content)
            .field("require_expiry", &self.require_expiry)
            .field("name", &self.name)
            .field("remark", &self.remark)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("check", &self.check.is_some())
            .field("example", &self.example)
            .field("tip", &self.tip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_json_field_names() {
        let claim = Claim::new("id").with_name("ID").with_content("test");
        let json = serde_json::to_string(&claim).unwrap();
        assert_eq!(json, r#"{"Code":"id","Name":"ID","Content":"test","Remark":""}"#);

        let claim = Claim::new("expired_at").with_expiry(1700000000);
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["ExpiredAt"], 1700000000);
        assert!(json.get("Name").is_none());
    }

    #[test]
    fn test_claim_missing_fields_default() {
        let claim: Claim = serde_json::from_str(r#"{"Code":"model"}"#).unwrap();
        assert_eq!(claim, Claim::new("model"));
    }

    #[test]
    fn test_is_expired_at() {
        assert!(!Claim::new("a").is_expired_at(i64::MAX));
        let claim = Claim::new("a").with_expiry(100);
        assert!(!claim.is_expired_at(99));
        assert!(claim.is_expired_at(100));
    }

    #[test]
    fn test_rule_normalizes_unrequired_fields() {
        let rule = ClaimRule::new("flag").name("Flag").remark("note");
        let supplied = Claim::new("flag")
            .with_name("caller name")
            .with_content("v")
            .with_expiry(123);

        let issued = rule.apply(&supplied).unwrap();
        assert_eq!(issued.name, "Flag");
        assert_eq!(issued.remark, "note");
        assert_eq!(issued.content, "");
        assert_eq!(issued.expired_at, 0);
    }

    #[test]
    fn test_rule_pattern_checks_supplied_content() {
        let rule = ClaimRule::new("model")
            .require_content()
            .pattern(Regex::new("^X[0-9]{3}$").unwrap());
        assert_eq!(rule.tip, "^X[0-9]{3}$");

        assert!(rule.apply(&Claim::new("model").with_content("X100")).is_ok());
        assert!(matches!(
            rule.apply(&Claim::new("model").with_content("Y100")),
            Err(ClaimError::ContentValidation { .. })
        ));
    }

    #[test]
    fn test_check_runs_only_when_something_is_required() {
        let rule = ClaimRule::new("noop").check(|_, _| Err("always fails".to_string()));
        assert!(rule.apply(&Claim::new("noop")).is_ok());

        let rule = rule.require_content();
        let err = rule.apply(&Claim::new("noop")).unwrap_err();
        assert_eq!(
            err,
            ClaimError::ContentValidation {
                code: "noop".to_string(),
                reason: "always fails".to_string()
            }
        );
    }
}
