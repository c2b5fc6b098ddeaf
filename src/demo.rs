//! Built-in `demo` license type

use crate::claim::ClaimRule;
use crate::registry::LicenseType;
use lazy_static::lazy_static;
use regex::Regex;

pub const DEMO_LICENSE: &str = "demo";

pub const CODE_IS_TRY: &str = "is_try";
pub const CODE_EXPIRED_AT: &str = "expired_at";
pub const CODE_MODEL: &str = "model";

lazy_static! {
    static ref MODEL_PATTERN: Regex = Regex::new(r"^X[0-9]{3}$").unwrap();
}

/// Trial flag: content `t` or `f`
pub fn is_try_rule() -> ClaimRule {
    ClaimRule::new(CODE_IS_TRY)
        .name("Trial")
        .require_content()
        .check(|content, _| match content {
            "t" | "f" => Ok(()),
            _ => Err("need t or f".to_string()),
        })
        .example("t|f")
}

/// Mandatory expiry, which must lie in the future at issue time
pub fn expired_at_rule() -> ClaimRule {
    ClaimRule::new(CODE_EXPIRED_AT)
        .required()
        .name("Expiration")
        .remark("timestamp")
        .require_expiry()
        .check(|_, expired_at| {
            if expired_at <= chrono::Utc::now().timestamp() {
                return Err("before now".to_string());
            }
            Ok(())
        })
        .example("2006-01-02 15:04:05")
}

/// Hardware model, `X` followed by three digits
pub fn model_rule() -> ClaimRule {
    ClaimRule::new(CODE_MODEL)
        .name("Model")
        .require_content()
        .pattern(MODEL_PATTERN.clone())
        .example("X100")
}

#[derive(Debug, Clone)]
pub struct DemoLicense {
    rules: Vec<ClaimRule>,
}

impl DemoLicense {
    pub fn new() -> Self {
        Self {
            rules: vec![is_try_rule(), expired_at_rule(), model_rule()],
        }
    }
}

impl Default for DemoLicense {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseType for DemoLicense {
    fn name(&self) -> &str {
        DEMO_LICENSE
    }

    fn rules(&self) -> &[ClaimRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{Claim, ClaimError};
    use crate::registry::{ClaimRegistry, CreateLicenseRequest};
    use chrono::{Duration, Utc};

    fn tomorrow() -> i64 {
        (Utc::now() + Duration::hours(24)).timestamp()
    }

    #[test]
    fn test_demo_request_validates() {
        let registry = ClaimRegistry::with_builtin_types();
        let request = CreateLicenseRequest::new(
            DEMO_LICENSE,
            vec![
                Claim::new(CODE_IS_TRY).with_content("t"),
                Claim::new(CODE_EXPIRED_AT).with_expiry(tomorrow()),
                Claim::new(CODE_MODEL).with_content("X200"),
            ],
        );

        let issued = registry.validate_request(&request).unwrap();
        assert_eq!(issued.len(), 3);
        assert_eq!(issued[0].name, "Trial");
        assert_eq!(issued[1].remark, "timestamp");
        assert_eq!(issued[1].content, "");
        assert_eq!(issued[2].content, "X200");
    }

    #[test]
    fn test_demo_rejects_past_expiry() {
        let registry = ClaimRegistry::with_builtin_types();
        let claims = vec![Claim::new(CODE_EXPIRED_AT).with_expiry(1)];
        assert!(matches!(
            registry.validate(DEMO_LICENSE, &claims),
            Err(ClaimError::ContentValidation { code, .. }) if code == CODE_EXPIRED_AT
        ));
    }

    #[test]
    fn test_demo_rejects_bad_content() {
        let registry = ClaimRegistry::with_builtin_types();

        let claims = vec![
            Claim::new(CODE_EXPIRED_AT).with_expiry(tomorrow()),
            Claim::new(CODE_IS_TRY).with_content("yes"),
        ];
        assert!(registry.validate(DEMO_LICENSE, &claims).is_err());

        let claims = vec![
            Claim::new(CODE_EXPIRED_AT).with_expiry(tomorrow()),
            Claim::new(CODE_MODEL).with_content("X1000"),
        ];
        assert!(registry.validate(DEMO_LICENSE, &claims).is_err());
    }

    #[test]
    fn test_demo_requires_expiry_claim() {
        let registry = ClaimRegistry::with_builtin_types();
        let claims = vec![Claim::new(CODE_MODEL).with_content("X100")];
        assert_eq!(
            registry.validate(DEMO_LICENSE, &claims),
            Err(ClaimError::MissingRequiredClaim(CODE_EXPIRED_AT.to_string()))
        );
    }

    #[test]
    fn test_model_tip_is_pattern() {
        assert_eq!(model_rule().tip, "^X[0-9]{3}$");
    }
}
