mod common;

use common::*;
use std::sync::Arc;
use std::thread;

/// A license type with its own validation on top of the rules
struct SeatLicense {
    rules: Vec<ClaimRule>,
}

impl SeatLicense {
    fn new() -> Self {
        Self {
            rules: vec![
                ClaimRule::new("seats")
                    .required()
                    .require_content()
                    .name("Seats")
                    .check(|content, _| {
                        content
                            .parse::<u32>()
                            .map(|_| ())
                            .map_err(|e| format!("seats must be a number: {}", e))
                    }),
                ClaimRule::new("support").name("Support").remark("email only"),
            ],
        }
    }
}

impl LicenseType for SeatLicense {
    fn name(&self) -> &str {
        "seats"
    }

    fn rules(&self) -> &[ClaimRule] {
        &self.rules
    }

    fn validate(&self, claims: &[Claim]) -> Result<Vec<Claim>, ClaimError> {
        let issued = superlicense::registry::generate_claims(self.rules(), claims)?;
        if issued.len() > 1 && issued[0].code != "seats" {
            return Err(ClaimError::ContentValidation {
                code: issued[0].code.clone(),
                reason: "seats must come first".to_string(),
            });
        }
        Ok(issued)
    }
}

fn registry() -> ClaimRegistry {
    ClaimRegistry::builder()
        .register(superlicense::demo::DemoLicense::new())
        .register(SeatLicense::new())
        .build()
}

#[test]
fn test_normalization_drops_unrequired_fields() -> Result<(), Box<dyn std::error::Error>> {
    let claims = vec![
        Claim::new("seats").with_content("25"),
        Claim::new("support")
            .with_name("caller")
            .with_content("v")
            .with_expiry(hours_from_now(5))
            .with_remark("caller remark"),
    ];

    let issued = registry().validate("seats", &claims)?;
    assert_eq!(issued[1].content, "");
    assert_eq!(issued[1].expired_at, 0);
    assert_eq!(issued[1].name, "Support");
    assert_eq!(issued[1].remark, "email only");
    assert_eq!(issued[0].content, "25");
    Ok(())
}

#[test]
fn test_custom_validate_and_check() {
    let registry = registry();

    let bad_number = vec![Claim::new("seats").with_content("many")];
    assert!(matches!(
        registry.validate("seats", &bad_number),
        Err(ClaimError::ContentValidation { code, .. }) if code == "seats"
    ));

    let wrong_order = vec![Claim::new("support"), Claim::new("seats").with_content("1")];
    assert!(matches!(
        registry.validate("seats", &wrong_order),
        Err(ClaimError::ContentValidation { reason, .. }) if reason.contains("first")
    ));
}

#[test]
fn test_types_are_isolated() {
    let registry = registry();
    assert_eq!(registry.names(), vec!["demo", "seats"]);

    // A demo claim is unknown to the seats type
    let claims = vec![
        Claim::new("seats").with_content("3"),
        Claim::new("model").with_content("X100"),
    ];
    assert_eq!(
        registry.validate("seats", &claims),
        Err(ClaimError::UnsupportedClaim("model".to_string()))
    );
}

#[test]
fn test_registry_shared_across_threads() {
    let registry = Arc::new(registry());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let claims = vec![Claim::new("seats").with_content(i.to_string())];
                registry.validate("seats", &claims)
            })
        })
        .collect();

    for handle in handles {
        let issued = handle.join().expect("thread panicked").expect("validation failed");
        assert_eq!(issued.len(), 1);
    }
}

#[test]
fn test_create_license_request_json() -> Result<(), Box<dyn std::error::Error>> {
    let expiry = hours_from_now(24);
    let json = format!(
        r#"{{"Name":"demo","Claims":[{{"Code":"expired_at","ExpiredAt":{}}},{{"Code":"is_try","Content":"f"}}]}}"#,
        expiry
    );
    let request: CreateLicenseRequest = serde_json::from_str(&json)?;
    assert_eq!(request.name, "demo");

    let issued = registry().validate_request(&request)?;
    assert_eq!(issued[0].expired_at, expiry);
    assert_eq!(issued[1].content, "f");
    Ok(())
}

#[test]
#[should_panic(expected = "registered twice: demo")]
fn test_builtin_type_cannot_be_registered_again() {
    ClaimRegistry::builder()
        .register(superlicense::demo::DemoLicense::new())
        .register(RuleSet::new("demo", vec![ClaimRule::new("x")]));
}
