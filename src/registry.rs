//! License types and the registry that validates claims against them
//!
//! A [`ClaimRegistry`] is assembled once with [`ClaimRegistryBuilder`] and is
//! immutable afterwards, so it can be shared freely across threads.
//! Registration mistakes are programming errors and panic.

use crate::claim::{Claim, ClaimError, ClaimRule};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Input to license issuance: the type name and the claims requested
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateLicenseRequest {
    pub name: String,
    pub claims: Vec<Claim>,
}

impl CreateLicenseRequest {
    pub fn new(name: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            name: name.into(),
            claims,
        }
    }
}

/// A named set of claim rules
pub trait LicenseType: Send + Sync {
    fn name(&self) -> &str;

    /// Rules in declaration order
    fn rules(&self) -> &[ClaimRule];

    /// Validate and normalize the requested claims
    fn validate(&self, claims: &[Claim]) -> Result<Vec<Claim>, ClaimError> {
        generate_claims(self.rules(), claims)
    }
}

/// A license type defined only by its name and rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<ClaimRule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<ClaimRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

impl LicenseType for RuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> &[ClaimRule] {
        &self.rules
    }
}

/// Validate `claims` against `rules`
///
/// Order of checks: duplicate codes, missing required codes (in rule
/// order), then per claim: unknown code, pattern, normalization, custom
/// check. Output preserves input order.
pub fn generate_claims(rules: &[ClaimRule], claims: &[Claim]) -> Result<Vec<Claim>, ClaimError> {
    let mut supplied = HashSet::with_capacity(claims.len());
    for claim in claims {
        if !supplied.insert(claim.code.as_str()) {
            return Err(ClaimError::DuplicateClaim(claim.code.clone()));
        }
    }

    if let Some(rule) = rules
        .iter()
        .find(|rule| rule.required && !supplied.contains(rule.code.as_str()))
    {
        return Err(ClaimError::MissingRequiredClaim(rule.code.clone()));
    }

    let by_code: HashMap<&str, &ClaimRule> = rules.iter().map(|r| (r.code.as_str(), r)).collect();

    claims
        .iter()
        .map(|claim| {
            let rule = by_code
                .get(claim.code.as_str())
                .ok_or_else(|| ClaimError::UnsupportedClaim(claim.code.clone()))?;
            rule.apply(claim)
        })
        .collect()
}

/// Immutable map of license type name to its rules
#[derive(Clone, Default)]
pub struct ClaimRegistry {
    types: HashMap<String, Arc<dyn LicenseType>>,
}

impl ClaimRegistry {
    pub fn builder() -> ClaimRegistryBuilder {
        ClaimRegistryBuilder::default()
    }

    /// Registry holding the types shipped with this crate
    pub fn with_builtin_types() -> Self {
        Self::builder().register(crate::demo::DemoLicense::new()).build()
    }

    pub fn get(&self, name: &str) -> Option<&dyn LicenseType> {
        self.types.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validate claims for the named license type
    pub fn validate(&self, type_name: &str, claims: &[Claim]) -> Result<Vec<Claim>, ClaimError> {
        let license_type = self
            .get(type_name)
            .ok_or_else(|| ClaimError::UnknownLicenseType(type_name.to_string()))?;
        let issued = license_type.validate(claims)?;
        debug!(license_type = type_name, claims = issued.len(), "Validated claims");
        Ok(issued)
    }

    /// Validate a [`CreateLicenseRequest`]
    pub fn validate_request(&self, request: &CreateLicenseRequest) -> Result<Vec<Claim>, ClaimError> {
        self.validate(&request.name, &request.claims)
    }
}

impl std::fmt::Debug for ClaimRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Collects license types before freezing them into a [`ClaimRegistry`]
#[derive(Default)]
pub struct ClaimRegistryBuilder {
    types: HashMap<String, Arc<dyn LicenseType>>,
}

impl ClaimRegistryBuilder {
    /// Add a license type
    ///
    /// # Panics
    ///
    /// If the name is already registered, the type has no rules, or two
    /// rules share a code.
    pub fn register<L: LicenseType + 'static>(mut self, license_type: L) -> Self {
        let name = license_type.name().to_string();
        if self.types.contains_key(&name) {
            panic!("license type registered twice: {}", name);
        }

        let rules = license_type.rules();
        if rules.is_empty() {
            panic!("license type {} has no claim rules", name);
        }

        let mut codes = HashSet::with_capacity(rules.len());
        for rule in rules {
            if !codes.insert(rule.code.as_str()) {
                panic!("license type {} has duplicate rule: {}", name, rule.code);
            }
        }

        self.types.insert(name, Arc::new(license_type));
        self
    }

    pub fn build(self) -> ClaimRegistry {
        ClaimRegistry { types: self.types }
    }
}
