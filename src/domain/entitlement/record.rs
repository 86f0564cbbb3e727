//! Customer entitlement record.
//!
//! An entitlement lets a customer take an eligible order without paying while
//! the grant window is open.
//!
//! # Design Decisions
//!
//! - **Fail-closed**: any missing attribute means no bypass
//! - **Strict window**: both bounds are exclusive
//! - **Tri-state status**: unset is distinct from inactive, but both deny

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OpenId, Timestamp, ValidationError};

/// Administrative switch on an entitlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Active,
    Inactive,
}

impl EntitlementStatus {
    /// Decodes the stored flag. Unknown values are treated as inactive.
    pub fn from_flag(flag: i8) -> Self {
        if flag == 1 {
            EntitlementStatus::Active
        } else {
            EntitlementStatus::Inactive
        }
    }

    pub fn as_flag(&self) -> i8 {
        match self {
            EntitlementStatus::Active => 1,
            EntitlementStatus::Inactive => 0,
        }
    }
}

/// Entitlement record keyed by open id.
///
/// # Invariants
///
/// - When both bounds are set, `grant_start < grant_end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub open_id: OpenId,

    /// `None` when the record was created without a decision.
    pub status: Option<EntitlementStatus>,

    pub grant_start: Option<Timestamp>,

    pub grant_end: Option<Timestamp>,

    /// Operator who granted the entitlement.
    pub granted_by: Option<String>,
}

impl Entitlement {
    /// Creates an active entitlement for the given window.
    pub fn grant(
        open_id: OpenId,
        grant_start: Timestamp,
        grant_end: Timestamp,
        granted_by: Option<String>,
    ) -> Result<Self, ValidationError> {
        let entitlement = Self {
            open_id,
            status: Some(EntitlementStatus::Active),
            grant_start: Some(grant_start),
            grant_end: Some(grant_end),
            granted_by,
        };
        entitlement.validate()?;
        Ok(entitlement)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (&self.grant_start, &self.grant_end) {
            if !start.is_before(end) {
                return Err(ValidationError::invalid_format(
                    "grant_end",
                    "must be after grant_start",
                ));
            }
        }
        Ok(())
    }

    /// True when this record lets its customer skip payment at `now`.
    ///
    /// Requires active status and `grant_start < now < grant_end`.
    pub fn permits_bypass(&self, now: &Timestamp) -> bool {
        let active = matches!(self.status, Some(EntitlementStatus::Active));
        let started = self.grant_start.map_or(false, |start| start.is_before(now));
        let not_ended = self.grant_end.map_or(false, |end| end.is_after(now));
        active && started && not_ended
    }
}

/// Outcome of entitlement evaluation for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    /// Customer is entitled; no payment is collected.
    Bypass,
    /// Normal paid flow.
    Pay,
}

impl EntitlementDecision {
    pub fn is_bypass(&self) -> bool {
        matches!(self, EntitlementDecision::Bypass)
    }
}
