//! Permission gating in front of surface launches.
//!
//! The gate maps a logical [`PermissionCapability`] to whatever the platform
//! calls it, answers status queries synchronously and shows the consent
//! prompt. Prompt results come back later as
//! [`PickEvent::Permission`](crate::coordinator::PickEvent::Permission).

use crate::request::{PermissionCapability, RequestId};

/// Current grant status of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDetermined,
}

/// Result of a consent prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Granted,
    Denied,
}

impl From<bool> for PromptOutcome {
    fn from(granted: bool) -> Self {
        if granted {
            PromptOutcome::Granted
        } else {
            PromptOutcome::Denied
        }
    }
}

/// Platform permission subsystem, generic over the host's interaction context `C`.
pub trait PermissionGate<C> {
    /// Side-effect-free status query
    fn status(&self, context: &C, capability: PermissionCapability) -> PermissionStatus;

    /// Show the consent prompt for `capability` on behalf of `request`.
    ///
    /// The outcome must be reported later, tagged with `request`. Implementations
    /// must not report it from inside this call. An `Err` means no prompt was
    /// shown and is treated as a denial.
    fn request_prompt(
        &self,
        context: &C,
        capability: PermissionCapability,
        request: RequestId,
    ) -> Result<(), String>;
}

/// Gate for hosts without a runtime permission model: everything is granted
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl<C> PermissionGate<C> for AlwaysGranted {
    fn status(&self, _context: &C, _capability: PermissionCapability) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_prompt(
        &self,
        _context: &C,
        capability: PermissionCapability,
        _request: RequestId,
    ) -> Result<(), String> {
        Err(format!("{capability} is always granted, nothing to prompt for"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_outcome_from_bool() {
        assert_eq!(PromptOutcome::from(true), PromptOutcome::Granted);
        assert_eq!(PromptOutcome::from(false), PromptOutcome::Denied);
    }

    #[test]
    fn test_always_granted() {
        let gate = AlwaysGranted;
        assert_eq!(
            PermissionGate::<()>::status(&gate, &(), PermissionCapability::Camera),
            PermissionStatus::Granted
        );
    }
}
