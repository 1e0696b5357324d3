/*!
 * # Pick request coordinator
 *
 * The state machine that correlates one pick request with the permission
 * prompt, the surface UI and the materialization step that follow it.
 *
 * ```text
 * Idle ─start─▶ AwaitingPermission ─granted─▶ AwaitingSurfaceResult ─produced─▶ AwaitingMaterialization
 *   ▲                 │ denied                      │ cancelled / unavailable          │ done / failed
 *   └─────────────────┴─────────────────────────────┴──────────────────────────────────┘  (reply + clear slot)
 * ```
 *
 * The coordinator is pure: it never calls a platform API. Each transition
 * returns at most one [`Effect`] for the host driver to carry out, and the
 * results of those effects come back as [`PickEvent`]s. Every event carries
 * the [`RequestId`] it answers; events that do not match the pending request
 * and its stage are discarded, so a late or duplicated platform callback can
 * never resurrect a finished request or corrupt a newer one.
 *
 * There is at most one pending request. Reaching a terminal outcome and
 * clearing the slot happen in the same call, and the caller's
 * [`CallerHandle`] is consumed by that single delivery.
 */

use crate::descriptor::AttachmentDescriptor;
use crate::error::{MaterializationError, PickError};
use crate::permission::{PermissionStatus, PromptOutcome};
use crate::request::{PermissionCapability, PickKind, PickOptions, RequestId};
use crate::surface::{RawItem, SurfaceOutcome};
use std::fmt;

/// Terminal outcome of one pick request
pub type PickOutcome = Result<AttachmentDescriptor, PickError>;

/// One-shot reply channel back to whoever started a request.
///
/// Delivering consumes the handle, so a request can be answered at most once.
pub struct CallerHandle {
    reply: Option<Box<dyn FnOnce(PickOutcome) + Send>>,
}

impl CallerHandle {
    pub fn new(reply: impl FnOnce(PickOutcome) + Send + 'static) -> Self {
        Self {
            reply: Some(Box::new(reply)),
        }
    }

    pub fn deliver(mut self, outcome: PickOutcome) {
        if let Some(reply) = self.reply.take() {
            reply(outcome);
        }
    }
}

impl Drop for CallerHandle {
    fn drop(&mut self) {
        if self.reply.is_some() {
            log::warn!("Pick request caller dropped without a reply");
        }
    }
}

impl fmt::Debug for CallerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerHandle")
            .field("answered", &self.reply.is_none())
            .finish()
    }
}

/// Stage of the pending request. Stages only ever advance.
///
/// `Idle` is the empty slot and `Done` is never stored: finishing clears the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    AwaitingPermission,
    AwaitingSurfaceResult,
    AwaitingMaterialization,
}

/// Work the host driver must perform on the coordinator's behalf
#[derive(Debug)]
pub enum Effect {
    RequestPermission {
        request: RequestId,
        capability: PermissionCapability,
    },
    LaunchSurface {
        request: RequestId,
        kind: PickKind,
        options: PickOptions,
    },
    Materialize {
        request: RequestId,
        kind: PickKind,
        item: RawItem,
    },
    Deliver {
        request: RequestId,
        caller: CallerHandle,
        outcome: PickOutcome,
    },
}

/// External signal addressed to the coordinator
#[derive(Debug)]
pub enum PickEvent {
    Permission {
        request: RequestId,
        capability: PermissionCapability,
        outcome: PromptOutcome,
    },
    Surface {
        request: RequestId,
        outcome: SurfaceOutcome,
    },
    Materialized {
        request: RequestId,
        result: Result<AttachmentDescriptor, MaterializationError>,
    },
    /// The hosting UI context is gone for good
    ContextLost,
}

/// A start that was refused; the caller handle is handed back unanswered
#[derive(Debug)]
pub struct Rejected {
    pub error: PickError,
    pub caller: CallerHandle,
}

#[derive(Debug)]
struct PendingRequest {
    id: RequestId,
    kind: PickKind,
    options: PickOptions,
    stage: Stage,
    awaited_capability: Option<PermissionCapability>,
    caller: CallerHandle,
}

impl PendingRequest {
    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage must advance: {:?} -> {next:?}", self.stage);
        log::debug!("Pick request {} {:?} -> {next:?}", self.id, self.stage);
        self.stage = next;
    }
}

#[derive(Debug, Default)]
pub struct PickRequestCoordinator {
    slot: Option<PendingRequest>,
    next_id: u64,
}

impl PickRequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.slot.is_none()
    }

    pub fn stage(&self) -> Option<Stage> {
        self.slot.as_ref().map(|pending| pending.stage)
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.slot.as_ref().map(|pending| pending.id)
    }

    /// Accept a new request, or refuse it with `Busy` if one is pending.
    ///
    /// `status` is consulted only when `kind` needs a capability. A refused
    /// start leaves the pending request untouched.
    pub fn start(
        &mut self,
        kind: PickKind,
        options: PickOptions,
        caller: CallerHandle,
        status: impl FnOnce(PermissionCapability) -> PermissionStatus,
    ) -> Result<(RequestId, Effect), Rejected> {
        if let Some(pending) = &self.slot {
            log::debug!(
                "Refusing {kind} request: request {} is {:?}",
                pending.id,
                pending.stage
            );
            return Err(Rejected {
                error: PickError::Busy,
                caller,
            });
        }

        self.next_id += 1;
        let id = RequestId(self.next_id);

        let missing = kind
            .required_capability()
            .filter(|capability| status(*capability) != PermissionStatus::Granted);

        let (stage, effect) = match missing {
            Some(capability) => (
                Stage::AwaitingPermission,
                Effect::RequestPermission {
                    request: id,
                    capability,
                },
            ),
            None => (
                Stage::AwaitingSurfaceResult,
                Effect::LaunchSurface {
                    request: id,
                    kind,
                    options: options.clone(),
                },
            ),
        };

        log::debug!("Accepted {kind} request {id}, starting at {stage:?}");
        self.slot = Some(PendingRequest {
            id,
            kind,
            options,
            stage,
            awaited_capability: missing,
            caller,
        });

        Ok((id, effect))
    }

    /// Apply one external event; events that do not match the pending stage are no-ops
    pub fn handle(&mut self, event: PickEvent) -> Option<Effect> {
        match event {
            PickEvent::Permission {
                request,
                capability,
                outcome,
            } => {
                let pending = self.matching(request, Stage::AwaitingPermission)?;
                if pending.awaited_capability != Some(capability) {
                    log::debug!(
                        "Discarding {capability} result for request {request}: awaiting {:?}",
                        pending.awaited_capability
                    );
                    return None;
                }

                match outcome {
                    PromptOutcome::Denied => self.finish(Err(PickError::PermissionDenied)),
                    PromptOutcome::Granted => {
                        pending.advance(Stage::AwaitingSurfaceResult);
                        Some(Effect::LaunchSurface {
                            request,
                            kind: pending.kind,
                            options: pending.options.clone(),
                        })
                    }
                }
            }
            PickEvent::Surface { request, outcome } => {
                let pending = self.matching(request, Stage::AwaitingSurfaceResult)?;
                match outcome {
                    SurfaceOutcome::Cancelled => self.finish(Err(PickError::UserCancelled)),
                    SurfaceOutcome::Unavailable(reason) => {
                        self.finish(Err(PickError::SurfaceUnavailable(reason)))
                    }
                    SurfaceOutcome::Produced(item) => {
                        pending.advance(Stage::AwaitingMaterialization);
                        Some(Effect::Materialize {
                            request,
                            kind: pending.kind,
                            item,
                        })
                    }
                }
            }
            PickEvent::Materialized { request, result } => {
                self.matching(request, Stage::AwaitingMaterialization)?;
                self.finish(result.map_err(PickError::from))
            }
            PickEvent::ContextLost => match self.stage() {
                Some(Stage::AwaitingPermission | Stage::AwaitingSurfaceResult) => {
                    self.finish(Err(PickError::NoInteractionContext))
                }
                _ => None,
            },
        }
    }

    fn matching(&mut self, request: RequestId, stage: Stage) -> Option<&mut PendingRequest> {
        match self.slot.as_mut() {
            Some(pending) if pending.id == request && pending.stage == stage => Some(pending),
            Some(pending) => {
                log::debug!(
                    "Discarding event for request {request} at {stage:?}: request {} is {:?}",
                    pending.id,
                    pending.stage
                );
                None
            }
            None => {
                log::debug!("Discarding event for request {request}: no request pending");
                None
            }
        }
    }

    /// Clear the slot and hand the caller its terminal outcome
    fn finish(&mut self, outcome: PickOutcome) -> Option<Effect> {
        let pending = self.slot.take()?;
        match &outcome {
            Ok(descriptor) => log::info!(
                "Pick request {} ({}) produced {}",
                pending.id,
                pending.kind,
                descriptor.file_path.display()
            ),
            Err(e @ (PickError::UserCancelled | PickError::PermissionDenied)) => {
                log::info!("Pick request {} ({}) ended: {e}", pending.id, pending.kind)
            }
            Err(e) => log::warn!("Pick request {} ({}) failed: {e}", pending.id, pending.kind),
        }

        Some(Effect::Deliver {
            request: pending.id,
            caller: pending.caller,
            outcome,
        })
    }
}
