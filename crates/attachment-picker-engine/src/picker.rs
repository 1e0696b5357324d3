//! Host-side driver around the [`PickRequestCoordinator`].
//!
//! Owns the platform collaborators, carries out the coordinator's effects and
//! feeds their results back in, one transition at a time. The hosting shell
//! passes its current interaction context (if any) into every call; the driver
//! never keeps it.

use crate::coordinator::{CallerHandle, Effect, PickEvent, PickRequestCoordinator, Rejected};
use crate::materialize::AttachmentMaterializer;
use crate::permission::{PermissionGate, PermissionStatus, PromptOutcome};
use crate::request::{PermissionCapability, PickKind, PickOptions, RequestId};
use crate::surface::{AcquisitionSurface, SurfaceLaunch, SurfaceOutcome};
use std::path::PathBuf;

pub struct AttachmentPicker<C> {
    coordinator: PickRequestCoordinator,
    gate: Box<dyn PermissionGate<C> + Send>,
    surface: Box<dyn AcquisitionSurface<C> + Send>,
    materializer: AttachmentMaterializer,
    /// Staging file handed to the camera for the pending request
    capture_target: Option<(RequestId, PathBuf)>,
}

impl<C> AttachmentPicker<C> {
    pub fn new(
        gate: Box<dyn PermissionGate<C> + Send>,
        surface: Box<dyn AcquisitionSurface<C> + Send>,
        materializer: AttachmentMaterializer,
    ) -> Self {
        Self {
            coordinator: PickRequestCoordinator::new(),
            gate,
            surface,
            materializer,
            capture_target: None,
        }
    }

    pub fn coordinator(&self) -> &PickRequestCoordinator {
        &self.coordinator
    }

    pub fn pick_camera_image(
        &mut self,
        context: Option<&C>,
        caller: CallerHandle,
    ) -> Result<RequestId, Rejected> {
        self.pick(context, PickKind::Camera, PickOptions::default(), caller)
    }

    pub fn pick_gallery_image(
        &mut self,
        context: Option<&C>,
        caller: CallerHandle,
    ) -> Result<RequestId, Rejected> {
        self.pick(context, PickKind::Gallery, PickOptions::default(), caller)
    }

    /// Pick one document; absent or empty `allowed_extensions` accepts any type
    pub fn pick_document(
        &mut self,
        context: Option<&C>,
        allowed_extensions: Option<Vec<String>>,
        caller: CallerHandle,
    ) -> Result<RequestId, Rejected> {
        let options = PickOptions {
            allowed_extensions: allowed_extensions.unwrap_or_default(),
        };
        self.pick(context, PickKind::Document, options, caller)
    }

    pub fn pick_audio_file(
        &mut self,
        context: Option<&C>,
        caller: CallerHandle,
    ) -> Result<RequestId, Rejected> {
        self.pick(context, PickKind::Audio, PickOptions::default(), caller)
    }

    /// Start a pick request.
    ///
    /// `Err` means the request was refused (`Busy`) and the caller handle is
    /// returned unanswered; otherwise exactly one outcome will reach `caller`.
    pub fn pick(
        &mut self,
        context: Option<&C>,
        kind: PickKind,
        options: PickOptions,
        caller: CallerHandle,
    ) -> Result<RequestId, Rejected> {
        let gate = &self.gate;
        let (request, effect) = self
            .coordinator
            .start(kind, options, caller, |capability| match context {
                Some(context) => gate.status(context, capability),
                None => PermissionStatus::NotDetermined,
            })?;
        self.run(context, Some(effect));
        Ok(request)
    }

    /// Whether `capability` is currently granted. Never prompts.
    pub fn request_permission(&self, context: Option<&C>, capability: PermissionCapability) -> bool {
        context.is_some_and(|context| {
            self.gate.status(context, capability) == PermissionStatus::Granted
        })
    }

    /// Platform reported the result of a consent prompt
    pub fn on_permission_result(
        &mut self,
        context: Option<&C>,
        request: RequestId,
        capability: PermissionCapability,
        outcome: PromptOutcome,
    ) {
        let effect = self.coordinator.handle(PickEvent::Permission {
            request,
            capability,
            outcome,
        });
        self.run(context, effect);
    }

    /// Platform reported the result of a surface launch
    pub fn on_surface_result(
        &mut self,
        context: Option<&C>,
        request: RequestId,
        outcome: SurfaceOutcome,
    ) {
        let effect = self.coordinator.handle(PickEvent::Surface { request, outcome });
        self.run(context, effect);
    }

    /// The hosting UI context is gone for good (not a configuration change).
    ///
    /// A request still waiting on a prompt or a surface fails with
    /// `NoInteractionContext` instead of occupying the slot forever.
    pub fn context_lost(&mut self) {
        let effect = self.coordinator.handle(PickEvent::ContextLost);
        self.run(None, effect);
    }

    fn run(&mut self, context: Option<&C>, effect: Option<Effect>) {
        let mut next = effect;
        while let Some(effect) = next.take() {
            next = match effect {
                Effect::RequestPermission {
                    request,
                    capability,
                } => self.request_prompt(context, request, capability),
                Effect::LaunchSurface {
                    request,
                    kind,
                    options,
                } => self.launch_surface(context, request, kind, &options),
                Effect::Materialize {
                    request,
                    kind,
                    item,
                } => {
                    let result = self.materializer.materialize(kind, &item);
                    self.coordinator
                        .handle(PickEvent::Materialized { request, result })
                }
                Effect::Deliver {
                    request,
                    caller,
                    outcome,
                } => {
                    log::debug!("Replying to pick request {request}");
                    self.discard_capture_target(request);
                    caller.deliver(outcome);
                    None
                }
            };
        }
    }

    fn request_prompt(
        &mut self,
        context: Option<&C>,
        request: RequestId,
        capability: PermissionCapability,
    ) -> Option<Effect> {
        let Some(context) = context else {
            log::warn!("Cannot prompt for {capability}: no interaction context");
            return self.coordinator.handle(PickEvent::ContextLost);
        };

        match self.gate.request_prompt(context, capability, request) {
            Ok(()) => {
                log::debug!("Prompting for {capability} on behalf of request {request}");
                None
            }
            Err(reason) => {
                log::warn!("Permission prompt for {capability} not shown: {reason}");
                self.coordinator.handle(PickEvent::Permission {
                    request,
                    capability,
                    outcome: PromptOutcome::Denied,
                })
            }
        }
    }

    fn launch_surface(
        &mut self,
        context: Option<&C>,
        request: RequestId,
        kind: PickKind,
        options: &PickOptions,
    ) -> Option<Effect> {
        let Some(context) = context else {
            log::warn!("Cannot launch {kind} surface: no interaction context");
            return self.coordinator.handle(PickEvent::ContextLost);
        };

        let launched = SurfaceLaunch::for_request(kind, options, || {
            self.materializer
                .prepare_capture_target(request)
                .map_err(|e| format!("Cannot prepare capture target: {e}"))
        })
        .and_then(|launch| {
            if let SurfaceLaunch::Camera { capture_target } = &launch {
                self.capture_target = Some((request, capture_target.clone()));
            }
            log::debug!("Launching {launch:?} for request {request}");
            self.surface.launch(context, request, &launch)
        });

        match launched {
            Ok(()) => None,
            Err(reason) => self.coordinator.handle(PickEvent::Surface {
                request,
                outcome: SurfaceOutcome::Unavailable(reason),
            }),
        }
    }

    /// The request is over; whatever the camera wrote for it is no longer needed.
    /// After a successful capture the materializer has already removed it.
    fn discard_capture_target(&mut self, request: RequestId) {
        if let Some((_, path)) = self.capture_target.take_if(|(staged_for, _)| *staged_for == request) {
            self.materializer.discard_capture_target(&path);
        }
    }
}
