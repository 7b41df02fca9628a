//! Blood request workflows on [`Gateway`]: creation, visibility, lifecycle
//! transitions and the generic update path.
//!
//! Every mutation goes through [`Gateway::mutate_request`], which reads the
//! row, computes the next row and swaps it in only if the version is
//! unchanged. A lost race re-reads and recomputes, so the loser of two
//! concurrent approvals sees the request as already approved.

use ebloodbank_core::{
    BloodRequest, NewBloodRequest, Principal, RequestAction, RequestId, RequestPatch,
    RequestStatus, ValidationError, generate_code, now,
};
use ebloodbank_store::{CasResult, RequestFilter, StoreError};
use tracing::{debug, info, instrument, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;

impl Gateway {
    /// Create a pending request owned by `principal`.
    #[instrument(name = "gateway.create_request", skip(self, input), fields(account = %principal.account()))]
    pub async fn create_request(
        &self,
        principal: &Principal,
        input: NewBloodRequest,
    ) -> Result<BloodRequest, GatewayError> {
        self.forbid_bank_operator(principal, "create blood requests")?;
        input.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = input
                .clone()
                .into_request(principal.account(), generate_code(), now())?;
            match self.store.insert_request(&request).await {
                Ok(()) => {
                    self.metrics.increment_requests_created();
                    info!(request.id = %request.id, code = %request.code, "blood request created");
                    return Ok(request);
                }
                Err(StoreError::Duplicate(reason)) if attempt < self.max_code_attempts => {
                    debug!(attempt, %reason, "request code collision; regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// List requests visible to `principal`.
    ///
    /// Requesters only ever see their own rows, whatever `filter` asks for.
    pub async fn list_requests(
        &self,
        principal: &Principal,
        mut filter: RequestFilter,
    ) -> Result<Vec<BloodRequest>, GatewayError> {
        if let Principal::Requester { account } = principal {
            filter.requester = Some(*account);
        }
        Ok(self.store.list_requests(&filter).await?)
    }

    /// Fetch one request. Requests owned by someone else are reported as
    /// missing to requesters.
    pub async fn get_request(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<BloodRequest, GatewayError> {
        let request = self
            .store
            .get_request(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        ensure_visible(principal, &request)?;
        Ok(request)
    }

    /// Bind the request to the caller's bank as approved.
    #[instrument(name = "gateway.approve_request", skip(self), fields(account = %principal.account()))]
    pub async fn approve_request(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<BloodRequest, GatewayError> {
        let bank = self.require_bank_operator(principal, "approve requests")?;
        let action = RequestAction::Approve {
            bank,
            by: principal.account(),
        };
        self.transition(principal, id, action).await
    }

    /// Decline a pending request on behalf of the caller's bank.
    #[instrument(name = "gateway.reject_request", skip(self), fields(account = %principal.account()))]
    pub async fn reject_request(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<BloodRequest, GatewayError> {
        let bank = self.require_bank_operator(principal, "reject requests")?;
        let action = RequestAction::Reject {
            bank,
            by: principal.account(),
        };
        self.transition(principal, id, action).await
    }

    /// Mark an approved request as handed over by the bound bank.
    #[instrument(name = "gateway.fulfill_request", skip(self), fields(account = %principal.account()))]
    pub async fn fulfill_request(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<BloodRequest, GatewayError> {
        let bank = self.require_bank_operator(principal, "fulfill requests")?;
        self.transition(principal, id, RequestAction::Fulfill { bank })
            .await
    }

    /// Withdraw a pending request. Only its requester may do this.
    #[instrument(name = "gateway.cancel_request", skip(self), fields(account = %principal.account()))]
    pub async fn cancel_request(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<BloodRequest, GatewayError> {
        let account = principal.account();
        let result = self
            .mutate_request(id, |current| {
                ensure_visible(principal, current)?;
                if current.requester != account {
                    return Err(GatewayError::Forbidden(
                        "only the requester can cancel a request".into(),
                    ));
                }
                Ok(current.apply(RequestAction::Cancel, now())?)
            })
            .await;
        self.finish_transition(RequestAction::Cancel, result)
    }

    /// Apply a partial update.
    ///
    /// A `status` of approved or rejected is routed through the state machine
    /// with the caller's bank, so it carries the same guards and binding as
    /// the dedicated transitions. Other fields are validated and applied in
    /// the same swap.
    #[instrument(name = "gateway.update_request", skip(self, patch), fields(account = %principal.account()))]
    pub async fn update_request(
        &self,
        principal: &Principal,
        id: RequestId,
        patch: RequestPatch,
    ) -> Result<BloodRequest, GatewayError> {
        patch.validate()?;

        let action = match patch.status {
            None => None,
            Some(status) => {
                let bank = self.require_bank_operator(principal, "change request status")?;
                let by = principal.account();
                match status {
                    RequestStatus::Approved => Some(RequestAction::Approve { bank, by }),
                    RequestStatus::Rejected => Some(RequestAction::Reject { bank, by }),
                    other => {
                        return Err(ValidationError::new(
                            "status",
                            format!("status can only be set to approved or rejected, not {other}"),
                        )
                        .into());
                    }
                }
            }
        };

        if action.is_none() && !patch.has_field_edits() {
            return self.get_request(principal, id).await;
        }

        let result = self
            .mutate_request(id, |current| {
                ensure_visible(principal, current)?;
                let stamp = now();
                let mut next = match action {
                    Some(action) => current.apply(action, stamp)?,
                    None => current.clone(),
                };
                if patch.has_field_edits() {
                    next = patch.apply_to(&next, stamp)?;
                }
                next.version = current.version + 1;
                Ok(next)
            })
            .await;

        match action {
            Some(action) => {
                let updated = self.finish_transition(action, result)?;
                if patch.has_field_edits() {
                    self.metrics.increment_requests_updated();
                }
                Ok(updated)
            }
            None => {
                let updated = result?;
                self.metrics.increment_requests_updated();
                info!(request.id = %updated.id, version = updated.version, "blood request edited");
                Ok(updated)
            }
        }
    }

    async fn transition(
        &self,
        principal: &Principal,
        id: RequestId,
        action: RequestAction,
    ) -> Result<BloodRequest, GatewayError> {
        let result = self
            .mutate_request(id, |current| {
                ensure_visible(principal, current)?;
                Ok(current.apply(action, now())?)
            })
            .await;
        self.finish_transition(action, result)
    }

    /// Count and log the outcome of a state machine transition.
    fn finish_transition(
        &self,
        action: RequestAction,
        result: Result<BloodRequest, GatewayError>,
    ) -> Result<BloodRequest, GatewayError> {
        match result {
            Ok(updated) => {
                match action {
                    RequestAction::Approve { .. } => self.metrics.increment_requests_approved(),
                    RequestAction::Reject { .. } => self.metrics.increment_requests_rejected(),
                    RequestAction::Fulfill { .. } => self.metrics.increment_requests_fulfilled(),
                    RequestAction::Cancel => self.metrics.increment_requests_cancelled(),
                }
                info!(
                    request.id = %updated.id,
                    action = action.name(),
                    status = %updated.status,
                    bloodbank = ?updated.bloodbank,
                    "blood request transitioned"
                );
                Ok(updated)
            }
            Err(GatewayError::Transition(err)) => {
                self.metrics.increment_transition_conflicts();
                warn!(action = action.name(), current = %err.current_status(), "transition refused: {err}");
                Err(GatewayError::Transition(err))
            }
            Err(e) => Err(e),
        }
    }

    /// Read, compute with `step`, and compare-and-swap on `version`, retrying
    /// the whole round when another writer got there first.
    ///
    /// `step` sees the freshest row on every round and must return the row
    /// to store with `version` one past the row it was given.
    pub(crate) async fn mutate_request<F>(
        &self,
        id: RequestId,
        mut step: F,
    ) -> Result<BloodRequest, GatewayError>
    where
        F: FnMut(&BloodRequest) -> Result<BloodRequest, GatewayError>,
    {
        for attempt in 1..=self.max_cas_attempts {
            let current = self
                .store
                .get_request(id)
                .await?
                .ok_or_else(|| not_found(id))?;
            let next = step(&current)?;
            match self
                .store
                .compare_and_swap_request(&next, current.version)
                .await?
            {
                CasResult::Swapped(updated) => return Ok(updated),
                CasResult::Conflict { current } => {
                    self.metrics.increment_cas_retries();
                    debug!(
                        request.id = %id,
                        attempt,
                        version = current.version,
                        "request changed underneath; retrying"
                    );
                }
            }
        }
        Err(GatewayError::Store(StoreError::Backend(format!(
            "request {id} kept changing; gave up after {} attempts",
            self.max_cas_attempts
        ))))
    }
}

fn not_found(id: RequestId) -> GatewayError {
    GatewayError::NotFound(format!("request {id}"))
}

fn ensure_visible(principal: &Principal, request: &BloodRequest) -> Result<(), GatewayError> {
    match principal {
        Principal::Requester { account } if request.requester != *account => {
            Err(not_found(request.id))
        }
        _ => Ok(()),
    }
}
