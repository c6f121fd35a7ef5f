use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::application::registry::Registry;
use crate::config::Settings;
use crate::domain::exchange::exchange_spec;
use crate::domain::instructions::{DataKind, Direction, ExchangeKind};
use crate::domain::ports::{ExchangeContext, PartnerTransport, RequestParser};
use crate::domain::request::{Purpose, TestRequest};
use crate::domain::status::StatusKind;
use crate::error::{HandlerError, ParseError, Result};
use crate::infrastructure::archive::{ArchiveManager, upload_data};
use crate::infrastructure::status::{StatusOrigin, StatusProtocol};

/// State that evolves while one test request moves through its lifecycle.
/// The parsed `TestRequest` itself stays immutable; everything mutable
/// lives here, owned by the processor task.
struct RunState {
    partner: String,
    sending: bool,
    expected_success: bool,
    /// The initial exchange actually ran (purpose was `TestRequest` and
    /// nothing had cancelled it beforehand).
    exchanged: bool,
    initial_error: bool,
    success: bool,
    verification_error: Option<String>,
    transaction_stamp: Option<String>,
}

impl RunState {
    fn new() -> Self {
        Self {
            partner: String::new(),
            sending: false,
            expected_success: true,
            exchanged: false,
            initial_error: false,
            success: true,
            verification_error: None,
            transaction_stamp: None,
        }
    }
}

/// Drives one request file through the full lifecycle:
/// parse, partner-conflict wait, ACK/NAK, initial exchange with uploads
/// and verification, response exchange, evaluation, archive.
///
/// One processor runs per admitted file, as its own task; it removes its
/// id from the registry when it finishes, however it finishes. The
/// archive step is always reached, even after a parse failure or an
/// internal error.
pub struct RequestProcessor {
    settings: Arc<Settings>,
    registry: Arc<Registry>,
    parser: Arc<dyn RequestParser>,
    transport: Arc<dyn PartnerTransport>,
    status: StatusProtocol,
    archive: ArchiveManager,
    request_path: PathBuf,
    request_id: String,
}

impl RequestProcessor {
    pub fn new(
        settings: Arc<Settings>,
        registry: Arc<Registry>,
        parser: Arc<dyn RequestParser>,
        transport: Arc<dyn PartnerTransport>,
        request_path: PathBuf,
        request_id: String,
    ) -> Self {
        let status = StatusProtocol::new(settings.status_dir.clone());
        let archive = ArchiveManager::new(
            settings.archive_dir.clone(),
            settings.delete_retry_limit,
            settings.delete_retry_delay,
        );
        Self {
            settings,
            registry,
            parser,
            transport,
            status,
            archive,
            request_path,
            request_id,
        }
    }

    pub async fn run(self) {
        let file_name = self
            .request_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        // Until the descriptor is parsed we cannot know our role; the
        // synthesized fallback identifiers then carry the receiver code.
        let mut origin = StatusOrigin::new(file_name, false);

        let parsed = match self.parser.parse(&self.request_path) {
            Ok(request) => Some(request),
            Err(err) => {
                self.nak(&origin, &err).await;
                None
            }
        };

        let mut state = RunState::new();
        let mut handler_failure: Option<String> = None;

        if let Some(request) = &parsed {
            state.sending = request
                .transmission
                .is_originated_by(&self.settings.participant_id);
            state.partner = request
                .transmission
                .partner_of(&self.settings.participant_id)
                .to_string();
            state.expected_success = request.expects_success();
            origin.sending = state.sending;

            if let Err(err) = self.open_test(request, &origin, &mut state).await {
                let suffix = if state.sending {
                    ", message not sent."
                } else {
                    ", receive aborted."
                };
                let message = format!("Unexpected handler error: {err}{suffix}");
                error!(id = %self.request_id, "{message}");
                self.registry.add_cancelled(&self.request_id).await;
                handler_failure = Some(message);
            }
        }

        // The request file is consumed no matter how processing went.
        if let Err(err) = self.archive.archive(&self.request_path).await {
            warn!(id = %self.request_id, "error moving test request to archive: {err}");
        }

        if let Some(request) = &parsed {
            if handler_failure.is_none() {
                self.close_test(request, &origin, &mut state).await;
            }
            if self.settings.delete_payload {
                self.archive_payload(request).await;
            }
        }

        match (&parsed, &handler_failure) {
            (None, _) => {
                // A NAKed request still gets a final negative evaluation,
                // through the synthesized identifier.
                if let Err(err) =
                    self.status
                        .report(StatusKind::ResultsNotOk, None, &origin, "Message NAKed")
                {
                    error!(id = %self.request_id, "could not update test status: {err}");
                }
                warn!(id = %self.request_id, "test status: FAILURE - Message NAKed");
            }
            (Some(request), Some(message)) => {
                if let Err(err) = self.report(request, &origin, StatusKind::ResultsNotOk, message) {
                    error!(id = %self.request_id, "could not update test status: {err}");
                }
            }
            _ => {}
        }

        self.registry.remove_active(&self.request_id).await;
        debug!(id = %self.request_id, "processor finished");
    }

    /// Conflict wait, ACK, and the initial transmission leg (or the
    /// cancellation marking when this request is not a live test).
    async fn open_test(
        &self,
        request: &TestRequest,
        origin: &StatusOrigin,
        state: &mut RunState,
    ) -> Result<()> {
        let purpose = request.purpose();

        // Best-effort serialization per partner: bounded backoff, then
        // proceed regardless. Two requests exhausting their retries at
        // the same time can still run concurrently.
        let mut attempts = 0;
        while let Some(other) = self
            .registry
            .find_conflicting_active(purpose, request.id(), &state.partner)
            .await
        {
            if attempts >= self.settings.conflict_retry_limit {
                break;
            }
            info!(
                id = %self.request_id,
                partner = %state.partner,
                other = %other,
                "partner still has an active test, waiting for it to complete"
            );
            attempts += 1;
            sleep(self.settings.conflict_retry_delay).await;
        }
        let role = if state.sending { "A" } else { "B" };
        self.registry
            .set_partner(request.id(), &format!("{}/{role}", state.partner))
            .await;

        if let Some(text) = &request.description.test_description {
            info!(id = %self.request_id, "description: {text}");
        }
        if let Some(protocol) = &request.description.protocol {
            debug!(id = %self.request_id, "protocol: {protocol}");
        }

        let ack = format!("Sent ACK for {purpose}");
        self.report(request, origin, StatusKind::Ack, &ack)?;
        info!(id = %self.request_id, "{ack}");

        let cancelled = self.registry.is_cancelled(request.id()).await;
        let global_cancel = self.registry.global_cancel().await;
        if purpose == Purpose::TestRequest && !cancelled && !global_cancel {
            self.initial_exchange(request, origin, state).await?;
        } else if purpose == Purpose::CancelRequest || (global_cancel && cancelled) {
            info!(id = %self.request_id, "request cancelled by user");
            self.registry.add_cancelled(request.id()).await;
        }
        Ok(())
    }

    async fn initial_exchange(
        &self,
        request: &TestRequest,
        origin: &StatusOrigin,
        state: &mut RunState,
    ) -> Result<()> {
        state.exchanged = true;
        let kind = self.leg_kind(request, state.sending)?;
        let spec = exchange_spec(kind);
        let ctx = self.context(state, kind);

        let (status, message, ok) = if state.sending {
            info!(
                id = %self.request_id,
                "preparing to send {kind} transmission for test case {} to {}",
                request.description.test_case,
                state.partner
            );
            let outcome = self.transport.send(&ctx).await?;
            let ok = outcome.delivered && state.expected_success;
            let message = if ok {
                format!("Successfully sent {kind} to {}", state.partner)
            } else {
                format!("Error sending {kind} to {}", state.partner)
            };
            self.report(request, origin, spec.sent(ok), &message)?;
            if let Some(data) = spec.upload {
                self.upload_all(
                    request,
                    Direction::Sent,
                    data,
                    outcome.artifact.as_deref().unwrap_or_default(),
                );
            }
            (spec.sent(ok), message, ok)
        } else {
            info!(
                id = %self.request_id,
                "waiting to receive {kind} for test case {} from {}",
                request.description.test_case,
                state.partner
            );
            let outcome = self.transport.receive(&ctx).await?;
            // Failure-type tests simulate a failed receive.
            let ok = outcome.delivered && state.expected_success;
            let message = if ok {
                format!("Successfully received {kind} from {}", state.partner)
            } else {
                format!("Error receiving {kind} from {}", state.partner)
            };
            self.report(request, origin, spec.received(ok), &message)?;
            if let Some(data) = spec.upload {
                self.upload_all(
                    request,
                    Direction::Received,
                    data,
                    outcome.artifact.as_deref().unwrap_or_default(),
                );
            }
            if let Some(verify) = spec.verification {
                let verdict = if ok { verify.valid_msg } else { verify.invalid_msg };
                let kind = if ok { verify.ok } else { verify.not_ok };
                self.report(request, origin, kind, verdict)?;
            }
            (spec.received(ok), message, ok)
        };
        debug!(id = %self.request_id, ?status, "initial exchange reported");
        info!(id = %self.request_id, "{message}");

        if !ok {
            state.initial_error = true;
            state.success = false;
            // Negatively evaluate up front; the response leg is skipped.
            self.report(request, origin, StatusKind::ResultsNotOk, &message)?;
            warn!(
                id = %self.request_id,
                "test status ({}): FAILURE - {message}",
                state.partner
            );
        }

        state.transaction_stamp = Some(Utc::now().format("%Y%m%d%H%M%S%3f").to_string());
        debug!(
            id = %self.request_id,
            stamp = state.transaction_stamp.as_deref().unwrap_or_default(),
            "transaction stamped"
        );
        Ok(())
    }

    /// Response leg (when the initial one succeeded) and final evaluation.
    async fn close_test(&self, request: &TestRequest, origin: &StatusOrigin, state: &mut RunState) {
        if state.exchanged && !state.initial_error {
            if let Err(err) = self.response_exchange(request, origin, state).await {
                let message = format!("Error recording the partner response: {err}");
                error!(id = %self.request_id, "{message}");
                if let Err(err) = self.report(request, origin, StatusKind::ResultsNotOk, &message) {
                    error!(id = %self.request_id, "could not update test status: {err}");
                }
                return;
            }
        }
        if let Err(err) = self.evaluate(request, origin, state).await {
            error!(id = %self.request_id, "could not update test status: {err}");
        }
    }

    /// The roles invert: the original receiver returns a response
    /// artifact, the original sender receives and verifies it.
    async fn response_exchange(
        &self,
        request: &TestRequest,
        origin: &StatusOrigin,
        state: &mut RunState,
    ) -> Result<()> {
        if !state.sending {
            let kind = self.leg_kind(request, true)?;
            let spec = exchange_spec(kind);
            info!(id = %self.request_id, "returning a {kind} response");
            let outcome = self.transport.send(&self.context(state, kind)).await?;
            let ok = outcome.delivered;
            let message = if ok {
                format!("Successfully sent {kind} response to {}", state.partner)
            } else {
                format!("Error sending {kind} response to {}", state.partner)
            };
            self.report(request, origin, spec.sent(ok), &message)?;
            if let Some(data) = spec.upload {
                self.upload_all(
                    request,
                    Direction::Sent,
                    data,
                    outcome.artifact.as_deref().unwrap_or_default(),
                );
            }
            info!(id = %self.request_id, "{message}");
            state.success = state.success && ok;
        } else {
            let kind = self.leg_kind(request, false)?;
            let spec = exchange_spec(kind);
            info!(id = %self.request_id, "receiving a {kind} response");
            let outcome = self.transport.receive(&self.context(state, kind)).await?;
            let ok = outcome.delivered;
            let message = if ok {
                format!("Successfully received {kind} response from {}", state.partner)
            } else {
                format!("Error receiving {kind} response from {}", state.partner)
            };
            self.report(request, origin, spec.received(ok), &message)?;
            if let Some(data) = spec.upload {
                self.upload_all(
                    request,
                    Direction::Received,
                    data,
                    outcome.artifact.as_deref().unwrap_or_default(),
                );
            }
            if let Some(verify) = spec.verification {
                let verdict = if ok { verify.valid_msg } else { verify.invalid_msg };
                let status = if ok { verify.ok } else { verify.not_ok };
                self.report(request, origin, status, verdict)?;
                if !ok {
                    state.verification_error = Some(verdict.to_string());
                }
            }
            info!(id = %self.request_id, "{message}");
            state.success = state.success && ok;
        }
        Ok(())
    }

    /// Exactly one verdict, in priority order: cancelled, verification
    /// error, success, generic failure. The id then leaves the active
    /// registry unconditionally.
    async fn evaluate(
        &self,
        request: &TestRequest,
        origin: &StatusOrigin,
        state: &RunState,
    ) -> Result<()> {
        let id = request.id();
        if self.registry.is_cancelled(id).await {
            let message = "Cancelled by user";
            self.report(request, origin, StatusKind::ResultsNotOk, message)?;
            info!(id = %self.request_id, partner = %state.partner, "test status: {message}");
            self.registry.remove_cancelled(id).await;
        } else if let Some(message) = &state.verification_error {
            self.report(request, origin, StatusKind::ResultsNotOk, message)?;
            warn!(id = %self.request_id, partner = %state.partner, "test status: {message}");
        } else if state.success {
            self.report(request, origin, StatusKind::ResultsOk, "Success!")?;
            info!(id = %self.request_id, partner = %state.partner, "test status: Success!");
        } else {
            let message = if state.sending {
                "could not send message"
            } else {
                "timeout occurred while attempting to receive message or response"
            };
            self.report(request, origin, StatusKind::ResultsNotOk, message)?;
            warn!(
                id = %self.request_id,
                partner = %state.partner,
                "test status: FAILURE - {message}"
            );
        }
        self.registry.remove_active(id).await;
        Ok(())
    }

    async fn nak(&self, origin: &StatusOrigin, err: &ParseError) {
        warn!(id = %self.request_id, "could not parse test request: {err}");
        let message = format!("Sent NAK for Test {} - reason: {err}", self.request_id);
        match self.status.report(StatusKind::Nak, None, origin, &message) {
            Ok(()) => info!(id = %self.request_id, "{message}"),
            Err(err) => error!(id = %self.request_id, "could not send NAK: {err}"),
        }
    }

    async fn archive_payload(&self, request: &TestRequest) {
        let Some(name) = request.transmission.bundle_file_name() else {
            return;
        };
        let path = self.settings.payload_dir.join(name);
        if let Err(err) = self.archive.archive(&path).await {
            warn!(id = %self.request_id, "error moving resource bundle to archive: {err}");
        }
    }

    /// Writes the artifact into every matching response slot. Upload
    /// failures are logged and swallowed; they never abort the lifecycle.
    fn upload_all(
        &self,
        request: &TestRequest,
        direction: Direction,
        kind: DataKind,
        content: &str,
    ) {
        let mut count = 0;
        for upload in request.instructions.uploads_for(direction, kind) {
            match upload_data(
                direction,
                kind,
                content,
                &upload.response_id,
                &self.settings.status_dir,
            ) {
                Ok(()) => {
                    info!(
                        id = %self.request_id,
                        slot = %upload.response_id,
                        "uploaded {kind} ({content}) {direction}"
                    );
                    count += 1;
                }
                Err(err) => {
                    warn!(
                        id = %self.request_id,
                        slot = %upload.response_id,
                        "error uploading {kind}: {err}"
                    );
                }
            }
        }
        if count == 0 {
            warn!(
                id = %self.request_id,
                %kind,
                %direction,
                "no matching upload instructions, nothing uploaded"
            );
        }
    }

    fn leg_kind(&self, request: &TestRequest, sending: bool) -> Result<ExchangeKind> {
        let kind = if sending {
            request.instructions.send_data_type
        } else {
            request.instructions.receive_data_type
        };
        kind.ok_or_else(|| HandlerError::Transport("test request names no exchange data type".into()))
    }

    fn context(&self, state: &RunState, kind: ExchangeKind) -> ExchangeContext {
        ExchangeContext {
            test_request_id: self.request_id.clone(),
            partner: state.partner.clone(),
            kind,
        }
    }

    fn report(
        &self,
        request: &TestRequest,
        origin: &StatusOrigin,
        kind: StatusKind,
        content: &str,
    ) -> Result<()> {
        self.status
            .report(kind, Some(&request.instructions), origin, content)
            .map_err(HandlerError::from)
    }
}
