use async_trait::async_trait;
use tracing::debug;

use crate::domain::instructions::ExchangeKind;
use crate::domain::ports::{ExchangeContext, PartnerTransport, TransferOutcome};
use crate::error::HandlerError;

/// A partner connection that never leaves the process. Every leg succeeds
/// (or fails, for the failure-injecting constructor) and yields the canned
/// artifact a real exchange of that kind would produce. This is the
/// default wiring until an installation plugs in its own FHIR client and
/// server behind `PartnerTransport`.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    deliver: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self { deliver: true }
    }

    /// Every leg reports a failed delivery; used to exercise the
    /// negative paths of the lifecycle.
    pub fn failing() -> Self {
        Self { deliver: false }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartnerTransport for LoopbackTransport {
    async fn send(&self, ctx: &ExchangeContext) -> Result<TransferOutcome, HandlerError> {
        debug!(
            partner = %ctx.partner,
            kind = %ctx.kind,
            id = %ctx.test_request_id,
            "loopback send"
        );
        Ok(TransferOutcome {
            delivered: self.deliver,
            artifact: canned_artifact(ctx.kind, true),
        })
    }

    async fn receive(&self, ctx: &ExchangeContext) -> Result<TransferOutcome, HandlerError> {
        debug!(
            partner = %ctx.partner,
            kind = %ctx.kind,
            id = %ctx.test_request_id,
            "loopback receive"
        );
        Ok(TransferOutcome {
            delivered: self.deliver,
            artifact: canned_artifact(ctx.kind, false),
        })
    }
}

fn canned_artifact(kind: ExchangeKind, sending: bool) -> Option<String> {
    let artifact = match kind {
        ExchangeKind::FhirId => "ABCDEFGHIJKLMNOP".to_string(),
        ExchangeKind::AccessToken | ExchangeKind::PatientRequest => "123456789".to_string(),
        ExchangeKind::ClientId => "Some Client ID".to_string(),
        ExchangeKind::PatientData => {
            if sending {
                "Sent headers and metadata".to_string()
            } else {
                "Received headers and metadata".to_string()
            }
        }
        ExchangeKind::PdexResource => "PDEX resource bundle".to_string(),
        ExchangeKind::Registration
        | ExchangeKind::AccessRequest
        | ExchangeKind::MemberMatchQuery
        | ExchangeKind::PdexRequest => return None,
    };
    Some(artifact)
}
