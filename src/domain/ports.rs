use std::path::Path;

use async_trait::async_trait;

use crate::domain::instructions::ExchangeKind;
use crate::domain::request::TestRequest;
use crate::error::{HandlerError, ParseError};

/// Everything a transport needs to know about one transmission leg.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    pub test_request_id: String,
    pub partner: String,
    pub kind: ExchangeKind,
}

/// What came back from one leg of the exchange. `delivered` is the raw
/// transport verdict; the processor combines it with the test's expected
/// result. `artifact` is the payload worth uploading for this leg, if any.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub delivered: bool,
    pub artifact: Option<String>,
}

/// The seam to the real partner connection. Implementations plug in the
/// actual FHIR client/server calls; the engine only ever invokes this at
/// the two exchange points of the lifecycle.
#[async_trait]
pub trait PartnerTransport: Send + Sync {
    async fn send(&self, ctx: &ExchangeContext) -> Result<TransferOutcome, HandlerError>;
    async fn receive(&self, ctx: &ExchangeContext) -> Result<TransferOutcome, HandlerError>;
}

/// Turns a request file into a `TestRequest` snapshot. Kill files carry a
/// full descriptor too (purpose `CancelRequest`) and go through the same
/// parser.
pub trait RequestParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<TestRequest, ParseError>;
}
