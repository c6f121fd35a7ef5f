use std::path::Path;

use serde::Deserialize;

use crate::domain::instructions::Instructions;
use crate::error::HandlerError;

/// Whether a request file starts a new test or cancels one by id.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Purpose {
    TestRequest,
    CancelRequest,
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Purpose::TestRequest => write!(f, "TestRequest"),
            Purpose::CancelRequest => write!(f, "CancelRequest"),
        }
    }
}

/// The verdict the orchestrator expects this test to reach. Absent in the
/// descriptor means `Success`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum ExpectedResult {
    #[default]
    Success,
    Failure,
}

/// The `description` element of a test request.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub test_request_id: String,
    pub test_case: String,
    #[serde(default)]
    pub test_case_type: Option<String>,
    pub purpose: Purpose,
    #[serde(default)]
    pub expected_result: ExpectedResult,
    #[serde(default)]
    pub test_description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub test_phase: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// The `transmission` element: who is talking to whom in this test, plus
/// the payload bundle the exchange refers to.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Transmission {
    pub sender_id: String,
    pub receiver_id: String,
    pub originator: String,
    pub recipient: String,
    #[serde(default)]
    pub originator_role: Option<String>,
    #[serde(default)]
    pub recipient_role: Option<String>,
    #[serde(default)]
    pub bundle_name: Option<String>,
    #[serde(default)]
    pub bundle_type: Option<String>,
    #[serde(default)]
    pub bundle_owner: Option<String>,
    #[serde(default)]
    pub patient_resource_name: Option<String>,
    #[serde(default)]
    pub patient_resource_type: Option<String>,
    #[serde(default)]
    pub patient_resource_owner: Option<String>,
}

impl Transmission {
    /// The trading partner is whichever side of the transmission is not us.
    pub fn partner_of(&self, participant_id: &str) -> &str {
        if self.sender_id.eq_ignore_ascii_case(participant_id) {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }

    /// True when this installation initiates the exchange.
    pub fn is_originated_by(&self, participant_id: &str) -> bool {
        self.originator.eq_ignore_ascii_case(participant_id)
    }

    /// File name of the resource bundle in the payload directory.
    pub fn bundle_file_name(&self) -> Option<String> {
        let name = self.bundle_name.as_deref()?;
        let kind = self.bundle_type.as_deref()?;
        Some(format!("{name}.{}", kind.to_lowercase()))
    }
}

/// Informational only; participants are logged but never drive branching.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub name: Option<String>,
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// An immutable snapshot of one parsed request descriptor. Constructed
/// once by the parser and shared read-only with the processor task; state
/// that evolves during the lifecycle (timestamps, error flags) lives on
/// the processor, never here.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    pub description: Description,
    pub transmission: Transmission,
    pub instructions: Instructions,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl TestRequest {
    pub fn id(&self) -> &str {
        &self.description.test_request_id
    }

    pub fn purpose(&self) -> Purpose {
        self.description.purpose
    }

    pub fn expects_success(&self) -> bool {
        self.description.expected_result == ExpectedResult::Success
    }
}

/// How a request file was delivered: a new test or a kill marker.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RequestKind {
    Test,
    Cancel,
}

/// Extracts the test-request id from `Req-<id>.xml` / `Req-<id>.kill`.
/// Both markers match case-insensitively; the id is the substring strictly
/// between them.
pub fn parse_request_filename(path: &Path) -> Result<(String, RequestKind), HandlerError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| HandlerError::MalformedFilename(path.display().to_string()))?;
    let lower = name.to_lowercase();

    let start = lower
        .find("req-")
        .ok_or_else(|| HandlerError::MalformedFilename(name.to_string()))?
        + "req-".len();
    let (end, kind) = if let Some(end) = lower.find(".xml") {
        (end, RequestKind::Test)
    } else if let Some(end) = lower.find(".kill") {
        (end, RequestKind::Cancel)
    } else {
        return Err(HandlerError::MalformedFilename(name.to_string()));
    };
    if end <= start {
        return Err(HandlerError::MalformedFilename(name.to_string()));
    }

    Ok((name[start..end].to_string(), kind))
}
