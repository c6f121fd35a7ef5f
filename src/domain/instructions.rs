use std::fmt;

use serde::Deserialize;

use crate::domain::status::StatusKind;

/// Whether an uploaded artifact was produced by our side or captured from
/// the partner.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => write!(f, "sent"),
            Direction::Received => write!(f, "received"),
        }
    }
}

/// The kind of artifact an upload instruction asks for.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum DataKind {
    #[serde(rename = "AccessToken")]
    AccessToken,
    #[serde(rename = "ClientID")]
    ClientId,
    #[serde(rename = "FHIR-ID")]
    FhirId,
    #[serde(rename = "PatientData")]
    PatientData,
    #[serde(rename = "Transport")]
    Transport,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataKind::AccessToken => "Access Token",
            DataKind::ClientId => "Client ID",
            DataKind::FhirId => "FHIR ID",
            DataKind::PatientData => "Patient Data",
            DataKind::Transport => "Transport Data",
        };
        write!(f, "{label}")
    }
}

/// What a transmission leg carries, as named by the test case.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum ExchangeKind {
    #[serde(rename = "Registration")]
    Registration,
    #[serde(rename = "AccessRequest")]
    AccessRequest,
    #[serde(rename = "AccessToken")]
    AccessToken,
    #[serde(rename = "ClientID")]
    ClientId,
    #[serde(rename = "MemberMatchQuery")]
    MemberMatchQuery,
    #[serde(rename = "FHIR-ID")]
    FhirId,
    #[serde(rename = "PDEXRequest")]
    PdexRequest,
    #[serde(rename = "PDEXResource")]
    PdexResource,
    #[serde(rename = "PatientRequest")]
    PatientRequest,
    #[serde(rename = "PatientData")]
    PatientData,
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExchangeKind::Registration => "Registration",
            ExchangeKind::AccessRequest => "AccessRequest",
            ExchangeKind::AccessToken => "AccessToken",
            ExchangeKind::ClientId => "ClientID",
            ExchangeKind::MemberMatchQuery => "MemberMatchQuery",
            ExchangeKind::FhirId => "FHIR-ID",
            ExchangeKind::PdexRequest => "PDEXRequest",
            ExchangeKind::PdexResource => "PDEXResource",
            ExchangeKind::PatientRequest => "PatientRequest",
            ExchangeKind::PatientData => "PatientData",
        };
        write!(f, "{label}")
    }
}

/// One artifact the orchestrator wants copied into a response slot.
/// Several instructions may name the same kind and direction; the artifact
/// is then broadcast to every matching slot.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UploadInstruction {
    pub response_id: String,
    pub kind: DataKind,
    pub direction: Direction,
}

/// The `instructions` element of a test request: the identifiers that name
/// status files for each lifecycle event, the exchange kinds of the two
/// transmission legs, and the upload instructions.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Instructions {
    #[serde(default)]
    pub ack_id: Option<String>,
    #[serde(default)]
    pub send_id: Option<String>,
    #[serde(default)]
    pub receive_id: Option<String>,

    #[serde(default)]
    pub send_access_token_id: Option<String>,
    #[serde(default)]
    pub receive_access_token_id: Option<String>,
    #[serde(default)]
    pub send_fhir_id: Option<String>,
    #[serde(default)]
    pub receive_fhir_id: Option<String>,
    #[serde(default)]
    pub send_pdex_request_id: Option<String>,
    #[serde(default)]
    pub receive_pdex_request_id: Option<String>,
    #[serde(default)]
    pub send_pdex_resource_id: Option<String>,
    #[serde(default)]
    pub receive_pdex_resource_id: Option<String>,
    #[serde(default)]
    pub send_patient_request_id: Option<String>,
    #[serde(default)]
    pub receive_patient_request_id: Option<String>,
    #[serde(default)]
    pub send_patient_data_id: Option<String>,
    #[serde(default)]
    pub receive_patient_data_id: Option<String>,

    #[serde(default)]
    pub access_token_verify_id: Option<String>,
    #[serde(default)]
    pub client_id_verify_id: Option<String>,
    #[serde(default)]
    pub fhir_id_verify_id: Option<String>,
    #[serde(default)]
    pub pdex_resource_verify_id: Option<String>,
    #[serde(default)]
    pub patient_data_verify_id: Option<String>,

    #[serde(default)]
    pub evaluate_test_id: Option<String>,

    #[serde(default)]
    pub send_data_type: Option<ExchangeKind>,
    #[serde(default)]
    pub receive_data_type: Option<ExchangeKind>,

    #[serde(default)]
    pub uploads: Vec<UploadInstruction>,
}

impl Instructions {
    /// The single mapping from a status kind to the identifier that names
    /// its file. `None` means the orchestrator did not ask for this event.
    pub fn identifier_for(&self, kind: StatusKind) -> Option<&str> {
        use StatusKind::*;
        let id = match kind {
            Ack | Nak => &self.ack_id,
            SentOk | SentNotOk => &self.send_id,
            ReceivedOk | ReceivedNotOk => &self.receive_id,

            SentAccessTokenOk | SentAccessTokenNotOk => &self.send_access_token_id,
            SentFhirIdOk | SentFhirIdNotOk => &self.send_fhir_id,
            SentPdexRequestOk | SentPdexRequestNotOk => &self.send_pdex_request_id,
            SentPdexResourceOk | SentPdexResourceNotOk => &self.send_pdex_resource_id,
            SentPatientRequestOk | SentPatientRequestNotOk => &self.send_patient_request_id,
            SentPatientDataOk | SentPatientDataNotOk => &self.send_patient_data_id,

            ReceivedAccessTokenOk | ReceivedAccessTokenNotOk => &self.receive_access_token_id,
            ReceivedFhirIdOk | ReceivedFhirIdNotOk => &self.receive_fhir_id,
            ReceivedPdexRequestOk | ReceivedPdexRequestNotOk => &self.receive_pdex_request_id,
            ReceivedPdexResourceOk | ReceivedPdexResourceNotOk => &self.receive_pdex_resource_id,
            ReceivedPatientRequestOk | ReceivedPatientRequestNotOk => {
                &self.receive_patient_request_id
            }
            ReceivedPatientDataOk | ReceivedPatientDataNotOk => &self.receive_patient_data_id,

            AccessTokenVerifiedOk | AccessTokenVerifiedNotOk => &self.access_token_verify_id,
            ClientIdVerifiedOk | ClientIdVerifiedNotOk => &self.client_id_verify_id,
            FhirIdVerifiedOk | FhirIdVerifiedNotOk => &self.fhir_id_verify_id,
            PdexResourceVerifiedOk | PdexResourceVerifiedNotOk => &self.pdex_resource_verify_id,
            PatientDataVerifiedOk | PatientDataVerifiedNotOk => &self.patient_data_verify_id,

            ResultsOk | ResultsNotOk => &self.evaluate_test_id,
        };
        id.as_deref()
    }

    /// All upload instructions matching a direction and kind.
    pub fn uploads_for(
        &self,
        direction: Direction,
        kind: DataKind,
    ) -> impl Iterator<Item = &UploadInstruction> {
        self.uploads
            .iter()
            .filter(move |u| u.direction == direction && u.kind == kind)
    }
}
