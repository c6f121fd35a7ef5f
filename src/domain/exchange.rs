use crate::domain::instructions::{DataKind, ExchangeKind};
use crate::domain::status::StatusKind;

/// A verification step the receiving side performs after an exchange.
#[derive(Debug, Clone, Copy)]
pub struct VerificationSpec {
    pub ok: StatusKind,
    pub not_ok: StatusKind,
    pub valid_msg: &'static str,
    pub invalid_msg: &'static str,
}

/// The declarative per-exchange-kind description of what the state machine
/// does with a transmission leg: which status events name the outcome,
/// which artifact kind gets uploaded, and whether the receiver verifies
/// the artifact. Adding a test-case type is a new entry here, not a new
/// branch in the processor.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeSpec {
    pub sent_ok: StatusKind,
    pub sent_not_ok: StatusKind,
    pub received_ok: StatusKind,
    pub received_not_ok: StatusKind,
    pub upload: Option<DataKind>,
    pub verification: Option<VerificationSpec>,
}

impl ExchangeSpec {
    pub fn sent(&self, ok: bool) -> StatusKind {
        if ok { self.sent_ok } else { self.sent_not_ok }
    }

    pub fn received(&self, ok: bool) -> StatusKind {
        if ok { self.received_ok } else { self.received_not_ok }
    }
}

/// Looks up the exchange descriptor for a test-case data kind.
pub fn exchange_spec(kind: ExchangeKind) -> ExchangeSpec {
    use StatusKind::*;
    match kind {
        // Plain request/registration legs report through the generic
        // identifiers and carry nothing worth uploading.
        ExchangeKind::Registration
        | ExchangeKind::AccessRequest
        | ExchangeKind::MemberMatchQuery => ExchangeSpec {
            sent_ok: SentOk,
            sent_not_ok: SentNotOk,
            received_ok: ReceivedOk,
            received_not_ok: ReceivedNotOk,
            upload: None,
            verification: None,
        },
        // Client ids have a verify identifier but no dedicated
        // send/receive identifiers.
        ExchangeKind::ClientId => ExchangeSpec {
            sent_ok: SentOk,
            sent_not_ok: SentNotOk,
            received_ok: ReceivedOk,
            received_not_ok: ReceivedNotOk,
            upload: Some(DataKind::ClientId),
            verification: Some(VerificationSpec {
                ok: ClientIdVerifiedOk,
                not_ok: ClientIdVerifiedNotOk,
                valid_msg: "Client ID is valid",
                invalid_msg: "Client ID is invalid",
            }),
        },
        ExchangeKind::AccessToken => ExchangeSpec {
            sent_ok: SentAccessTokenOk,
            sent_not_ok: SentAccessTokenNotOk,
            received_ok: ReceivedAccessTokenOk,
            received_not_ok: ReceivedAccessTokenNotOk,
            upload: Some(DataKind::AccessToken),
            verification: Some(VerificationSpec {
                ok: AccessTokenVerifiedOk,
                not_ok: AccessTokenVerifiedNotOk,
                valid_msg: "Successfully validated the Access Token",
                invalid_msg: "Access Token was invalid",
            }),
        },
        ExchangeKind::FhirId => ExchangeSpec {
            sent_ok: SentFhirIdOk,
            sent_not_ok: SentFhirIdNotOk,
            received_ok: ReceivedFhirIdOk,
            received_not_ok: ReceivedFhirIdNotOk,
            upload: Some(DataKind::FhirId),
            verification: Some(VerificationSpec {
                ok: FhirIdVerifiedOk,
                not_ok: FhirIdVerifiedNotOk,
                valid_msg: "Successfully validated the Member ID",
                invalid_msg: "Member ID was invalid",
            }),
        },
        ExchangeKind::PdexRequest => ExchangeSpec {
            sent_ok: SentPdexRequestOk,
            sent_not_ok: SentPdexRequestNotOk,
            received_ok: ReceivedPdexRequestOk,
            received_not_ok: ReceivedPdexRequestNotOk,
            upload: None,
            verification: None,
        },
        ExchangeKind::PdexResource => ExchangeSpec {
            sent_ok: SentPdexResourceOk,
            sent_not_ok: SentPdexResourceNotOk,
            received_ok: ReceivedPdexResourceOk,
            received_not_ok: ReceivedPdexResourceNotOk,
            upload: Some(DataKind::PatientData),
            verification: Some(VerificationSpec {
                ok: PdexResourceVerifiedOk,
                not_ok: PdexResourceVerifiedNotOk,
                valid_msg: "Successfully validated the PDEX Resource",
                invalid_msg: "PDEX Resource was invalid",
            }),
        },
        // A patient request carries the access token that authorizes it.
        ExchangeKind::PatientRequest => ExchangeSpec {
            sent_ok: SentPatientRequestOk,
            sent_not_ok: SentPatientRequestNotOk,
            received_ok: ReceivedPatientRequestOk,
            received_not_ok: ReceivedPatientRequestNotOk,
            upload: Some(DataKind::AccessToken),
            verification: Some(VerificationSpec {
                ok: AccessTokenVerifiedOk,
                not_ok: AccessTokenVerifiedNotOk,
                valid_msg: "Access Token is valid",
                invalid_msg: "Access Token is invalid",
            }),
        },
        // Patient data itself moves out of band; the exchange records the
        // transport headers and metadata.
        ExchangeKind::PatientData => ExchangeSpec {
            sent_ok: SentPatientDataOk,
            sent_not_ok: SentPatientDataNotOk,
            received_ok: ReceivedPatientDataOk,
            received_not_ok: ReceivedPatientDataNotOk,
            upload: Some(DataKind::Transport),
            verification: Some(VerificationSpec {
                ok: PatientDataVerifiedOk,
                not_ok: PatientDataVerifiedNotOk,
                valid_msg: "Successfully validated the Patient Data",
                invalid_msg: "Patient Data was invalid",
            }),
        },
    }
}
