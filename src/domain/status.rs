/// Every outcome the daemon can report to the orchestrator. Each variant
/// resolves to one identifier field on the request's `Instructions`
/// (see `Instructions::identifier_for`) and one polarity, which together
/// name the status file.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum StatusKind {
    Ack,
    Nak,

    SentOk,
    SentNotOk,
    ReceivedOk,
    ReceivedNotOk,

    SentAccessTokenOk,
    SentAccessTokenNotOk,
    SentFhirIdOk,
    SentFhirIdNotOk,
    SentPdexRequestOk,
    SentPdexRequestNotOk,
    SentPdexResourceOk,
    SentPdexResourceNotOk,
    SentPatientRequestOk,
    SentPatientRequestNotOk,
    SentPatientDataOk,
    SentPatientDataNotOk,

    ReceivedAccessTokenOk,
    ReceivedAccessTokenNotOk,
    ReceivedFhirIdOk,
    ReceivedFhirIdNotOk,
    ReceivedPdexRequestOk,
    ReceivedPdexRequestNotOk,
    ReceivedPdexResourceOk,
    ReceivedPdexResourceNotOk,
    ReceivedPatientRequestOk,
    ReceivedPatientRequestNotOk,
    ReceivedPatientDataOk,
    ReceivedPatientDataNotOk,

    AccessTokenVerifiedOk,
    AccessTokenVerifiedNotOk,
    ClientIdVerifiedOk,
    ClientIdVerifiedNotOk,
    FhirIdVerifiedOk,
    FhirIdVerifiedNotOk,
    PdexResourceVerifiedOk,
    PdexResourceVerifiedNotOk,
    PatientDataVerifiedOk,
    PatientDataVerifiedNotOk,

    ResultsOk,
    ResultsNotOk,
}

impl StatusKind {
    /// Positive outcomes produce `_P.sts` files, negative ones `_N.sts`.
    pub fn is_positive(self) -> bool {
        use StatusKind::*;
        !matches!(
            self,
            Nak | SentNotOk
                | ReceivedNotOk
                | SentAccessTokenNotOk
                | SentFhirIdNotOk
                | SentPdexRequestNotOk
                | SentPdexResourceNotOk
                | SentPatientRequestNotOk
                | SentPatientDataNotOk
                | ReceivedAccessTokenNotOk
                | ReceivedFhirIdNotOk
                | ReceivedPdexRequestNotOk
                | ReceivedPdexResourceNotOk
                | ReceivedPatientRequestNotOk
                | ReceivedPatientDataNotOk
                | AccessTokenVerifiedNotOk
                | ClientIdVerifiedNotOk
                | FhirIdVerifiedNotOk
                | PdexResourceVerifiedNotOk
                | PatientDataVerifiedNotOk
                | ResultsNotOk
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity() {
        assert!(StatusKind::Ack.is_positive());
        assert!(StatusKind::ResultsOk.is_positive());
        assert!(StatusKind::SentFhirIdOk.is_positive());
        assert!(!StatusKind::Nak.is_positive());
        assert!(!StatusKind::ResultsNotOk.is_positive());
        assert!(!StatusKind::PatientDataVerifiedNotOk.is_positive());
    }
}
