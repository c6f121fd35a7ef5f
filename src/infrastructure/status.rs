use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::instructions::Instructions;
use crate::domain::status::StatusKind;

/// Where a status event came from, for identifier synthesis when the
/// descriptor never yielded one: the request file name and the role this
/// installation plays (`A` when sending, `B` when receiving).
#[derive(Debug, Clone)]
pub struct StatusOrigin {
    pub file_name: String,
    pub sending: bool,
}

impl StatusOrigin {
    pub fn new(file_name: impl Into<String>, sending: bool) -> Self {
        Self {
            file_name: file_name.into(),
            sending,
        }
    }
}

/// Writes status events into the status directory as
/// `<identifier>_P.sts` / `<identifier>_N.sts` files whose bytes are
/// exactly the event content. Files appear atomically: the content is
/// written to a temp file in the same directory and renamed into place,
/// so the orchestrator never observes a partial write.
#[derive(Debug, Clone)]
pub struct StatusProtocol {
    status_dir: PathBuf,
}

impl StatusProtocol {
    pub fn new(status_dir: PathBuf) -> Self {
        Self { status_dir }
    }

    /// Reports one status event. Events whose identifier the instructions
    /// never set are dropped, except `Nak` and `ResultsNotOk`: a failure
    /// must never go unreported, so those fall back to an identifier
    /// synthesized from the request file name.
    pub fn report(
        &self,
        kind: StatusKind,
        instructions: Option<&Instructions>,
        origin: &StatusOrigin,
        content: &str,
    ) -> io::Result<()> {
        let identifier = instructions
            .and_then(|i| i.identifier_for(kind))
            .map(str::to_owned)
            .or_else(|| match kind {
                StatusKind::Nak => synthesize_identifier(origin, "ACK"),
                StatusKind::ResultsNotOk => synthesize_identifier(origin, "VotedOK"),
                _ => None,
            });

        let Some(identifier) = identifier else {
            debug!(?kind, "no identifier for status event, dropping");
            return Ok(());
        };
        self.write(kind, &identifier, content)
    }

    fn write(&self, kind: StatusKind, identifier: &str, content: &str) -> io::Result<()> {
        let suffix = if kind.is_positive() { "_P.sts" } else { "_N.sts" };
        let target = self.status_dir.join(format!("{identifier}{suffix}"));

        let mut file = NamedTempFile::new_in(&self.status_dir)?;
        file.write_all(content.as_bytes())?;
        file.persist(&target).map_err(|e| e.error)?;
        debug!(file = %target.display(), "wrote status event");
        Ok(())
    }
}

/// `Req-Txxxx.xml` yields `Txxxx_<A|B><suffix>`: the token between the `-`
/// and the `.` of the file name, the role code, and the event suffix.
fn synthesize_identifier(origin: &StatusOrigin, suffix: &str) -> Option<String> {
    let name = &origin.file_name;
    let start = name.find('-')? + 1;
    let end = name[start..].find('.')? + start;
    if end <= start {
        return None;
    }
    let code = if origin.sending { "A" } else { "B" };
    Some(format!("{}_{code}{suffix}", &name[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> (tempfile::TempDir, StatusProtocol) {
        let dir = tempfile::tempdir().unwrap();
        let protocol = StatusProtocol::new(dir.path().to_path_buf());
        (dir, protocol)
    }

    #[test]
    fn test_results_ok_round_trip() {
        let (dir, protocol) = protocol();
        let instructions: Instructions = serde_json::from_value(serde_json::json!({
            "evaluateTestId": "EVT1",
        }))
        .unwrap();
        let origin = StatusOrigin::new("Req-T1.xml", true);

        protocol
            .report(StatusKind::ResultsOk, Some(&instructions), &origin, "Success!")
            .unwrap();

        let bytes = std::fs::read(dir.path().join("EVT1_P.sts")).unwrap();
        assert_eq!(bytes, b"Success!");
        assert!(!dir.path().join("EVT1_N.sts").exists());
    }

    #[test]
    fn test_negative_events_get_n_suffix() {
        let (dir, protocol) = protocol();
        let instructions: Instructions = serde_json::from_value(serde_json::json!({
            "sendFhirId": "T1_SFID",
        }))
        .unwrap();
        let origin = StatusOrigin::new("Req-T1.xml", true);

        protocol
            .report(
                StatusKind::SentFhirIdNotOk,
                Some(&instructions),
                &origin,
                "Error sending FHIR-ID to OldPayer",
            )
            .unwrap();

        assert!(dir.path().join("T1_SFID_N.sts").exists());
    }

    #[test]
    fn test_nak_synthesizes_identifier_without_instructions() {
        let (dir, protocol) = protocol();
        let origin = StatusOrigin::new("Req-T200.xml", false);

        protocol
            .report(StatusKind::Nak, None, &origin, "Sent NAK for Test T200")
            .unwrap();

        assert!(dir.path().join("T200_BACK_N.sts").exists());
    }

    #[test]
    fn test_results_not_ok_synthesizes_voted_identifier() {
        let (dir, protocol) = protocol();
        let origin = StatusOrigin::new("Req-T200.xml", true);

        protocol
            .report(StatusKind::ResultsNotOk, None, &origin, "Message NAKed")
            .unwrap();

        assert!(dir.path().join("T200_AVotedOK_N.sts").exists());
    }

    #[test]
    fn test_unresolved_identifier_drops_event() {
        let (dir, protocol) = protocol();
        let origin = StatusOrigin::new("Req-T1.xml", true);

        protocol
            .report(StatusKind::SentOk, None, &origin, "whatever")
            .unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
