use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::domain::ports::RequestParser;
use crate::domain::request::{Purpose, TestRequest};
use crate::error::ParseError;

/// Reads a request descriptor from disk and validates the invariants the
/// lifecycle engine relies on. The descriptor is structured serde data;
/// the engine itself never looks inside the file, only at this parser's
/// output.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorParser;

impl DescriptorParser {
    pub fn new() -> Self {
        Self
    }
}

impl RequestParser for DescriptorParser {
    fn parse(&self, path: &Path) -> Result<TestRequest, ParseError> {
        let file = File::open(path)?;
        let request: TestRequest = serde_json::from_reader(BufReader::new(file))?;
        validate(&request)?;
        Ok(request)
    }
}

fn validate(request: &TestRequest) -> Result<(), ParseError> {
    if request.description.test_request_id.trim().is_empty() {
        return Err(ParseError::Invalid("empty test request id".into()));
    }
    let trans = &request.transmission;
    for (field, value) in [
        ("senderId", &trans.sender_id),
        ("receiverId", &trans.receiver_id),
        ("originator", &trans.originator),
        ("recipient", &trans.recipient),
    ] {
        if value.trim().is_empty() {
            return Err(ParseError::Invalid(format!("empty transmission {field}")));
        }
    }
    // A live test needs both transmission legs described; a cancellation
    // carries no exchange at all.
    if request.purpose() == Purpose::TestRequest
        && (request.instructions.send_data_type.is_none()
            || request.instructions.receive_data_type.is_none())
    {
        return Err(ParseError::Invalid(
            "test request names no send/receive data types".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_descriptor(value: &serde_json::Value) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Req-T1.xml");
        std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
        (dir, path)
    }

    fn descriptor() -> serde_json::Value {
        serde_json::json!({
            "description": {
                "testRequestId": "T1",
                "testCase": "TC-01",
                "purpose": "TestRequest",
                "expectedResult": "Success",
            },
            "transmission": {
                "senderId": "NewPayer",
                "receiverId": "OldPayer",
                "originator": "NewPayer",
                "recipient": "OldPayer",
            },
            "instructions": {
                "ackId": "T1_AACK",
                "sendDataType": "FHIR-ID",
                "receiveDataType": "ClientID",
            },
        })
    }

    #[test]
    fn test_parses_valid_descriptor() {
        let (_dir, path) = write_descriptor(&descriptor());
        let request = DescriptorParser::new().parse(&path).unwrap();
        assert_eq!(request.id(), "T1");
        assert_eq!(request.purpose(), Purpose::TestRequest);
        assert!(request.expects_success());
    }

    #[test]
    fn test_rejects_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DescriptorParser::new()
            .parse(&dir.path().join("Req-T404.xml"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_rejects_unknown_purpose() {
        let mut value = descriptor();
        value["description"]["purpose"] = serde_json::json!("Renegotiate");
        let (_dir, path) = write_descriptor(&value);
        let err = DescriptorParser::new().parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_rejects_empty_request_id() {
        let mut value = descriptor();
        value["description"]["testRequestId"] = serde_json::json!("  ");
        let (_dir, path) = write_descriptor(&value);
        let err = DescriptorParser::new().parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn test_rejects_test_request_without_exchange_kinds() {
        let mut value = descriptor();
        value["instructions"] = serde_json::json!({ "ackId": "T1_AACK" });
        let (_dir, path) = write_descriptor(&value);
        let err = DescriptorParser::new().parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn test_cancel_request_needs_no_exchange_kinds() {
        let mut value = descriptor();
        value["description"]["purpose"] = serde_json::json!("CancelRequest");
        value["instructions"] = serde_json::json!({ "ackId": "T1_AACK" });
        let (_dir, path) = write_descriptor(&value);
        let request = DescriptorParser::new().parse(&path).unwrap();
        assert_eq!(request.purpose(), Purpose::CancelRequest);
    }
}
