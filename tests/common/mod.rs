use std::path::{Path, PathBuf};
use std::time::Duration;

use conformd::config::Settings;

/// Production timings shrunk so the suites finish quickly.
pub fn fast_settings(root: &Path, participant: &str) -> Settings {
    let mut settings = Settings::new(
        root.join("requests"),
        root.join("status"),
        root.join("archive"),
        root.join("payload"),
        participant,
    );
    settings.poll_interval = Duration::from_millis(10);
    settings.stale_status_age = Duration::from_secs(5 * 60);
    settings.delete_retry_limit = 2;
    settings.delete_retry_delay = Duration::from_millis(1);
    settings.conflict_retry_limit = 2;
    settings.conflict_retry_delay = Duration::from_millis(5);
    settings.ensure_directories().unwrap();
    settings
}

/// A test where this installation (NewPayer) originates the exchange:
/// it sends a FHIR-ID and receives a ClientID response.
pub fn sender_descriptor(id: &str) -> serde_json::Value {
    serde_json::json!({
        "description": {
            "testRequestId": id,
            "testCase": "TC-01",
            "testCaseType": "FHIR-ID",
            "purpose": "TestRequest",
            "expectedResult": "Success",
        },
        "transmission": {
            "senderId": "NewPayer",
            "receiverId": "OldPayer",
            "originator": "NewPayer",
            "recipient": "OldPayer",
            "bundleName": "member-bundle",
            "bundleType": "JSON",
        },
        "instructions": {
            "ackId": format!("{id}_AACK"),
            "sendFhirId": format!("{id}_SFID"),
            "receiveId": format!("{id}_RID"),
            "clientIdVerifyId": format!("{id}_CIDV"),
            "evaluateTestId": format!("{id}_AVotedOK"),
            "sendDataType": "FHIR-ID",
            "receiveDataType": "ClientID",
            "uploads": [
                { "responseId": format!("{id}_U1"), "kind": "FHIR-ID", "direction": "Sent" },
                { "responseId": format!("{id}_U2"), "kind": "ClientID", "direction": "Received" },
            ],
        },
        "participants": [
            { "name": "New Payer", "id": "NewPayer", "role": "Client" },
            { "name": "Old Payer", "id": "OldPayer", "role": "Server" },
        ],
    })
}

/// The mirror image: the partner originates, we receive the FHIR-ID and
/// return a ClientID response.
pub fn receiver_descriptor(id: &str) -> serde_json::Value {
    serde_json::json!({
        "description": {
            "testRequestId": id,
            "testCase": "TC-02",
            "testCaseType": "FHIR-ID",
            "purpose": "TestRequest",
            "expectedResult": "Success",
        },
        "transmission": {
            "senderId": "OldPayer",
            "receiverId": "NewPayer",
            "originator": "OldPayer",
            "recipient": "NewPayer",
        },
        "instructions": {
            "ackId": format!("{id}_BACK"),
            "receiveFhirId": format!("{id}_RFID"),
            "sendId": format!("{id}_SID"),
            "fhirIdVerifyId": format!("{id}_FIDV"),
            "evaluateTestId": format!("{id}_BVoted"),
            "sendDataType": "ClientID",
            "receiveDataType": "FHIR-ID",
            "uploads": [
                { "responseId": format!("{id}_U1"), "kind": "FHIR-ID", "direction": "Received" },
                { "responseId": format!("{id}_U2"), "kind": "ClientID", "direction": "Sent" },
            ],
        },
    })
}

pub fn cancel_descriptor(id: &str) -> serde_json::Value {
    serde_json::json!({
        "description": {
            "testRequestId": id,
            "testCase": "TC-20",
            "purpose": "CancelRequest",
        },
        "transmission": {
            "senderId": "NewPayer",
            "receiverId": "OldPayer",
            "originator": "NewPayer",
            "recipient": "OldPayer",
        },
        "instructions": {
            "ackId": format!("{id}_AACK"),
            "evaluateTestId": format!("{id}_AVotedOK"),
        },
    })
}

pub fn write_request(settings: &Settings, name: &str, descriptor: &serde_json::Value) -> PathBuf {
    let path = settings.request_dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(descriptor).unwrap()).unwrap();
    path
}

/// Polls for a file the daemon is expected to produce.
pub async fn wait_for(path: &Path) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Polls until a file is gone.
pub async fn wait_for_removal(path: &Path) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
