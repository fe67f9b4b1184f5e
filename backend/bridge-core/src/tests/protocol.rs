use crate::invoke::Args;
use crate::ipc::protocol::{ClientFrame, RejectCode, ServerFrame};

use serde_json::{Value, json};

/// **VALUE**: Frame shapes are a wire contract with hosts written in other languages.
///
/// **BUG THIS CATCHES**: Would catch a serde attribute change (tag name, casing) that
/// silently breaks every existing host.
#[test]
fn given_client_frames_when_serialized_then_tagged_snake_case_json() {
    let auth = ClientFrame::Auth {
        token: String::from("t0k"),
    };
    let mut args = Args::new();
    args.insert(String::from("gameCode"), json!("ABC123"));
    let invoke = ClientFrame::Invoke {
        request_id: 7,
        command: String::from("get_realtime_game"),
        args: Some(args),
    };

    assert_eq!(
        serde_json::to_value(&auth).unwrap(),
        json!({"type": "auth", "token": "t0k"})
    );
    assert_eq!(
        serde_json::to_value(&invoke).unwrap(),
        json!({
            "type": "invoke",
            "request_id": 7,
            "command": "get_realtime_game",
            "args": {"gameCode": "ABC123"}
        })
    );
}

#[test]
fn given_invoke_without_args_when_serialized_then_args_omitted_and_parsed_back_as_none() {
    let frame = ClientFrame::Invoke {
        request_id: 1,
        command: String::from("start_game"),
        args: None,
    };

    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value.get("args"), None);

    let parsed: ClientFrame =
        serde_json::from_str(r#"{"type":"invoke","request_id":1,"command":"start_game"}"#)
            .unwrap();
    assert_eq!(parsed, frame);
}

#[test]
fn given_server_frames_when_serialized_then_expected_json() {
    let auth_ok = ServerFrame::AuthResult {
        success: true,
        error: None,
    };
    let resolved = ServerFrame::Resolved {
        request_id: 3,
        value: json!("{\"t\":1}"),
    };
    let rejected = ServerFrame::Rejected {
        request_id: 4,
        code: RejectCode::UnknownCommand,
        message: String::from("nope"),
    };

    assert_eq!(
        serde_json::to_value(&auth_ok).unwrap(),
        json!({"type": "auth_result", "success": true})
    );
    assert_eq!(
        serde_json::to_value(&resolved).unwrap(),
        json!({"type": "resolved", "request_id": 3, "value": "{\"t\":1}"})
    );
    assert_eq!(
        serde_json::to_value(&rejected).unwrap(),
        json!({"type": "rejected", "request_id": 4, "code": "unknown_command", "message": "nope"})
    );
}

#[test]
fn given_server_frames_when_request_id_read_then_only_answers_carry_one() {
    assert_eq!(
        ServerFrame::AuthResult {
            success: false,
            error: Some(String::from("bad"))
        }
        .request_id(),
        None
    );
    assert_eq!(
        ServerFrame::Resolved {
            request_id: 9,
            value: Value::Null
        }
        .request_id(),
        Some(9)
    );
}

#[test]
fn given_unknown_frame_type_when_parsed_then_error() {
    assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"subscribe"}"#).is_err());
    assert!(serde_json::from_str::<ServerFrame>("not json").is_err());
}
