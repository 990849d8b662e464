//! Coordinator payload fixtures shared by the unit tests.

use {
    coordinator_client::SocketEvent,
    coordinator_rpc::event::{WcConnectionData, WcRequestData},
    serde_json::{json, Value},
};

pub(crate) fn request_json(user_id: &str, id: &str) -> Value {
    json!({
        "id": id,
        "requestId": 1_700_000_000_123u64,
        "sessionId": "s1",
        "userId": user_id,
        "userAddress": "0xBA5BA3955463ADcc7aa3E33bbdfb8A68e0933dD8",
        "method": "eth_sendTransaction",
        "params": [{ "from": "0xBA5BA3955463ADcc7aa3E33bbdfb8A68e0933dD8", "value": "0x0" }],
        "chainId": 1,
        "dappName": "TestDapp",
        "dappUrl": "https://dapp.example",
        "createdAt": "2026-10-17T10:00:00Z",
        "expiresAt": "2026-10-17T10:05:00Z"
    })
}

pub(crate) fn request(user_id: &str, id: &str) -> WcRequestData {
    serde_json::from_value(request_json(user_id, id)).unwrap()
}

pub(crate) fn request_event(user_id: &str, id: &str) -> SocketEvent {
    SocketEvent {
        name: "NEW_REQUEST".into(),
        args: vec![json!({
            "message": "New request",
            "userId": user_id,
            "data": request_json(user_id, id),
        })],
    }
}

fn connection_json(topic: &str, dapp_name: &str, connected_at: &str) -> Value {
    json!({
        "topic": topic,
        "dappName": dapp_name,
        "dappUrl": "https://dapp.example",
        "chainId": "eip155:1",
        "connectedAt": connected_at,
    })
}

pub(crate) fn connection(topic: &str, dapp_name: &str, connected_at: &str) -> WcConnectionData {
    serde_json::from_value(connection_json(topic, dapp_name, connected_at)).unwrap()
}

pub(crate) fn connection_event(user_id: &str, topic: &str) -> SocketEvent {
    SocketEvent {
        name: "NEW_CONNECTION".into(),
        args: vec![json!({
            "message": "Wallet connected",
            "userId": user_id,
            "data": connection_json(topic, "TestDapp", "2026-10-17T10:00:00Z"),
        })],
    }
}
