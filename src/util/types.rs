use serde::{Deserialize, Serialize};

// Wire messages for the six replica operations. Application-level refusal is
// carried in the body (`ok` / `granted`); a transport failure is the absence
// of a response, never a negative vote.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbdReadRequest {
    pub key: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbdReadResponse {
    pub value: String,
    pub ts: i64,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbdWriteRequest {
    pub key: String,
    pub value: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbdWriteResponse {
    pub ok: bool,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRequest {
    pub key: String,
    pub client_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockResponse {
    pub granted: bool,
    pub ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub key: String,
    pub client_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlkReadRequest {
    pub key: String,
    pub client_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlkReadResponse {
    pub value: String,
    pub ts: i64,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlkWriteRequest {
    pub key: String,
    pub value: String,
    pub ts: i64,
    pub client_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlkWriteResponse {
    pub ok: bool,
    pub ts: i64,
}
