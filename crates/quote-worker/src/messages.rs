use quote_types::{ErrorCode, MeshBounds, Metrics, Platform};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages from the page to the parse worker.
/// Serialized as JSON for postMessage transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WorkerRequest {
    /// Fetch `file_url`, parse it as STL and compute its metrics.
    Parse {
        job_id: Uuid,
        file_url: String,
        #[serde(default)]
        platform: Platform,
    },
}

impl WorkerRequest {
    /// A parse request with a fresh job id.
    pub fn parse(file_url: impl Into<String>, platform: Platform) -> Self {
        WorkerRequest::Parse {
            job_id: Uuid::new_v4(),
            file_url: file_url.into(),
            platform,
        }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            WorkerRequest::Parse { job_id, .. } => *job_id,
        }
    }
}

/// Messages from the parse worker back to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WorkerResponse {
    /// The file parsed; `bounds` places it on the bed.
    Ok {
        job_id: Uuid,
        metrics: Metrics,
        bounds: MeshBounds,
    },
    /// The parse failed; every failure is reduced to a presentation code.
    Err { job_id: Uuid, code: ErrorCode },
}

impl WorkerResponse {
    pub fn failed(job_id: Uuid, code: ErrorCode) -> Self {
        WorkerResponse::Err { job_id, code }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            WorkerResponse::Ok { job_id, .. } | WorkerResponse::Err { job_id, .. } => *job_id,
        }
    }

    pub fn into_result(self) -> Result<(Metrics, MeshBounds), ErrorCode> {
        match self {
            WorkerResponse::Ok {
                metrics, bounds, ..
            } => Ok((metrics, bounds)),
            WorkerResponse::Err { code, .. } => Err(code),
        }
    }
}
