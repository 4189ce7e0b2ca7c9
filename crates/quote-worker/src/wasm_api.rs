//! WASM entry points for the parse web worker.
//!
//! This module is only compiled for the `wasm32` target. The page posts the
//! request JSON together with the file bytes it read from the object URL;
//! the worker answers with the response JSON.

use quote_types::ErrorCode;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use crate::config::WorkerConfig;
use crate::dispatch::dispatch;
use crate::fetch::MemoryFetcher;
use crate::messages::{WorkerRequest, WorkerResponse};

/// Install the panic hook. Call once when the worker starts.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Process a JSON `WorkerRequest` and return a JSON `WorkerResponse`.
///
/// `bytes` are the contents behind the request's `fileUrl`.
#[wasm_bindgen]
pub fn process_message(request_json: &str, bytes: &[u8]) -> String {
    let response = match serde_json::from_str::<WorkerRequest>(request_json) {
        Ok(request) => {
            let blobs = MemoryFetcher::new();
            let WorkerRequest::Parse { file_url, .. } = &request;
            blobs.insert(file_url.clone(), bytes.to_vec());
            dispatch(request, &blobs, &WorkerConfig::default())
        }
        Err(_) => WorkerResponse::failed(Uuid::nil(), ErrorCode::Unknown),
    };

    serde_json::to_string(&response).unwrap_or_else(|_| {
        format!(
            r#"{{"type":"err","jobId":"{}","code":"UNKNOWN"}}"#,
            response.job_id()
        )
    })
}
