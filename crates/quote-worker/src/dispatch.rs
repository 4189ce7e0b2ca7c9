use std::panic::{catch_unwind, AssertUnwindSafe};

use mesh_metrics::{compute_metrics_with_limits, MetricsError};
use quote_types::{ErrorCode, MeshBounds, Metrics};
use stl_mesh::{load_stl, StlError};
use tracing::{info, instrument, warn};

use crate::config::WorkerConfig;
use crate::fetch::{FetchError, FileFetcher};
use crate::messages::{WorkerRequest, WorkerResponse};

/// Anything that can go wrong inside one parse job.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Stl(#[from] StlError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("parse job cancelled")]
    Cancelled,
}

impl DispatchError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            DispatchError::Fetch(e) => e.error_code(),
            DispatchError::Stl(e) => e.error_code(),
            DispatchError::Metrics(e) => e.error_code(),
            DispatchError::Cancelled => ErrorCode::UploadFailed,
        }
    }
}

/// Run one request to completion and return its response.
///
/// Every failure, including a panic inside the loader or the metrics pass,
/// becomes an `Err` response; nothing unwinds out of this function.
pub fn dispatch(
    request: WorkerRequest,
    fetcher: &dyn FileFetcher,
    config: &WorkerConfig,
) -> WorkerResponse {
    dispatch_cancellable(request, fetcher, config, &|| false)
}

/// [`dispatch`] with a cancellation probe checked between the fetch, load
/// and metrics phases.
pub(crate) fn dispatch_cancellable(
    request: WorkerRequest,
    fetcher: &dyn FileFetcher,
    config: &WorkerConfig,
    cancelled: &dyn Fn() -> bool,
) -> WorkerResponse {
    let job_id = request.job_id();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        handle_request(request, fetcher, config, cancelled)
    }));
    match outcome {
        Ok(Ok((metrics, bounds))) => WorkerResponse::Ok {
            job_id,
            metrics,
            bounds,
        },
        Ok(Err(e)) => {
            warn!(%job_id, error = %e, "parse job failed");
            WorkerResponse::failed(job_id, e.error_code())
        }
        Err(_) => {
            warn!(%job_id, "parse job panicked");
            WorkerResponse::failed(job_id, ErrorCode::Unknown)
        }
    }
}

#[instrument(skip_all, fields(job_id = %request.job_id()))]
fn handle_request(
    request: WorkerRequest,
    fetcher: &dyn FileFetcher,
    config: &WorkerConfig,
    cancelled: &dyn Fn() -> bool,
) -> Result<(Metrics, MeshBounds), DispatchError> {
    match request {
        WorkerRequest::Parse {
            file_url, platform, ..
        } => {
            let limits = config.limits_for(platform);
            let bytes = fetcher.fetch(&file_url)?;
            if cancelled() {
                return Err(DispatchError::Cancelled);
            }
            let loaded = load_stl(&bytes, &limits)?;
            drop(bytes);
            if cancelled() {
                return Err(DispatchError::Cancelled);
            }
            let metrics = compute_metrics_with_limits(&loaded.mesh, &limits)?;
            info!(
                ?platform,
                triangles = loaded.mesh.triangle_count(),
                volume_mm3 = metrics.volume_mm3,
                "parse job finished"
            );
            Ok((metrics, loaded.bounds))
        }
    }
}
