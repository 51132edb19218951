use thiserror::Error;

use crate::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("pass summary requested for an empty trajectory")]
    EmptyTrajectory,
    #[error("prediction aborted")]
    Aborted,
    #[error("invalid prediction window: {0}")]
    InvalidWindow(String),
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}
