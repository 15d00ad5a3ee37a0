use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::Coordinates;

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location error: {0}")]
    Other(String),
}

/// Source of the viewer's current position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Reports a position fixed at construction, e.g. from flags or config.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(Option<Coordinates>);

impl FixedPosition {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self(coords)
    }
}

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        match self.0 {
            Some(coords) if coords.is_valid() => Ok(coords),
            Some(coords) => Err(LocationError::Other(format!(
                "coordinates out of range: {coords}"
            ))),
            None => Err(LocationError::Unavailable),
        }
    }
}
