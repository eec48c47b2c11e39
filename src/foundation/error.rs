/// Convenience result type used across tracebridge.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Top-level error taxonomy used by the session and compositing APIs.
///
/// Every variant is scoped to a single render job: orchestrators log it, tear the job down and
/// return to an idle state.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// Invalid host-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable render device could be resolved.
    #[error("device error: {0}")]
    Device(String),

    /// Camera parameters could not be derived from the host scene.
    #[error("camera error: {0}")]
    Camera(String),

    /// Render engine reported a failure, or a session was driven out of order.
    #[error("engine error: {0}")]
    Engine(String),

    /// The accumulation buffer could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Build a [`BridgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BridgeError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`BridgeError::Camera`] value.
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::Camera(msg.into())
    }

    /// Build a [`BridgeError::Engine`] value.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Build a [`BridgeError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`BridgeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures that come from resolving the render setup (device or camera).
    ///
    /// The offline path answers these with a constant-color frame instead of a render.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Camera(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
