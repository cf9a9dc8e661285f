use gpu::RenderError;

/// Upstream route failures. These never become rendering faults; the overlay
/// answers them by showing no route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    NoRoute,
    InvalidPoint { index: usize },
    Service(String),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRoute => write!(f, "No route found"),
            Self::InvalidPoint { index } => write!(f, "Invalid route point at index {index}"),
            Self::Service(msg) => write!(f, "Route service error: {msg}"),
        }
    }
}

impl std::error::Error for RouteError {}

#[derive(Debug)]
pub enum OverlayError {
    Config(String),
    Route(RouteError),
    Render(RenderError),
    /// A lifecycle event arrived before the overlay was added to a map.
    NotBound,
    /// The overlay has been torn down.
    Retired,
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Invalid config: {msg}"),
            Self::Route(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
            Self::NotBound => write!(f, "Overlay is not attached to a map"),
            Self::Retired => write!(f, "Overlay has been torn down"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Route(err) => Some(err),
            Self::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RouteError> for OverlayError {
    fn from(err: RouteError) -> Self {
        Self::Route(err)
    }
}

impl From<RenderError> for OverlayError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
