//! Error types for SolarSync alerts

use thiserror::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for a monitoring run
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a non-200 status
    #[error("API returned HTTP {status}: {message}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Hint and body excerpt
        message: String,
    },

    /// Connection-level HTTP failure (DNS, TLS, timeout...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a transport error from a status code and the response body
    pub fn transport(status: u16, body: &str) -> Self {
        let hint = status_hint(status);
        let body = body.trim();
        let message = if body.is_empty() {
            hint.to_string()
        } else {
            let excerpt: String = body.chars().take(200).collect();
            format!("{hint} ({excerpt})")
        };

        Self::Transport { status, message }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Operator-facing hint for well-known API statuses
pub fn status_hint(status: u16) -> &'static str {
    match status {
        400 => "Requête invalide",
        401 => "Non authentifié - Vérifier la clé API",
        403 => "Accès refusé - Permissions insuffisantes",
        404 => "Ressource non trouvée",
        429 => "Trop de requêtes - Limite de taux atteinte",
        500 => "Erreur interne du serveur",
        503 => "Service temporairement indisponible",
        _ => "Erreur inconnue",
    }
}
