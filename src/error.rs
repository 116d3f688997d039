use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Configuration(String),

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Auth(String),

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

impl ClientError {
    pub fn transport(context: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { context, source }
    }

    pub fn decode(context: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { context, source }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration Error",
            Self::Validation(_) => "Validation Error",
            Self::Provider(_) => "Request Failed",
            Self::Auth(_) => "Authentication Failed",
            Self::Transport { .. } | Self::Decode { .. } => "Error",
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        if self.is_transport() {
            fallback.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined_by_newline() {
        let err = ClientError::Validation(vec![
            "Invalid email address".to_string(),
            "Password must be at least 6 characters long".to_string(),
        ]);
        assert_eq!(
            err.user_message("unused"),
            "Invalid email address\nPassword must be at least 6 characters long"
        );
        assert_eq!(err.title(), "Validation Error");
    }

    #[test]
    fn decode_errors_use_the_generic_fallback() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::decode("login response", source);
        assert!(err.is_transport());
        assert_eq!(err.user_message("Please try again."), "Please try again.");
    }

    #[test]
    fn provider_messages_are_verbatim() {
        let err = ClientError::Provider("Movie not found!".to_string());
        assert!(!err.is_transport());
        assert_eq!(err.user_message("generic"), "Movie not found!");
    }
}
