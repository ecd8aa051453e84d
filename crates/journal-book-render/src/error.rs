//! Error types for book configuration and GUI management.

/// Failure to load a [`BookConfig`](crate::BookConfig) or
/// [`LayoutConfig`](crate::LayoutConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Payload was not valid JSON for the target type.
    Json(serde_json::Error),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid book config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Book and GUI registry errors.
#[derive(Debug)]
pub enum BookError {
    /// Neither the requested GUI nor the default one is registered.
    UnknownGui(String),
    /// The default GUI can only be removed by shutting the registry down.
    DefaultGuiPinned,
    /// Configuration failed to load.
    Config(ConfigError),
}

impl core::fmt::Display for BookError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownGui(name) => write!(f, "no book GUI registered as '{}'", name),
            Self::DefaultGuiPinned => write!(f, "the default book GUI cannot be unloaded"),
            Self::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for BookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for BookError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_chain_through_book_error() {
        let json_err = match serde_json::from_str::<u32>("nope") {
            Ok(_) => unreachable!("invalid JSON parsed"),
            Err(err) => err,
        };
        let err = BookError::from(ConfigError::from(json_err));
        assert!(err.to_string().starts_with("invalid book config"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn gui_errors_name_the_gui() {
        let err = BookError::UnknownGui("BkNotebook".into());
        assert_eq!(err.to_string(), "no book GUI registered as 'BkNotebook'");
    }
}
