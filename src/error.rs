use std::fmt;

/// Failures surfaced by the fallible edges of the runtime: config and
/// best-time files. Gameplay itself never errors.
#[derive(Debug)]
pub enum GameError {
    Io(std::io::Error),
    Config(String),
    Persistence(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Config(m) => write!(f, "invalid config: {m}"),
            Self::Persistence(m) => write!(f, "best-time store: {m}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
