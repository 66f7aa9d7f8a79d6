use std::fmt;

#[derive(Debug)]
pub enum ManifestError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    DuplicateRoute(String),
    UnknownRoute(String),
    EmptyManifest,
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ManifestError::*;
        match self {
            Io(e) => Some(e),
            Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ManifestError::*;
        match self {
            Io(e) => write!(f, "Io: {}", e),
            Yaml(e) => write!(f, "Yaml: {}", e),
            DuplicateRoute(s) => write!(f, "DuplicateRoute: {}", s),
            UnknownRoute(s) => write!(f, "UnknownRoute: {}", s),
            EmptyManifest => write!(f, "EmptyManifest"),
        }
    }
}

impl From<std::io::Error> for ManifestError {
    fn from(error: std::io::Error) -> Self {
        ManifestError::Io(error)
    }
}

impl From<serde_yaml::Error> for ManifestError {
    fn from(error: serde_yaml::Error) -> Self {
        ManifestError::Yaml(error)
    }
}

#[derive(Debug)]
pub enum PageError {
    NotFound(String),
    Parse(crate::dom::ParseError),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PageError::*;
        match self {
            NotFound(s) => write!(f, "NotFound: {}", s),
            Parse(e) => write!(f, "Parse: {}", crate::unpack_error(e)),
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use PageError::*;
        match self {
            Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::dom::ParseError> for PageError {
    fn from(error: crate::dom::ParseError) -> Self {
        PageError::Parse(error)
    }
}
