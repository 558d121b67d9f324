use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    FileWriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    TomlParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    TomlSerializeError(toml::ser::Error),
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    YamlSerializeError(serde_yaml::Error),
    JsonParseError {
        command: String,
        source: serde_json::Error,
    },
    IoError(std::io::Error),
    InvalidVersion {
        version: String,
        reason: String,
    },
    UnsupportedVersionFormat {
        version: String,
    },
    DuplicatePrelude {
        version: String,
        section: String,
    },
    UnknownSection {
        fragment: String,
        section: String,
    },
    UnknownRelease {
        version: String,
    },
    ConfigError {
        reason: String,
    },
    FragmentError {
        path: PathBuf,
        reason: String,
    },
    CommandError {
        command: String,
        reason: String,
    },
    NoReleases,
    PathsNotDetected {
        start: PathBuf,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileReadError { path, source } => {
                write!(f, "failed to read file: {} ({})", path.display(), source)
            }
            Error::FileWriteError { path, source } => {
                write!(f, "failed to write file: {} ({})", path.display(), source)
            }
            Error::TomlParseError { path, source } => {
                write!(
                    f,
                    "failed to parse toml file: {} ({})",
                    path.display(),
                    source
                )
            }
            Error::TomlSerializeError(err) => {
                write!(f, "failed to serialize toml: {}", err)
            }
            Error::YamlParseError { path, source } => {
                write!(
                    f,
                    "failed to parse yaml file: {} ({})",
                    path.display(),
                    source
                )
            }
            Error::YamlSerializeError(err) => {
                write!(f, "failed to serialize yaml: {}", err)
            }
            Error::JsonParseError { command, source } => {
                write!(f, "failed to parse json output of '{}': {}", command, source)
            }
            Error::IoError(err) => {
                write!(f, "io error: {}", err)
            }
            Error::InvalidVersion { version, reason } => {
                write!(f, "invalid version '{}': {}", version, reason)
            }
            Error::UnsupportedVersionFormat { version } => {
                write!(f, "unsupported version format: {}", version)
            }
            Error::DuplicatePrelude { version, section } => {
                write!(
                    f,
                    "found prelude section \"{}\" more than once in release {}",
                    section, version
                )
            }
            Error::UnknownSection { fragment, section } => {
                write!(
                    f,
                    "found unknown section \"{}\" in fragment {}",
                    section, fragment
                )
            }
            Error::UnknownRelease { version } => {
                write!(f, "release {} does not exist in the change metadata", version)
            }
            Error::ConfigError { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            Error::FragmentError { path, reason } => {
                write!(f, "invalid fragment {}: {}", path.display(), reason)
            }
            Error::CommandError { command, reason } => {
                write!(f, "command '{}' failed: {}", command, reason)
            }
            Error::NoReleases => {
                write!(f, "change metadata does not contain any release")
            }
            Error::PathsNotDetected { start } => {
                write!(
                    f,
                    "no changelogs/config.toml found in {} or any parent directory",
                    start.display()
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FileReadError { source, .. } => Some(source),
            Error::FileWriteError { source, .. } => Some(source),
            Error::TomlParseError { source, .. } => Some(source),
            Error::TomlSerializeError(err) => Some(err),
            Error::YamlParseError { source, .. } => Some(source),
            Error::YamlSerializeError(err) => Some(err),
            Error::JsonParseError { source, .. } => Some(source),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::TomlSerializeError(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlSerializeError(err)
    }
}

// helpers for attaching paths to io errors
impl Error {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileReadError {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileWriteError {
            path: path.into(),
            source,
        }
    }
}
