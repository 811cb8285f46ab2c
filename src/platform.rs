use crate::error::ControllerError;

/// Operating system family, as far as screen grabbing and opening links care
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            other => Self::Other(other.to_string()),
        }
    }

    /// ffmpeg input device used to grab the screen
    pub fn input_driver(&self) -> Result<&'static str, ControllerError> {
        match self {
            Self::Windows => Ok("gdigrab"),
            Self::MacOs => Ok("avfoundation"),
            Self::Linux => Ok("x11grab"),
            Self::Other(os) => Err(ControllerError::UnsupportedPlatform(os.clone())),
        }
    }

    /// Program that hands a URL or file to the desktop's default handler
    pub fn opener(&self) -> Result<&'static str, ControllerError> {
        match self {
            Self::Windows => Ok("explorer"),
            Self::MacOs => Ok("open"),
            Self::Linux => Ok("xdg-open"),
            Self::Other(os) => Err(ControllerError::UnsupportedPlatform(os.clone())),
        }
    }

    /// Clipboard writers to try in order; each reads the text from stdin
    pub fn clipboard_commands(&self) -> Result<&'static [&'static [&'static str]], ControllerError> {
        match self {
            Self::Windows => Ok(&[&["clip"]]),
            Self::MacOs => Ok(&[&["pbcopy"]]),
            Self::Linux => Ok(&[&["wl-copy"], &["xclip", "-selection", "clipboard"]]),
            Self::Other(os) => Err(ControllerError::UnsupportedPlatform(os.clone())),
        }
    }
}
