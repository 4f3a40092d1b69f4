/// Result of a capture or stop-timelapse command. A multi-lens capture may
/// produce several origin urls; a plain photo produces exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrl {
    origins: Vec<String>,
}

impl MediaUrl {
    pub fn new(origins: Vec<String>) -> Self {
        MediaUrl { origins }
    }

    pub fn empty() -> Self {
        MediaUrl::default()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn is_single_origin(&self) -> bool {
        self.origins.len() == 1
    }

    /// Only meaningful when exactly one origin url is present.
    pub fn single_origin(&self) -> Option<&str> {
        if self.is_single_origin() {
            self.origins.first().map(|s| s.as_str())
        } else {
            None
        }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }
}
