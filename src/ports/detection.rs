/// A detected file type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub mime: String,
    /// Canonical extension without the dot
    pub ext: String,
}

impl FileType {
    pub fn new(mime: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            ext: ext.into(),
        }
    }
}

/// Port for sniffing a file type from its leading bytes.
///
/// Implementations must tolerate empty and truncated buffers and return
/// `None` when nothing is recognized.
pub trait FileTypeDetector: Send + Sync + 'static {
    fn detect(&self, bytes: &[u8]) -> Option<FileType>;
}
