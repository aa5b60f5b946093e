use bytes::Bytes;

/// A browser-style file handle: bytes plus the name and type the caller
/// declared for them
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub data: Bytes,
    pub name: Option<String>,
    pub content_type: Option<String>,
}

impl FileHandle {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            name: None,
            content_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// What a caller hands to `upload`
#[derive(Debug, Clone, PartialEq)]
pub enum FileInput {
    /// Raw in-memory bytes; the content type is always sniffed
    Bytes(Bytes),
    /// A file handle with a declared name and type
    File(FileHandle),
}

impl FileInput {
    pub fn size(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            FileInput::Bytes(data) => data,
            FileInput::File(handle) => &handle.data,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            FileInput::Bytes(_) => None,
            FileInput::File(handle) => handle.name.as_deref(),
        }
    }

    /// The content type declared by the caller, ignoring blank values
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            FileInput::Bytes(_) => None,
            FileInput::File(handle) => handle
                .content_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty()),
        }
    }

    /// Lowercase extension of the declared file name
    pub fn name_extension(&self) -> Option<String> {
        let name = self.name()?;
        let file_name = name.rsplit('/').next().unwrap_or(name);
        match file_name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
                Some(file_name[idx + 1..].to_ascii_lowercase())
            }
            _ => None,
        }
    }
}

impl From<Bytes> for FileInput {
    fn from(data: Bytes) -> Self {
        FileInput::Bytes(data)
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(data: Vec<u8>) -> Self {
        FileInput::Bytes(Bytes::from(data))
    }
}

impl From<&'static [u8]> for FileInput {
    fn from(data: &'static [u8]) -> Self {
        FileInput::Bytes(Bytes::from_static(data))
    }
}

impl From<FileHandle> for FileInput {
    fn from(handle: FileHandle) -> Self {
        FileInput::File(handle)
    }
}
