use crate::domain::errors::ValidationError;

const MAX_KEY_LENGTH: usize = 1024;
const SUFFIX_LENGTH: usize = 8;

/// A validated object key (path) addressing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > MAX_KEY_LENGTH {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidObjectKeyCharacter(c));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectKeyStartsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectKeyContainsDoubleSlash);
        }

        if value.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(ValidationError::ObjectKeyContainsRelativeSegment);
        }

        Ok(Self(value))
    }

    /// Build the destination key for an upload.
    ///
    /// * no filename: `<unix-millis>-<random>`, regardless of `unique`
    /// * filename and `unique`: `<stem>-<random>[.ext]`
    /// * filename without `unique`: the filename verbatim
    ///
    /// A non-empty folder is prefixed as `folder/…` after trimming slashes.
    pub fn for_upload(
        folder: Option<&str>,
        filename: Option<&str>,
        unique: bool,
    ) -> Result<Self, ValidationError> {
        let name = match filename.filter(|f| !f.trim().is_empty()) {
            None => generated_name(),
            Some(filename) if unique => with_suffix(filename, &random_suffix()),
            Some(filename) => filename.to_string(),
        };

        match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            Some(folder) => Self::new(format!("{}/{}", folder, name)),
            None => Self::new(name),
        }
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Get the directory part of the key (everything before the last '/')
    pub fn parent(&self) -> Option<&str> {
        self.0.rfind('/').map(|idx| &self.0[..idx])
    }

    /// Get the file name part of the key (everything after the last '/')
    pub fn file_name(&self) -> &str {
        self.0.rfind('/').map_or(&self.0, |idx| &self.0[idx + 1..])
    }

    /// Lowercase extension of the file name, if it has one
    pub fn extension(&self) -> Option<String> {
        split_extension(self.file_name()).1.map(str::to_ascii_lowercase)
    }

    /// The key with the trailing extension of its file name removed
    pub fn without_extension(&self) -> ObjectKey {
        let file_name = self.file_name();
        match split_extension(file_name) {
            (stem, Some(_)) => {
                let cut = self.0.len() - file_name.len() + stem.len();
                ObjectKey(self.0[..cut].to_string())
            }
            (_, None) => self.clone(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split `name` into stem and extension. Leading dots (hidden files) do not
/// start an extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

fn with_suffix(filename: &str, suffix: &str) -> String {
    match split_extension(filename) {
        (stem, Some(ext)) => format!("{}-{}.{}", stem, suffix, ext),
        (stem, None) => format!("{}-{}", stem, suffix),
    }
}

fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..SUFFIX_LENGTH].to_string()
}

fn generated_name() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        random_suffix()
    )
}
