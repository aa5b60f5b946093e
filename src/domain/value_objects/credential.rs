use serde::{Deserialize, Deserializer};

/// A secret configuration value (API secret, access key).
///
/// Never shows up in `Debug` output and is skipped by serde
/// serialization of the structs holding it (`#[serde(skip_serializing)]`).
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret. Only call this at the point of use.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = Credential::new("super-secret-value");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super-secret-value"));
        assert_eq!(secret.expose(), "super-secret-value");
    }

    #[test]
    fn test_blank() {
        assert!(Credential::new("  ").is_blank());
        assert!(!Credential::from("k").is_blank());
    }
}
