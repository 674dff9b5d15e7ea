//! Release signing credentials
//!
//! A [`CredentialBundle`] holds the four optional release-signing inputs. A
//! field is either present and non-blank or absent: blank values are dropped
//! when the bundle is built, so "set to an empty string" and "unset" behave
//! the same way.

use crate::env::EnvSource;
use serde::Serialize;
use std::fmt;

/// Environment variable holding the release keystore path
pub const KEYSTORE_PATH_VAR: &str = "KEYSTORE_PATH";
/// Environment variable holding the keystore password
pub const STORE_PASSWORD_VAR: &str = "STORE_PASSWORD";
/// Environment variable holding the signing key alias
pub const KEY_ALIAS_VAR: &str = "KEY_ALIAS";
/// Environment variable holding the signing key password
pub const KEY_PASSWORD_VAR: &str = "KEY_PASSWORD";

/// A password that never shows up in `Debug` or `Display` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

/// One of the four credential inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    /// Path to the release keystore
    KeystorePath,
    /// Keystore password
    StorePassword,
    /// Alias of the signing key inside the keystore
    KeyAlias,
    /// Password of the signing key
    KeyPassword,
}

impl CredentialField {
    /// All fields, in environment-variable order
    pub const ALL: [CredentialField; 4] = [
        CredentialField::KeystorePath,
        CredentialField::StorePassword,
        CredentialField::KeyAlias,
        CredentialField::KeyPassword,
    ];

    /// Environment variable the field is read from
    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            CredentialField::KeystorePath => KEYSTORE_PATH_VAR,
            CredentialField::StorePassword => STORE_PASSWORD_VAR,
            CredentialField::KeyAlias => KEY_ALIAS_VAR,
            CredentialField::KeyPassword => KEY_PASSWORD_VAR,
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Optional release-signing inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialBundle {
    keystore_path: Option<String>,
    store_password: Option<Secret>,
    key_alias: Option<String>,
    key_password: Option<Secret>,
}

/// Borrowed view of a bundle with every field present
#[derive(Debug, Clone, Copy)]
pub struct CompleteCredentials<'a> {
    /// Keystore path exactly as supplied
    pub keystore_path: &'a str,
    /// Keystore password
    pub store_password: &'a Secret,
    /// Signing key alias
    pub key_alias: &'a str,
    /// Signing key password
    pub key_password: &'a Secret,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CredentialBundle {
    /// Build a bundle from raw optional values; blank values count as absent
    pub fn new(
        keystore_path: Option<String>,
        store_password: Option<String>,
        key_alias: Option<String>,
        key_password: Option<String>,
    ) -> Self {
        Self {
            keystore_path: non_blank(keystore_path),
            store_password: non_blank(store_password).map(Secret),
            key_alias: non_blank(key_alias),
            key_password: non_blank(key_password).map(Secret),
        }
    }

    /// Read the four credential variables once from `env`
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let bundle = Self::new(
            env.var(KEYSTORE_PATH_VAR),
            env.var(STORE_PASSWORD_VAR),
            env.var(KEY_ALIAS_VAR),
            env.var(KEY_PASSWORD_VAR),
        );

        tracing::debug!(
            present = CredentialField::ALL.len() - bundle.missing_fields().len(),
            "Read release credentials from environment"
        );

        bundle
    }

    /// True iff all four fields are present and non-blank
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }

    /// All four fields, or `None` if any is missing
    #[must_use]
    pub fn complete(&self) -> Option<CompleteCredentials<'_>> {
        Some(CompleteCredentials {
            keystore_path: self.keystore_path.as_deref()?,
            store_password: self.store_password.as_ref()?,
            key_alias: self.key_alias.as_deref()?,
            key_password: self.key_password.as_ref()?,
        })
    }

    /// Fields that are absent or blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<CredentialField> {
        CredentialField::ALL
            .into_iter()
            .filter(|field| !self.has(*field))
            .collect()
    }

    /// Whether a single field is present
    #[must_use]
    pub fn has(&self, field: CredentialField) -> bool {
        match field {
            CredentialField::KeystorePath => self.keystore_path.is_some(),
            CredentialField::StorePassword => self.store_password.is_some(),
            CredentialField::KeyAlias => self.key_alias.is_some(),
            CredentialField::KeyPassword => self.key_password.is_some(),
        }
    }

    /// Keystore path, if supplied
    #[must_use]
    pub fn keystore_path(&self) -> Option<&str> {
        self.keystore_path.as_deref()
    }

    /// Key alias, if supplied
    #[must_use]
    pub fn key_alias(&self) -> Option<&str> {
        self.key_alias.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        [
            (KEYSTORE_PATH_VAR, "/secrets/release.jks"),
            (STORE_PASSWORD_VAR, "store-pass"),
            (KEY_ALIAS_VAR, "upload"),
            (KEY_PASSWORD_VAR, "key-pass"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_complete_bundle_from_env() {
        let bundle = CredentialBundle::from_env(&full_env());

        assert!(bundle.is_complete());
        assert!(bundle.missing_fields().is_empty());
        let complete = bundle.complete().unwrap();
        assert_eq!(complete.keystore_path, "/secrets/release.jks");
        assert_eq!(complete.store_password.expose(), "store-pass");
    }

    #[test]
    fn test_unset_key_password_is_incomplete() {
        let mut env = full_env();
        env.remove(KEY_PASSWORD_VAR);

        let bundle = CredentialBundle::from_env(&env);
        assert!(!bundle.is_complete());
        assert_eq!(bundle.missing_fields(), vec![CredentialField::KeyPassword]);
    }

    #[test]
    fn test_empty_store_password_counts_as_blank() {
        let mut env = full_env();
        env.insert(STORE_PASSWORD_VAR.to_string(), String::new());

        let bundle = CredentialBundle::from_env(&env);
        assert!(!bundle.is_complete());
        assert!(!bundle.has(CredentialField::StorePassword));
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let bundle = CredentialBundle::new(
            Some("  ".to_string()),
            Some("a".to_string()),
            Some("b".to_string()),
            Some("\t\n".to_string()),
        );
        assert_eq!(
            bundle.missing_fields(),
            vec![CredentialField::KeystorePath, CredentialField::KeyPassword]
        );
    }

    #[test]
    fn test_secrets_are_redacted() {
        let bundle = CredentialBundle::from_env(&full_env());
        let debug = format!("{bundle:?}");

        assert!(!debug.contains("store-pass"));
        assert!(!debug.contains("key-pass"));
        assert!(debug.contains("upload"));
        assert_eq!(Secret::new("hunter2").to_string(), "********");
    }

    #[test]
    fn test_field_env_vars() {
        let vars: Vec<_> = CredentialField::ALL.iter().map(|f| f.env_var()).collect();
        assert_eq!(
            vars,
            vec!["KEYSTORE_PATH", "STORE_PASSWORD", "KEY_ALIAS", "KEY_PASSWORD"]
        );
    }

    fn field_value() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None::<String>),
            Just(Some(String::new())),
            "[ \t]{1,3}".prop_map(Some),
            "[A-Za-z0-9/._-]{1,12}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn prop_complete_iff_all_non_blank(
            path in field_value(),
            store in field_value(),
            alias in field_value(),
            key in field_value(),
        ) {
            let present = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.trim().is_empty());
            let expected = present(&path) && present(&store) && present(&alias) && present(&key);

            let bundle = CredentialBundle::new(path, store, alias, key);
            prop_assert_eq!(bundle.is_complete(), expected);
            prop_assert_eq!(bundle.missing_fields().is_empty(), expected);
        }
    }
}
