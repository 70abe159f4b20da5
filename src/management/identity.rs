//! Stable registration key for a pool.

use crate::core::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Domain used for identities derived from an instance name.
pub const DEFAULT_DOMAIN: &str = "managed_pool";

/// Immutable key under which a pool is registered with a
/// [`ManagementRegistry`](super::ManagementRegistry).
///
/// Any non-empty string is accepted. Derived identities use the
/// `domain:key=value,...` management-name form so that registries can filter
/// by domain and key properties:
///
/// ```rust
/// use managed_pool::management::PoolIdentity;
///
/// let id = PoolIdentity::derive("orders");
/// assert_eq!(id.as_str(), r#"managed_pool:type=WorkerPool,name="orders""#);
/// assert_eq!(id.domain(), Some("managed_pool"));
/// assert_eq!(id.key_property("name").as_deref(), Some("orders"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolIdentity(Arc<str>);

impl PoolIdentity {
    /// Wraps an explicit identity string.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the string is empty or blank.
    pub fn new(identity: impl Into<String>) -> Result<Self> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(PoolError::invalid_config(
                "identity",
                "identity must not be empty",
            ));
        }
        Ok(Self(identity.into()))
    }

    /// Derives the default identity for a pool instance name.
    pub fn derive(instance_name: &str) -> Self {
        Self(
            format!(
                "{}:type=WorkerPool,name={}",
                DEFAULT_DOMAIN,
                quote(instance_name)
            )
            .into(),
        )
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:`, if there is one.
    pub fn domain(&self) -> Option<&str> {
        self.0.split_once(':').map(|(domain, _)| domain)
    }

    /// Looks up a `key=value` property after the domain, unquoting the value.
    pub fn key_property(&self, key: &str) -> Option<String> {
        let (_, properties) = self.0.split_once(':')?;
        split_properties(properties)
            .into_iter()
            .find_map(|(k, v)| (k == key).then(|| unquote(v)))
    }
}

impl fmt::Display for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolIdentity({:?})", &*self.0)
    }
}

impl TryFrom<String> for PoolIdentity {
    type Error = PoolError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PoolIdentity> for String {
    fn from(id: PoolIdentity) -> Self {
        id.0.to_string()
    }
}

/// Quotes a property value so that `,`, `=`, `:` and quotes survive.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\\' | '"' | '*' | '?' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

// Splits `k1=v1,k2="a,b"` on commas outside quotes.
fn split_properties(properties: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in properties.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                pairs.push(&properties[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&properties[start..]);

    pairs
        .into_iter()
        .filter_map(|pair| pair.split_once('='))
        .collect()
}
