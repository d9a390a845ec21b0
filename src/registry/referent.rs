//! Referent capability.
//!
//! Every entity addressable by a GUID exposes the same three accessors;
//! the resolver only ever sees entities through this trait.

use serde::{Deserialize, Deserializer, Serialize};

/// How a resolved GUID should be served to friendly (non-API) callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Rewrite internally to the referent's deep URL.
    Proxy,
    /// Send the client to the referent's canonical URL.
    #[default]
    Redirect,
}

impl RedirectMode {
    /// Parse a mode name. Anything other than `proxy` is a redirect.
    pub fn from_name(name: &str) -> Self {
        match name {
            "proxy" => RedirectMode::Proxy,
            _ => RedirectMode::Redirect,
        }
    }

    pub fn is_proxy(self) -> bool {
        self == RedirectMode::Proxy
    }
}

impl<'de> Deserialize<'de> for RedirectMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(RedirectMode::from_name(&name))
    }
}

/// An entity that can be the target of a GUID.
pub trait Referent: Send + Sync + std::fmt::Debug {
    /// Whether friendly routes proxy or redirect to this entity.
    fn redirect_mode(&self) -> RedirectMode;

    /// Canonical, client-visible path.
    fn url(&self) -> String;

    /// Internal path used only when proxying.
    fn deep_url(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_modes_redirect() {
        assert_eq!(RedirectMode::from_name("proxy"), RedirectMode::Proxy);
        assert_eq!(RedirectMode::from_name("redirect"), RedirectMode::Redirect);
        assert_eq!(RedirectMode::from_name("PROXY"), RedirectMode::Redirect);
        assert_eq!(RedirectMode::from_name(""), RedirectMode::Redirect);
    }

    #[test]
    fn test_mode_deserialize() {
        let mode: RedirectMode = serde_json::from_str("\"proxy\"").unwrap();
        assert!(mode.is_proxy());
        let mode: RedirectMode = serde_json::from_str("\"bounce\"").unwrap();
        assert_eq!(mode, RedirectMode::Redirect);
    }
}
