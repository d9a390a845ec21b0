//! GUID resolution.
//!
//! # Responsibilities
//! - Recover the routing prefix (API mount) from the request path
//! - Look up the identifier, then its lower-cased form
//! - Choose between redirecting and proxying to the referent
//!
//! # Design Decisions
//! - Pure and synchronous; the store is the only shared state
//! - API callers are always redirected so the URL names the real endpoint
//! - Case fallback redirects to the lower-cased identifier, not the referent

use thiserror::Error;

use crate::guid::url::{build_guid_url, request_prefix};
use crate::registry::{IdentifierRecord, IdentifierStore, RedirectMode};

/// What the HTTP layer should do with a resolved GUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Answer with a redirect to this path.
    Redirect(String),
    /// Re-dispatch the request internally to this path.
    Proxy(String),
}

/// Resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("GUID not found: {identifier}")]
    NotFound { identifier: String },
}

impl ResolveError {
    fn not_found(identifier: &str) -> Self {
        ResolveError::NotFound {
            identifier: identifier.to_string(),
        }
    }
}

/// Resolves identifiers against an injected store.
#[derive(Debug, Clone)]
pub struct GuidResolver<S> {
    store: S,
}

impl<S: IdentifierStore> GuidResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve `identifier`, found in `request_path`, plus an optional
    /// trailing `suffix`.
    pub fn resolve(
        &self,
        request_path: &str,
        identifier: &str,
        suffix: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        if identifier.is_empty() {
            return Err(ResolveError::not_found(identifier));
        }

        let prefix = request_prefix(request_path, identifier);

        if let Some(record) = self.store.lookup(identifier) {
            return self.resolve_record(&record, prefix, suffix);
        }

        // Exact key missed; try the canonical lower-case form.
        let lower = identifier.to_lowercase();
        if lower != identifier && self.store.lookup(&lower).is_some() {
            let path = build_guid_url(&lower, Some(prefix), suffix);
            tracing::debug!(guid = %identifier, target = %path, "Redirecting to lower-cased GUID");
            return Ok(Resolution::Redirect(path));
        }

        tracing::debug!(guid = %identifier, "GUID not found");
        Err(ResolveError::not_found(identifier))
    }

    fn resolve_record(
        &self,
        record: &IdentifierRecord,
        prefix: &str,
        suffix: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let Some(referent) = record.referent() else {
            tracing::error!(guid = %record.key, target = %record.target, "Referent of GUID not found");
            return Err(ResolveError::not_found(&record.key));
        };

        let mode = referent.redirect_mode();
        let url = match mode {
            RedirectMode::Proxy => referent.deep_url(),
            RedirectMode::Redirect => referent.url(),
        };
        if url.is_empty() {
            tracing::error!(guid = %record.key, mode = ?mode, "Referent of GUID has no URL");
            return Err(ResolveError::not_found(&record.key));
        }

        let path = build_guid_url(&url, Some(prefix), suffix);
        if !prefix.is_empty() || !mode.is_proxy() {
            Ok(Resolution::Redirect(path))
        } else {
            Ok(Resolution::Proxy(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Entity, EntityKind, EntityRef, Node, Referent, RegistrySnapshot, StoredFile};
    use std::fmt::Write as _;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn node(id: &str, mode: RedirectMode) -> Entity {
        Entity::Node(Node {
            id: id.to_string(),
            title: id.to_string(),
            category: "project".to_string(),
            is_public: true,
            is_deleted: false,
            is_registration: false,
            contributors: Vec::new(),
            logs: Vec::new(),
            redirect_mode: mode,
        })
    }

    fn file(id: &str) -> Entity {
        Entity::File(StoredFile {
            id: id.to_string(),
            node_id: "abc12".to_string(),
            name: "data.csv".to_string(),
        })
    }

    fn snapshot() -> RegistrySnapshot {
        let mut snap = RegistrySnapshot::new();
        for entity in [
            node("abc12", RedirectMode::Proxy),
            node("red34", RedirectMode::Redirect),
            file("f1x9q"),
        ] {
            let target = entity.entity_ref();
            snap.insert_guid(target.id.clone(), target);
            snap.insert_entity(entity);
        }
        snap.insert_guid("abc1", EntityRef::new(EntityKind::Node, "red34"));
        snap.insert_guid("lost1", EntityRef::new(EntityKind::Node, "missing"));
        snap
    }

    fn resolver() -> GuidResolver<RegistrySnapshot> {
        GuidResolver::new(snapshot())
    }

    #[derive(Default)]
    struct FieldText(String);

    impl Visit for FieldText {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            let _ = write!(self.0, "{}={:?} ", field.name(), value);
        }
    }

    /// Collects the fields of every error-level event.
    #[derive(Clone, Default)]
    struct ErrorEvents(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                let mut text = FieldText::default();
                event.record(&mut text);
                self.0.lock().unwrap().push(text.0);
            }
        }
    }

    #[test]
    fn test_friendly_proxy() {
        let out = resolver().resolve("/abc12/", "abc12", None).unwrap();
        assert_eq!(out, Resolution::Proxy("/project/abc12/".to_string()));
    }

    #[test]
    fn test_friendly_proxy_with_suffix() {
        let out = resolver().resolve("/abc12/wiki/", "abc12", Some("wiki/")).unwrap();
        assert_eq!(out, Resolution::Proxy("/project/abc12/wiki/".to_string()));
    }

    #[test]
    fn test_api_always_redirects() {
        let r = resolver();
        let out = r.resolve("/api/v1/abc12/", "abc12", None).unwrap();
        assert_eq!(out, Resolution::Redirect("/api/v1/project/abc12/".to_string()));

        let out = r
            .resolve("/api/v1/abc12/comments/", "abc12", Some("comments"))
            .unwrap();
        assert_eq!(
            out,
            Resolution::Redirect("/api/v1/project/abc12/comments/".to_string())
        );

        let out = r.resolve("/api/v1/red34/", "red34", None).unwrap();
        assert_eq!(out, Resolution::Redirect("/api/v1/red34/".to_string()));
    }

    #[test]
    fn test_redirect_mode_always_redirects() {
        let r = resolver();
        let out = r.resolve("/red34/", "red34", None).unwrap();
        assert_eq!(out, Resolution::Redirect("/red34/".to_string()));

        let out = r.resolve("/f1x9q/", "f1x9q", None).unwrap();
        assert_eq!(
            out,
            Resolution::Redirect("/project/abc12/files/data.csv/".to_string())
        );
    }

    #[test]
    fn test_case_fallback_uses_lowered_identifier() {
        let r = resolver();
        // "abc1" points at red34, whose own url is "/red34/".
        let out = r.resolve("/AbC1/", "AbC1", None).unwrap();
        assert_eq!(out, Resolution::Redirect("/abc1/".to_string()));

        let out = r
            .resolve("/api/v1/AbC1/comments/", "AbC1", Some("comments"))
            .unwrap();
        assert_eq!(out, Resolution::Redirect("/api/v1/abc1/comments/".to_string()));
    }

    #[test]
    fn test_case_fallback_ignores_proxy_mode() {
        let out = resolver().resolve("/ABC12/", "ABC12", None).unwrap();
        assert_eq!(out, Resolution::Redirect("/abc12/".to_string()));
    }

    #[test]
    fn test_total_miss() {
        let r = resolver();
        assert_eq!(
            r.resolve("/ZzZ9/", "ZzZ9", None),
            Err(ResolveError::NotFound {
                identifier: "ZzZ9".to_string()
            })
        );
        assert!(r.resolve("/zzz9/", "zzz9", None).is_err());
    }

    #[test]
    fn test_empty_identifier() {
        assert!(resolver().resolve("/", "", None).is_err());
    }

    #[test]
    fn test_integrity_miss_logs_once() {
        let events = ErrorEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let r = resolver();

        let out = tracing::subscriber::with_default(subscriber, || {
            r.resolve("/lost1/", "lost1", None)
        });

        assert!(matches!(out, Err(ResolveError::NotFound { .. })));
        let logged = events.0.lock().unwrap();
        assert_eq!(logged.len(), 1);
        assert!(logged[0].contains("lost1"));
    }

    #[test]
    fn test_plain_miss_does_not_log_errors() {
        let events = ErrorEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let r = resolver();

        let _ = tracing::subscriber::with_default(subscriber, || {
            r.resolve("/nothing/", "nothing", None)
        });

        assert!(events.0.lock().unwrap().is_empty());
    }

    #[derive(Debug)]
    struct Blank;

    impl Referent for Blank {
        fn redirect_mode(&self) -> RedirectMode {
            RedirectMode::Redirect
        }
        fn url(&self) -> String {
            String::new()
        }
        fn deep_url(&self) -> String {
            String::new()
        }
    }

    /// Store whose every record points at a referent without URLs.
    struct BlankStore;

    impl IdentifierStore for BlankStore {
        fn lookup(&self, key: &str) -> Option<IdentifierRecord> {
            Some(IdentifierRecord::new(
                key,
                EntityRef::new(EntityKind::File, key),
                Some(Arc::new(Blank)),
            ))
        }
    }

    #[test]
    fn test_referent_without_url() {
        let events = ErrorEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let store: Arc<dyn IdentifierStore> = Arc::new(BlankStore);
        let r = GuidResolver::new(store);

        let out = tracing::subscriber::with_default(subscriber, || {
            r.resolve("/any/", "any", None)
        });

        assert!(out.is_err());
        assert_eq!(events.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_resolutions_match_sequential() {
        let r = Arc::new(GuidResolver::new(Arc::new(snapshot())));
        let cases: Vec<(&str, &str, Option<&str>)> = vec![
            ("/abc12/", "abc12", None),
            ("/api/v1/abc12/", "abc12", Some("comments")),
            ("/red34/", "red34", None),
            ("/AbC1/", "AbC1", None),
            ("/lost1/", "lost1", None),
            ("/nope/", "nope", None),
        ];
        let sequential: Vec<_> = cases
            .iter()
            .map(|(p, id, s)| r.resolve(p, id, *s))
            .collect();

        let parallel: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = cases
                .iter()
                .map(|(p, id, s)| {
                    let r = Arc::clone(&r);
                    scope.spawn(move || r.resolve(p, id, *s))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sequential, parallel);
    }
}
