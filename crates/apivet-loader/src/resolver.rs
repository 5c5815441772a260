//! The reference resolver.
//!
//! Resolution of one document runs in three phases:
//!
//! 1. **Scan** — a depth-first walk collects every `$ref` site. A
//!    `$ref`-free object recurses into all properties; a `$ref`-bearing
//!    object is itself the substitution point and is not entered.
//! 2. **Fan-out** — cross-document targets resolve to absolute keys and
//!    load concurrently, sharing the session's write-once cache. Each
//!    target runs the full load/parse/resolve pipeline recursively.
//! 3. **Apply** — queued substitutions run in dependency order: a site
//!    whose target subtree contains other sites waits for those first,
//!    then deep-copies the target into place with fresh node ids. A
//!    dependency cycle leaves the participating `$ref` nodes unchanged
//!    and reports `REF_CYCLE` at each inner site.
//!
//! Failures never abort the pass: an unreachable resource or dangling
//! pointer becomes one diagnostic and resolution continues elsewhere.

use crate::env::Environment;
use crate::loader::LoaderSet;
use apivet_diagnostics::{Diagnostic, DiagnosticsStore, SourceLocation, codes};
use apivet_document::{DocumentSet, Located, Node, NodeId, Pointer};
use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tokio::sync::Notify;

/// Outcome of a full load-and-resolve run.
pub struct LoadResult {
    /// The resolved root document; `None` when the root itself failed to
    /// load or parse (the store says why).
    pub root: Option<Node>,
    /// Resolved absolute key of the root document
    pub root_key: String,
    /// Source registry and location index for every document touched
    pub docs: DocumentSet,
    /// Every diagnostic the load produced
    pub store: DiagnosticsStore,
}

/// Load a document and resolve every reference reachable from it.
pub async fn load(path: &str, env: &dyn Environment, loaders: &LoaderSet) -> LoadResult {
    load_into(path, env, loaders, DiagnosticsStore::new()).await
}

/// [`load`] with a caller-prepared diagnostics store, so severity remaps
/// configured up front apply to diagnostics the load records.
pub async fn load_into(
    path: &str,
    env: &dyn Environment,
    loaders: &LoaderSet,
    store: DiagnosticsStore,
) -> LoadResult {
    let key = env.resolve(&env.cwd(), path);
    let session = Session {
        env,
        loaders,
        docs: RefCell::new(DocumentSet::new()),
        store: RefCell::new(store),
        cache: RefCell::new(HashMap::new()),
        waits: RefCell::new(HashMap::new()),
    };

    let outcome = session.ensure_document(key.clone(), None).await;
    let root = match outcome {
        DocOutcome::Resolved(doc) => Some(doc.root.clone()),
        _ => None,
    };

    LoadResult {
        root,
        root_key: key,
        docs: session.docs.into_inner(),
        store: session.store.into_inner(),
    }
}

struct ResolvedDoc {
    root: Node,
}

#[derive(Clone)]
enum DocOutcome {
    Resolved(Rc<ResolvedDoc>),
    Failed,
    Cycle,
}

enum DocState {
    Loading(Rc<Notify>),
    Resolved(Rc<ResolvedDoc>),
    Failed,
}

/// One `$ref` occurrence found by the scan.
struct RefSite {
    /// Pointer to the `$ref`-bearing object within its document
    path: Pointer,
    /// Node id of the `$ref` string value, for diagnostic locations
    value_id: NodeId,
    raw: String,
    target: Option<RefTarget>,
    state: SiteState,
}

#[derive(Clone)]
enum RefTarget {
    Local(Pointer),
    External { key: String, pointer: Pointer },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteState {
    Pending,
    InProgress,
    Done,
    Cyclic,
}

struct Session<'a> {
    env: &'a dyn Environment,
    loaders: &'a LoaderSet,
    docs: RefCell<DocumentSet>,
    store: RefCell<DiagnosticsStore>,
    /// Write-once document cache keyed by resolved absolute path
    cache: RefCell<HashMap<String, DocState>>,
    /// Which in-flight documents each in-flight document is awaiting;
    /// consulted to turn cooperative-wait deadlocks into cycle reports
    waits: RefCell<HashMap<String, HashSet<String>>>,
}

impl<'a> Session<'a> {
    /// Get a fully resolved document, loading it if this is the first
    /// request for its key. Concurrent requests for an in-flight key wait
    /// cooperatively unless waiting would deadlock, which is a reference
    /// cycle between documents.
    fn ensure_document<'s>(
        &'s self,
        key: String,
        requester: Option<String>,
    ) -> LocalBoxFuture<'s, DocOutcome> {
        async move {
            loop {
                let waiting = {
                    let mut cache = self.cache.borrow_mut();
                    match cache.get(&key) {
                        Some(DocState::Resolved(doc)) => return DocOutcome::Resolved(doc.clone()),
                        Some(DocState::Failed) => return DocOutcome::Failed,
                        Some(DocState::Loading(notify)) => {
                            if let Some(requester) = &requester
                                && self.would_deadlock(&key, requester)
                            {
                                return DocOutcome::Cycle;
                            }
                            Some(notify.clone())
                        }
                        None => {
                            cache.insert(key.clone(), DocState::Loading(Rc::new(Notify::new())));
                            None
                        }
                    }
                };
                match waiting {
                    Some(notify) => notify.notified().await,
                    None => break,
                }
            }

            tracing::debug!(%key, "loading document");
            let outcome = self.load_and_resolve(&key).await;

            let state = match &outcome {
                DocOutcome::Resolved(doc) => DocState::Resolved(doc.clone()),
                _ => DocState::Failed,
            };
            let previous = self.cache.borrow_mut().insert(key.clone(), state);
            if let Some(DocState::Loading(notify)) = previous {
                notify.notify_waiters();
            }
            outcome
        }
        .boxed_local()
    }

    /// Would `requester` waiting on `target` close a wait loop?
    fn would_deadlock(&self, target: &str, requester: &str) -> bool {
        let waits = self.waits.borrow();
        let mut stack = vec![target.to_string()];
        let mut seen = HashSet::new();
        while let Some(key) = stack.pop() {
            if key == requester {
                return true;
            }
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Some(next) = waits.get(&key) {
                stack.extend(next.iter().cloned());
            }
        }
        false
    }

    async fn load_and_resolve(&self, key: &str) -> DocOutcome {
        let (content, content_type) = match self.loaders.try_load(key, self.env).await {
            Ok(loaded) => loaded,
            Err(declinations) => {
                let reasons = declinations
                    .iter()
                    .map(|(name, reason)| format!("{name}: {reason}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                self.store.borrow_mut().add(
                    &[key],
                    Diagnostic::new(codes::LOAD_FAILED)
                        .meta("path", key)
                        .meta("reasons", reasons),
                );
                return DocOutcome::Failed;
            }
        };

        let parsed = self
            .docs
            .borrow_mut()
            .parse(key, &content, content_type.as_deref());
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                self.store.borrow_mut().add(
                    &[key],
                    Diagnostic::new(codes::PARSE_FAILED)
                        .meta("path", key)
                        .meta("detail", e.to_string()),
                );
                return DocOutcome::Failed;
            }
        };

        let root = self.resolve_tree(key, parsed.root).await;
        DocOutcome::Resolved(Rc::new(ResolvedDoc { root }))
    }

    async fn resolve_tree(&self, key: &str, mut root: Node) -> Node {
        let mut sites = Vec::new();
        scan_refs(&root, Pointer::root(), &mut sites);
        if sites.is_empty() {
            return root;
        }

        // Resolve targets against this document's location.
        let base = self.env.dirname(key);
        for site in &mut sites {
            site.target = parse_ref(&site.raw).map(|(document, pointer)| match document {
                None => RefTarget::Local(pointer),
                Some(document) => RefTarget::External {
                    key: self.env.resolve(&base, &document),
                    pointer,
                },
            });
        }

        // Fan out all cross-document loads, deduplicated by key.
        let mut external: Vec<String> = Vec::new();
        for site in &sites {
            if let Some(RefTarget::External { key: target, .. }) = &site.target
                && !external.contains(target)
            {
                external.push(target.clone());
            }
        }
        let outcomes: HashMap<String, DocOutcome> = if external.is_empty() {
            HashMap::new()
        } else {
            self.waits
                .borrow_mut()
                .insert(key.to_string(), external.iter().cloned().collect());
            let results = join_all(
                external
                    .iter()
                    .map(|target| self.ensure_document(target.clone(), Some(key.to_string()))),
            )
            .await;
            self.waits.borrow_mut().remove(key);
            external.into_iter().zip(results).collect()
        };

        // Apply queued substitutions in dependency order.
        for index in 0..sites.len() {
            self.apply_site(index, &mut sites, &mut root, key, &outcomes);
        }
        root
    }

    fn apply_site(
        &self,
        index: usize,
        sites: &mut Vec<RefSite>,
        root: &mut Node,
        key: &str,
        outcomes: &HashMap<String, DocOutcome>,
    ) {
        if sites[index].state != SiteState::Pending {
            return;
        }
        sites[index].state = SiteState::InProgress;

        match sites[index].target.clone() {
            None => {
                self.report_unresolved(&sites[index]);
                sites[index].state = SiteState::Done;
            }

            Some(RefTarget::Local(pointer)) => {
                // Sites inside the target subtree must substitute first so
                // the copy below picks up their resolved values. A site
                // reached while in progress is a reference cycle.
                let mut cyclic = false;
                for dep in 0..sites.len() {
                    if !pointer.is_prefix_of(&sites[dep].path) {
                        continue;
                    }
                    match sites[dep].state {
                        SiteState::Pending => {
                            self.apply_site(dep, sites, root, key, outcomes);
                            cyclic = sites[dep].state == SiteState::Cyclic;
                        }
                        SiteState::InProgress | SiteState::Cyclic => cyclic = true,
                        SiteState::Done => {}
                    }
                    if cyclic {
                        break;
                    }
                }
                if cyclic {
                    self.report_cycle(&sites[index]);
                    sites[index].state = SiteState::Cyclic;
                    return;
                }

                let copy = match pointer.locate(root) {
                    Some(target) => self.docs.borrow_mut().index.deep_copy(target),
                    None => {
                        self.report_unresolved(&sites[index]);
                        sites[index].state = SiteState::Done;
                        return;
                    }
                };
                self.substitute(root, &sites[index].path, copy);
                sites[index].state = SiteState::Done;
            }

            Some(RefTarget::External {
                key: target_key,
                pointer,
            }) => match outcomes.get(&target_key) {
                Some(DocOutcome::Resolved(doc)) => {
                    let copy = match pointer.locate(&doc.root) {
                        Some(target) => self.docs.borrow_mut().index.deep_copy(target),
                        None => {
                            self.report_unresolved(&sites[index]);
                            sites[index].state = SiteState::Done;
                            return;
                        }
                    };
                    self.substitute(root, &sites[index].path, copy);
                    sites[index].state = SiteState::Done;
                }
                Some(DocOutcome::Cycle) => {
                    self.report_cycle(&sites[index]);
                    sites[index].state = SiteState::Cyclic;
                }
                Some(DocOutcome::Failed) | None => {
                    self.report_unresolved(&sites[index]);
                    sites[index].state = SiteState::Done;
                }
            },
        }
    }

    /// Replace the node at `path` with the copy, evicting the records of
    /// the discarded `$ref` subtree.
    fn substitute(&self, root: &mut Node, path: &Pointer, copy: Node) {
        let slot = if path.is_root() {
            Some(&mut *root)
        } else {
            path.locate_mut(root)
        };
        if let Some(slot) = slot {
            self.docs.borrow_mut().index.evict(slot);
            *slot = copy;
        }
    }

    fn report_unresolved(&self, site: &RefSite) {
        let mut diagnostic =
            Diagnostic::new(codes::REF_NOT_RESOLVED).meta("ref", site.raw.clone());
        if let Some(location) = self.locate(site.value_id) {
            diagnostic = diagnostic.at(location);
        }
        self.store
            .borrow_mut()
            .add(site.path.segments(), diagnostic);
    }

    fn report_cycle(&self, site: &RefSite) {
        let mut diagnostic = Diagnostic::new(codes::REF_CYCLE).meta("ref", site.raw.clone());
        if let Some(location) = self.locate(site.value_id) {
            diagnostic = diagnostic.at(location);
        }
        self.store
            .borrow_mut()
            .add(site.path.segments(), diagnostic);
    }

    fn locate(&self, id: NodeId) -> Option<SourceLocation> {
        self.docs.borrow().index.locate(id).map(to_source_location)
    }
}

fn to_source_location(located: Located) -> SourceLocation {
    SourceLocation {
        source: located.source,
        file: Some(located.file),
        pointer: located.pointer,
        range: located.range,
    }
}

fn scan_refs(node: &Node, path: Pointer, sites: &mut Vec<RefSite>) {
    if let Some(entry) = node.entry("$ref")
        && let Some(raw) = entry.value.as_str()
    {
        sites.push(RefSite {
            path,
            value_id: entry.value.id,
            raw: raw.to_string(),
            target: None,
            state: SiteState::Pending,
        });
        return;
    }
    match &node.value {
        apivet_document::Value::Object(entries) => {
            for entry in entries {
                scan_refs(&entry.value, path.child(entry.key.clone()), sites);
            }
        }
        apivet_document::Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                scan_refs(item, path.child(i.to_string()), sites);
            }
        }
        _ => {}
    }
}

/// Split a `$ref` string into its document part and pointer.
///
/// `#/a/b` is local; `file#/a/b` is cross-document; a bare `file` is a
/// whole-document reference (the root pointer). Returns `None` for a
/// malformed reference, which reports as unresolvable.
fn parse_ref(raw: &str) -> Option<(Option<String>, Pointer)> {
    if raw.is_empty() {
        return None;
    }
    match raw.split_once('#') {
        Some(("", fragment)) => Pointer::parse(fragment).map(|p| (None, p)),
        Some((document, fragment)) => {
            Pointer::parse(fragment).map(|p| (Some(document.to_string()), p))
        }
        None => Some((Some(raw.to_string()), Pointer::root())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::OsEnvironment;

    fn session<'a>(env: &'a OsEnvironment, loaders: &'a LoaderSet) -> Session<'a> {
        Session {
            env,
            loaders,
            docs: RefCell::new(DocumentSet::new()),
            store: RefCell::new(DiagnosticsStore::new()),
            cache: RefCell::new(HashMap::new()),
            waits: RefCell::new(HashMap::new()),
        }
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let env = OsEnvironment::new();
        let loaders = LoaderSet::new();
        let session = session(&env, &loaders);

        let parsed = session
            .docs
            .borrow_mut()
            .parse("a.yml", "a:\n  $ref: \"#/b\"\nb: 7\n", None)
            .unwrap();

        let once = session.resolve_tree("a.yml", parsed.root).await;
        assert_eq!(once.get("a").unwrap().as_i64(), Some(7));
        assert!(session.store.borrow().is_empty());

        // A second pass over the already-resolved tree changes nothing
        // and records nothing.
        let twice = session.resolve_tree("a.yml", once.clone()).await;
        assert!(twice.value_eq(&once));
        assert!(session.store.borrow().is_empty());
    }

    #[test]
    fn test_parse_ref_forms() {
        let (doc, ptr) = parse_ref("#/a/b").unwrap();
        assert!(doc.is_none());
        assert_eq!(ptr.segments(), ["a", "b"]);

        let (doc, ptr) = parse_ref("b.yml#/y").unwrap();
        assert_eq!(doc.as_deref(), Some("b.yml"));
        assert_eq!(ptr.segments(), ["y"]);

        let (doc, ptr) = parse_ref("b.yml").unwrap();
        assert_eq!(doc.as_deref(), Some("b.yml"));
        assert!(ptr.is_root());

        let (doc, ptr) = parse_ref("b.yml#").unwrap();
        assert_eq!(doc.as_deref(), Some("b.yml"));
        assert!(ptr.is_root());

        assert!(parse_ref("").is_none());
        assert!(parse_ref("#no-slash").is_none());
    }

    #[test]
    fn test_scan_skips_ref_object_interiors() {
        let mut docs = DocumentSet::new();
        let parsed = docs
            .parse(
                "a.yml",
                "x:\n  $ref: \"#/y\"\n  ignored:\n    $ref: \"#/z\"\ny: 1\n",
                None,
            )
            .unwrap();
        let mut sites = Vec::new();
        scan_refs(&parsed.root, Pointer::root(), &mut sites);
        // The nested $ref under the ref-bearing object is not a site.
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].raw, "#/y");
        assert_eq!(sites[0].path.segments(), ["x"]);
    }
}
