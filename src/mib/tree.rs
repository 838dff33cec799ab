//! OID trie.
//!
//! Group nodes hold their children in two parallel vectors: sorted sub-ids
//! and the nodes they lead to. Instance nodes are leaves holding a
//! [`ResolverHandle`]. The root group is `1.3.6.1` and is never removed.

use crate::error::{Error, ErrorStatus, OidErrorKind, RegisterErrorKind, Result};
use crate::handler::{RequestKind, ResolverHandle, ResolverTable};
use crate::oid::{INTERNET, MAX_OID_LEN, Oid};
use crate::value::Value;

use super::SearchResult;

#[derive(Debug)]
enum Node {
    Group(GroupNode),
    Instance(InstanceNode),
}

#[derive(Debug, Default)]
struct GroupNode {
    sub_ids: Vec<u32>,
    children: Vec<Node>,
}

#[derive(Debug)]
struct InstanceNode {
    handle: ResolverHandle,
}

impl GroupNode {
    fn with_child(sub_id: u32, child: Node) -> Self {
        let mut sub_ids = Vec::with_capacity(1);
        let mut children = Vec::with_capacity(1);
        sub_ids.push(sub_id);
        children.push(child);
        Self { sub_ids, children }
    }

    fn len(&self) -> usize {
        self.sub_ids.len()
    }

    fn find(&self, sub_id: u32) -> std::result::Result<usize, usize> {
        self.sub_ids.binary_search(&sub_id)
    }

    fn insert(&mut self, idx: usize, sub_id: u32, child: Node) {
        let cap = self.sub_ids.capacity();
        if self.sub_ids.len() == cap {
            let grow = (cap + 5) * 3 / 2 - cap;
            self.sub_ids.reserve_exact(grow);
            self.children.reserve_exact(grow);
        }
        self.sub_ids.insert(idx, sub_id);
        self.children.insert(idx, child);
    }

    fn remove(&mut self, idx: usize) -> Node {
        self.sub_ids.remove(idx);
        self.children.remove(idx)
    }
}

/// The registration trie.
///
/// Holds only [`ResolverHandle`]s; the resolvers live in a
/// [`ResolverTable`] passed to the search functions.
#[derive(Debug, Default)]
pub struct MibTree {
    root: GroupNode,
    instances: usize,
}

/// Where a GETNEXT walk should start.
enum Start<'a> {
    /// Descend matching these arcs below the root.
    Exact(&'a [u32]),
    /// Take the leftmost instance of the whole tree.
    Leftmost,
}

impl MibTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered instance nodes.
    pub fn len(&self) -> usize {
        self.instances
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.instances == 0
    }

    /// Register `handle` at `oid`.
    ///
    /// Missing groups along the path are created. Fails if the OID is not
    /// below `1.3.6.1`, is longer than [`MAX_OID_LEN`], already exists as
    /// any node, or passes through an instance.
    pub fn register(&mut self, oid: &Oid, handle: ResolverHandle) -> Result<()> {
        check_registrable(oid)?;
        let arcs = &oid.arcs()[INTERNET.len()..];

        let mut group = &mut self.root;
        for (depth, &sub_id) in arcs.iter().enumerate() {
            match group.find(sub_id) {
                Ok(_) if depth + 1 == arcs.len() => {
                    return Err(Error::Registration {
                        oid: oid.clone(),
                        kind: RegisterErrorKind::AlreadyRegistered,
                    });
                }
                Ok(idx) => {
                    group = match &mut group.children[idx] {
                        Node::Group(child) => child,
                        Node::Instance(_) => {
                            return Err(Error::Registration {
                                oid: oid.clone(),
                                kind: RegisterErrorKind::PathThroughInstance,
                            });
                        }
                    };
                }
                Err(idx) => {
                    // Build the missing tail bottom-up, one single-child group per arc.
                    let mut node = Node::Instance(InstanceNode { handle });
                    for &below in arcs[depth + 1..].iter().rev() {
                        node = Node::Group(GroupNode::with_child(below, node));
                    }
                    group.insert(idx, sub_id, node);
                    self.instances += 1;
                    return Ok(());
                }
            }
        }
        Err(Error::invalid_oid(OidErrorKind::OutsideInternet))
    }

    /// Remove the node at `oid` and its whole subtree.
    ///
    /// Returns the handles of every instance removed, or `None` if nothing
    /// is registered there. The root cannot be removed.
    pub fn unregister(&mut self, oid: &Oid) -> Option<Vec<ResolverHandle>> {
        if oid.arcs() == INTERNET {
            tracing::warn!(target: "smart_snmp::mib", "refusing to unregister the root node");
            return None;
        }
        if !oid.is_internet() {
            return None;
        }

        let arcs = &oid.arcs()[INTERNET.len()..];
        let (last, path) = arcs.split_last()?;
        let mut group = &mut self.root;
        for &sub_id in path {
            let idx = group.find(sub_id).ok()?;
            group = match &mut group.children[idx] {
                Node::Group(child) => child,
                Node::Instance(_) => return None,
            };
        }
        let idx = group.find(*last).ok()?;
        let removed = group.remove(idx);

        let mut handles = Vec::new();
        let mut pending = vec![removed];
        while let Some(node) = pending.pop() {
            match node {
                Node::Instance(inst) => handles.push(inst.handle),
                Node::Group(g) => pending.extend(g.children),
            }
        }
        self.instances -= handles.len();
        Some(handles)
    }

    /// Look up the instance at exactly `oid`, within `scope`.
    ///
    /// An instance node matching a prefix of `oid` is asked to resolve the
    /// rest as its instance suffix (possibly empty). Anything else is
    /// `noSuchObject`.
    pub fn search_exact(
        &self,
        resolvers: &mut ResolverTable,
        scope: &Oid,
        oid: &Oid,
        kind: RequestKind,
        value: Option<&Value>,
    ) -> SearchResult {
        let missing = || SearchResult::exception(oid.clone(), Value::NoSuchObject);
        if !oid.is_internet() || !oid.starts_with(scope) || oid.len() > MAX_OID_LEN {
            return missing();
        }

        let arcs = &oid.arcs()[INTERNET.len()..];
        let mut group = &self.root;
        for (depth, &sub_id) in arcs.iter().enumerate() {
            let Ok(idx) = group.find(sub_id) else {
                return missing();
            };
            match &group.children[idx] {
                Node::Group(child) => group = child,
                Node::Instance(inst) => {
                    let suffix = &arcs[depth + 1..];
                    let resolved = resolvers.resolve(inst.handle, kind, suffix, value);
                    return SearchResult {
                        oid: oid.clone(),
                        status: resolved.status,
                        value: resolved.value,
                    };
                }
            }
        }
        missing()
    }

    /// Find the first instance strictly after `query`, within `scope`.
    ///
    /// A query sorting before the scope starts at the scope. A query past
    /// the scope, or a walk that runs off the end, yields `endOfMibView`
    /// carrying the scope OID.
    pub fn search_next(
        &self,
        resolvers: &mut ResolverTable,
        scope: &Oid,
        query: &Oid,
    ) -> SearchResult {
        let end = || SearchResult::exception(scope.clone(), Value::EndOfMibView);

        let target = if query < scope {
            scope
        } else if query.starts_with(scope) {
            query
        } else {
            return end();
        };

        let start = if target.arcs().starts_with(&INTERNET) {
            Start::Exact(&target.arcs()[INTERNET.len()..])
        } else if target.arcs() < &INTERNET[..] {
            Start::Leftmost
        } else {
            return end();
        };

        match self.walk(resolvers, scope, query, start) {
            Some(found) => found,
            None => end(),
        }
    }

    /// Iterative depth-first walk with an explicit backlog.
    fn walk(
        &self,
        resolvers: &mut ResolverTable,
        scope: &Oid,
        query: &Oid,
        start: Start<'_>,
    ) -> Option<SearchResult> {
        let (rest, mut immediate) = match start {
            Start::Exact(rest) => (rest, false),
            Start::Leftmost => (&[][..], true),
        };

        // (group, sibling index to resume at, path length at that group)
        let mut backlog: Vec<(&GroupNode, usize, usize)> = Vec::with_capacity(MAX_OID_LEN);
        let mut path: Vec<u32> = Vec::with_capacity(MAX_OID_LEN);
        path.extend_from_slice(&INTERNET);

        let mut group = &self.root;
        let mut idx = first_index(group, rest, 0, &mut immediate);

        loop {
            if idx >= group.len() {
                let (parent, next, depth) = backlog.pop()?;
                group = parent;
                idx = next;
                path.truncate(depth);
                immediate = true;
                continue;
            }

            if idx + 1 < group.len() {
                backlog.push((group, idx + 1, path.len()));
            }
            path.push(group.sub_ids[idx]);
            let consumed = path.len() - INTERNET.len();

            match &group.children[idx] {
                Node::Group(child) => {
                    group = child;
                    idx = first_index(group, rest, consumed, &mut immediate);
                }
                Node::Instance(inst) => {
                    let suffix = if immediate {
                        &[][..]
                    } else {
                        rest.get(consumed..).unwrap_or(&[])
                    };
                    let resolved =
                        resolvers.resolve(inst.handle, RequestKind::GetNext, suffix, None);
                    if resolved.is_hit() {
                        let mut oid = Oid::from_slice(&path);
                        if let Some(found) = &resolved.suffix {
                            oid.extend_from_slice(found.arcs());
                        }
                        if oid.len() <= MAX_OID_LEN && oid > *query {
                            if !oid.starts_with(scope) {
                                return None;
                            }
                            tracing::trace!(target: "smart_snmp::mib", %query, next = %oid, "getnext resolved");
                            return Some(SearchResult {
                                oid,
                                status: ErrorStatus::NoError,
                                value: resolved.value,
                            });
                        }
                    }
                    // Resolver had nothing (more): continue with the next sibling.
                    idx = group.len();
                    path.pop();
                }
            }
        }
    }
}

/// Pick the child index to enter in `group`, leaving exact mode when the
/// target diverges from the tree or runs out.
fn first_index(group: &GroupNode, rest: &[u32], consumed: usize, immediate: &mut bool) -> usize {
    if *immediate {
        return 0;
    }
    match rest.get(consumed) {
        None => {
            *immediate = true;
            0
        }
        Some(sub_id) => match group.find(*sub_id) {
            Ok(idx) => idx,
            Err(idx) => {
                *immediate = true;
                idx
            }
        },
    }
}

fn check_registrable(oid: &Oid) -> Result<()> {
    if oid.is_empty() {
        return Err(Error::invalid_oid(OidErrorKind::Empty));
    }
    oid.validate_length()?;
    if !oid.is_internet() {
        return Err(Error::invalid_oid(OidErrorKind::OutsideInternet));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{InstanceResolver, Resolved};
    use crate::oid;

    fn scalar(text: &'static str) -> Box<dyn InstanceResolver> {
        Box::new(move |kind: RequestKind, suffix: &[u32], _: Option<&Value>| {
            match (kind, suffix.is_empty()) {
                (RequestKind::Get, true) => Resolved::value(text),
                (RequestKind::GetNext, true) => Resolved::next(Oid::empty(), text),
                (RequestKind::Get, false) => Resolved::no_such_instance(),
                _ => Resolved::end_of_view(),
            }
        })
    }

    fn tree_with(oids: &[Oid]) -> (MibTree, ResolverTable) {
        let mut tree = MibTree::new();
        let mut resolvers = ResolverTable::new();
        for oid in oids {
            let handle = resolvers.insert(scalar("x"));
            resolvers.acquire(handle);
            tree.register(oid, handle).unwrap();
        }
        (tree, resolvers)
    }

    fn internet() -> Oid {
        Oid::from_slice(&INTERNET)
    }

    #[test]
    fn test_register_rejects_bad_oids() {
        let (mut tree, mut resolvers) = tree_with(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
        let h = resolvers.insert(scalar("y"));

        let err = tree.register(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), h).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration {
                kind: RegisterErrorKind::AlreadyRegistered,
                ..
            }
        ));
        let err = tree.register(&oid!(1, 3, 6, 1, 2, 1, 1), h).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration {
                kind: RegisterErrorKind::AlreadyRegistered,
                ..
            }
        ));
        let err = tree
            .register(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0, 5), h)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Registration {
                kind: RegisterErrorKind::PathThroughInstance,
                ..
            }
        ));
        assert!(matches!(
            tree.register(&oid!(1, 3, 6, 2, 1), h),
            Err(Error::InvalidOid {
                kind: OidErrorKind::OutsideInternet,
                ..
            })
        ));
        assert!(matches!(
            tree.register(&internet(), h),
            Err(Error::InvalidOid {
                kind: OidErrorKind::OutsideInternet,
                ..
            })
        ));
        assert!(matches!(
            tree.register(&Oid::empty(), h),
            Err(Error::InvalidOid {
                kind: OidErrorKind::Empty,
                ..
            })
        ));
        let long = Oid::new(INTERNET.into_iter().chain(std::iter::repeat_n(1, 61)));
        assert!(matches!(
            tree.register(&long, h),
            Err(Error::InvalidOid {
                kind: OidErrorKind::TooManyArcs { count: 65, .. },
                ..
            })
        ));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_sub_ids_stay_sorted() {
        let (tree, _) = tree_with(&[
            oid!(1, 3, 6, 1, 9),
            oid!(1, 3, 6, 1, 2),
            oid!(1, 3, 6, 1, 7),
            oid!(1, 3, 6, 1, 4),
            oid!(1, 3, 6, 1, 1),
            oid!(1, 3, 6, 1, 8),
            oid!(1, 3, 6, 1, 3),
        ]);
        assert_eq!(tree.root.sub_ids, vec![1, 2, 3, 4, 7, 8, 9]);
        assert!(tree.root.sub_ids.capacity() >= 7);
    }

    #[test]
    fn test_group_growth_policy() {
        let mut group = GroupNode::with_child(1, Node::Group(GroupNode::default()));
        assert_eq!(group.sub_ids.capacity(), 1);
        group.insert(1, 2, Node::Group(GroupNode::default()));
        assert_eq!(group.sub_ids.capacity(), 9);
        assert_eq!(group.children.capacity(), 9);
    }

    #[test]
    fn test_search_exact() {
        let (tree, mut resolvers) = tree_with(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
        let scope = internet();

        let hit = tree.search_exact(
            &mut resolvers,
            &scope,
            &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            RequestKind::Get,
            None,
        );
        assert_eq!(hit.value, Value::from("x"));

        // Below the instance: resolver sees suffix [7]
        let below = tree.search_exact(
            &mut resolvers,
            &scope,
            &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0, 7),
            RequestKind::Get,
            None,
        );
        assert_eq!(below.value, Value::NoSuchInstance);

        for miss in [
            oid!(1, 3, 6, 1, 2, 1, 1),
            oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
            oid!(1, 3, 6, 2, 1),
        ] {
            let res = tree.search_exact(&mut resolvers, &scope, &miss, RequestKind::Get, None);
            assert_eq!(res.value, Value::NoSuchObject);
            assert_eq!(res.oid, miss);
        }

        let narrow = oid!(1, 3, 6, 1, 4);
        let out_of_scope = tree.search_exact(
            &mut resolvers,
            &narrow,
            &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            RequestKind::Get,
            None,
        );
        assert_eq!(out_of_scope.value, Value::NoSuchObject);
    }

    #[test]
    fn test_search_next_walks_in_order() {
        let (tree, mut resolvers) = tree_with(&[
            oid!(1, 3, 6, 1, 2, 1, 2, 1, 0),
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
        ]);
        let scope = internet();

        let mut seen = Vec::new();
        let mut cursor = Oid::from_slice(&[1, 3]);
        loop {
            let res = tree.search_next(&mut resolvers, &scope, &cursor);
            if res.value == Value::EndOfMibView {
                assert_eq!(res.oid, scope);
                break;
            }
            seen.push(res.oid.clone());
            cursor = res.oid;
        }
        assert_eq!(
            seen,
            vec![
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
                oid!(1, 3, 6, 1, 2, 1, 2, 1, 0),
            ]
        );
    }

    #[test]
    fn test_search_next_from_between_and_inside() {
        let (tree, mut resolvers) = tree_with(&[
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            oid!(1, 3, 6, 1, 2, 1, 2, 1, 0),
        ]);
        let scope = internet();

        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 2, 1, 1, 5));
        assert_eq!(res.oid, oid!(1, 3, 6, 1, 2, 1, 2, 1, 0));

        // Inside the first scalar's suffix space
        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0, 3));
        assert_eq!(res.oid, oid!(1, 3, 6, 1, 2, 1, 2, 1, 0));

        // Prefix of a registration
        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 2, 1, 1));
        assert_eq!(res.oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));

        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 2));
        assert_eq!(res.value, Value::EndOfMibView);
    }

    #[test]
    fn test_search_next_respects_scope() {
        let (tree, mut resolvers) = tree_with(&[
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            oid!(1, 3, 6, 1, 4, 1, 1, 0),
        ]);
        let scope = oid!(1, 3, 6, 1, 4);

        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        assert_eq!(res.oid, oid!(1, 3, 6, 1, 4, 1, 1, 0));

        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 4, 1, 1, 0));
        assert_eq!(res.value, Value::EndOfMibView);
        assert_eq!(res.oid, scope);

        let narrow = oid!(1, 3, 6, 1, 2, 1);
        let res = tree.search_next(&mut resolvers, &narrow, &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        assert_eq!(res.value, Value::EndOfMibView);
        assert_eq!(res.oid, narrow);
    }

    #[test]
    fn test_unregister_subtree_and_reregister() {
        let (mut tree, mut resolvers) = tree_with(&[
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
            oid!(1, 3, 6, 1, 4, 1, 1, 0),
        ]);
        let removed = tree.unregister(&oid!(1, 3, 6, 1, 2, 1, 1)).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(tree.len(), 1);
        assert!(tree.unregister(&oid!(1, 3, 6, 1, 2, 1, 1)).is_none());
        assert!(tree.unregister(&internet()).is_none());

        let scope = internet();
        let res = tree.search_exact(
            &mut resolvers,
            &scope,
            &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            RequestKind::Get,
            None,
        );
        assert_eq!(res.value, Value::NoSuchObject);

        // The emptied 1.3.6.1.2.1 group is kept and walks past cleanly
        let res = tree.search_next(&mut resolvers, &scope, &oid!(1, 3, 6, 1, 2));
        assert_eq!(res.oid, oid!(1, 3, 6, 1, 4, 1, 1, 0));

        let h = resolvers.insert(scalar("again"));
        tree.register(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), h).unwrap();
        assert_eq!(tree.len(), 2);
    }
}
