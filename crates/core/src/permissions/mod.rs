//! Permission nodes for players on the local server.
//!
//! Nodes are dotted paths such as `chatactions.wave`. A `*` segment matches the
//! rest of any path, so `chatactions.*` grants every node under `chatactions`.
//! A node prefixed with `-` is an explicit denial.

#[derive(Debug)]
enum PathSegment {
    WildCard,
    Named(String),
}

#[derive(Debug)]
struct PermissionNode {
    path: Vec<PathSegment>,
    value: bool,
}

impl PermissionNode {
    fn matches(&self, name: &str) -> bool {
        let mut segments = name.split('.');
        for expected in &self.path {
            match (expected, segments.next()) {
                (PathSegment::WildCard, _) => return true,
                (PathSegment::Named(expected), Some(segment)) => {
                    if !expected.eq_ignore_ascii_case(segment) {
                        return false;
                    }
                }
                (PathSegment::Named(_), None) => return false,
            }
        }
        segments.next().is_none()
    }
}

#[derive(Debug, Default)]
pub struct PermissionSet {
    nodes: Vec<PermissionNode>,
}

impl PermissionSet {
    /// The value of the first node matching `name`. Exact nodes take priority over wildcards.
    pub fn get_node_val(&self, name: &str) -> Option<bool> {
        let matching = || self.nodes.iter().filter(|node| node.matches(name));
        matching()
            .find(|node| {
                !node
                    .path
                    .iter()
                    .any(|segment| matches!(segment, PathSegment::WildCard))
            })
            .or_else(|| matching().next())
            .map(|node| node.value)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get_node_val(name).unwrap_or(false)
    }

    /// Adds a node. `-node` denies it.
    pub fn insert(&mut self, name: &str) {
        let (name, value) = match name.strip_prefix('-') {
            Some(name) => (name, false),
            None => (name, true),
        };
        let path = name
            .split('.')
            .map(|s| match s {
                "*" => PathSegment::WildCard,
                s => PathSegment::Named(s.to_owned()),
            })
            .collect();
        self.nodes.push(PermissionNode { path, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(nodes: &[&str]) -> PermissionSet {
        let mut set = PermissionSet::default();
        for node in nodes {
            set.insert(node);
        }
        set
    }

    #[test]
    fn exact_and_wildcard() {
        let perms = set(&["chatactions.wave", "other.*"]);
        assert!(perms.has("chatactions.wave"));
        assert!(!perms.has("chatactions.hug"));
        assert!(!perms.has("chatactions"));
        assert!(!perms.has("chatactions.wave.extra"));
        assert!(perms.has("other.anything.deep"));
        assert!(set(&["*"]).has("chatactions.admin"));
    }

    #[test]
    fn exact_denial_beats_wildcard() {
        let perms = set(&["chatactions.*", "-chatactions.admin"]);
        assert!(perms.has("chatactions.wave"));
        assert!(!perms.has("chatactions.admin"));
        assert_eq!(perms.get_node_val("unrelated"), None);
    }
}
