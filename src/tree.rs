//! Builds the hierarchical file tree from the flat repository listing.

use crate::models::{TreeEntry, TreeNode};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Directory names holding version-control internals, never shown in a tree
pub const INTERNAL_METADATA_DIRS: &[&str] = &[".git"];

/// Returns `true` when any segment of `path` is an internal-metadata directory
pub fn is_internal_metadata(path: &str) -> bool {
    path.split('/')
        .any(|segment| INTERNAL_METADATA_DIRS.contains(&segment))
}

/// Path of the parent directory, or `None` for root-level entries
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Converts a flat entry list into the root nodes of a tree
///
/// Children keep input order. An entry whose parent is absent from the input
/// (or is not a directory) becomes a root.
pub fn build(entries: &[TreeEntry]) -> Vec<TreeNode> {
    let kept: Vec<&TreeEntry> = entries
        .iter()
        .filter(|entry| !is_internal_metadata(&entry.path))
        .collect();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(kept.len());
    for (position, entry) in kept.iter().enumerate() {
        index.insert(entry.path.as_str(), position);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); kept.len()];
    let mut roots = Vec::new();
    for (position, entry) in kept.iter().enumerate() {
        let parent = parent_path(&entry.path).and_then(|parent| index.get(parent).copied());
        match parent {
            Some(parent) if kept[parent].kind.is_directory() => children[parent].push(position),
            _ => roots.push(position),
        }
    }

    roots
        .into_iter()
        .map(|position| assemble(position, &kept, &children))
        .collect()
}

fn assemble(position: usize, entries: &[&TreeEntry], children: &[Vec<usize>]) -> TreeNode {
    let mut node = TreeNode::from_entry(entries[position]);
    if let Some(slot) = node.children.as_mut() {
        slot.extend(
            children[position]
                .iter()
                .map(|&child| assemble(child, entries, children)),
        );
    }
    node
}

/// Display ordering: directories before files, then by path
pub fn display_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_directory()
        .cmp(&a.is_directory())
        .then_with(|| a.path.cmp(&b.path))
}

/// Sorts nodes recursively for display
pub fn sort_for_display(nodes: &mut [TreeNode]) {
    nodes.sort_by(display_order);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_for_display(children);
        }
    }
}

/// Finds a node by path among a list of roots
pub fn find<'a>(roots: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    roots.iter().find_map(|root| root.find(path))
}

/// Collects every path reachable from `roots`, depth first
pub fn reachable_paths(roots: &[TreeNode]) -> Vec<&str> {
    let mut paths = Vec::new();
    let mut stack: Vec<&TreeNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        paths.push(node.path.as_str());
        stack.extend(node.children().iter().rev());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.path.as_str()).collect()
    }

    #[test]
    fn test_builds_nested_tree() {
        let entries = vec![
            TreeEntry::file("a.txt"),
            TreeEntry::directory("dir"),
            TreeEntry::file("dir/b.txt"),
        ];

        let roots = build(&entries);

        assert_eq!(names(&roots), vec!["a.txt", "dir"]);
        assert_eq!(roots[0].children, None);
        assert_eq!(names(roots[1].children()), vec!["dir/b.txt"]);
    }

    #[test]
    fn test_children_keep_input_order() {
        let entries = vec![
            TreeEntry::directory("src"),
            TreeEntry::file("src/z.rs"),
            TreeEntry::file("src/a.rs"),
            TreeEntry::directory("src/m"),
        ];

        let roots = build(&entries);
        assert_eq!(
            names(roots[0].children()),
            vec!["src/z.rs", "src/a.rs", "src/m"]
        );
        assert_eq!(roots[0].children()[2].children, Some(Vec::new()));
    }

    #[test]
    fn test_skips_git_metadata() {
        let entries = vec![
            TreeEntry::directory(".git"),
            TreeEntry::file(".git/HEAD"),
            TreeEntry::directory("vendor/.git"),
            TreeEntry::file("vendor/.git/config"),
            TreeEntry::directory(".github"),
            TreeEntry::file(".gitignore"),
        ];

        let roots = build(&entries);
        assert_eq!(names(&roots), vec![".github", ".gitignore"]);
    }

    #[test]
    fn test_orphans_become_roots() {
        let entries = vec![
            TreeEntry::file("missing/child.rs"),
            TreeEntry::file("top.rs"),
        ];

        let roots = build(&entries);
        assert_eq!(names(&roots), vec!["missing/child.rs", "top.rs"]);
    }

    #[test]
    fn test_child_of_file_becomes_root() {
        let entries = vec![TreeEntry::file("odd"), TreeEntry::file("odd/inner")];

        let roots = build(&entries);
        assert_eq!(names(&roots), vec!["odd", "odd/inner"]);
    }

    #[test]
    fn test_display_sort_puts_directories_first() {
        let entries = vec![
            TreeEntry::file("b.txt"),
            TreeEntry::file("a.txt"),
            TreeEntry::directory("z"),
            TreeEntry::file("z/2"),
            TreeEntry::directory("z/1"),
        ];

        let mut roots = build(&entries);
        sort_for_display(&mut roots);

        assert_eq!(names(&roots), vec!["z", "a.txt", "b.txt"]);
        assert_eq!(names(roots[0].children()), vec!["z/1", "z/2"]);
    }

    #[test]
    fn test_find_and_parent_path() {
        let entries = vec![
            TreeEntry::directory("a"),
            TreeEntry::directory("a/b"),
            TreeEntry::file("a/b/c.rs"),
        ];
        let roots = build(&entries);

        assert_eq!(find(&roots, "a/b/c.rs").map(|n| n.kind), Some(EntryKind::File));
        assert!(find(&roots, "a/c.rs").is_none());
        assert_eq!(parent_path("a/b/c.rs"), Some("a/b"));
        assert_eq!(parent_path("top"), None);
    }

    /// Entry sets closed under ancestors: every ancestor is a directory and
    /// every path with no descendants is a file.
    fn entry_sets() -> impl Strategy<Value = Vec<TreeEntry>> {
        prop::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,3}", 0..24).prop_map(|leaves| {
            let mut kinds: BTreeMap<String, EntryKind> = BTreeMap::new();
            for leaf in &leaves {
                let mut prefix = String::new();
                for segment in leaf.split('/') {
                    if !prefix.is_empty() {
                        kinds.insert(prefix.clone(), EntryKind::Directory);
                        prefix.push('/');
                    }
                    prefix.push_str(segment);
                }
                kinds.entry(prefix).or_insert(EntryKind::File);
            }
            kinds
                .into_iter()
                .map(|(path, kind)| TreeEntry { path, kind })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_every_path_reachable_once(entries in entry_sets()) {
            let roots = build(&entries);
            let mut reached: Vec<&str> = reachable_paths(&roots);
            reached.sort_unstable();
            let mut expected: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
            expected.sort_unstable();
            prop_assert_eq!(reached, expected);
        }

        #[test]
        fn prop_display_sort_hides_input_order(
            (entries, shuffled) in entry_sets()
                .prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
        ) {
            let mut original = build(&entries);
            let mut reordered = build(&shuffled);
            sort_for_display(&mut original);
            sort_for_display(&mut reordered);
            prop_assert_eq!(original, reordered);
        }

        #[test]
        fn prop_directories_always_have_children(entries in entry_sets()) {
            let roots = build(&entries);
            let mut stack: Vec<&TreeNode> = roots.iter().collect();
            while let Some(node) = stack.pop() {
                prop_assert_eq!(node.children.is_some(), node.is_directory());
                stack.extend(node.children());
            }
        }
    }
}
