//! KDL dialogue scripts.
//!
//! ```kdl
//! node "root" text="The gate guard eyes you." {
//!     node "ask" text="Who goes there?" {
//!         node "friend" text="[color=green]A friend.[/color]"
//!     }
//!     node "leave" text="Walk away."
//! }
//! ```
//!
//! Exactly one top-level `node` is the root. The first argument is the node
//! id, `text` is optional. Children of other names are skipped with a warning.

use std::path::{Path, PathBuf};

use super::{DialogueTree, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse KDL: {0}")]
    Kdl(#[from] kdl::KdlError),
    #[error("script has no top-level node")]
    NoRoot,
    #[error("script has more than one top-level node (second is '{0}')")]
    ExtraRoot(String),
    #[error("node without an id under '{parent}'")]
    MissingId { parent: String },
}

const NODE: &str = "node";

/// Read and parse a dialogue script file.
pub fn load_script<C>(path: impl AsRef<Path>) -> Result<DialogueTree<C>, ScriptError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = parse_script(&content)?;
    log::debug!("loaded {} dialogue nodes from {}", tree.len(), path.display());
    Ok(tree)
}

pub fn parse_script<C>(source: &str) -> Result<DialogueTree<C>, ScriptError> {
    let doc = source.parse::<kdl::KdlDocument>()?;

    let mut roots = doc.nodes().iter().filter(|n| is_dialogue_node(n));
    let root = roots.next().ok_or(ScriptError::NoRoot)?;
    if let Some(extra) = roots.next() {
        return Err(ScriptError::ExtraRoot(node_id(extra).unwrap_or("?").to_string()));
    }
    for other in doc.nodes().iter().filter(|n| !is_dialogue_node(n)) {
        log::warn!("skipping unknown top-level entry '{}'", other.name());
    }

    let id = node_id(root).ok_or_else(|| ScriptError::MissingId {
        parent: "<document>".to_string(),
    })?;
    let mut tree = DialogueTree::new(id, node_text(root));
    if let Some(children) = root.children() {
        let root_id = tree.root();
        add_children(&mut tree, root_id, id, children)?;
    }
    Ok(tree)
}

fn add_children<C>(
    tree: &mut DialogueTree<C>,
    parent: NodeId,
    parent_id: &str,
    children: &kdl::KdlDocument,
) -> Result<(), ScriptError> {
    for child in children.nodes() {
        if !is_dialogue_node(child) {
            log::warn!("skipping unknown entry '{}' under '{parent_id}'", child.name());
            continue;
        }
        let id = node_id(child).ok_or_else(|| ScriptError::MissingId {
            parent: parent_id.to_string(),
        })?;
        let Some(node) = tree.add_choice(parent, id, node_text(child)) else {
            continue;
        };
        if let Some(grandchildren) = child.children() {
            add_children(tree, node, id, grandchildren)?;
        }
    }
    Ok(())
}

fn is_dialogue_node(node: &kdl::KdlNode) -> bool {
    node.name().value() == NODE
}

fn node_id(node: &kdl::KdlNode) -> Option<&str> {
    node.get(0).and_then(|v| v.as_string())
}

fn node_text(node: &kdl::KdlNode) -> &str {
    node.get("text").and_then(|v| v.as_string()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATE: &str = r#"
node "root" text="The gate guard eyes you." {
    node "ask" text="Who goes there?" {
        node "friend" text="A friend."
        node "foe"
    }
    node "leave" text="Walk away."
}
"#;

    fn ids(tree: &DialogueTree<()>) -> Vec<String> {
        tree.iter()
            .filter_map(|n| tree.get(n).map(|n| n.id.clone()))
            .collect()
    }

    #[test]
    fn nested_script() {
        let tree: DialogueTree<()> = parse_script(GATE).expect("valid script");
        assert_eq!(ids(&tree), ["root", "ask", "friend", "foe", "leave"]);

        let root = tree.get(tree.root()).expect("root");
        assert_eq!(root.text, "The gate guard eyes you.");
        assert_eq!(root.choices().len(), 2);

        let foe = tree.find("foe").and_then(|n| tree.get(n)).expect("foe");
        assert_eq!(foe.text, "");
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let src = r#"
title "ignored"
node "root" text="hi" {
    comment "also ignored"
    node "a" text="A"
}
"#;
        let tree: DialogueTree<()> = parse_script(src).expect("valid script");
        assert_eq!(ids(&tree), ["root", "a"]);
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(parse_script::<()>("title \"x\""), Err(ScriptError::NoRoot)));
        assert!(matches!(
            parse_script::<()>("node \"a\"\nnode \"b\""),
            Err(ScriptError::ExtraRoot(ref id)) if id == "b"
        ));
        assert!(matches!(
            parse_script::<()>("node \"root\" { node text=\"no id\" }"),
            Err(ScriptError::MissingId { ref parent }) if parent == "root"
        ));
        assert!(matches!(parse_script::<()>("node \"root\" {"), Err(ScriptError::Kdl(_))));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gate.kdl");
        std::fs::write(&path, GATE).expect("write");
        let tree: DialogueTree<()> = load_script(&path).expect("load");
        assert_eq!(tree.len(), 5);

        let missing = load_script::<()>(dir.path().join("missing.kdl"));
        assert!(matches!(missing, Err(ScriptError::Io { .. })));
    }
}
