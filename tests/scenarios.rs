// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::{Path, PathBuf};

use chat_branches::format::{parse_document, to_document_string, DecodeOptions, DocumentError};
use chat_branches::model::{ConversationTree, MalformedDocument, NodeId, Role};
use chat_branches::ops::{
    append, append_at, prune_to, set_content, switch_branch, truncate_after, ApplyError,
    Direction, SwitchOutcome,
};
use chat_branches::query::{
    locate, normalize_active_path, outline, project_active, ChatMessage, SiblingPosition,
};
use rstest::{fixture, rstest};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("conversations")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"))
}

fn load_fixture(name: &str) -> Result<ConversationTree, DocumentError> {
    parse_document(&read_fixture(name), &DecodeOptions::default())
}

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn position(depth: usize, j: usize, n: usize) -> SiblingPosition {
    SiblingPosition {
        depth,
        j: Some(j),
        n: Some(n),
    }
}

/// Checks single root, parent/children symmetry, sibling math and the root-prefixed active path.
fn assert_structurally_sound(tree: &ConversationTree) {
    let roots: Vec<_> = tree.nodes().filter(|node| node.is_root()).collect();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].node_id(), tree.root_id());

    for node in tree.nodes() {
        let Some(parent_id) = node.parent_id() else {
            continue;
        };
        let siblings = tree.children(parent_id.as_str());
        assert!(siblings.contains(node.node_id()));

        let pos = locate(tree, node.node_id().as_str()).expect("locate");
        let (j, n) = (pos.j.expect("j"), pos.n.expect("n"));
        assert!(1 <= j && j <= n);
        assert_eq!(n, siblings.len());
    }
    for node in tree.nodes() {
        for child_id in tree.children(node.node_id().as_str()) {
            let child = tree.node(child_id.as_str()).expect("child exists");
            assert_eq!(child.parent_id(), Some(node.node_id()));
        }
    }

    assert_eq!(tree.active_path().first(), Some(tree.root_id()));
}

#[fixture]
fn greeting() -> ConversationTree {
    load_fixture("greeting.json").expect("greeting fixture")
}

#[rstest]
fn scenario_locate_and_project_linear_chat(greeting: ConversationTree) {
    assert_structurally_sound(&greeting);
    assert_eq!(greeting.title(), Some("Greeting"));
    assert_eq!(locate(&greeting, "B"), Some(position(2, 1, 1)));
    assert_eq!(
        project_active(&greeting),
        vec![
            ChatMessage::new(Role::User, "hi"),
            ChatMessage::new(Role::Assistant, "hello"),
        ]
    );
}

#[rstest]
fn scenario_regenerate_creates_a_sibling_and_selects_it(mut greeting: ConversationTree) {
    let nodes_before = greeting.node_count();
    let links_before = greeting.child_link_count();

    let outcome = switch_branch(&mut greeting, 3, Direction::Right).expect("switch right");
    let SwitchOutcome::Created(b2) = outcome else {
        panic!("expected a new sibling, got {outcome:?}");
    };

    assert_eq!(greeting.node_count(), nodes_before + 1);
    assert_eq!(greeting.child_link_count(), links_before + 1);
    assert_eq!(greeting.active_path(), &[nid("R"), nid("A"), b2.clone()]);
    assert_eq!(locate(&greeting, b2.as_str()), Some(position(2, 2, 2)));
    assert_eq!(locate(&greeting, "B"), Some(position(2, 1, 2)));
    assert_structurally_sound(&greeting);

    set_content(&mut greeting, &b2, Some("hey there".to_owned())).expect("fill reply");
    assert_eq!(
        project_active(&greeting).last(),
        Some(&ChatMessage::new(Role::Assistant, "hey there"))
    );
}

#[rstest]
fn scenario_switch_left_at_first_sibling_is_a_no_op(mut greeting: ConversationTree) {
    let before = greeting.clone();

    let outcome = switch_branch(&mut greeting, 3, Direction::Left).expect("switch left");

    assert_eq!(outcome, SwitchOutcome::Unchanged);
    assert_eq!(greeting.active_path(), before.active_path());
    assert_eq!(greeting.node_count(), before.node_count());
    assert_eq!(greeting.rev(), before.rev());
}

#[rstest]
fn scenario_truncate_keeps_nodes(mut greeting: ConversationTree) {
    truncate_after(&mut greeting, 1).expect("truncate");

    assert_eq!(greeting.active_path(), &[nid("R")]);
    assert!(greeting.contains("A"));
    assert!(greeting.contains("B"));
    assert_eq!(greeting.children("R"), &[nid("A")]);
    assert_eq!(greeting.children("A"), &[nid("B")]);
    assert!(project_active(&greeting).is_empty());
}

#[rstest]
fn scenario_append_at_updates_sibling_counts(mut greeting: ConversationTree) {
    let alt = append_at(
        &mut greeting,
        &nid("A"),
        Role::Assistant,
        Some("alt reply".to_owned()),
    )
    .expect("append_at");

    assert_eq!(greeting.active_path(), &[nid("R"), nid("A"), nid("B")]);
    assert_eq!(locate(&greeting, alt.as_str()), Some(position(2, 2, 2)));
    assert_eq!(locate(&greeting, "B"), Some(position(2, 1, 2)));
    assert_structurally_sound(&greeting);
}

#[test]
fn scenario_flat_array_is_synthesized_into_a_chain() {
    let tree = load_fixture("flat.json").expect("flat fixture");

    assert_eq!(tree.active_path(), &[nid("root"), nid("n1"), nid("n2")]);
    let n1 = tree.node("n1").expect("n1");
    assert_eq!((n1.role(), n1.content()), (Role::User, Some("x")));
    let n2 = tree.node("n2").expect("n2");
    assert_eq!((n2.role(), n2.content()), (Role::Assistant, Some("y")));
    assert_eq!(n2.parent_id(), Some(&nid("n1")));
    assert_structurally_sound(&tree);
}

#[test]
fn dangling_parent_is_rejected_at_load() {
    let err = load_fixture("dangling_parent.json").unwrap_err();

    let DocumentError::Malformed { source } = err else {
        panic!("expected a malformed document, got {err:?}");
    };
    assert_eq!(
        source,
        MalformedDocument::DanglingParent {
            node_id: nid("A"),
            parent_id: nid("ghost"),
        }
    );
}

#[test]
fn omitted_leaf_children_and_rootless_active_path_are_tolerated() {
    let tree = load_fixture("omitted_leaf_children.json").expect("fixture");

    assert!(tree.children("A").is_empty());
    assert_eq!(tree.active_path(), &[nid("R"), nid("A")]);
}

#[rstest]
fn normalizing_an_active_path_is_idempotent(greeting: ConversationTree) {
    let root = greeting.root_id();
    for raw in [vec![], vec![nid("A"), nid("B")], greeting.active_path().to_vec()] {
        let once = normalize_active_path(root, &raw);
        assert_eq!(once.first(), Some(root));
        assert_eq!(normalize_active_path(root, &once), once);
    }
}

#[rstest]
fn switch_left_never_creates_nodes(mut greeting: ConversationTree) {
    append_at(&mut greeting, &nid("A"), Role::Assistant, Some("alt".to_owned()))
        .expect("append_at");
    switch_branch(&mut greeting, 3, Direction::Right).expect("to alt");

    let nodes_before = greeting.node_count();
    for _ in 0..3 {
        switch_branch(&mut greeting, 3, Direction::Left).expect("switch left");
    }

    assert_eq!(greeting.node_count(), nodes_before);
    assert_eq!(greeting.active_path(), &[nid("R"), nid("A"), nid("B")]);
}

#[rstest]
fn truncate_then_append_grows_a_new_branch_without_losing_data(mut greeting: ConversationTree) {
    truncate_after(&mut greeting, 2).expect("truncate");
    let retry = append(&mut greeting, Role::Assistant, Some("hello again".to_owned()))
        .expect("append");

    assert!(greeting.contains("B"));
    assert_eq!(greeting.children("A"), &[nid("B"), retry.clone()]);
    assert_eq!(greeting.active_path(), &[nid("R"), nid("A"), retry]);
    assert_structurally_sound(&greeting);
}

#[rstest]
fn failed_operations_leave_the_tree_untouched(mut greeting: ConversationTree) {
    let other = append_at(&mut greeting, &nid("R"), Role::User, Some("other".to_owned()))
        .expect("append_at");
    let before = to_document_string(&greeting).expect("encode");
    let rev = greeting.rev();

    assert!(matches!(
        switch_branch(&mut greeting, 1, Direction::Right),
        Err(ApplyError::InvalidDepth { depth: 1, .. })
    ));
    assert!(matches!(
        truncate_after(&mut greeting, 0),
        Err(ApplyError::InvalidDepth { depth: 0, .. })
    ));
    assert!(matches!(
        prune_to(&mut greeting, &nid("missing")),
        Err(ApplyError::NodeNotFound { .. })
    ));
    assert!(matches!(
        prune_to(&mut greeting, &other),
        Err(ApplyError::NodeNotOnActivePath { .. })
    ));

    assert_eq!(greeting.rev(), rev);
    assert_eq!(to_document_string(&greeting).expect("encode"), before);
}

#[rstest]
fn saved_document_reloads_to_the_same_outline(mut greeting: ConversationTree) {
    switch_branch(&mut greeting, 3, Direction::Right).expect("regenerate");
    append(&mut greeting, Role::User, Some("thanks".to_owned())).expect("append");

    let text = to_document_string(&greeting).expect("encode");
    let reloaded = parse_document(&text, &DecodeOptions::default()).expect("reload");

    let rows = |tree: &ConversationTree| {
        outline(tree)
            .into_iter()
            .map(|row| (row.node.node_id().clone(), row.depth, row.j, row.n, row.on_active_path))
            .collect::<Vec<_>>()
    };
    assert_eq!(rows(&reloaded), rows(&greeting));
    assert_eq!(project_active(&reloaded), project_active(&greeting));
}
