//! Branching dialogue: a tree of named nodes and a manager that walks it.
//!
//! Nodes live in a slotmap arena owned by [`DialogueTree`]; choices are
//! handles into the same arena. Removing a node drops its whole subtree,
//! including any widget trees the nodes own.

pub mod script;

use slotmap::{SlotMap, new_key_type};

use crate::locale::Localizer;
use crate::measure::TextMeasure;
use crate::ui::{Callback, DrawList, FrameInput, KeyBindings, UiEvent, UiState, WidgetId, WidgetTree};

new_key_type! {
    /// Stable handle to a dialogue node.
    pub struct NodeId;
}

/// Id that always resolves to the tree root without searching.
pub const ROOT_ID: &str = "root";

pub struct DialogueNode<C> {
    pub id: String,
    pub text: String,
    parent: Option<NodeId>,
    choices: Vec<NodeId>,
    /// Widgets shown while this node is current.
    pub widgets: Option<WidgetTree<C>>,
    on_enter: Option<Callback<C>>,
    on_exit: Option<Callback<C>>,
}

impl<C> DialogueNode<C> {
    fn new(id: &str, text: &str, parent: Option<NodeId>) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            parent,
            choices: Vec::new(),
            widgets: None,
            on_enter: None,
            on_exit: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn choices(&self) -> &[NodeId] {
        &self.choices
    }
}

pub struct DialogueTree<C> {
    arena: SlotMap<NodeId, DialogueNode<C>>,
    root: NodeId,
}

impl<C> DialogueTree<C> {
    pub fn new(root_id: &str, text: &str) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(DialogueNode::new(root_id, text, None));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, node: NodeId) -> Option<&DialogueNode<C>> {
        self.arena.get(node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut DialogueNode<C>> {
        self.arena.get_mut(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.arena.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Append a new choice under `parent`. Ids are not required to be
    /// unique; a duplicate is accepted with a warning and lookups resolve
    /// to the first depth-first match.
    pub fn add_choice(&mut self, parent: NodeId, id: &str, text: &str) -> Option<NodeId> {
        if !self.arena.contains_key(parent) {
            return None;
        }
        if self.find(id).is_some() {
            log::warn!("dialogue node id '{id}' already exists; lookups will find the first one");
        }
        let node = self.arena.insert(DialogueNode::new(id, text, Some(parent)));
        self.arena[parent].choices.push(node);
        Some(node)
    }

    /// Remove a node and its subtree. The root cannot be removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.arena.contains_key(node) {
            return false;
        }
        let parent = self.arena[node].parent;
        if let Some(p) = parent.and_then(|id| self.arena.get_mut(id)) {
            p.choices.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.arena.remove(id) {
                stack.extend(removed.choices);
            }
        }
        true
    }

    pub fn set_callbacks(
        &mut self,
        node: NodeId,
        on_enter: Option<Callback<C>>,
        on_exit: Option<Callback<C>>,
    ) {
        if let Some(n) = self.arena.get_mut(node) {
            n.on_enter = on_enter;
            n.on_exit = on_exit;
        }
    }

    pub fn set_on_enter(&mut self, node: NodeId, callback: impl FnMut(&mut C) + 'static) {
        if let Some(n) = self.arena.get_mut(node) {
            n.on_enter = Some(Box::new(callback));
        }
    }

    pub fn set_on_exit(&mut self, node: NodeId, callback: impl FnMut(&mut C) + 'static) {
        if let Some(n) = self.arena.get_mut(node) {
            n.on_exit = Some(Box::new(callback));
        }
    }

    /// Attach a widget tree, returning the one it replaces.
    pub fn set_widgets(&mut self, node: NodeId, widgets: WidgetTree<C>) -> Option<WidgetTree<C>> {
        self.arena.get_mut(node)?.widgets.replace(widgets)
    }

    /// Depth-first pre-order search from the root.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.iter().find(|&n| self.arena[n].id == id)
    }

    /// Node handles in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some(n) = self.arena.get(node) {
                stack.extend(n.choices.iter().rev().copied());
            }
            Some(node)
        })
    }

    fn fire_enter(&mut self, node: NodeId, ctx: &mut C) {
        if let Some(cb) = self.arena.get_mut(node).and_then(|n| n.on_enter.as_mut()) {
            cb(ctx);
        }
    }

    fn fire_exit(&mut self, node: NodeId, ctx: &mut C) {
        if let Some(cb) = self.arena.get_mut(node).and_then(|n| n.on_exit.as_mut()) {
            cb(ctx);
        }
    }
}

/// Knobs for [`DialogueManager`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialoguePolicy {
    /// Re-run exit and enter callbacks when the target is already current.
    pub reenter_on_self: bool,
}

impl Default for DialoguePolicy {
    fn default() -> Self {
        Self {
            reenter_on_self: true,
        }
    }
}

/// Outcome of a transition request. Callers that care must check it:
/// a missing id silently lands on the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Reached(NodeId),
    FellBack,
}

pub struct DialogueManager<C> {
    tree: DialogueTree<C>,
    current: NodeId,
    active: bool,
    policy: DialoguePolicy,
}

impl<C> DialogueManager<C> {
    /// Start at the root. No enter callback runs until the first transition.
    pub fn new(tree: DialogueTree<C>) -> Self {
        Self::with_policy(tree, DialoguePolicy::default())
    }

    pub fn with_policy(tree: DialogueTree<C>, policy: DialoguePolicy) -> Self {
        let current = tree.root();
        Self {
            tree,
            current,
            active: true,
            policy,
        }
    }

    pub fn tree(&self) -> &DialogueTree<C> {
        &self.tree
    }

    /// Mutable access to the tree. If the current node is removed through
    /// it, the manager returns to the root on next use.
    pub fn tree_mut(&mut self) -> &mut DialogueTree<C> {
        &mut self.tree
    }

    pub fn current(&self) -> NodeId {
        if self.tree.contains(self.current) {
            self.current
        } else {
            self.tree.root()
        }
    }

    pub fn current_node(&self) -> Option<&DialogueNode<C>> {
        self.tree.get(self.current())
    }

    pub fn is_at_root(&self) -> bool {
        self.current() == self.tree.root()
    }

    pub fn policy(&self) -> DialoguePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DialoguePolicy) {
        self.policy = policy;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inactive managers skip `update` and `draw`.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Move to the node with id `target`: exit the current node, resolve the
    /// target, enter the result. Unknown ids fall back to the root.
    pub fn transition(&mut self, target: &str, ctx: &mut C) -> Transition {
        let found = if target == ROOT_ID {
            Some(self.tree.root())
        } else {
            self.tree.find(target)
        };
        match found {
            Some(node) => {
                self.enter(node, ctx);
                Transition::Reached(node)
            }
            None => {
                log::warn!("dialogue node '{target}' not found, returning to root");
                let root = self.tree.root();
                self.enter(root, ctx);
                Transition::FellBack
            }
        }
    }

    /// Move to the `index`th choice of the current node. Resolves by handle,
    /// so duplicate ids elsewhere in the tree do not interfere.
    pub fn choose(&mut self, index: usize, ctx: &mut C) -> Option<NodeId> {
        let node = *self.current_node()?.choices.get(index)?;
        self.enter(node, ctx);
        Some(node)
    }

    fn enter(&mut self, node: NodeId, ctx: &mut C) {
        let from = self.current();
        if from == node && !self.policy.reenter_on_self {
            return;
        }
        self.tree.fire_exit(from, ctx);
        self.current = node;
        log::debug!(
            "dialogue: {} -> {}",
            self.tree.get(from).map_or("?", |n| n.id.as_str()),
            self.tree.get(node).map_or("?", |n| n.id.as_str()),
        );
        self.tree.fire_enter(node, ctx);
    }

    /// Run one input frame against the current node's widgets.
    pub fn update(
        &mut self,
        ui: &mut UiState,
        input: &FrameInput,
        bindings: &KeyBindings,
        ctx: &mut C,
    ) -> Vec<UiEvent> {
        if !self.active {
            return Vec::new();
        }
        let current = self.current();
        match self.tree.get_mut(current).and_then(|n| n.widgets.as_mut()) {
            Some(widgets) => ui.update(widgets, input, bindings, ctx),
            None => Vec::new(),
        }
    }

    pub fn draw<M: TextMeasure + ?Sized>(
        &mut self,
        draw_list: &mut DrawList,
        measure: &mut M,
        hovered: Option<WidgetId>,
    ) {
        if !self.active {
            return;
        }
        let current = self.current();
        if let Some(widgets) = self.tree.get_mut(current).and_then(|n| n.widgets.as_mut()) {
            widgets.draw(draw_list, measure, hovered);
        }
    }

    /// Re-apply translations to every node's localized widgets.
    pub fn relocalize(&mut self, localizer: &Localizer) {
        for node in self.tree.arena.values_mut() {
            if let Some(widgets) = node.widgets.as_mut() {
                widgets.relocalize(localizer);
            }
        }
    }
}
