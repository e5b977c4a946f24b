//! Edit session state.
//!
//! [`EditSession`] owns one document together with its flattened node list,
//! the current selection and a dirty flag. Every mutation goes through the
//! session and is followed by a full re-flatten, so a renderer only ever
//! reads a consistent snapshot through [`EditSession::render`].

use std::sync::Arc;

use serde_json::Value;

use crate::{
    data::{
        array,
        defaults::fill_missing,
        item::{self, parse_input},
        pointer::Pointer,
        schema::{Schema, SchemaNode},
        tree::{FlattenOptions, TreeNode, flatten_with},
        types::Affordance,
    },
    error::{ConfigError, Result},
    store::ConfigStore,
    validate::ViolationReport,
};

/// Callback invoked when a hooked node is selected.
pub type HookCallback = Arc<dyn Fn(&TreeNode, &Value) + Send + Sync>;

/// Hook registration for one node.
#[derive(Clone)]
pub struct ElemHook {
    /// Node the hook is attached to.
    pub pointer: Pointer,
    /// Callback executed when the node is selected.
    pub callback: HookCallback,
}

/// What a renderer gets for each node.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    /// The flattened node.
    pub node: &'a TreeNode,
    /// Whether the node is the current selection.
    pub selected: bool,
    /// Input widget to offer when the node is edited.
    pub affordance: Affordance<'a>,
    /// Schema `description`, or a placeholder when there is none.
    pub description: &'a str,
}

/// Editing state for one named document.
#[derive(Clone)]
pub struct EditSession<'s> {
    schema: &'s Schema,
    name: String,
    document: Value,
    nodes: Vec<TreeNode>,
    selected: Option<Pointer>,
    needs_save: bool,
    elem_hooks: Vec<ElemHook>,
    options: FlattenOptions,
}

impl<'s> EditSession<'s> {
    /// Start a session over an in-memory document.
    pub fn new(schema: &'s Schema, name: impl Into<String>, document: Value) -> Self {
        let mut session = Self {
            schema,
            name: name.into(),
            document,
            nodes: Vec::new(),
            selected: None,
            needs_save: false,
            elem_hooks: Vec::new(),
            options: FlattenOptions::default(),
        };
        session.refresh();
        session
    }

    /// Load document `name` from `store` and start a session over it.
    ///
    /// # Errors
    ///
    /// Any error of [`ConfigStore::load`].
    pub fn open(store: &ConfigStore, schema: &'s Schema, name: &str) -> Result<Self> {
        let document = store.load(name)?;
        Ok(Self::new(schema, name, document))
    }

    /// Name the document is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema the document is edited against.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The document being edited.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume the session, returning the document.
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Current flattened node list.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Whether there are edits not yet written to the store.
    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    /// Change the flatten options and re-flatten.
    pub fn set_options(&mut self, options: FlattenOptions) {
        self.options = options;
        self.refresh();
    }

    /// Register a hook fired whenever `pointer` is selected.
    pub fn add_hook(&mut self, hook: ElemHook) {
        self.elem_hooks.push(hook);
    }

    /// Rebuild the node list from the document.
    ///
    /// A selection whose node disappeared moves to its nearest surviving
    /// ancestor, or is cleared.
    pub fn refresh(&mut self) {
        self.nodes = flatten_with(&self.document, self.schema.root(), &self.options);
        let mut candidate = self.selected.take();
        while let Some(pointer) = candidate {
            if self.nodes.iter().any(|n| n.pointer == pointer) {
                self.selected = Some(pointer);
                break;
            }
            candidate = pointer.parent();
        }
    }

    /// Select the node at `pointer` and fire its hooks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if no such node is listed.
    pub fn select(&mut self, pointer: &Pointer) -> Result<&TreeNode> {
        let idx = self
            .nodes
            .iter()
            .position(|n| &n.pointer == pointer)
            .ok_or_else(|| ConfigError::not_found(format!("node {pointer}")))?;
        self.selected = Some(pointer.clone());

        let node = &self.nodes[idx];
        if let Some(value) = pointer.get(&self.document) {
            for hook in self.elem_hooks.iter().filter(|h| &h.pointer == pointer) {
                (hook.callback)(node, value);
            }
        }
        Ok(node)
    }

    /// The selected node, if any.
    pub fn selected(&self) -> Option<&TreeNode> {
        let pointer = self.selected.as_ref()?;
        self.nodes.iter().find(|n| &n.pointer == pointer)
    }

    /// Subschema governing `pointer`.
    pub fn schema_of(&self, pointer: &Pointer) -> &'s SchemaNode {
        self.schema.resolve(pointer)
    }

    /// Initial editor text for the value at `pointer`.
    pub fn edit_buffer(&self, pointer: &Pointer) -> Option<String> {
        pointer.get(&self.document).map(item::edit_buffer)
    }

    /// Parse `input` for the node at `pointer` and write it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TypeMismatch`] if the input does not parse for the
    /// node, or any error of [`EditSession::set_value`].
    pub fn set_from_input(&mut self, pointer: &Pointer, input: &str) -> Result<()> {
        let value = parse_input(self.schema_of(pointer), pointer, input)?;
        self.set_value(pointer, value)
    }

    /// Write `value` at `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if there is nowhere to write it.
    pub fn set_value(&mut self, pointer: &Pointer, value: Value) -> Result<()> {
        item::set_value(&mut self.document, pointer, value)?;
        self.needs_save = true;
        self.refresh();
        Ok(())
    }

    /// Append an element to the array at `pointer` and select it.
    ///
    /// # Errors
    ///
    /// See [`array::append`].
    pub fn append(&mut self, pointer: &Pointer) -> Result<Pointer> {
        let added = array::append(&mut self.document, self.schema.root(), pointer)?;
        self.needs_save = true;
        self.refresh();
        self.select(&added)?;
        Ok(added)
    }

    /// Remove the array element at `pointer`; the selection moves to the
    /// parent array.
    ///
    /// # Errors
    ///
    /// See [`array::remove`]. A refused removal changes nothing.
    pub fn remove(&mut self, pointer: &Pointer) -> Result<Pointer> {
        let parent = array::remove(&mut self.document, self.schema.root(), pointer)?;
        self.needs_save = true;
        self.selected = Some(parent.clone());
        self.refresh();
        Ok(parent)
    }

    /// Insert defaults for missing object properties.
    ///
    /// Returns how many values were inserted.
    pub fn fill_missing(&mut self) -> usize {
        let inserted = fill_missing(&mut self.document, self.schema.root());
        if inserted > 0 {
            self.needs_save = true;
            self.refresh();
        }
        inserted
    }

    /// Validate the current document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSchema`] if the schema cannot be used.
    pub fn validate(&self) -> Result<ViolationReport> {
        self.schema.validate(&self.document)
    }

    /// Write the document to `store` under the session's name.
    ///
    /// # Errors
    ///
    /// Any error of [`ConfigStore::save`].
    pub fn save(&mut self, store: &ConfigStore) -> Result<()> {
        store.save(&self.name, &self.document)?;
        self.needs_save = false;
        Ok(())
    }

    /// Make this document the active one, saving pending edits.
    ///
    /// The in-memory document is validated first; nothing is written when
    /// it fails.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ActivationRejected`] if the document does not
    /// validate, or any error of [`ConfigStore::save`] and
    /// [`ConfigStore::set_active`].
    pub fn activate(&mut self, store: &ConfigStore) -> Result<()> {
        let violations = self.validate()?;
        if !violations.is_empty() {
            warn!(
                "refusing to activate `{}`: {} violation(s)",
                self.name,
                violations.len()
            );
            return Err(ConfigError::ActivationRejected {
                name: self.name.clone(),
                violations,
            });
        }
        if self.needs_save {
            self.save(store)?;
        }
        store.set_active(&self.name, self.schema)
    }

    /// Hand every node, in order, to `callback`.
    pub fn render<F>(&self, mut callback: F)
    where
        F: FnMut(NodeView<'_>),
    {
        for node in &self.nodes {
            let sub = self.schema.resolve(&node.pointer);
            callback(NodeView {
                node,
                selected: self.selected.as_ref() == Some(&node.pointer),
                affordance: sub.affordance(),
                description: sub.description(),
            });
        }
    }
}
