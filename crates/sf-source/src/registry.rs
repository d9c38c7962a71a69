//! Metadata type registry.
//!
//! Maps a type name to its directory, file suffix and owning parent type.
//! The registry is a pure lookup: descriptors are never mutated once built.

use std::collections::HashMap;

use crate::error::{Error, ErrorKind, Result};

/// How a parent type lays out its child components in source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildLayout {
    /// The type has no child types.
    #[default]
    None,
    /// Each child lives in its own file under the parent's folder,
    /// e.g. `objects/Account/fields/Industry.field-meta.xml`.
    Decomposed,
    /// Children are entries inside the parent's single file,
    /// e.g. `<rules>` inside `workflows/Account.workflow-meta.xml`.
    Nested,
}

/// Static description of one metadata type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Directory in source format, and the element name children are
    /// nested under inside their parent's document.
    pub directory_name: String,
    pub suffix: String,
    pub parent: Option<String>,
    pub child_layout: ChildLayout,
}

impl TypeDescriptor {
    pub fn new(
        name: impl Into<String>,
        directory_name: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            directory_name: directory_name.into(),
            suffix: suffix.into(),
            parent: None,
            child_layout: ChildLayout::None,
        }
    }

    /// Declare this type as a child of `parent`.
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_child_layout(mut self, layout: ChildLayout) -> Self {
        self.child_layout = layout;
        self
    }
}

/// Lookup table of metadata types.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, usize>,
    by_suffix: HashMap<String, usize>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the metadata types handled by the CRUD read and upsert flows.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(
            TypeDescriptor::new("CustomObject", "objects", "object")
                .with_child_layout(ChildLayout::Decomposed),
        );
        for (name, directory, suffix) in [
            ("CustomField", "fields", "field"),
            ("RecordType", "recordTypes", "recordType"),
            ("ListView", "listViews", "listView"),
            ("ValidationRule", "validationRules", "validationRule"),
            ("WebLink", "webLinks", "webLink"),
            ("CompactLayout", "compactLayouts", "compactLayout"),
            ("FieldSet", "fieldSets", "fieldSet"),
            ("BusinessProcess", "businessProcesses", "businessProcess"),
            ("SharingReason", "sharingReasons", "sharingReason"),
            ("Index", "indexes", "index"),
        ] {
            registry.register(TypeDescriptor::new(name, directory, suffix).child_of("CustomObject"));
        }

        registry.register(
            TypeDescriptor::new("Workflow", "workflows", "workflow")
                .with_child_layout(ChildLayout::Nested),
        );
        for (name, directory, suffix) in [
            ("WorkflowRule", "rules", "rule"),
            ("WorkflowFieldUpdate", "fieldUpdates", "fieldUpdate"),
            ("WorkflowAlert", "alerts", "alert"),
            ("WorkflowTask", "tasks", "task"),
            ("WorkflowOutboundMessage", "outboundMessages", "outboundMessage"),
        ] {
            registry.register(TypeDescriptor::new(name, directory, suffix).child_of("Workflow"));
        }

        registry.register(
            TypeDescriptor::new("CustomObjectTranslation", "objectTranslations", "objectTranslation")
                .with_child_layout(ChildLayout::Decomposed),
        );
        registry.register(
            TypeDescriptor::new("CustomFieldTranslation", "fields", "fieldTranslation")
                .child_of("CustomObjectTranslation"),
        );

        registry.register(
            TypeDescriptor::new("Territory2Model", "territory2Models", "territory2Model")
                .with_child_layout(ChildLayout::Decomposed),
        );
        registry.register(
            TypeDescriptor::new("Territory2Rule", "rules", "territory2Rule").child_of("Territory2Model"),
        );

        for (name, directory, suffix) in [
            ("Profile", "profiles", "profile"),
            ("PermissionSet", "permissionsets", "permissionset"),
            ("Layout", "layouts", "layout"),
            ("CustomApplication", "applications", "app"),
            ("CustomMetadata", "customMetadata", "md"),
            ("CustomLabels", "labels", "labels"),
            ("Translations", "translations", "translation"),
            ("GlobalValueSet", "globalValueSets", "globalValueSet"),
            ("StandardValueSet", "standardValueSets", "standardValueSet"),
            ("Flow", "flows", "flow"),
            ("CustomTab", "tabs", "tab"),
            ("RemoteSiteSetting", "remoteSiteSettings", "remoteSite"),
        ] {
            registry.register(TypeDescriptor::new(name, directory, suffix));
        }

        registry
    }

    /// Add or replace a type.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        match self.by_name.get(&descriptor.name) {
            Some(&index) => {
                self.by_suffix.remove(&self.types[index].suffix);
                self.by_suffix.insert(descriptor.suffix.clone(), index);
                self.types[index] = descriptor;
            }
            None => {
                let index = self.types.len();
                self.by_name.insert(descriptor.name.clone(), index);
                self.by_suffix.insert(descriptor.suffix.clone(), index);
                self.types.push(descriptor);
            }
        }
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn get_type_by_name(&self, name: &str) -> Result<&TypeDescriptor> {
        self.find_type(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownType(name.to_string())))
    }

    /// The declared parent type of `name`, if any.
    pub fn get_parent_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.find_type(name)
            .and_then(|t| t.parent.as_deref())
            .and_then(|parent| self.find_type(parent))
    }

    pub fn get_type_by_suffix(&self, suffix: &str) -> Option<&TypeDescriptor> {
        self.by_suffix.get(suffix).map(|&i| &self.types[i])
    }

    /// Types declaring `parent` as their parent, in registration order.
    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a TypeDescriptor> + 'a {
        self.types
            .iter()
            .filter(move |t| t.parent.as_deref() == Some(parent))
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }
}
