//! In-memory namespace.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::*;

use super::{Name, Namespace, SonarObject};
use crate::common::NamespaceError;
use crate::protocol::{Message, MessageEncoder};

/// Creates a new object of a registered type from its name
pub type ObjectFactory = Box<dyn Fn(&str) -> Arc<dyn SonarObject> + Send + Sync>;

/// Plain object with a type, a name and notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicObject {
    type_n: String,
    name: String,
    notes: Option<String>,
}

impl BasicObject {
    pub fn new(type_n: &str, name: &str) -> Self {
        BasicObject {
            type_n: type_n.to_string(),
            name: name.to_string(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Get a factory creating objects of one type
    pub fn factory(type_n: &str) -> ObjectFactory {
        let type_n = type_n.to_string();
        Box::new(move |name: &str| -> Arc<dyn SonarObject> {
            Arc::new(BasicObject::new(&type_n, name))
        })
    }
}

impl SonarObject for BasicObject {
    fn type_name(&self) -> &str {
        &self.type_n
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

struct TypeNode {
    factory: ObjectFactory,
    objects: BTreeMap<String, Arc<dyn SonarObject>>,
}

/// Namespace holding every object in memory, ordered by name.
#[derive(Default)]
pub struct MemoryNamespace {
    types: RwLock<BTreeMap<String, TypeNode>>,
}

impl MemoryNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, TypeNode>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, TypeNode>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a type; registering it again replaces its factory.
    pub fn register_type(&self, type_n: &str, factory: ObjectFactory) {
        let mut types = self.write();
        match types.get_mut(type_n) {
            Some(node) => node.factory = factory,
            None => {
                types.insert(
                    type_n.to_string(),
                    TypeNode {
                        factory,
                        objects: BTreeMap::new(),
                    },
                );
            }
        }
    }

    /// Get the registered type names
    pub fn type_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Create and add an object from an object name.
    pub fn create_object(&self, name: &Name) -> Result<Arc<dyn SonarObject>, NamespaceError> {
        if !name.is_object() {
            return Err(NamespaceError::NameInvalid(name.to_string()));
        }
        let mut types = self.write();
        let node = types
            .get_mut(name.type_part())
            .ok_or_else(|| NamespaceError::NameUnknown(name.to_string()))?;
        if node.objects.contains_key(name.object_part()) {
            return Err(NamespaceError::NameExists(name.to_string()));
        }
        let obj = (node.factory)(name.object_part());
        node.objects.insert(name.object_part().to_string(), obj.clone());
        debug!("created {}", name);
        Ok(obj)
    }

    /// Add an existing object under its type.
    pub fn add_object(&self, obj: Arc<dyn SonarObject>) -> Result<(), NamespaceError> {
        let mut types = self.write();
        let path = format!("{}/{}", obj.type_name(), obj.name());
        let node = types
            .get_mut(obj.type_name())
            .ok_or_else(|| NamespaceError::NameUnknown(path.clone()))?;
        if node.objects.contains_key(obj.name()) {
            return Err(NamespaceError::NameExists(path));
        }
        node.objects.insert(obj.name().to_string(), obj);
        Ok(())
    }

    /// Remove an object by name.
    pub fn remove_object(&self, name: &Name) -> Result<Arc<dyn SonarObject>, NamespaceError> {
        if !name.is_object() {
            return Err(NamespaceError::NameInvalid(name.to_string()));
        }
        self.write()
            .get_mut(name.type_part())
            .and_then(|node| node.objects.remove(name.object_part()))
            .ok_or_else(|| NamespaceError::NameUnknown(name.to_string()))
    }

    /// Encode the part of the namespace selected by a name.
    ///
    /// The root lists every type; a type lists its objects between TYPE
    /// records; an object lists itself.
    pub fn enumerate(&self, out: &mut MessageEncoder, name: &Name) -> Result<(), NamespaceError> {
        let types = self.read();
        if name.is_root() {
            for type_n in types.keys() {
                out.encode_name(Message::Type, type_n);
            }
            out.encode_name(Message::Type, "");
        } else if name.is_type() {
            let node = types
                .get(name.type_part())
                .ok_or_else(|| NamespaceError::NameUnknown(name.to_string()))?;
            out.encode_name(Message::Type, name.type_part());
            for obj in node.objects.keys() {
                out.encode_name(Message::Object, obj);
            }
            out.encode_name(Message::Type, "");
        } else if name.is_object() {
            let found = types
                .get(name.type_part())
                .is_some_and(|node| node.objects.contains_key(name.object_part()));
            if !found {
                return Err(NamespaceError::NameUnknown(name.to_string()));
            }
            out.encode_name(Message::Object, name.as_str());
        } else {
            return Err(NamespaceError::NameInvalid(name.to_string()));
        }
        Ok(())
    }
}

impl Namespace for MemoryNamespace {
    fn lookup_object(&self, type_n: &str, name: &str) -> Option<Arc<dyn SonarObject>> {
        self.read()
            .get(type_n)
            .and_then(|node| node.objects.get(name).cloned())
    }

    fn iterate(&self, type_n: &str) -> Vec<Arc<dyn SonarObject>> {
        self.read()
            .get(type_n)
            .map(|node| node.objects.values().cloned().collect())
            .unwrap_or_default()
    }

    fn count(&self, type_n: &str) -> usize {
        self.read().get(type_n).map_or(0, |node| node.objects.len())
    }
}
