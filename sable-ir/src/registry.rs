#![forbid(unsafe_code)]

use std::collections::HashMap;

use thiserror::Error;

use crate::ir::{ClassId, CompilationUnit};
use crate::name::QualifiedName;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("class type '{0}' is already registered")]
    Duplicate(QualifiedName),
}

/// A class type and the compilation unit that owns its methods.
#[derive(Clone, Debug)]
pub struct ClassType {
    pub name: QualifiedName,
    pub unit: CompilationUnit,
}

/// Class types keyed by qualified name.
///
/// Deliberately not a process-wide global: every import call receives the
/// registry it should resolve against, so tests can run against isolated
/// registries. Callers that share one registry across threads must
/// serialize access themselves.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: Vec<ClassType>,
    by_name: HashMap<QualifiedName, ClassId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &QualifiedName) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn create(&mut self, name: QualifiedName) -> Result<ClassId, RegistryError> {
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.classes.push(ClassType {
            name,
            unit: CompilationUnit::new(),
        });
        Ok(id)
    }

    pub fn class(&self, id: ClassId) -> &ClassType {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassType {
        &mut self.classes[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassType)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let mut reg = TypeRegistry::new();
        let q = QualifiedName::from_dotted("__sable__.A").unwrap();
        let id = reg.create(q.clone()).unwrap();
        assert_eq!(reg.get(&q), Some(id));
        assert_eq!(reg.class(id).name, q);
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut reg = TypeRegistry::new();
        let q = QualifiedName::from_dotted("__sable__.A").unwrap();
        reg.create(q.clone()).unwrap();
        let err = reg.create(q).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
    }

    #[test]
    fn unregistered_name_is_none() {
        let reg = TypeRegistry::new();
        let q = QualifiedName::from_dotted("__sable__.Missing").unwrap();
        assert_eq!(reg.get(&q), None);
    }
}
