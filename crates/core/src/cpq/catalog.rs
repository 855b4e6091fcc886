use std::collections::HashMap;

use crate::domain::material::{Material, MaterialId};

/// Read-only view over collaborator-supplied materials.
pub trait MaterialLookup {
    fn find_material(&self, id: &MaterialId) -> Option<&Material>;
}

#[derive(Clone, Debug, Default)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
}

impl MaterialCatalog {
    pub fn new(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl MaterialLookup for MaterialCatalog {
    fn find_material(&self, id: &MaterialId) -> Option<&Material> {
        self.materials.iter().find(|material| &material.id == id)
    }
}

impl MaterialLookup for HashMap<MaterialId, Material> {
    fn find_material(&self, id: &MaterialId) -> Option<&Material> {
        self.get(id)
    }
}

impl FromIterator<Material> for MaterialCatalog {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
