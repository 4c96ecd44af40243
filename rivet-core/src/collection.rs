use crate::Entity;
use std::{ops::Index, rc::Rc, slice};

/// Ordered, fixed length sequence of materialized entities.
#[derive(Default, Debug, Clone)]
pub struct Collection(Rc<[Entity]>);

impl Collection {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self(entities.into())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.0.get(index)
    }
    pub fn first(&self) -> Option<&Entity> {
        self.0.first()
    }
    pub fn iter(&self) -> slice::Iter<'_, Entity> {
        self.0.iter()
    }
    pub fn as_slice(&self) -> &[Entity] {
        &self.0
    }
}

impl Index<usize> for Collection {
    type Output = Entity;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entity;
    type IntoIter = slice::Iter<'a, Entity>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.to_vec().into_iter()
    }
}

impl FromIterator<Entity> for Collection {
    fn from_iter<T: IntoIterator<Item = Entity>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
