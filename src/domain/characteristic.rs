// Characteristic - a borrowed view of a node of the debt model.

use std::{fmt, num::NonZeroUsize};

use crate::domain::{model::CharacteristicId, DebtModel, Requirement};

/// Stored data of one characteristic. Owned by the [`DebtModel`] arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CharacteristicData {
    pub(crate) key: String,
    pub(crate) name: String,
    pub(crate) order: Option<NonZeroUsize>,
    pub(crate) parent: Option<CharacteristicId>,
    pub(crate) children: Vec<CharacteristicId>,
    pub(crate) requirements: Vec<Requirement>,
}

/// A borrowed view of a characteristic of a [`DebtModel`].
///
/// Characteristics are nodes of the remediation taxonomy (e.g.
/// "Maintainability" or its sub-characteristic "Readability"). The model
/// owns every node; this view gives read-only access to one of them and
/// navigation to its parent and children.
#[derive(Clone, Copy)]
pub struct Characteristic<'a> {
    model: &'a DebtModel,
    id: CharacteristicId,
}

impl<'a> Characteristic<'a> {
    pub(crate) const fn new(model: &'a DebtModel, id: CharacteristicId) -> Self {
        Self { model, id }
    }

    fn data(&self) -> &'a CharacteristicData {
        self.model.data(self.id)
    }

    /// The characteristic's key, unique within a well-formed model.
    #[must_use]
    pub fn key(&self) -> &'a str {
        &self.data().key
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// The display position of a root characteristic, starting at 1.
    ///
    /// Always `None` below the root level.
    #[must_use]
    pub fn order(&self) -> Option<NonZeroUsize> {
        self.data().order
    }

    /// The enclosing characteristic, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| Self::new(self.model, id))
    }

    /// Whether this is a root characteristic.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.data().parent.is_none()
    }

    /// The sub-characteristics, in document order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Self> + 'a {
        let model = self.model;
        self.data()
            .children
            .iter()
            .map(move |&id| Self::new(model, id))
    }

    /// The requirements attached directly to this characteristic, in
    /// document order.
    #[must_use]
    pub fn requirements(&self) -> &'a [Requirement] {
        &self.data().requirements
    }

    /// The number of ancestors (zero for a root).
    #[must_use]
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), Self::parent).count()
    }

    /// This characteristic and everything below it, depth-first, parents
    /// before children.
    #[must_use]
    pub fn descendants(&self) -> Vec<Self> {
        let mut found = Vec::new();
        let mut stack = vec![*self];
        while let Some(next) = stack.pop() {
            found.push(next);
            let children: Vec<_> = next.children().collect();
            stack.extend(children.into_iter().rev());
        }
        found
    }
}

impl PartialEq for Characteristic<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.model, other.model) && self.id == other.id
    }
}

impl Eq for Characteristic<'_> {}

impl fmt::Debug for Characteristic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("key", &self.key())
            .field("name", &self.name())
            .field("order", &self.order())
            .field("children", &self.data().children.len())
            .field("requirements", &self.requirements().len())
            .finish()
    }
}
