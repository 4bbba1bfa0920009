//! The imported technical debt model.
//!
//! The [`DebtModel`] owns every characteristic in a single arena. Children
//! are referenced by arena index and parents by a non-owning index back
//! into the same arena, so the tree holds no ownership cycles. A key index
//! gives O(1) lookup of any node.

use std::{collections::HashMap, num::NonZeroUsize};

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};

use crate::domain::{
    characteristic::CharacteristicData, work_unit::UnitRatios, Characteristic,
    RemediationFunction, Requirement,
};

/// Index of a characteristic in the model's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CharacteristicId(usize);

/// A hierarchy of characteristics and the remediation requirements attached
/// to them.
///
/// Built by the importer and read-only afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DebtModel {
    /// Every characteristic, in creation order.
    nodes: Vec<CharacteristicData>,

    /// Root characteristics, in display order.
    roots: Vec<CharacteristicId>,

    /// Lookup from key to characteristic.
    ///
    /// When a key occurs more than once the latest node wins.
    index: HashMap<String, CharacteristicId>,
}

impl DebtModel {
    /// Appends a root characteristic. Its order is its position among the
    /// roots, starting at 1.
    pub(crate) fn add_root(&mut self, key: String, name: String) -> CharacteristicId {
        let order = NonZeroUsize::new(self.roots.len() + 1);
        let id = self.insert(key, name, order, None);
        self.roots.push(id);
        id
    }

    /// Appends a sub-characteristic to `parent`.
    pub(crate) fn add_child(
        &mut self,
        parent: CharacteristicId,
        key: String,
        name: String,
    ) -> CharacteristicId {
        let id = self.insert(key, name, None, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Appends a requirement to a characteristic.
    pub(crate) fn add_requirement(&mut self, owner: CharacteristicId, requirement: Requirement) {
        self.nodes[owner.0].requirements.push(requirement);
    }

    fn insert(
        &mut self,
        key: String,
        name: String,
        order: Option<NonZeroUsize>,
        parent: Option<CharacteristicId>,
    ) -> CharacteristicId {
        let id = CharacteristicId(self.nodes.len());
        self.index.insert(key.clone(), id);
        self.nodes.push(CharacteristicData {
            key,
            name,
            order,
            parent,
            children: Vec::new(),
            requirements: Vec::new(),
        });
        id
    }

    pub(crate) fn data(&self, id: CharacteristicId) -> &CharacteristicData {
        &self.nodes[id.0]
    }

    /// Whether a characteristic with this key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Looks a characteristic up by key, at any depth.
    #[must_use]
    pub fn characteristic_by_key(&self, key: &str) -> Option<Characteristic<'_>> {
        self.index
            .get(key)
            .map(|&id| Characteristic::new(self, id))
    }

    /// The root characteristics, in display order.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = Characteristic<'_>> {
        self.roots.iter().map(|&id| Characteristic::new(self, id))
    }

    /// Every characteristic, depth-first, parents before children.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Characteristic<'_>> {
        self.roots()
            .flat_map(|root| root.descendants())
            .collect()
    }

    /// Every requirement, with the characteristic that holds it, in the
    /// same order as [`DebtModel::characteristics`].
    pub fn requirements(&self) -> impl Iterator<Item = (Characteristic<'_>, &Requirement)> {
        self.characteristics().into_iter().flat_map(|characteristic| {
            characteristic
                .requirements()
                .iter()
                .map(move |requirement| (characteristic, requirement))
        })
    }

    /// The keys of the key index.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The number of characteristics, at every depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the model has no characteristics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total remediation minutes of every requirement's factor and offset,
    /// one violation each, under the given ratios.
    ///
    /// Useful as a rough size of the model.
    #[must_use]
    pub fn unit_cost_minutes(&self, ratios: UnitRatios) -> f64 {
        self.requirements()
            .map(|(_, requirement)| {
                requirement.factor().minutes_with(ratios) + requirement.offset().minutes_with(ratios)
            })
            .sum()
    }

    /// A digest of the model's structure.
    ///
    /// Two models have the same fingerprint when they have the same
    /// characteristics (keys, names, orders, nesting) and requirements in the
    /// same order, with costs compared the way [`crate::WorkUnit`] compares
    /// them.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for
    /// this data structure).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct NodeData<'a> {
            key: &'a str,
            name: &'a str,
            order: Option<u64>,
            requirements: Vec<RequirementData<'a>>,
            children: Vec<NodeData<'a>>,
        }

        #[derive(BorshSerialize)]
        struct RequirementData<'a> {
            repository: &'a str,
            key: &'a str,
            function: RemediationFunction,
            factor_minutes: u128,
            offset_minutes: u128,
        }

        fn node_data(characteristic: Characteristic<'_>) -> NodeData<'_> {
            NodeData {
                key: characteristic.key(),
                name: characteristic.name(),
                order: characteristic
                    .order()
                    .and_then(|order| u64::try_from(order.get()).ok()),
                requirements: characteristic
                    .requirements()
                    .iter()
                    .map(|requirement| RequirementData {
                        repository: requirement.rule().repository(),
                        key: requirement.rule().key(),
                        function: requirement.function(),
                        factor_minutes: requirement.factor().scaled_minutes(UnitRatios::STANDARD),
                        offset_minutes: requirement.offset().scaled_minutes(UnitRatios::STANDARD),
                    })
                    .collect(),
                children: characteristic.children().map(node_data).collect(),
            }
        }

        let roots: Vec<NodeData<'_>> = self.roots().map(node_data).collect();

        // encode using [borsh](https://borsh.io/)
        let encoded = borsh::to_vec(&roots).expect("this should never fail");

        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::{RuleReference, TimeUnit, WorkUnit};

    fn requirement(key: &str, hours: u64) -> Requirement {
        Requirement::new(
            RuleReference::new("checkstyle", key).unwrap(),
            RemediationFunction::Linear,
            WorkUnit::whole(hours, TimeUnit::Hours).unwrap(),
            WorkUnit::zero(TimeUnit::Hours),
        )
    }

    /// PORTABILITY(COMPILER, HARDWARE), MAINTAINABILITY(READABILITY)
    fn sample() -> DebtModel {
        let mut model = DebtModel::default();
        let portability = model.add_root("PORTABILITY".into(), "Portability".into());
        let compiler = model.add_child(portability, "COMPILER".into(), "Compiler".into());
        model.add_child(portability, "HARDWARE".into(), "Hardware".into());
        let maintainability = model.add_root("MAINTAINABILITY".into(), "Maintainability".into());
        let readability = model.add_child(maintainability, "READABILITY".into(), "Readability".into());
        model.add_requirement(compiler, requirement("Regexp", 1));
        model.add_requirement(readability, requirement("LineLength", 2));
        model.add_requirement(readability, requirement("MagicNumber", 3));
        model
    }

    #[test]
    fn roots_are_ordered_from_one() {
        let model = sample();
        let roots: Vec<_> = model
            .roots()
            .map(|root| (root.key(), root.order().map(NonZeroUsize::get)))
            .collect();
        assert_eq!(
            roots,
            vec![("PORTABILITY", Some(1)), ("MAINTAINABILITY", Some(2))]
        );
    }

    #[test]
    fn only_roots_carry_an_order() {
        let model = sample();
        let compiler = model.characteristic_by_key("COMPILER").unwrap();
        assert_eq!(compiler.order(), None);
        assert!(!compiler.is_root());
        assert_eq!(compiler.depth(), 1);
    }

    #[test]
    fn parents_are_navigable() {
        let model = sample();
        let hardware = model.characteristic_by_key("HARDWARE").unwrap();
        let parent = hardware.parent().unwrap();
        assert_eq!(parent.key(), "PORTABILITY");
        assert_eq!(parent, model.characteristic_by_key("PORTABILITY").unwrap());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn index_covers_every_reachable_key() {
        let model = sample();
        let indexed: BTreeSet<_> = model.keys().collect();
        let reachable: BTreeSet<_> = model
            .characteristics()
            .into_iter()
            .map(|characteristic| characteristic.key())
            .collect();
        assert_eq!(indexed, reachable);
        assert_eq!(model.len(), 5);
    }

    #[test]
    fn traversal_is_depth_first() {
        let model = sample();
        let keys: Vec<_> = model
            .characteristics()
            .into_iter()
            .map(|characteristic| characteristic.key())
            .collect();
        assert_eq!(
            keys,
            vec![
                "PORTABILITY",
                "COMPILER",
                "HARDWARE",
                "MAINTAINABILITY",
                "READABILITY"
            ]
        );

        let rules: Vec<_> = model
            .requirements()
            .map(|(owner, requirement)| (owner.key(), requirement.rule().key()))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("COMPILER", "Regexp"),
                ("READABILITY", "LineLength"),
                ("READABILITY", "MagicNumber"),
            ]
        );
    }

    #[test]
    fn duplicate_key_resolves_to_latest_node() {
        let mut model = DebtModel::default();
        let first = model.add_root("EFFICIENCY".into(), "Efficiency".into());
        model.add_child(first, "MEMORY".into(), "Memory".into());
        model.add_root("EFFICIENCY".into(), "Efficiency again".into());

        assert_eq!(model.roots().len(), 2);
        assert_eq!(
            model.characteristic_by_key("EFFICIENCY").unwrap().name(),
            "Efficiency again"
        );
        assert_eq!(model.keys().count(), 2);
    }

    #[test]
    fn unit_cost_uses_given_ratios() {
        let model = sample();
        let minutes = model.unit_cost_minutes(UnitRatios::STANDARD);
        assert!((minutes - 360.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
    }

    #[test]
    fn fingerprint_tracks_structure() {
        let mut other = sample();
        let compiler = other.index["COMPILER"];
        other.add_requirement(compiler, requirement("Other", 1));
        assert_ne!(sample().fingerprint(), other.fingerprint());
    }

    #[test]
    fn fingerprint_compares_costs_by_duration() {
        let mut in_hours = DebtModel::default();
        let root = in_hours.add_root("A".into(), "A".into());
        in_hours.add_requirement(root, requirement("Regexp", 8));

        let mut in_days = DebtModel::default();
        let root = in_days.add_root("A".into(), "A".into());
        in_days.add_requirement(
            root,
            Requirement::new(
                RuleReference::new("checkstyle", "Regexp").unwrap(),
                RemediationFunction::Linear,
                WorkUnit::whole(1, TimeUnit::Days).unwrap(),
                WorkUnit::zero(TimeUnit::Days),
            ),
        );

        assert_eq!(in_hours.fingerprint(), in_days.fingerprint());
    }
}
