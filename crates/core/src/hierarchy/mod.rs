//! Classification hierarchies (domain, kind and trait DAGs).
//!
//! A hierarchy is a directed acyclic graph of tags with eagerly maintained
//! ancestor and descendant closures, so `isa` queries are a set lookup.
//! Edges from declarative parent maps are applied in sorted order, which makes
//! failures on malformed input (cycles, self-edges) reproducible.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{MoneyError, MoneyResult};

/// One parent or several, as written in a declarative parent map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parents {
    /// A single parent tag.
    One(String),
    /// Several parent tags.
    Many(Vec<String>),
}

impl Parents {
    fn sorted(&self) -> BTreeSet<&str> {
        match self {
            Self::One(p) => std::iter::once(p.as_str()).collect(),
            Self::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<Vec<String>> for Parents {
    fn from(parents: Vec<String>) -> Self {
        Self::Many(parents)
    }
}

/// A tag DAG with ancestor/descendant closures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    parents: BTreeMap<String, BTreeSet<String>>,
    ancestors: BTreeMap<String, BTreeSet<String>>,
    descendants: BTreeMap<String, BTreeSet<String>>,
}

impl Hierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hierarchy from a `tag -> parents` map.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on a self-edge or a cycle; the first
    /// offending edge in sorted order is reported.
    pub fn from_parent_map<P>(map: &BTreeMap<String, P>) -> MoneyResult<Self>
    where
        P: Clone + Into<Parents>,
    {
        let mut hierarchy = Self::new();
        for (child, parents) in map {
            let parents: Parents = parents.clone().into();
            for parent in parents.sorted() {
                hierarchy.derive_in_place(child, parent)?;
            }
        }
        Ok(hierarchy)
    }

    /// Returns a new hierarchy with the `child -> parent` edge added.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if the edge would create a cycle.
    pub fn derive(&self, child: &str, parent: &str) -> MoneyResult<Self> {
        let mut next = self.clone();
        next.derive_in_place(child, parent)?;
        Ok(next)
    }

    fn derive_in_place(&mut self, child: &str, parent: &str) -> MoneyResult<()> {
        if child == parent {
            return Err(MoneyError::validation(format!(
                "Hierarchy tag {child} cannot be its own parent"
            )));
        }
        if self.parents.get(child).is_some_and(|ps| ps.contains(parent)) {
            return Ok(());
        }
        if self.isa(parent, child) {
            return Err(MoneyError::validation(format!(
                "Cyclic hierarchy: {parent} already derives from {child}"
            )));
        }

        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());

        let mut lower: BTreeSet<String> = self.descendants.get(child).cloned().unwrap_or_default();
        lower.insert(child.to_string());
        let mut upper: BTreeSet<String> = self.ancestors.get(parent).cloned().unwrap_or_default();
        upper.insert(parent.to_string());

        for tag in &lower {
            self.ancestors
                .entry(tag.clone())
                .or_default()
                .extend(upper.iter().cloned());
        }
        for tag in &upper {
            self.descendants
                .entry(tag.clone())
                .or_default()
                .extend(lower.iter().cloned());
        }
        Ok(())
    }

    /// Is-a query: equality short-circuits before the closure lookup.
    #[must_use]
    pub fn isa(&self, child: &str, parent: &str) -> bool {
        child == parent
            || self
                .ancestors
                .get(child)
                .is_some_and(|ancestors| ancestors.contains(parent))
    }

    /// Direct parents of a tag.
    pub fn parents<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.parents.get(tag).into_iter().flatten().map(String::as_str)
    }

    /// All ancestors of a tag.
    pub fn ancestors<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.ancestors.get(tag).into_iter().flatten().map(String::as_str)
    }

    /// All descendants of a tag.
    pub fn descendants<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.descendants.get(tag).into_iter().flatten().map(String::as_str)
    }

    /// Returns true if the hierarchy has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Declarative parent maps for the three classification hierarchies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchySpec {
    /// Domain tag parents.
    #[serde(default)]
    pub domain: BTreeMap<String, Parents>,
    /// Kind tag parents.
    #[serde(default)]
    pub kind: BTreeMap<String, Parents>,
    /// Trait tag parents.
    #[serde(default)]
    pub traits: BTreeMap<String, Parents>,
}

/// The three classification hierarchies owned by a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchies {
    /// Domain DAG (tags upper-cased like currency domains).
    pub domain: Hierarchy,
    /// Kind DAG.
    pub kind: Hierarchy,
    /// Trait DAG.
    pub traits: Hierarchy,
}

impl Hierarchies {
    /// Wraps prebuilt graphs.
    #[must_use]
    pub fn new(domain: Hierarchy, kind: Hierarchy, traits: Hierarchy) -> Self {
        Self {
            domain,
            kind,
            traits,
        }
    }

    /// Builds all three graphs from declarative parent maps.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` naming the malformed hierarchy.
    pub fn from_spec(spec: &HierarchySpec) -> MoneyResult<Self> {
        let domain_upper: BTreeMap<String, Parents> = spec
            .domain
            .iter()
            .map(|(child, parents)| {
                let upper = parents
                    .sorted()
                    .into_iter()
                    .map(str::to_ascii_uppercase)
                    .collect::<Vec<_>>();
                (child.to_ascii_uppercase(), Parents::Many(upper))
            })
            .collect();

        Ok(Self {
            domain: Hierarchy::from_parent_map(&domain_upper).map_err(|e| context("domain", e))?,
            kind: Hierarchy::from_parent_map(&spec.kind).map_err(|e| context("kind", e))?,
            traits: Hierarchy::from_parent_map(&spec.traits).map_err(|e| context("traits", e))?,
        })
    }
}

fn context(name: &str, err: MoneyError) -> MoneyError {
    match err {
        MoneyError::Validation(msg) => MoneyError::validation(format!("{name} hierarchy: {msg}")),
        other => other,
    }
}
