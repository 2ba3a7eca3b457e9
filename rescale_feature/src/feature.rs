// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared features and the ordered set the interaction rescales.
//!
//! A [`Feature`] is a cheap handle: cloning it shares the same geometry and
//! attributes, so the interaction mutates caller-owned data in place. Every
//! mutation bumps the feature's revision, which hosts can use to detect
//! geometry changes between lifecycle events.
//!
//! [`FeatureSet`] is an ordered list of such handles with a membership
//! revision. It is shared the same way, so a host component can drive the
//! membership while the interaction observes it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use kurbo::{Point, Rect};

use crate::geometry::Geometry;
use crate::property::ObserverKey;

static NEXT_FEATURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Feature`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(u64);

impl FeatureId {
    fn next() -> Self {
        Self(NEXT_FEATURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A value stored in a feature attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// A flag.
    Bool(bool),
    /// A number.
    Number(f64),
    /// Free text.
    Text(String),
}

impl AttributeValue {
    /// Returns the number if this is [`AttributeValue::Number`].
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the flag if this is [`AttributeValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

#[derive(Debug)]
struct FeatureData {
    geometry: Geometry,
    attributes: HashMap<String, AttributeValue>,
    revision: u64,
}

/// A geometry plus attributes, shared by reference.
///
/// Equality is identity: two handles are equal when they point at the same
/// feature.
///
/// ```
/// use kurbo::Point;
/// use rescale_feature::{Feature, Geometry};
///
/// let feature = Feature::new(Geometry::Point(Point::new(1.0, 2.0)));
/// let alias = feature.clone();
///
/// alias.update_geometry(|geom| geom.scale(2.0, 2.0, Some(Point::ZERO)));
/// assert_eq!(feature.geometry().point(), Some(Point::new(2.0, 4.0)));
/// assert_eq!(feature.revision(), 1);
/// ```
#[derive(Clone)]
pub struct Feature {
    id: FeatureId,
    data: Rc<RefCell<FeatureData>>,
}

impl Feature {
    /// Creates a feature without attributes.
    #[must_use]
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self::with_attributes(geometry, core::iter::empty::<(String, AttributeValue)>())
    }

    /// Creates a feature with initial attributes.
    #[must_use]
    pub fn with_attributes<K, V>(
        geometry: impl Into<Geometry>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            id: FeatureId::next(),
            data: Rc::new(RefCell::new(FeatureData {
                geometry: geometry.into(),
                attributes,
                revision: 0,
            })),
        }
    }

    /// Returns this feature's identity.
    #[must_use]
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Borrows the geometry.
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`Feature::update_geometry`] on the same feature.
    #[must_use]
    pub fn geometry(&self) -> Ref<'_, Geometry> {
        Ref::map(self.data.borrow(), |data| &data.geometry)
    }

    /// Replaces the geometry.
    pub fn set_geometry(&self, geometry: impl Into<Geometry>) {
        let mut data = self.data.borrow_mut();
        data.geometry = geometry.into();
        data.revision += 1;
    }

    /// Mutates the geometry in place and bumps the revision.
    pub fn update_geometry<R>(&self, f: impl FnOnce(&mut Geometry) -> R) -> R {
        let mut data = self.data.borrow_mut();
        let result = f(&mut data.geometry);
        data.revision += 1;
        result
    }

    /// Returns the geometry extent.
    #[must_use]
    pub fn extent(&self) -> Option<Rect> {
        self.data.borrow().geometry.extent()
    }

    /// Returns a copy of the attribute stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<AttributeValue> {
        self.data.borrow().attributes.get(key).cloned()
    }

    /// Stores an attribute; the revision only moves when the value changes.
    pub fn set(&self, key: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        let mut data = self.data.borrow_mut();
        if data.attributes.get(key) == Some(&value) {
            return;
        }
        data.attributes.insert(key.into(), value);
        data.revision += 1;
    }

    /// Returns `true` when the attribute under `key` is `Bool(true)`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.data
            .borrow()
            .attributes
            .get(key)
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false)
    }

    /// Returns the number of changes applied to this feature.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.data.borrow().revision
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Feature {}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Feature")
            .field("id", &self.id)
            .field("geometry", &data.geometry)
            .field("attributes", &data.attributes)
            .field("revision", &data.revision)
            .finish()
    }
}

/// What a membership mutation did to a [`FeatureSet`].
#[derive(Clone, Debug, PartialEq)]
pub enum MembershipChange {
    /// Features were inserted, in insertion order.
    Added(Vec<Feature>),
    /// Features were removed, in their former order.
    Removed(Vec<Feature>),
}

impl MembershipChange {
    /// Returns the features the change touched.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        match self {
            Self::Added(features) | Self::Removed(features) => features,
        }
    }
}

/// Callback run after a [`FeatureSet`] membership change.
pub type MembershipObserver = Box<dyn FnMut(&FeatureSet, &MembershipChange)>;

#[derive(Debug, Default)]
struct Members {
    items: Vec<Feature>,
    revision: u64,
}

#[derive(Default)]
struct SetInner {
    members: RefCell<Members>,
    observers: RefCell<Vec<(ObserverKey, MembershipObserver)>>,
    next_key: Cell<u64>,
}

/// Ordered collection of features targeted by a rescale.
///
/// Like [`Feature`], a set is a shared handle: clones see and drive the same
/// membership, and equality is identity. Duplicates are allowed, as in any
/// host feature collection. Each successful insertion or removal bumps the
/// membership revision and then runs the observers once.
///
/// ```
/// use kurbo::Point;
/// use rescale_feature::{Feature, FeatureSet};
///
/// let set = FeatureSet::new();
/// let alias = set.clone();
/// alias.push(Feature::new(Point::new(4.0, 0.0)));
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.centroid(), Some(Point::new(4.0, 0.0)));
/// ```
#[derive(Clone, Default)]
pub struct FeatureSet {
    inner: Rc<SetInner>,
}

impl FeatureSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if both handles share the same membership.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.members.borrow().items.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.members.borrow().items.is_empty()
    }

    /// Iterates the members in insertion order.
    ///
    /// The iterator yields handles and reads the membership lazily, so the set
    /// may be mutated while iterating.
    pub fn iter(&self) -> FeatureSetIter<'_> {
        FeatureSetIter {
            set: self,
            index: 0,
        }
    }

    /// Returns the members as a vector of handles.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Feature> {
        self.inner.members.borrow().items.clone()
    }

    /// Returns the member at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Feature> {
        self.inner.members.borrow().items.get(index).cloned()
    }

    /// Returns `true` if a feature with `id` is a member.
    #[must_use]
    pub fn contains(&self, id: FeatureId) -> bool {
        self.position(id).is_some()
    }

    /// Returns the index of the first member with `id`.
    #[must_use]
    pub fn position(&self, id: FeatureId) -> Option<usize> {
        self.inner
            .members
            .borrow()
            .items
            .iter()
            .position(|feature| feature.id() == id)
    }

    /// Returns the membership revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.members.borrow().revision
    }

    /// Appends a feature.
    pub fn push(&self, feature: Feature) {
        self.mutate(|items| {
            items.push(feature.clone());
            Some(MembershipChange::Added(vec![feature]))
        });
    }

    /// Inserts a feature at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, feature: Feature) {
        self.mutate(|items| {
            let index = index.min(items.len());
            items.insert(index, feature.clone());
            Some(MembershipChange::Added(vec![feature]))
        });
    }

    /// Appends several features as a single change.
    pub fn extend(&self, features: impl IntoIterator<Item = Feature>) {
        let added: Vec<Feature> = features.into_iter().collect();
        if added.is_empty() {
            return;
        }
        self.mutate(|items| {
            items.extend(added.iter().cloned());
            Some(MembershipChange::Added(added))
        });
    }

    /// Removes the first member with `id`.
    pub fn remove(&self, id: FeatureId) -> Option<Feature> {
        let index = self.position(id)?;
        self.remove_at(index)
    }

    /// Removes and returns the last member.
    pub fn pop(&self) -> Option<Feature> {
        let last = self.len().checked_sub(1)?;
        self.remove_at(last)
    }

    /// Removes every member, returning them in order.
    pub fn clear(&self) -> Vec<Feature> {
        let removed = self.mutate(|items| {
            if items.is_empty() {
                return None;
            }
            Some(MembershipChange::Removed(core::mem::take(items)))
        });
        match removed {
            Some(MembershipChange::Removed(features)) => features,
            _ => Vec::new(),
        }
    }

    /// Returns the combined extent of every member geometry.
    #[must_use]
    pub fn extent(&self) -> Option<Rect> {
        self.inner
            .members
            .borrow()
            .items
            .iter()
            .filter_map(Feature::extent)
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Returns the center of the combined extent, or `None` when empty.
    #[must_use]
    pub fn centroid(&self) -> Option<Point> {
        self.extent().map(|rect| rect.center())
    }

    /// Registers a membership observer.
    ///
    /// Observers run after the membership was updated, in registration order.
    /// Observers registered from inside an observer first run on the next change.
    pub fn observe<F>(&self, observer: F) -> ObserverKey
    where
        F: FnMut(&Self, &MembershipChange) + 'static,
    {
        let key = ObserverKey(self.inner.next_key.get());
        self.inner.next_key.set(key.0 + 1);
        self.inner
            .observers
            .borrow_mut()
            .push((key, Box::new(observer)));
        key
    }

    /// Unregisters a membership observer; returns `false` if `key` was unknown.
    pub fn unobserve(&self, key: ObserverKey) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(k, _)| *k != key);
        observers.len() != before
    }

    fn remove_at(&self, index: usize) -> Option<Feature> {
        let change = self.mutate(|items| {
            (index < items.len()).then(|| MembershipChange::Removed(vec![items.remove(index)]))
        });
        match change {
            Some(MembershipChange::Removed(mut features)) => features.pop(),
            _ => None,
        }
    }

    /// Applies `f` to the members and, if it reports a change, bumps the
    /// revision and notifies observers with no borrow held.
    fn mutate(
        &self,
        f: impl FnOnce(&mut Vec<Feature>) -> Option<MembershipChange>,
    ) -> Option<MembershipChange> {
        let change = {
            let mut members = self.inner.members.borrow_mut();
            let change = f(&mut members.items)?;
            members.revision += 1;
            change
        };
        self.notify(&change);
        Some(change)
    }

    fn notify(&self, change: &MembershipChange) {
        let mut running = core::mem::take(&mut *self.inner.observers.borrow_mut());
        for (_, observer) in &mut running {
            observer(self, change);
        }
        let mut observers = self.inner.observers.borrow_mut();
        let registered = core::mem::replace(&mut *observers, running);
        observers.extend(registered);
    }
}

impl PartialEq for FeatureSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for FeatureSet {}

// Manual Debug impl since observers aren't Debug
impl fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self.inner.members.borrow();
        f.debug_struct("FeatureSet")
            .field("items", &members.items)
            .field("revision", &members.revision)
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

impl From<Vec<Feature>> for FeatureSet {
    fn from(items: Vec<Feature>) -> Self {
        Self {
            inner: Rc::new(SetInner {
                members: RefCell::new(Members { items, revision: 0 }),
                ..SetInner::default()
            }),
        }
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// Iterator over the members of a [`FeatureSet`].
#[derive(Debug)]
pub struct FeatureSetIter<'a> {
    set: &'a FeatureSet,
    index: usize,
}

impl Iterator for FeatureSetIter<'_> {
    type Item = Feature;

    fn next(&mut self) -> Option<Feature> {
        let feature = self.set.get(self.index)?;
        self.index += 1;
        Some(feature)
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = Feature;
    type IntoIter = FeatureSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Feature {
        Feature::new(Point::new(x, y))
    }

    #[test]
    fn feature_ids_are_unique() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 0.0);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn attribute_set_bumps_revision_only_on_change() {
        let feature = Feature::with_attributes(Point::ZERO, [("factor", 1.0)]);
        assert_eq!(feature.get("factor"), Some(AttributeValue::Number(1.0)));
        assert_eq!(feature.revision(), 0);

        feature.set("factor", 1.0);
        assert_eq!(feature.revision(), 0);

        feature.set("factor", 2.0);
        assert_eq!(feature.revision(), 1);
        assert_eq!(
            feature.get("factor").and_then(|v| v.as_number()),
            Some(2.0)
        );
    }

    #[test]
    fn flag_reads_bool_attributes() {
        let feature = Feature::with_attributes(Point::ZERO, [("marker", true)]);
        assert!(feature.flag("marker"));
        assert!(!feature.flag("missing"));
        feature.set("marker", "yes");
        assert!(!feature.flag("marker"));
    }

    #[test]
    fn clones_share_geometry() {
        let feature = point(1.0, 1.0);
        let alias = feature.clone();
        alias.set_geometry(Point::new(5.0, 6.0));
        assert_eq!(feature.geometry().point(), Some(Point::new(5.0, 6.0)));
        assert_eq!(feature.revision(), 1);
    }

    #[test]
    fn centroid_of_two_points() {
        let set: FeatureSet = vec![point(20.0, 20.0), point(0.0, 0.0)].into();
        assert_eq!(set.centroid(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert_eq!(FeatureSet::new().centroid(), None);
    }

    #[test]
    fn centroid_skips_empty_geometries() {
        let set: FeatureSet = [
            Feature::new(Geometry::LineString(vec![])),
            point(-10.0, -10.0),
            point(-5.0, -5.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.centroid(), Some(Point::new(-7.5, -7.5)));
    }

    #[test]
    fn membership_ops_bump_revision() {
        let set = FeatureSet::new();
        let a = point(0.0, 0.0);
        let b = point(1.0, 1.0);

        set.push(a.clone());
        set.insert(0, b.clone());
        assert_eq!(set.to_vec(), vec![b.clone(), a.clone()]);
        assert_eq!(set.revision(), 2);

        assert_eq!(set.remove(b.id()), Some(b.clone()));
        assert_eq!(set.remove(b.id()), None);
        assert_eq!(set.revision(), 3);

        assert_eq!(set.pop(), Some(a));
        assert_eq!(set.pop(), None);
        assert_eq!(set.revision(), 4);

        assert!(set.clear().is_empty());
        set.extend([]);
        assert_eq!(set.revision(), 4);
    }

    #[test]
    fn clones_share_membership() {
        let set = FeatureSet::new();
        let alias = set.clone();
        let a = point(2.0, 2.0);
        alias.push(a.clone());
        assert!(set.contains(a.id()));
        assert_eq!(set, alias);
        assert_ne!(set, FeatureSet::new());
    }

    #[test]
    fn observers_see_each_change_once() {
        let set = FeatureSet::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let key = set.observe(move |set, change| {
            let added = matches!(change, MembershipChange::Added(_));
            sink.borrow_mut()
                .push((added, change.features().len(), set.len()));
        });

        set.extend([point(0.0, 0.0), point(1.0, 0.0)]);
        set.pop();
        set.clear();
        set.clear();
        assert_eq!(
            *seen.borrow(),
            vec![(true, 2, 2), (false, 1, 1), (false, 1, 0)]
        );

        assert!(set.unobserve(key));
        assert!(!set.unobserve(key));
        set.push(point(0.0, 0.0));
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn observers_may_read_and_mutate_the_set() {
        let set = FeatureSet::new();
        set.observe(|set, change| {
            if matches!(change, MembershipChange::Added(_)) && set.len() > 2 {
                set.remove(set.get(0).unwrap().id());
            }
        });
        let first = point(0.0, 0.0);
        set.extend([first.clone(), point(1.0, 0.0)]);
        set.push(point(2.0, 0.0));
        assert_eq!(set.len(), 2);
        assert!(!set.contains(first.id()));
    }

    #[test]
    fn iteration_tolerates_mutation() {
        let set: FeatureSet = vec![point(0.0, 0.0), point(1.0, 0.0)].into();
        let mut visited = 0;
        for feature in &set {
            visited += 1;
            if visited == 1 {
                set.push(feature.clone());
            }
        }
        assert_eq!(visited, 3);
    }
}
