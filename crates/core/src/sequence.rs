//! Sibling sequences: materials that share (type, subject, topic), in catalog
//! order.
//!
//! Everything here is a stable filter over the persisted list. Nothing is
//! re-sorted; reordering only happens through [`move_material`], which swaps
//! two entries of the full list.

use thiserror::Error;

use crate::model::{Material, MaterialId, MaterialKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("material not found: {0}")]
    NotFound(MaterialId),
}

/// Grouping key for a sibling sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub kind: MaterialKind,
    pub subject: String,
    pub topic: String,
}

impl GroupKey {
    #[must_use]
    pub fn new(kind: MaterialKind, subject: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            topic: topic.into(),
        }
    }

    #[must_use]
    pub fn of(material: &Material) -> Self {
        Self::new(material.kind(), material.subject(), material.topic_bucket())
    }

    #[must_use]
    pub fn matches(&self, material: &Material) -> bool {
        material.kind() == self.kind
            && material.subject() == self.subject
            && material.topic_bucket() == self.topic
    }
}

/// A material together with its place in its sibling sequence.
#[derive(Debug, Clone, Copy)]
pub struct SiblingSlot<'a> {
    pub index: usize,
    pub material: &'a Material,
    pub previous: Option<&'a Material>,
}

/// One (type, subject, topic) group in catalog order.
#[derive(Debug, Clone)]
pub struct SiblingGroup<'a> {
    pub key: GroupKey,
    pub members: Vec<&'a Material>,
}

impl<'a> SiblingGroup<'a> {
    /// Slots for every member, each pointing at its predecessor.
    #[must_use]
    pub fn slots(&self) -> Vec<SiblingSlot<'a>> {
        slots_of(&self.members)
    }
}

/// Members of the group `key`, in catalog order.
#[must_use]
pub fn siblings<'a>(all: &'a [Material], key: &GroupKey) -> Vec<&'a Material> {
    all.iter().filter(|m| key.matches(m)).collect()
}

/// Members of the group `key` as slots.
#[must_use]
pub fn sequence<'a>(all: &'a [Material], key: &GroupKey) -> Vec<SiblingSlot<'a>> {
    slots_of(&siblings(all, key))
}

/// Every group present in `all`, ordered by first appearance.
#[must_use]
pub fn groups(all: &[Material]) -> Vec<SiblingGroup<'_>> {
    let mut out: Vec<SiblingGroup<'_>> = Vec::new();
    for material in all {
        match out.iter_mut().find(|g| g.key.matches(material)) {
            Some(group) => group.members.push(material),
            None => out.push(SiblingGroup {
                key: GroupKey::of(material),
                members: vec![material],
            }),
        }
    }
    out
}

/// Slot of a single material within its own group.
#[must_use]
pub fn slot_of<'a>(all: &'a [Material], id: &MaterialId) -> Option<SiblingSlot<'a>> {
    let target = all.iter().find(|m| m.id() == id)?;
    sequence(all, &GroupKey::of(target))
        .into_iter()
        .find(|slot| slot.material.id() == id)
}

fn slots_of<'a>(members: &[&'a Material]) -> Vec<SiblingSlot<'a>> {
    members
        .iter()
        .copied()
        .enumerate()
        .map(|(index, material)| SiblingSlot {
            index,
            material,
            previous: index.checked_sub(1).map(|prev| members[prev]),
        })
        .collect()
}

//
// ─── REORDERING ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Already first/last within its subject; the list is unchanged.
    AtBoundary,
}

/// Swaps a material with its nearest neighbour of the same subject.
///
/// Neighbours are found among all materials of the subject regardless of
/// type or topic; materials of other subjects keep their slots.
///
/// # Errors
///
/// Returns `SequenceError::NotFound` if `id` is not in `all`.
pub fn move_material(
    all: &mut [Material],
    id: &MaterialId,
    direction: MoveDirection,
) -> Result<MoveOutcome, SequenceError> {
    let from = all
        .iter()
        .position(|m| m.id() == id)
        .ok_or_else(|| SequenceError::NotFound(id.clone()))?;
    let subject = all[from].subject().to_owned();
    let same_subject = |m: &Material| m.subject() == subject;

    let to = match direction {
        MoveDirection::Up => all[..from].iter().rposition(same_subject),
        MoveDirection::Down => all[from + 1..]
            .iter()
            .position(same_subject)
            .map(|offset| from + 1 + offset),
    };

    match to {
        Some(to) => {
            all.swap(from, to);
            Ok(MoveOutcome::Moved)
        }
        None => Ok(MoveOutcome::AtBoundary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, kind: MaterialKind, subject: &str, topic: Option<&str>) -> Material {
        Material::new(
            MaterialId::new(id).unwrap(),
            format!("Material {id}"),
            kind,
            subject,
            topic.map(str::to_owned),
            None,
        )
        .unwrap()
    }

    fn ids(materials: &[&Material]) -> Vec<String> {
        materials.iter().map(|m| m.id().to_string()).collect()
    }

    fn catalog() -> Vec<Material> {
        vec![
            m("v1", MaterialKind::Video, "Physics", None),
            m("d1", MaterialKind::Document, "Physics", None),
            m("v2", MaterialKind::Video, "Physics", Some("optics")),
            m("v3", MaterialKind::Video, "Physics", None),
            m("c1", MaterialKind::Video, "Chemistry", None),
            m("v4", MaterialKind::Video, "Physics", Some("general")),
        ]
    }

    #[test]
    fn siblings_is_a_stable_filter() {
        let all = catalog();
        let key = GroupKey::new(MaterialKind::Video, "Physics", "general");
        assert_eq!(ids(&siblings(&all, &key)), ["v1", "v3", "v4"]);
    }

    #[test]
    fn slots_point_at_previous_sibling() {
        let all = catalog();
        let slots = sequence(&all, &GroupKey::new(MaterialKind::Video, "Physics", "general"));
        assert_eq!(slots.len(), 3);
        assert!(slots[0].previous.is_none());
        assert_eq!(slots[1].previous.map(|p| p.id().as_str()), Some("v1"));
        assert_eq!(slots[2].previous.map(|p| p.id().as_str()), Some("v3"));
        assert_eq!(slots[2].index, 2);
    }

    #[test]
    fn groups_follow_first_appearance() {
        let all = catalog();
        let found: Vec<(MaterialKind, String, String)> = groups(&all)
            .into_iter()
            .map(|g| (g.key.kind, g.key.subject, g.key.topic))
            .collect();
        assert_eq!(
            found,
            vec![
                (MaterialKind::Video, "Physics".into(), "general".into()),
                (MaterialKind::Document, "Physics".into(), "general".into()),
                (MaterialKind::Video, "Physics".into(), "optics".into()),
                (MaterialKind::Video, "Chemistry".into(), "general".into()),
            ]
        );
    }

    #[test]
    fn slot_of_finds_position_in_own_group() {
        let all = catalog();
        let slot = slot_of(&all, &MaterialId::new("v4").unwrap()).unwrap();
        assert_eq!(slot.index, 2);
        assert!(slot_of(&all, &MaterialId::new("nope").unwrap()).is_none());
    }

    #[test]
    fn move_swaps_within_subject_and_sequence_follows() {
        let mut all = catalog();
        let v3 = MaterialId::new("v3").unwrap();

        // v3's nearest Physics neighbour above is v2.
        assert_eq!(
            move_material(&mut all, &v3, MoveDirection::Up),
            Ok(MoveOutcome::Moved)
        );
        assert_eq!(all[2].id(), &v3);

        assert_eq!(
            move_material(&mut all, &v3, MoveDirection::Up),
            Ok(MoveOutcome::Moved)
        );
        assert_eq!(
            move_material(&mut all, &v3, MoveDirection::Up),
            Ok(MoveOutcome::Moved)
        );
        let key = GroupKey::new(MaterialKind::Video, "Physics", "general");
        assert_eq!(ids(&siblings(&all, &key)), ["v3", "v1", "v4"]);
    }

    #[test]
    fn move_skips_other_subjects() {
        let mut all = catalog();
        let v4 = MaterialId::new("v4").unwrap();
        move_material(&mut all, &v4, MoveDirection::Up).unwrap();
        assert_eq!(all[4].id().as_str(), "c1");
        assert_eq!(all[3].id(), &v4);
    }

    #[test]
    fn move_at_boundary_is_noop() {
        let mut all = catalog();
        let before = all.clone();
        let c1 = MaterialId::new("c1").unwrap();
        assert_eq!(
            move_material(&mut all, &c1, MoveDirection::Down),
            Ok(MoveOutcome::AtBoundary)
        );
        assert_eq!(
            move_material(&mut all, &c1, MoveDirection::Up),
            Ok(MoveOutcome::AtBoundary)
        );
        assert_eq!(all, before);
    }

    #[test]
    fn move_unknown_id_fails() {
        let mut all = catalog();
        let missing = MaterialId::new("zz").unwrap();
        assert_eq!(
            move_material(&mut all, &missing, MoveDirection::Up),
            Err(SequenceError::NotFound(missing))
        );
    }
}
