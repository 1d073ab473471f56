//! Movie-aggregate reconciliation.
//!
//! Computes the join-row operations that move a movie's persisted genre set,
//! cinema set and actor roster to a submitted desired state. The result is a
//! [`RelationshipDelta`] of tagged insert/delete operations that the catalog
//! store applies as one atomic unit.
//!
//! - Genres and cinemas are diffed as sets: only-current ids are deleted,
//!   only-desired ids are inserted, shared ids are left alone.
//! - The roster is always fully replaced: every existing role row is deleted
//!   and one row per desired entry is inserted with `order = index`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One entry of a submitted roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub actor_id: DbId,
    pub character_name: String,
}

/// A persisted role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRow {
    pub actor_id: DbId,
    pub character_name: String,
    pub order: i32,
}

/// The relationship state a write request asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRelations {
    #[serde(default)]
    pub genre_ids: Vec<DbId>,
    #[serde(default)]
    pub cinema_ids: Vec<DbId>,
    #[serde(default)]
    pub roster: Vec<RoleAssignment>,
}

/// The relationship state currently persisted for a movie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentRelations {
    pub genre_ids: Vec<DbId>,
    pub cinema_ids: Vec<DbId>,
    pub roster: Vec<RoleRow>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A join row of the movie aggregate, without its movie id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRow {
    Genre { genre_id: DbId },
    Cinema { cinema_id: DbId },
    /// Role rows are addressed by `order`, which is unique within a movie.
    Role {
        actor_id: DbId,
        character_name: String,
        order: i32,
    },
}

/// A tagged mutation of one join row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOp {
    Insert(JoinRow),
    Delete(JoinRow),
}

/// Every join-row mutation for one reconciliation of one movie.
///
/// Deletes always precede inserts, so a store applying `ops` in sequence
/// never collides on the `(movie_id, order)` key of role rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDelta {
    pub movie_id: DbId,
    pub ops: Vec<JoinOp>,
}

impl RelationshipDelta {
    pub fn inserts(&self) -> impl Iterator<Item = &JoinRow> {
        self.ops.iter().filter_map(|op| match op {
            JoinOp::Insert(row) => Some(row),
            JoinOp::Delete(_) => None,
        })
    }

    pub fn deletes(&self) -> impl Iterator<Item = &JoinRow> {
        self.ops.iter().filter_map(|op| match op {
            JoinOp::Delete(row) => Some(row),
            JoinOp::Insert(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether this delta was computed from the state in `current`.
    ///
    /// Every deleted row must still be persisted, and the role deletes must
    /// cover the whole persisted roster, since reconciliation always
    /// replaces it. A delta computed from an older read fails this check
    /// once another write has changed the movie's join rows.
    pub fn deletes_match(&self, current: &CurrentRelations) -> bool {
        let mut role_deletes = 0;
        let all_present = self.deletes().all(|row| match row {
            JoinRow::Genre { genre_id } => current.genre_ids.contains(genre_id),
            JoinRow::Cinema { cinema_id } => current.cinema_ids.contains(cinema_id),
            JoinRow::Role {
                actor_id,
                character_name,
                order,
            } => {
                role_deletes += 1;
                current.roster.iter().any(|r| {
                    r.order == *order
                        && r.actor_id == *actor_id
                        && r.character_name == *character_name
                })
            }
        });
        all_present && role_deletes == current.roster.len()
    }

    /// Every genre, cinema and actor id this delta inserts a reference to.
    pub fn referenced_ids(&self) -> ReferencedIds {
        let mut refs = ReferencedIds::default();
        for row in self.inserts() {
            match row {
                JoinRow::Genre { genre_id } => {
                    refs.genre_ids.insert(*genre_id);
                }
                JoinRow::Cinema { cinema_id } => {
                    refs.cinema_ids.insert(*cinema_id);
                }
                JoinRow::Role { actor_id, .. } => {
                    refs.actor_ids.insert(*actor_id);
                }
            }
        }
        refs
    }
}

/// Foreign ids referenced by the inserts of a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedIds {
    pub genre_ids: BTreeSet<DbId>,
    pub cinema_ids: BTreeSet<DbId>,
    pub actor_ids: BTreeSet<DbId>,
}

/// Result of diffing two id sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDiff {
    pub insert: Vec<DbId>,
    pub delete: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Diff the persisted id set against the desired one.
///
/// Both sides are treated as sets: repeated ids count once. Inserts keep the
/// order of first appearance in `desired`; deletes keep the order of `current`.
pub fn diff_ids(current: &[DbId], desired: &[DbId]) -> SetDiff {
    let current_set: BTreeSet<DbId> = current.iter().copied().collect();
    let desired_set: BTreeSet<DbId> = desired.iter().copied().collect();

    let mut seen = BTreeSet::new();
    let insert = desired
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id) && seen.insert(*id))
        .collect();

    let mut seen = BTreeSet::new();
    let delete = current
        .iter()
        .copied()
        .filter(|id| !desired_set.contains(id) && seen.insert(*id))
        .collect();

    SetDiff { insert, delete }
}

/// Assign `order` from submission position. Duplicate actors are kept.
pub fn assign_order(roster: &[RoleAssignment]) -> Vec<RoleRow> {
    roster
        .iter()
        .enumerate()
        .map(|(index, role)| RoleRow {
            actor_id: role.actor_id,
            character_name: role.character_name.clone(),
            order: index as i32,
        })
        .collect()
}

/// Compute the delta that makes `current` match `desired` for `movie_id`.
pub fn reconcile(
    movie_id: DbId,
    current: &CurrentRelations,
    desired: &DesiredRelations,
) -> RelationshipDelta {
    let genres = diff_ids(&current.genre_ids, &desired.genre_ids);
    let cinemas = diff_ids(&current.cinema_ids, &desired.cinema_ids);

    let mut deletes = Vec::new();
    let mut inserts = Vec::new();

    deletes.extend(
        genres
            .delete
            .into_iter()
            .map(|genre_id| JoinOp::Delete(JoinRow::Genre { genre_id })),
    );
    deletes.extend(
        cinemas
            .delete
            .into_iter()
            .map(|cinema_id| JoinOp::Delete(JoinRow::Cinema { cinema_id })),
    );
    deletes.extend(current.roster.iter().map(|row| {
        JoinOp::Delete(JoinRow::Role {
            actor_id: row.actor_id,
            character_name: row.character_name.clone(),
            order: row.order,
        })
    }));

    inserts.extend(
        genres
            .insert
            .into_iter()
            .map(|genre_id| JoinOp::Insert(JoinRow::Genre { genre_id })),
    );
    inserts.extend(
        cinemas
            .insert
            .into_iter()
            .map(|cinema_id| JoinOp::Insert(JoinRow::Cinema { cinema_id })),
    );
    inserts.extend(assign_order(&desired.roster).into_iter().map(|row| {
        JoinOp::Insert(JoinRow::Role {
            actor_id: row.actor_id,
            character_name: row.character_name,
            order: row.order,
        })
    }));

    deletes.append(&mut inserts);
    RelationshipDelta {
        movie_id,
        ops: deletes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(actor_id: DbId, name: &str) -> RoleAssignment {
        RoleAssignment {
            actor_id,
            character_name: name.to_string(),
        }
    }

    fn row(actor_id: DbId, name: &str, order: i32) -> RoleRow {
        RoleRow {
            actor_id,
            character_name: name.to_string(),
            order,
        }
    }

    const A: DbId = 1;
    const B: DbId = 2;
    const C: DbId = 3;

    #[test]
    fn genre_diff_leaves_shared_ids_untouched() {
        let current = CurrentRelations {
            genre_ids: vec![A, B],
            ..Default::default()
        };
        let desired = DesiredRelations {
            genre_ids: vec![B, C],
            ..Default::default()
        };

        let delta = reconcile(10, &current, &desired);

        assert_eq!(
            delta.ops,
            vec![
                JoinOp::Delete(JoinRow::Genre { genre_id: A }),
                JoinOp::Insert(JoinRow::Genre { genre_id: C }),
            ]
        );
        assert!(!delta
            .ops
            .iter()
            .any(|op| matches!(op, JoinOp::Delete(JoinRow::Genre { genre_id }) | JoinOp::Insert(JoinRow::Genre { genre_id }) if *genre_id == B)));
    }

    #[test]
    fn identical_sets_produce_no_ops() {
        let current = CurrentRelations {
            genre_ids: vec![A, B],
            cinema_ids: vec![C],
            roster: vec![],
        };
        let desired = DesiredRelations {
            genre_ids: vec![B, A],
            cinema_ids: vec![C],
            roster: vec![],
        };
        assert!(reconcile(1, &current, &desired).is_empty());
    }

    #[test]
    fn duplicate_desired_ids_insert_once() {
        let diff = diff_ids(&[], &[C, C, A, C]);
        assert_eq!(diff.insert, vec![C, A]);
        assert!(diff.delete.is_empty());
    }

    #[test]
    fn empty_desired_set_deletes_everything() {
        let current = CurrentRelations {
            genre_ids: vec![A, B],
            cinema_ids: vec![C],
            roster: vec![row(7, "Hero", 0)],
        };
        let delta = reconcile(1, &current, &DesiredRelations::default());

        assert_eq!(delta.inserts().count(), 0);
        assert_eq!(delta.deletes().count(), 4);
    }

    #[test]
    fn roster_is_fully_replaced_even_when_actor_reappears() {
        let (a1, a2, a3) = (11, 12, 13);
        let current = CurrentRelations {
            roster: vec![row(a1, "Hero", 0), row(a2, "Villain", 1)],
            ..Default::default()
        };
        let desired = DesiredRelations {
            roster: vec![role(a3, "Sidekick"), role(a1, "Hero")],
            ..Default::default()
        };

        let delta = reconcile(5, &current, &desired);

        let deletes: Vec<_> = delta.deletes().cloned().collect();
        assert_eq!(
            deletes,
            vec![
                JoinRow::Role {
                    actor_id: a1,
                    character_name: "Hero".into(),
                    order: 0
                },
                JoinRow::Role {
                    actor_id: a2,
                    character_name: "Villain".into(),
                    order: 1
                },
            ]
        );
        let inserts: Vec<_> = delta.inserts().cloned().collect();
        assert_eq!(
            inserts,
            vec![
                JoinRow::Role {
                    actor_id: a3,
                    character_name: "Sidekick".into(),
                    order: 0
                },
                JoinRow::Role {
                    actor_id: a1,
                    character_name: "Hero".into(),
                    order: 1
                },
            ]
        );
    }

    #[test]
    fn unchanged_roster_is_still_replaced() {
        let current = CurrentRelations {
            roster: vec![row(1, "Hero", 0)],
            ..Default::default()
        };
        let desired = DesiredRelations {
            roster: vec![role(1, "Hero")],
            ..Default::default()
        };
        let delta = reconcile(1, &current, &desired);
        assert_eq!(delta.deletes().count(), 1);
        assert_eq!(delta.inserts().count(), 1);
    }

    #[test]
    fn duplicate_actor_ids_keep_their_own_order() {
        let rows = assign_order(&[role(4, "Young Ann"), role(4, "Old Ann"), role(5, "Bob")]);
        assert_eq!(
            rows,
            vec![row(4, "Young Ann", 0), row(4, "Old Ann", 1), row(5, "Bob", 2)]
        );
    }

    #[test]
    fn deletes_precede_inserts() {
        let current = CurrentRelations {
            genre_ids: vec![A],
            cinema_ids: vec![B],
            roster: vec![row(1, "X", 0)],
        };
        let desired = DesiredRelations {
            genre_ids: vec![C],
            cinema_ids: vec![C],
            roster: vec![role(2, "Y")],
        };
        let delta = reconcile(1, &current, &desired);
        let first_insert = delta
            .ops
            .iter()
            .position(|op| matches!(op, JoinOp::Insert(_)))
            .unwrap();
        assert!(delta.ops[first_insert..]
            .iter()
            .all(|op| matches!(op, JoinOp::Insert(_))));
    }

    #[test]
    fn referenced_ids_cover_inserts_only() {
        let current = CurrentRelations {
            genre_ids: vec![A],
            ..Default::default()
        };
        let desired = DesiredRelations {
            genre_ids: vec![B],
            cinema_ids: vec![C],
            roster: vec![role(9, "Z"), role(8, "W")],
        };
        let refs = reconcile(1, &current, &desired).referenced_ids();
        assert_eq!(refs.genre_ids, BTreeSet::from([B]));
        assert_eq!(refs.cinema_ids, BTreeSet::from([C]));
        assert_eq!(refs.actor_ids, BTreeSet::from([8, 9]));
    }

    #[test]
    fn fresh_delta_matches_its_source_state() {
        let current = CurrentRelations {
            genre_ids: vec![A, B],
            cinema_ids: vec![C],
            roster: vec![row(1, "Hero", 0), row(2, "Villain", 1)],
        };
        let desired = DesiredRelations {
            genre_ids: vec![B],
            roster: vec![role(2, "Villain")],
            ..Default::default()
        };
        assert!(reconcile(1, &current, &desired).deletes_match(&current));
    }

    #[test]
    fn delta_from_an_older_read_does_not_match() {
        let read = CurrentRelations {
            roster: vec![row(1, "Hero", 0), row(2, "Villain", 1)],
            ..Default::default()
        };
        let delta = reconcile(
            1,
            &read,
            &DesiredRelations {
                roster: vec![role(3, "Solo")],
                ..Default::default()
            },
        );

        // Another write appended a third role after the read.
        let mut now = read.clone();
        now.roster.push(row(3, "Sidekick", 2));
        assert!(!delta.deletes_match(&now));

        // Another write renamed a role the delta wants to delete.
        let mut renamed = read.clone();
        renamed.roster[1].character_name = "Antihero".into();
        assert!(!delta.deletes_match(&renamed));
    }

    #[test]
    fn delta_from_an_older_read_of_genres_does_not_match() {
        let read = CurrentRelations {
            genre_ids: vec![A],
            ..Default::default()
        };
        let delta = reconcile(1, &read, &DesiredRelations::default());
        assert!(!delta.deletes_match(&CurrentRelations::default()));
    }
}
