//! The in-memory entity store.
//!
//! The [`Store`] is the sole owner of the roster. Every mutation builds a new
//! collection and swaps it in as a whole, so a [`Snapshot`] taken before the
//! mutation keeps seeing the old state and nobody ever sees a half-applied
//! change. Subscribers are told about each committed change.

use std::{fmt, sync::Arc};

use rand::Rng;
use tracing::instrument;

use crate::domain::{
    Catalog, ClassPosition, DegreeId, GenerateError, Relationship, RelationshipId, Student,
    StudentGenerator, StudentId, query,
};

/// An immutable view of the roster at one point in time.
///
/// Cloning a snapshot is cheap; the collections are reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    catalog: Arc<Catalog>,
    students: Arc<[Student]>,
    relationships: Arc<[Relationship]>,
    revision: u64,
}

impl Snapshot {
    /// The fixed catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// All students, in insertion order.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// All teaching assignments, in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Number of committed mutations since the store was created.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// The single source of truth for the roster.
///
/// Catalog collections are fixed at construction. Students and relationships
/// change only through the methods below. All mutations are total: a missing
/// id leaves the state untouched and the method returns `false`.
pub struct Store {
    current: Snapshot,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Creates a store from the fixed catalog and the seed collections.
    #[must_use]
    pub fn new(catalog: Catalog, students: Vec<Student>, relationships: Vec<Relationship>) -> Self {
        Self {
            current: Snapshot {
                catalog: Arc::new(catalog),
                students: students.into(),
                relationships: relationships.into(),
                revision: 0,
            },
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Creates a store with a catalog and no students or relationships.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self::new(catalog, Vec::new(), Vec::new())
    }

    /// The latest committed state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    /// The fixed catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.current.catalog()
    }

    /// All students, in insertion order.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        self.current.students()
    }

    /// All teaching assignments, in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        self.current.relationships()
    }

    /// Registers a listener that receives every newly committed snapshot.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener.
    ///
    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Students matching both constraints; `None` matches everything.
    ///
    /// The result is a fresh vector in store order.
    #[must_use]
    pub fn filtered_students(
        &self,
        degree: Option<DegreeId>,
        class: Option<ClassPosition>,
    ) -> Vec<Student> {
        query::filtered_students(self.students(), degree, class)
    }

    /// Looks up a teaching assignment by id.
    #[must_use]
    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships().iter().find(|relationship| relationship.id == id)
    }

    /// Looks up a student by id.
    #[must_use]
    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students().iter().find(|student| student.id == id)
    }

    /// The smallest id greater than every existing relationship id.
    #[must_use]
    pub fn next_relationship_id(&self) -> RelationshipId {
        let max = self
            .relationships()
            .iter()
            .map(|relationship| relationship.id.get())
            .max()
            .unwrap_or(0);
        RelationshipId::new(max.saturating_add(1))
    }

    /// Replaces the student that has the same id as `updated`.
    ///
    /// Other students keep their values and order. Returns `true` if a
    /// student was replaced.
    #[instrument(level = "debug", skip_all, fields(id = %updated.id))]
    pub fn update_student(&mut self, updated: Student) -> bool {
        let Some(students) = replace_matching(self.students(), |s| s.id == updated.id, &updated)
        else {
            tracing::debug!("no student with this id, nothing to update");
            return false;
        };

        self.commit(|snapshot| snapshot.students = students);
        true
    }

    /// Removes the student with the given id.
    ///
    /// Returns `true` if a student was removed.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_student(&mut self, id: StudentId) -> bool {
        let Some(students) = remove_matching(self.students(), |s| s.id == id) else {
            tracing::debug!("no student with this id, nothing to delete");
            return false;
        };

        self.commit(|snapshot| snapshot.students = students);
        true
    }

    /// Appends a teaching assignment.
    ///
    /// The caller chooses the id; duplicates are accepted as given.
    #[instrument(level = "debug", skip_all, fields(id = %relationship.id))]
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if self.relationship(relationship.id).is_some() {
            tracing::warn!("a relationship with this id already exists, appending anyway");
        }

        let relationships: Arc<[Relationship]> = self
            .relationships()
            .iter()
            .cloned()
            .chain(std::iter::once(relationship))
            .collect();

        self.commit(|snapshot| snapshot.relationships = relationships);
    }

    /// Replaces the teaching assignment that has the same id as `updated`.
    ///
    /// Returns `true` if an assignment was replaced.
    #[instrument(level = "debug", skip_all, fields(id = %updated.id))]
    pub fn update_relationship(&mut self, updated: Relationship) -> bool {
        let Some(relationships) =
            replace_matching(self.relationships(), |r| r.id == updated.id, &updated)
        else {
            tracing::debug!("no relationship with this id, nothing to update");
            return false;
        };

        self.commit(|snapshot| snapshot.relationships = relationships);
        true
    }

    /// Removes the teaching assignment with the given id.
    ///
    /// Returns `true` if an assignment was removed.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_relationship(&mut self, id: RelationshipId) -> bool {
        let Some(relationships) = remove_matching(self.relationships(), |r| r.id == id) else {
            tracing::debug!("no relationship with this id, nothing to delete");
            return false;
        };

        self.commit(|snapshot| snapshot.relationships = relationships);
        true
    }

    /// Appends a batch of synthetic students in a single commit.
    ///
    /// Returns the newly appended students.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] if the catalog has no grade levels or no
    /// classes, or if there are not enough unused enrollment numbers left.
    /// The store is unchanged on error.
    #[instrument(level = "debug", skip_all)]
    pub fn generate_students<R: Rng>(
        &mut self,
        generator: &StudentGenerator,
        rng: &mut R,
    ) -> Result<&[Student], GenerateError> {
        let batch = generator.batch(&self.current, rng)?;
        let start = self.students().len();
        let count = batch.len();

        let students: Arc<[Student]> = self.students().iter().cloned().chain(batch).collect();
        self.commit(|snapshot| snapshot.students = students);

        tracing::info!(count, "generated students");
        Ok(&self.students()[start..])
    }

    fn commit(&mut self, apply: impl FnOnce(&mut Snapshot)) {
        let mut next = self.current.clone();
        apply(&mut next);
        next.revision += 1;
        self.current = next;

        tracing::trace!(revision = self.current.revision, "committed");
        for (_, listener) in &self.listeners {
            listener(&self.current);
        }
    }
}

/// A copy of `items` with every match swapped for `replacement`, or `None`
/// if nothing matched.
fn replace_matching<T: Clone>(
    items: &[T],
    matches: impl Fn(&T) -> bool,
    replacement: &T,
) -> Option<Arc<[T]>> {
    if !items.iter().any(&matches) {
        return None;
    }

    Some(
        items
            .iter()
            .map(|item| {
                if matches(item) {
                    replacement.clone()
                } else {
                    item.clone()
                }
            })
            .collect(),
    )
}

/// A copy of `items` without the matches, or `None` if nothing matched.
fn remove_matching<T: Clone>(items: &[T], matches: impl Fn(&T) -> bool) -> Option<Arc<[T]>> {
    if !items.iter().any(&matches) {
        return None;
    }

    Some(items.iter().filter(|&item| !matches(item)).cloned().collect())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::domain::{
        Class, Degree, DegreeAssignment, Matter, MatterId, Ra, Teacher, TeacherId,
    };

    fn position(value: u32) -> ClassPosition {
        ClassPosition::new(value).unwrap()
    }

    fn student(id: u32, ra: u32, name: &str, degree: u32, class: u32) -> Student {
        Student {
            id: StudentId::new(id),
            name: name.to_string(),
            ra: Ra::new(ra),
            degree_id: DegreeId::new(degree),
            class_id: position(class),
        }
    }

    fn relationship(id: u32, teacher: u32, degree: u32) -> Relationship {
        Relationship {
            id: RelationshipId::new(id),
            teacher_id: TeacherId::new(teacher),
            matter_id: MatterId::new(1),
            degrees: vec![DegreeAssignment::new(DegreeId::new(degree), [position(1)])],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Degree {
                    id: DegreeId::new(1),
                    name: "1ª Série".to_string(),
                },
                Degree {
                    id: DegreeId::new(2),
                    name: "2ª Série".to_string(),
                },
            ],
            vec![
                Class {
                    name: "Classe A".to_string(),
                },
                Class {
                    name: "Classe B".to_string(),
                },
            ],
            vec![Teacher {
                id: TeacherId::new(1),
                name: "Helena".to_string(),
            }],
            vec![Matter {
                id: MatterId::new(1),
                name: "Matemática".to_string(),
            }],
        )
    }

    fn store() -> Store {
        Store::new(
            catalog(),
            vec![
                student(1, 101, "A", 1, 1),
                student(2, 102, "B", 1, 2),
                student(3, 103, "C", 2, 1),
            ],
            vec![relationship(1, 1, 1), relationship(2, 1, 2)],
        )
    }

    #[test]
    fn update_student_replaces_only_the_target() {
        let mut store = store();
        let before = store.students().to_vec();
        let updated = student(2, 102, "Bruna", 2, 1);

        assert!(store.update_student(updated.clone()));

        assert_eq!(store.students().len(), before.len());
        assert_eq!(store.students()[0], before[0]);
        assert_eq!(store.students()[1], updated);
        assert_eq!(store.students()[2], before[2]);
    }

    #[test]
    fn update_missing_student_is_a_no_op() {
        let mut store = store();
        let before = store.snapshot();

        assert!(!store.update_student(student(99, 999, "Nobody", 1, 1)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn delete_student_removes_exactly_one() {
        let mut store = store();

        assert!(store.delete_student(StudentId::new(2)));
        assert_eq!(store.students().len(), 2);
        assert!(store.student(StudentId::new(2)).is_none());

        assert!(!store.delete_student(StudentId::new(2)));
        assert_eq!(store.students().len(), 2);
    }

    #[test]
    fn relationship_round_trip() {
        let mut store = store();
        let added = relationship(10, 1, 2);

        store.add_relationship(added.clone());
        assert_eq!(store.relationship(RelationshipId::new(10)), Some(&added));

        let mut changed = added.clone();
        changed.teacher_id = TeacherId::new(999);
        assert!(store.update_relationship(changed.clone()));

        let fetched = store.relationship(RelationshipId::new(10)).unwrap();
        assert_eq!(fetched.teacher_id, TeacherId::new(999));
        assert_eq!(fetched.matter_id, added.matter_id);
        assert_eq!(fetched.degrees, added.degrees);

        assert!(store.delete_relationship(RelationshipId::new(10)));
        assert!(store.relationship(RelationshipId::new(10)).is_none());
        assert!(!store.delete_relationship(RelationshipId::new(10)));
    }

    #[test]
    fn missing_relationship_lookup_is_absent() {
        let store = store();
        assert!(store.relationship(RelationshipId::new(0)).is_none());
    }

    #[test]
    fn duplicate_relationship_ids_are_accepted() {
        let mut store = store();
        store.add_relationship(relationship(1, 1, 2));

        let duplicates = store
            .relationships()
            .iter()
            .filter(|r| r.id == RelationshipId::new(1))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn next_relationship_id_follows_the_maximum() {
        let mut store = store();
        assert_eq!(store.next_relationship_id(), RelationshipId::new(3));

        store.add_relationship(relationship(40, 1, 1));
        assert_eq!(store.next_relationship_id(), RelationshipId::new(41));

        let empty = Store::with_catalog(catalog());
        assert_eq!(empty.next_relationship_id(), RelationshipId::new(1));
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_mutations() {
        let mut store = store();
        let held = store.snapshot();

        store.delete_student(StudentId::new(1));
        store.add_relationship(relationship(5, 1, 1));

        assert_eq!(held.students().len(), 3);
        assert_eq!(held.relationships().len(), 2);
        assert_eq!(held.revision(), 0);
        assert_eq!(store.snapshot().revision(), 2);
    }

    #[test]
    fn subscribers_see_each_commit() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        store.subscribe(move |snapshot| {
            sink.lock()
                .unwrap()
                .push((snapshot.revision(), snapshot.students().len()));
        });

        store.delete_student(StudentId::new(1));
        store.delete_student(StudentId::new(1));
        store.update_student(student(2, 102, "Bruna", 1, 2));

        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn generation_notifies_once() {
        let mut store = store();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let generated = store
            .generate_students(&StudentGenerator::default(), &mut rng)
            .unwrap();

        assert_eq!(generated.len(), 300);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let mut store = store();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.delete_student(StudentId::new(1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.delete_student(StudentId::new(2));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_generation_leaves_store_unchanged() {
        let mut store = Store::with_catalog(Catalog::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let error = store
            .generate_students(&StudentGenerator::default(), &mut rng)
            .unwrap_err();

        assert_eq!(error, GenerateError::NoDegrees);
        assert_eq!(store.snapshot().revision(), 0);
        assert!(store.students().is_empty());
    }
}
