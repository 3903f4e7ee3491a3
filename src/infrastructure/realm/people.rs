//! In-memory people directory.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::entities::{Person, UserId};
use crate::domain::fold_dict::FoldDict;
use crate::domain::ports::PeopleDirectory;

#[derive(Debug, Default)]
struct PeopleTable {
    by_email: FoldDict<UserId>,
    by_id: HashMap<UserId, Person>,
}

/// People directory keyed by case-insensitive email.
#[derive(Debug)]
pub struct InMemoryPeople {
    me: UserId,
    table: RwLock<PeopleTable>,
}

impl InMemoryPeople {
    /// Creates a directory whose current user is `me`.
    #[must_use]
    pub fn new(me: Person) -> Self {
        let people = Self {
            me: me.user_id(),
            table: RwLock::new(PeopleTable::default()),
        };
        people.add_person(me);
        people
    }

    pub fn add_person(&self, person: Person) {
        let mut guard = self.table.write();
        let table = &mut *guard;
        if let Some(previous) = table.by_id.get(&person.user_id()) {
            let previous_email = previous.email().to_string();
            table.by_email.remove(&previous_email);
        }
        table.by_email.insert(person.email(), person.user_id());
        table.by_id.insert(person.user_id(), person);
    }

    /// Changes a user's email. Returns `false` for unknown users.
    pub fn set_email(&self, user_id: UserId, new_email: &str) -> bool {
        let mut guard = self.table.write();
        let table = &mut *guard;
        let Some(person) = table.by_id.get_mut(&user_id) else {
            return false;
        };
        let old_email = person.email().to_string();
        person.set_email(new_email);
        table.by_email.remove(&old_email);
        table.by_email.insert(new_email, user_id);
        true
    }

    #[must_use]
    pub fn person(&self, user_id: UserId) -> Option<Person> {
        self.table.read().by_id.get(&user_id).cloned()
    }
}

impl PeopleDirectory for InMemoryPeople {
    fn my_user_id(&self) -> UserId {
        self.me
    }

    fn my_email(&self) -> String {
        self.email_by_user_id(self.me)
            .unwrap_or_default()
            .to_lowercase()
    }

    fn user_id_by_email(&self, email: &str) -> Option<UserId> {
        self.table.read().by_email.get(email).copied()
    }

    fn email_by_user_id(&self, user_id: UserId) -> Option<String> {
        self.table
            .read()
            .by_id
            .get(&user_id)
            .map(|person| person.email().to_string())
    }
}
