//! In-memory people and departments store with the write-time rules and
//! delete cascades of the board's backend.

use crate::error::DirectoryError;
use crate::model::{Department, Person, Reference, Snapshot};
use crate::resolve::DEPARTMENT_NODE_PREFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug, Clone, Default)]
pub struct Directory {
    people: Vec<Person>,
    departments: Vec<Department>,
    next_department: u64,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Departments sorted by name, like the listing endpoint.
    pub fn departments(&self) -> Vec<&Department> {
        let mut departments: Vec<&Department> = self.departments.iter().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        departments
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    /// Looks a manager reference up by external id, then by storage id.
    fn referenced_person(&self, id: &str) -> Option<&Person> {
        self.person(id).or_else(|| {
            self.people
                .iter()
                .find(|person| person.storage_id.as_deref() == Some(id))
        })
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|dept| dept.id == id)
    }

    pub fn create_person(&mut self, person: Person) -> Result<&Person> {
        if person.id.trim().is_empty() {
            return Err(DirectoryError::MissingField { field: "id" });
        }
        if person.id.starts_with(DEPARTMENT_NODE_PREFIX) {
            return Err(DirectoryError::ReservedPersonId(person.id));
        }
        if self.person(&person.id).is_some() {
            return Err(DirectoryError::DuplicatePerson(person.id));
        }
        let person = self.checked(person)?;
        self.people.push(person);
        Ok(&self.people[self.people.len() - 1])
    }

    /// Replaces the record stored under `id`; the external id is kept.
    pub fn update_person(&mut self, id: &str, mut update: Person) -> Result<&Person> {
        let Some(pos) = self.people.iter().position(|person| person.id == id) else {
            return Err(DirectoryError::PersonNotFound(id.to_string()));
        };
        update.id = id.to_string();
        if update.storage_id.is_none() {
            update.storage_id = self.people[pos].storage_id.clone();
        }
        let update = self.checked(update)?;
        self.people[pos] = update;
        Ok(&self.people[pos])
    }

    /// Removes a person and clears every manager reference pointing at them.
    pub fn delete_person(&mut self, id: &str) -> Result<Person> {
        let Some(pos) = self.people.iter().position(|person| person.id == id) else {
            return Err(DirectoryError::PersonNotFound(id.to_string()));
        };
        let removed = self.people.remove(pos);
        for person in &mut self.people {
            if refers_to(person.manager.as_ref(), &removed) {
                debug!(person = %person.id, manager = %removed.id, "clearing manager");
                person.manager = None;
            }
        }
        for dept in &mut self.departments {
            if refers_to(dept.manager.as_ref(), &removed) {
                debug!(department = %dept.id, manager = %removed.id, "clearing department manager");
                dept.manager = None;
            }
        }
        Ok(removed)
    }

    pub fn create_department(&mut self, name: &str) -> Result<&Department> {
        let name = self.checked_department_name(name, None)?;
        self.next_department += 1;
        let id = format!("d{:04}", self.next_department);
        self.departments.push(Department::new(id, name));
        Ok(&self.departments[self.departments.len() - 1])
    }

    pub fn rename_department(&mut self, id: &str, name: &str) -> Result<&Department> {
        let Some(pos) = self.departments.iter().position(|dept| dept.id == id) else {
            return Err(DirectoryError::DepartmentNotFound(id.to_string()));
        };
        let name = self.checked_department_name(name, Some(id))?;
        self.departments[pos].name = name;
        Ok(&self.departments[pos])
    }

    pub fn set_department_manager(
        &mut self,
        id: &str,
        manager_id: Option<&str>,
    ) -> Result<&Department> {
        let Some(pos) = self.departments.iter().position(|dept| dept.id == id) else {
            return Err(DirectoryError::DepartmentNotFound(id.to_string()));
        };
        let manager = match manager_id {
            Some(manager_id) => {
                let manager = self
                    .referenced_person(manager_id)
                    .ok_or_else(|| DirectoryError::PersonNotFound(manager_id.to_string()))?;
                Some(Reference::new(manager.id.clone()))
            }
            None => None,
        };
        self.departments[pos].manager = manager;
        Ok(&self.departments[pos])
    }

    /// Removes a department and clears it from every member.
    pub fn delete_department(&mut self, id: &str) -> Result<Department> {
        let Some(pos) = self.departments.iter().position(|dept| dept.id == id) else {
            return Err(DirectoryError::DepartmentNotFound(id.to_string()));
        };
        let removed = self.departments.remove(pos);
        for person in &mut self.people {
            if person.department.as_ref().is_some_and(|dept| dept.id == removed.id) {
                debug!(person = %person.id, department = %removed.id, "clearing department");
                person.department = None;
            }
        }
        Ok(removed)
    }

    /// Joined view: every reference carries the target's current name.
    pub fn snapshot(&self) -> Snapshot {
        let people = self
            .people
            .iter()
            .map(|person| {
                let mut person = person.clone();
                person.department = person.department.map(|dept| match self.department(&dept.id) {
                    Some(found) => Reference::named(found.id.clone(), found.name.clone()),
                    None => dept,
                });
                person.manager = person.manager.map(|manager| self.joined_person(manager));
                person
            })
            .collect();
        let departments = self
            .departments()
            .into_iter()
            .map(|dept| {
                let mut dept = dept.clone();
                dept.manager = dept.manager.map(|manager| self.joined_person(manager));
                dept
            })
            .collect();
        Snapshot::new(people, departments)
    }

    fn joined_person(&self, reference: Reference) -> Reference {
        match self.referenced_person(&reference.id) {
            Some(found) => Reference::named(found.id.clone(), found.name.clone()),
            None => reference,
        }
    }

    fn checked(&self, mut person: Person) -> Result<Person> {
        person.name = person.name.trim().to_string();
        person.title = person.title.trim().to_string();
        if person.name.is_empty() {
            return Err(DirectoryError::MissingField { field: "name" });
        }
        if person.title.is_empty() {
            return Err(DirectoryError::MissingField { field: "title" });
        }
        if let Some(email) = person.email.as_deref() {
            if !EMAIL_RE.is_match(email) {
                return Err(DirectoryError::InvalidEmail(email.to_string()));
            }
        }
        if let Some(dept) = &person.department {
            if self.department(&dept.id).is_none() {
                return Err(DirectoryError::DepartmentNotFound(dept.id.clone()));
            }
        }
        if let Some(manager) = &person.manager {
            if manager.id == person.id || person.storage_id.as_deref() == Some(manager.id.as_str()) {
                return Err(DirectoryError::SelfManaged(person.id.clone()));
            }
            if self.referenced_person(&manager.id).is_none() {
                return Err(DirectoryError::PersonNotFound(manager.id.clone()));
            }
        }
        Ok(person)
    }

    fn checked_department_name(&self, name: &str, current: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::MissingField { field: "name" });
        }
        let taken = self
            .departments
            .iter()
            .any(|dept| dept.name == name && Some(dept.id.as_str()) != current);
        if taken {
            return Err(DirectoryError::DuplicateDepartment(name.to_string()));
        }
        Ok(name.to_string())
    }
}

fn refers_to(reference: Option<&Reference>, person: &Person) -> bool {
    reference.is_some_and(|reference| {
        reference.id == person.id || person.storage_id.as_deref() == Some(reference.id.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::resolve::{department_node_id, resolve_snapshot};

    fn seeded() -> (Directory, String) {
        let mut directory = Directory::new();
        let eng = directory.create_department("Engineering").unwrap().id.clone();
        directory
            .create_person(Person::new("alice", "Alice", "CTO"))
            .unwrap();
        directory
            .create_person(Person::new("bob", "Bob", "Engineer").with_department(eng.clone()))
            .unwrap();
        directory
            .create_person(Person::new("carol", "Carol", "Intern").with_manager("bob"))
            .unwrap();
        directory
            .set_department_manager(&eng, Some("alice"))
            .unwrap();
        (directory, eng)
    }

    #[test]
    fn rejects_invalid_people() {
        let (mut directory, _) = seeded();
        assert_eq!(
            directory.create_person(Person::new("bob", "Bobby", "Dev")).unwrap_err(),
            DirectoryError::DuplicatePerson("bob".to_string())
        );
        assert_eq!(
            directory.create_person(Person::new("x", "  ", "Dev")).unwrap_err(),
            DirectoryError::MissingField { field: "name" }
        );
        assert_eq!(
            directory
                .create_person(Person::new("x", "X", "Dev").with_department("nope"))
                .unwrap_err(),
            DirectoryError::DepartmentNotFound("nope".to_string())
        );
        let mut with_email = Person::new("y", "Y", "Dev");
        with_email.email = Some("not-an-email".to_string());
        assert_eq!(
            directory.create_person(with_email).unwrap_err(),
            DirectoryError::InvalidEmail("not-an-email".to_string())
        );
    }

    #[test]
    fn rejects_person_ids_in_department_namespace() {
        let (mut directory, eng) = seeded();
        let taken = department_node_id(&eng);
        assert_eq!(
            directory
                .create_person(Person::new(taken.clone(), "Mallory", "Dev"))
                .unwrap_err(),
            DirectoryError::ReservedPersonId(taken)
        );
        let graph = resolve_snapshot(&directory.snapshot());
        let ids: std::collections::HashSet<&str> =
            graph.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids.len(), graph.nodes.len());
    }

    #[test]
    fn manager_may_be_given_by_storage_id() {
        let (mut directory, eng) = seeded();
        let mut erin = Person::new("erin", "Erin", "Lead");
        erin.storage_id = Some("65f0a1".to_string());
        directory.create_person(erin).unwrap();
        directory
            .create_person(Person::new("finn", "Finn", "Dev").with_manager("65f0a1"))
            .unwrap();
        directory.set_department_manager(&eng, Some("65f0a1")).unwrap();
        assert_eq!(
            directory.department(&eng).unwrap().manager,
            Some(Reference::new("erin"))
        );

        let graph = resolve_snapshot(&directory.snapshot());
        let incoming: Vec<_> = graph.incoming("finn").collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, "erin");

        directory.delete_person("erin").unwrap();
        assert_eq!(directory.person("finn").unwrap().manager, None);
    }

    #[test]
    fn rejects_self_management_on_update() {
        let (mut directory, _) = seeded();
        let update = Person::new("ignored", "Carol", "Intern").with_manager("carol");
        assert_eq!(
            directory.update_person("carol", update).unwrap_err(),
            DirectoryError::SelfManaged("carol".to_string())
        );
        assert_eq!(
            directory.person("carol").unwrap().manager,
            Some(Reference::new("bob"))
        );
    }

    #[test]
    fn department_names_are_unique() {
        let (mut directory, eng) = seeded();
        assert_eq!(
            directory.create_department(" Engineering ").unwrap_err(),
            DirectoryError::DuplicateDepartment("Engineering".to_string())
        );
        assert_eq!(directory.rename_department(&eng, "Engineering").unwrap().name, "Engineering");
        let sales = directory.create_department("Sales").unwrap().id.clone();
        assert!(directory.rename_department(&sales, "Engineering").is_err());
    }

    #[test]
    fn deleting_department_clears_members() {
        let (mut directory, eng) = seeded();
        directory.delete_department(&eng).unwrap();
        assert_eq!(directory.person("bob").unwrap().department, None);

        let graph = resolve_snapshot(&directory.snapshot());
        let dept_node = department_node_id(&eng);
        assert!(graph.node(&dept_node).is_none());
        assert!(!graph.edges.iter().any(|edge| edge.kind == EdgeKind::DepartmentMembership));
        assert!(!graph.edges.iter().any(|edge| edge.source == dept_node));
    }

    #[test]
    fn deleting_person_clears_reports_and_department_head() {
        let (mut directory, eng) = seeded();
        directory.delete_person("bob").unwrap();
        assert_eq!(directory.person("carol").unwrap().manager, None);
        directory.delete_person("alice").unwrap();
        assert_eq!(directory.department(&eng).unwrap().manager, None);
        assert!(directory.delete_person("alice").is_err());
    }

    #[test]
    fn snapshot_embeds_names() {
        let (directory, eng) = seeded();
        let snapshot = directory.snapshot();
        let bob = snapshot.people.iter().find(|p| p.id == "bob").unwrap();
        assert_eq!(
            bob.department,
            Some(Reference::named(eng.clone(), "Engineering"))
        );
        assert_eq!(
            snapshot.departments[0].manager,
            Some(Reference::named("alice", "Alice"))
        );
    }
}
