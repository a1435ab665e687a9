use crate::error::SnapshotError;
use crate::resolve::department_node_id;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

/// Availability shown on a person's card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    #[default]
    #[serde(alias = "Available", alias = "Disponível")]
    Available,
    #[serde(alias = "Busy", alias = "Ocupado")]
    Busy,
    #[serde(alias = "OnLeave", alias = "De Férias", alias = "Férias")]
    OnLeave,
}

/// A joined foreign key: the target's id plus its display name when the
/// collaborator embedded a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReferenceRepr")]
pub struct Reference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceRepr {
    Bare(String),
    Summary {
        #[serde(default)]
        id: Option<String>,
        #[serde(rename = "_id", default)]
        storage_id: Option<String>,
        #[serde(alias = "nome", default)]
        name: Option<String>,
    },
}

impl TryFrom<ReferenceRepr> for Reference {
    type Error = String;

    fn try_from(repr: ReferenceRepr) -> Result<Self, Self::Error> {
        match repr {
            ReferenceRepr::Bare(id) => Ok(Reference::new(id)),
            // populated people carry both ids; the external one is the node identity
            ReferenceRepr::Summary {
                id,
                storage_id,
                name,
            } => match id.or(storage_id) {
                Some(id) => Ok(Reference { id, name }),
                None => Err("reference summary has neither `id` nor `_id`".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// External id, stable across storage migrations; used as the node id.
    pub id: String,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "cargo")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(alias = "fotoUrl", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(alias = "projetos", default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub status: Availability,
    #[serde(alias = "departamento", default)]
    pub department: Option<Reference>,
    #[serde(alias = "gestor", default)]
    pub manager: Option<Reference>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            storage_id: None,
            name: name.into(),
            title: title.into(),
            email: None,
            photo_url: None,
            skills: Vec::new(),
            projects: Vec::new(),
            status: Availability::default(),
            department: None,
            manager: None,
        }
    }

    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department = Some(Reference::new(department_id));
        self
    }

    pub fn with_manager(mut self, manager_id: impl Into<String>) -> Self {
        self.manager = Some(Reference::new(manager_id));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "gestor", default)]
    pub manager: Option<Reference>,
}

impl Department {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager_id: impl Into<String>) -> Self {
        self.manager = Some(Reference::new(manager_id));
        self
    }
}

/// Full, already-joined view of the directory at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(alias = "users", default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub departments: Vec<Department>,
}

/// Shape problems that do not stop resolution but deserve a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotIssue {
    DuplicatePersonId(String),
    DuplicateDepartmentId(String),
    SelfManaged(String),
    /// A person id equal to some department's node id.
    NodeIdCollision(String),
}

impl std::fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotIssue::DuplicatePersonId(id) => write!(f, "duplicate person id `{id}`"),
            SnapshotIssue::DuplicateDepartmentId(id) => {
                write!(f, "duplicate department id `{id}`")
            }
            SnapshotIssue::SelfManaged(id) => write!(f, "person `{id}` is listed as own manager"),
            SnapshotIssue::NodeIdCollision(id) => {
                write!(f, "person id `{id}` collides with a department node")
            }
        }
    }
}

impl Snapshot {
    pub fn new(people: Vec<Person>, departments: Vec<Department>) -> Self {
        Self {
            people,
            departments,
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(input).map_err(|source| SnapshotError::Malformed {
            what: "snapshot",
            source,
        })
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, SnapshotError> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Self::from_json_str(&buf)
    }

    /// Builds a snapshot from the raw bodies of the users and departments
    /// listing endpoints.
    pub fn from_endpoint_dumps(users: &str, departments: &str) -> Result<Self, SnapshotError> {
        let people: Vec<Person> =
            serde_json::from_str(users).map_err(|source| SnapshotError::Malformed {
                what: "users",
                source,
            })?;
        let departments: Vec<Department> =
            serde_json::from_str(departments).map_err(|source| SnapshotError::Malformed {
                what: "departments",
                source,
            })?;
        Ok(Self::new(people, departments))
    }

    pub fn issues(&self) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for person in &self.people {
            if !seen.insert(person.id.as_str()) {
                issues.push(SnapshotIssue::DuplicatePersonId(person.id.clone()));
            }
            let self_managed = person.manager.as_ref().is_some_and(|manager| {
                manager.id == person.id || person.storage_id.as_deref() == Some(manager.id.as_str())
            });
            if self_managed {
                issues.push(SnapshotIssue::SelfManaged(person.id.clone()));
            }
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for dept in &self.departments {
            if !seen.insert(dept.id.as_str()) {
                issues.push(SnapshotIssue::DuplicateDepartmentId(dept.id.clone()));
            }
        }
        let department_nodes: HashSet<String> = self
            .departments
            .iter()
            .map(|dept| department_node_id(&dept.id))
            .collect();
        for person in &self.people {
            if department_nodes.contains(&person.id) {
                issues.push(SnapshotIssue::NodeIdCollision(person.id.clone()));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_backend_payloads() {
        let users = r#"[
            {"_id": "65a1", "id": "u-1", "nome": "Alice", "cargo": "CEO",
             "fotoUrl": "https://example.com/a.png", "position": {"x": 10, "y": 20},
             "departamento": null, "gestor": null, "__v": 0},
            {"_id": "65a2", "id": "u-2", "nome": "Bob", "cargo": "Engineer",
             "status": "Disponível",
             "departamento": {"_id": "d-1", "nome": "Engineering"},
             "gestor": {"_id": "65a1", "id": "u-1", "nome": "Alice"}}
        ]"#;
        let departments = r#"[{"_id": "d-1", "nome": "Engineering", "gestor": "u-1"}]"#;
        let snapshot = Snapshot::from_endpoint_dumps(users, departments).unwrap();
        assert_eq!(snapshot.people.len(), 2);
        let bob = &snapshot.people[1];
        assert_eq!(bob.storage_id.as_deref(), Some("65a2"));
        assert_eq!(bob.status, Availability::Available);
        assert_eq!(
            bob.department,
            Some(Reference::named("d-1", "Engineering"))
        );
        assert_eq!(bob.manager, Some(Reference::named("u-1", "Alice")));
        assert_eq!(snapshot.departments[0].manager, Some(Reference::new("u-1")));
        assert_eq!(
            snapshot.people[0].photo_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn null_list_is_rejected() {
        let err = Snapshot::from_json_str(r#"{"people": null, "departments": []}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { what: "snapshot", .. }));
    }

    #[test]
    fn summary_without_id_is_rejected() {
        let input = r#"{"people": [{"id": "a", "name": "A", "title": "T", "manager": {"name": "X"}}]}"#;
        assert!(Snapshot::from_json_str(input).is_err());
    }

    #[test]
    fn reports_issues() {
        let snapshot = Snapshot::new(
            vec![
                Person::new("a", "A", "T").with_manager("a"),
                Person::new("a", "A again", "T"),
            ],
            vec![Department::new("d", "D"), Department::new("d", "D2")],
        );
        let issues = snapshot.issues();
        assert_eq!(
            issues,
            vec![
                SnapshotIssue::SelfManaged("a".to_string()),
                SnapshotIssue::DuplicatePersonId("a".to_string()),
                SnapshotIssue::DuplicateDepartmentId("d".to_string()),
            ]
        );
    }

    #[test]
    fn reports_person_ids_shadowing_department_nodes() {
        let snapshot = Snapshot::new(
            vec![Person::new("dept-x", "X", "T"), Person::new("dept-free", "Y", "T")],
            vec![Department::new("x", "X dept")],
        );
        assert_eq!(
            snapshot.issues(),
            vec![SnapshotIssue::NodeIdCollision("dept-x".to_string())]
        );
    }
}
