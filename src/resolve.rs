use crate::graph::{EdgeKind, NodeData, NodeKind, OrgEdge, OrgGraph, OrgNode};
use crate::model::{Department, Person, Reference, Snapshot};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Namespace for department node ids so they never collide with person ids.
pub const DEPARTMENT_NODE_PREFIX: &str = "dept-";

pub fn department_node_id(department_id: &str) -> String {
    format!("{DEPARTMENT_NODE_PREFIX}{department_id}")
}

pub fn resolve_snapshot(snapshot: &Snapshot) -> OrgGraph {
    resolve(&snapshot.people, &snapshot.departments)
}

/// Projects people and departments onto a directed org graph.
///
/// Department nodes come first, then people, each in input order. References
/// that do not match a record in this snapshot never produce an edge.
pub fn resolve(people: &[Person], departments: &[Department]) -> OrgGraph {
    let index = ReferenceIndex::new(people, departments);
    let mut builder = GraphBuilder::default();

    for dept in departments {
        let manager_name = dept
            .manager
            .as_ref()
            .and_then(|manager| index.person(&manager.id))
            .map(|manager| manager.name.clone());
        builder.push_node(OrgNode {
            id: department_node_id(&dept.id),
            kind: NodeKind::Department,
            data: NodeData {
                name: dept.name.clone(),
                subtitle: manager_name,
                ..NodeData::default()
            },
        });
    }

    for person in people {
        if index.department_node(&person.id) {
            warn!(person = %person.id, "person id collides with a department node");
        }
        let department_name = person
            .department
            .as_ref()
            .and_then(|dept| index.department(&dept.id))
            .map(|dept| dept.name.clone());
        builder.push_node(OrgNode {
            id: person.id.clone(),
            kind: NodeKind::Person,
            data: NodeData {
                name: person.name.clone(),
                subtitle: Some(person.title.clone()),
                category: department_name,
                photo_url: person.photo_url.clone(),
                status: Some(person.status),
            },
        });
    }

    for dept in departments {
        let Some(manager_ref) = &dept.manager else {
            continue;
        };
        let Some(manager) = index.person(&manager_ref.id) else {
            debug!(
                department = %dept.id,
                manager = %manager_ref.id,
                "dropping department manager edge: unknown person"
            );
            continue;
        };
        builder.push_edge(
            &manager.id,
            &department_node_id(&dept.id),
            EdgeKind::ManagesDepartment,
        );
    }

    for person in people {
        if let Some((source, kind)) = incoming_link(person, &index) {
            builder.push_edge(&source, &person.id, kind);
        }
    }

    builder.finish()
}

/// Picks the single edge that places `person` in the hierarchy: department
/// membership first, direct manager otherwise.
fn incoming_link(person: &Person, index: &ReferenceIndex<'_>) -> Option<(String, EdgeKind)> {
    if let Some(dept_ref) = &person.department {
        match index.department(&dept_ref.id) {
            Some(dept) => {
                return Some((department_node_id(&dept.id), EdgeKind::DepartmentMembership));
            }
            None => debug!(
                person = %person.id,
                department = %dept_ref.id,
                "unknown department, falling back to manager"
            ),
        }
    }

    let manager_ref: &Reference = person.manager.as_ref()?;
    let Some(manager) = index.person(&manager_ref.id) else {
        debug!(
            person = %person.id,
            manager = %manager_ref.id,
            "dropping direct report edge: unknown person"
        );
        return None;
    };
    if manager.id == person.id {
        warn!(person = %person.id, "ignoring self-referencing manager");
        return None;
    }
    Some((manager.id.clone(), EdgeKind::DirectReport))
}

struct ReferenceIndex<'a> {
    by_external_id: HashMap<&'a str, &'a Person>,
    by_storage_id: HashMap<&'a str, &'a Person>,
    departments: HashMap<&'a str, &'a Department>,
}

impl<'a> ReferenceIndex<'a> {
    fn new(people: &'a [Person], departments: &'a [Department]) -> Self {
        let mut by_external_id = HashMap::with_capacity(people.len());
        let mut by_storage_id = HashMap::new();
        for person in people {
            by_external_id.entry(person.id.as_str()).or_insert(person);
            if let Some(storage_id) = person.storage_id.as_deref() {
                by_storage_id.entry(storage_id).or_insert(person);
            }
        }
        let mut by_department_id = HashMap::with_capacity(departments.len());
        for dept in departments {
            by_department_id.entry(dept.id.as_str()).or_insert(dept);
        }
        Self {
            by_external_id,
            by_storage_id,
            departments: by_department_id,
        }
    }

    fn person(&self, id: &str) -> Option<&'a Person> {
        self.by_external_id
            .get(id)
            .or_else(|| self.by_storage_id.get(id))
            .copied()
    }

    fn department(&self, id: &str) -> Option<&'a Department> {
        self.departments.get(id).copied()
    }

    fn department_node(&self, node_id: &str) -> bool {
        node_id
            .strip_prefix(DEPARTMENT_NODE_PREFIX)
            .is_some_and(|id| self.departments.contains_key(id))
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: OrgGraph,
    seen_edges: HashSet<(String, String)>,
}

impl GraphBuilder {
    fn push_node(&mut self, node: OrgNode) {
        self.graph.nodes.push(node);
    }

    fn push_edge(&mut self, source: &str, target: &str, kind: EdgeKind) {
        if !self
            .seen_edges
            .insert((source.to_string(), target.to_string()))
        {
            return;
        }
        self.graph.edges.push(OrgEdge::new(source, target, kind));
    }

    fn finish(self) -> OrgGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn edge_set(graph: &OrgGraph) -> BTreeSet<(String, String, String)> {
        graph
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone(), format!("{:?}", e.kind)))
            .collect()
    }

    fn triple(source: &str, target: &str, kind: &str) -> (String, String, String) {
        (source.to_string(), target.to_string(), kind.to_string())
    }

    #[test]
    fn derives_department_and_report_edges() {
        let departments = vec![Department::new("eng", "Engineering").with_manager("alice")];
        let people = vec![
            Person::new("alice", "Alice", "CTO"),
            Person::new("bob", "Bob", "Engineer").with_department("eng"),
            Person::new("carol", "Carol", "Intern").with_manager("bob"),
        ];
        let graph = resolve(&people, &departments);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.nodes[0].id, "dept-eng");
        assert_eq!(graph.nodes[0].data.subtitle.as_deref(), Some("Alice"));
        assert_eq!(
            edge_set(&graph),
            BTreeSet::from([
                triple("alice", "dept-eng", "ManagesDepartment"),
                triple("dept-eng", "bob", "DepartmentMembership"),
                triple("bob", "carol", "DirectReport"),
            ])
        );
        let bob = graph.node("bob").unwrap();
        assert_eq!(bob.data.category.as_deref(), Some("Engineering"));
        assert_eq!(graph.edges[0].id, "edge-alice-to-dept-eng");
    }

    #[test]
    fn department_wins_over_manager() {
        let departments = vec![Department::new("ops", "Ops")];
        let people = vec![
            Person::new("boss", "Boss", "Head"),
            Person::new("dan", "Dan", "Operator")
                .with_department("ops")
                .with_manager("boss"),
        ];
        let graph = resolve(&people, &departments);
        let incoming: Vec<&OrgEdge> = graph.incoming("dan").collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].kind, EdgeKind::DepartmentMembership);
    }

    #[test]
    fn dangling_references_drop_edges_but_keep_nodes() {
        let departments = vec![Department::new("hr", "HR").with_manager("ghost")];
        let people = vec![
            Person::new("erin", "Erin", "Recruiter").with_manager("nobody"),
        ];
        let graph = resolve(&people, &departments);
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.node("dept-hr").is_some());
        assert_eq!(graph.node("dept-hr").unwrap().data.subtitle, None);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn dangling_department_falls_back_to_manager() {
        let people = vec![
            Person::new("boss", "Boss", "Head"),
            Person::new("fay", "Fay", "Analyst")
                .with_department("deleted")
                .with_manager("boss"),
        ];
        let graph = resolve(&people, &[]);
        assert_eq!(
            edge_set(&graph),
            BTreeSet::from([triple("boss", "fay", "DirectReport")])
        );
        assert_eq!(graph.node("fay").unwrap().data.category, None);
    }

    #[test]
    fn both_references_dangling_leave_a_root() {
        let people = vec![
            Person::new("gus", "Gus", "Analyst")
                .with_department("deleted")
                .with_manager("gone"),
        ];
        let graph = resolve(&people, &[]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn self_manager_is_ignored() {
        let people = vec![Person::new("hal", "Hal", "Founder").with_manager("hal")];
        let graph = resolve(&people, &[]);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn manager_resolves_by_storage_id() {
        let mut boss = Person::new("boss", "Boss", "Head");
        boss.storage_id = Some("65f0".to_string());
        let people = vec![boss, Person::new("ivy", "Ivy", "Dev").with_manager("65f0")];
        let graph = resolve(&people, &[]);
        assert_eq!(
            edge_set(&graph),
            BTreeSet::from([triple("boss", "ivy", "DirectReport")])
        );
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let graph = resolve(&[], &[]);
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn edge_set_is_independent_of_input_order() {
        let departments = vec![
            Department::new("a", "A").with_manager("p1"),
            Department::new("b", "B").with_manager("p2"),
        ];
        let mut people = vec![
            Person::new("p1", "P1", "T"),
            Person::new("p2", "P2", "T").with_department("a"),
            Person::new("p3", "P3", "T").with_manager("p2"),
            Person::new("p4", "P4", "T").with_department("b").with_manager("p1"),
        ];
        let forward = resolve(&people, &departments);
        people.reverse();
        let mut reversed_departments = departments.clone();
        reversed_departments.reverse();
        let backward = resolve(&people, &reversed_departments);
        assert_eq!(edge_set(&forward), edge_set(&backward));
    }
}
