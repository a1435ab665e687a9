use crate::model::Availability;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Person,
    Department,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    ManagesDepartment,
    DepartmentMembership,
    DirectReport,
}

/// Card payload shown by the rendering surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub name: String,
    /// Job title for people, manager name for departments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Department name a person belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Availability>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrgNode {
    pub id: String,
    pub kind: NodeKind,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl OrgEdge {
    pub fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            id: format!("edge-{source}-to-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrgGraph {
    pub nodes: Vec<OrgNode>,
    pub edges: Vec<OrgEdge>,
}

impl OrgGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&OrgNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a OrgEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
