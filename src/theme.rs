use crate::graph::{EdgeKind, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub person_color: String,
    pub department_color: String,
    pub manages_department_stroke: String,
    pub membership_stroke: String,
    pub direct_report_stroke: String,
    pub animate_direct_reports: bool,
}

impl Theme {
    /// Orange, blue and grey strokes of the classic board.
    pub fn classic() -> Self {
        Self {
            person_color: "#FFFFFF".to_string(),
            department_color: "#FFF4E5".to_string(),
            manages_department_stroke: "#ff8c00".to_string(),
            membership_stroke: "#00aaff".to_string(),
            direct_report_stroke: "#cccccc".to_string(),
            animate_direct_reports: true,
        }
    }

    pub fn muted() -> Self {
        Self {
            person_color: "#F8FAFF".to_string(),
            department_color: "#EEF2F8".to_string(),
            manages_department_stroke: "#7A8AA6".to_string(),
            membership_stroke: "#7A8AA6".to_string(),
            direct_report_stroke: "#C7D2E5".to_string(),
            animate_direct_reports: false,
        }
    }

    pub fn node_color(&self, kind: NodeKind) -> &str {
        match kind {
            NodeKind::Person => &self.person_color,
            NodeKind::Department => &self.department_color,
        }
    }

    pub fn edge_stroke(&self, kind: EdgeKind) -> &str {
        match kind {
            EdgeKind::ManagesDepartment => &self.manages_department_stroke,
            EdgeKind::DepartmentMembership => &self.membership_stroke,
            EdgeKind::DirectReport => &self.direct_report_stroke,
        }
    }

    pub fn edge_animated(&self, kind: EdgeKind) -> bool {
        self.animate_direct_reports && kind == EdgeKind::DirectReport
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
