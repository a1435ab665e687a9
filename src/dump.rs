use crate::graph::{EdgeKind, NodeData, NodeKind};
use crate::layout::Layout;
use crate::theme::Theme;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Positioned chart in the shape the board renders directly.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDump {
    pub algorithm: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub position: Position,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
    pub color: String,
    pub data: NodeData,
}

#[derive(Debug, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(rename = "type")]
    pub edge_type: &'static str,
    pub animated: bool,
    pub style: EdgeStyleDump,
    pub constraining: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeStyleDump {
    pub stroke: String,
}

impl ChartDump {
    pub fn from_layout(layout: &Layout, theme: &Theme) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                node_type: match node.kind {
                    NodeKind::Person => "custom",
                    NodeKind::Department => "department",
                },
                position: Position {
                    x: node.x,
                    y: node.y,
                },
                width: node.width,
                height: node.height,
                rank: node.rank,
                color: theme.node_color(node.kind).to_string(),
                data: node.data.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind,
                edge_type: "smoothstep",
                animated: theme.edge_animated(edge.kind),
                style: EdgeStyleDump {
                    stroke: theme.edge_stroke(edge.kind).to_string(),
                },
                constraining: edge.constraining,
            })
            .collect();

        ChartDump {
            algorithm: format!("{:?}", layout.algorithm).to_lowercase(),
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

/// Writes the chart as JSON to `path`, or to stdout when no path is given.
pub fn write_chart_dump(
    layout: &Layout,
    theme: &Theme,
    path: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let dump = ChartDump::from_layout(layout, theme);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_json(writer, &dump, pretty)
        }
        None => write_json(io::stdout().lock(), &dump, pretty),
    }
}

fn write_json<W: Write>(mut writer: W, dump: &ChartDump, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, dump)?;
    } else {
        serde_json::to_writer(&mut writer, dump)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutAlgorithm, LayoutConfig};
    use crate::layout::compute_layout;
    use crate::model::{Department, Person};
    use crate::resolve::resolve;

    #[test]
    fn dump_uses_board_field_names() {
        let graph = resolve(
            &[
                Person::new("alice", "Alice", "CTO"),
                Person::new("bob", "Bob", "Dev").with_manager("alice"),
            ],
            &[Department::new("eng", "Engineering").with_manager("alice")],
        );
        let config = LayoutConfig::default().with_algorithm(LayoutAlgorithm::Layered);
        let layout = compute_layout(&graph, &config);
        let value = serde_json::to_value(ChartDump::from_layout(&layout, &Theme::classic())).unwrap();

        assert_eq!(value["algorithm"], "layered");
        let dept = &value["nodes"][0];
        assert_eq!(dept["id"], "dept-eng");
        assert_eq!(dept["type"], "department");
        assert_eq!(dept["data"]["subtitle"], "Alice");
        assert!(dept["position"]["x"].is_number());

        let report = value["edges"]
            .as_array()
            .unwrap()
            .iter()
            .find(|edge| edge["kind"] == "directReport")
            .unwrap();
        assert_eq!(report["source"], "alice");
        assert_eq!(report["animated"], true);
        assert_eq!(report["style"]["stroke"], "#cccccc");
        assert_eq!(report["type"], "smoothstep");
    }
}
