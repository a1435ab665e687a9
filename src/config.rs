use crate::graph::NodeKind;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which layering implementation places the nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LayoutAlgorithm {
    /// Sugiyama-style layout from `dagre_rust`.
    #[default]
    Dagre,
    /// Built-in longest-path layering with barycenter ordering.
    Layered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub algorithm: LayoutAlgorithm,
    pub person_width: f32,
    pub person_height: f32,
    pub department_width: f32,
    pub department_height: f32,
    /// Minimum horizontal gap between neighbouring nodes of one rank.
    pub node_spacing: f32,
    /// Minimum vertical gap between ranks.
    pub rank_spacing: f32,
    pub margin: f32,
    pub order_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::default(),
            person_width: 220.0,
            person_height: 100.0,
            department_width: 220.0,
            department_height: 100.0,
            node_spacing: 70.0,
            rank_spacing: 70.0,
            margin: 0.0,
            order_passes: 4,
        }
    }
}

impl LayoutConfig {
    /// Same box for every node type.
    pub fn uniform(width: f32, height: f32, rank_spacing: f32, node_spacing: f32) -> Self {
        Self {
            person_width: width,
            person_height: height,
            department_width: width,
            department_height: height,
            node_spacing,
            rank_spacing,
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: LayoutAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn node_size(&self, kind: NodeKind) -> (f32, f32) {
        match kind {
            NodeKind::Person => (self.person_width, self.person_height),
            NodeKind::Department => (self.department_width, self.department_height),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    person_color: Option<String>,
    department_color: Option<String>,
    manages_department_stroke: Option<String>,
    membership_stroke: Option<String>,
    direct_report_stroke: Option<String>,
    animate_direct_reports: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    algorithm: Option<LayoutAlgorithm>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    person_width: Option<f32>,
    person_height: Option<f32>,
    department_width: Option<f32>,
    department_height: Option<f32>,
    #[serde(alias = "nodesep")]
    node_spacing: Option<f32>,
    #[serde(alias = "ranksep")]
    rank_spacing: Option<f32>,
    margin: Option<f32>,
    order_passes: Option<usize>,
}

/// Loads a JSON (or JSON5) config file on top of the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "classic" | "default" => config.theme = Theme::classic(),
            "muted" => config.theme = Theme::muted(),
            other => anyhow::bail!("unknown theme `{other}`"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.person_color {
            config.theme.person_color = v;
        }
        if let Some(v) = vars.department_color {
            config.theme.department_color = v;
        }
        if let Some(v) = vars.manages_department_stroke {
            config.theme.manages_department_stroke = v;
        }
        if let Some(v) = vars.membership_stroke {
            config.theme.membership_stroke = v;
        }
        if let Some(v) = vars.direct_report_stroke {
            config.theme.direct_report_stroke = v;
        }
        if let Some(v) = vars.animate_direct_reports {
            config.theme.animate_direct_reports = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.algorithm {
            target.algorithm = v;
        }
        if let Some(v) = layout.node_width {
            target.person_width = v;
            target.department_width = v;
        }
        if let Some(v) = layout.node_height {
            target.person_height = v;
            target.department_height = v;
        }
        if let Some(v) = layout.person_width {
            target.person_width = v;
        }
        if let Some(v) = layout.person_height {
            target.person_height = v;
        }
        if let Some(v) = layout.department_width {
            target.department_width = v;
        }
        if let Some(v) = layout.department_height {
            target.department_height = v;
        }
        if let Some(v) = layout.node_spacing {
            target.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            target.rank_spacing = v;
        }
        if let Some(v) = layout.margin {
            target.margin = v;
        }
        if let Some(v) = layout.order_passes {
            target.order_passes = v;
        }
    }

    validate_layout(&config.layout)?;
    Ok(config)
}

fn validate_layout(layout: &LayoutConfig) -> anyhow::Result<()> {
    let sizes = [
        ("personWidth", layout.person_width),
        ("personHeight", layout.person_height),
        ("departmentWidth", layout.department_width),
        ("departmentHeight", layout.department_height),
    ];
    for (name, value) in sizes {
        if !(value.is_finite() && value > 0.0) {
            anyhow::bail!("{name} must be a positive number, got {value}");
        }
    }
    let gaps = [
        ("nodeSpacing", layout.node_spacing),
        ("rankSpacing", layout.rank_spacing),
        ("margin", layout.margin),
    ];
    for (name, value) in gaps {
        if !(value.is_finite() && value >= 0.0) {
            anyhow::bail!("{name} must be zero or positive, got {value}");
        }
    }
    Ok(())
}
