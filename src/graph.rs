//! Graph of SCION connections between ASes.
//!
//! Built from the declared links: one vertex per (ISD, AS), one edge per link
//! repetition. Core ASes are drawn as double circles. Core links are bold,
//! peering links dashed, and transit links carry a `P` label at the first
//! declared end and a `C` label at the second. [`Graph::to_dot`] renders the
//! graph in GraphViz format.

use crate::emulation::Emulation;
use crate::links::{LinkEnds, LinkRegistry};
use crate::scion::{IsdAsn, LinkType};
use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    DoubleCircle,
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Circle => f.write_str("circle"),
            Shape::DoubleCircle => f.write_str("doublecircle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Solid,
    Bold,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub name: String,
    pub group: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// (group, name) of the first end
    pub a: (String, String),
    pub b: (String, String),
    pub label: Option<String>,
    pub a_label: Option<String>,
    pub b_label: Option<String>,
    pub style: EdgeStyle,
}

/// Undirected graph with vertices grouped into clusters
#[derive(Debug, Clone)]
pub struct Graph {
    pub name: String,
    vertices: IndexMap<(String, String), Vertex>,
    edges: Vec<Edge>,
}

fn vertex_key(ia: IsdAsn) -> (String, String) {
    (format!("ISD{}", ia.isd), format!("AS{}", ia.asn))
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: IndexMap::new(),
            edges: Vec::new(),
        }
    }

    /// Add a vertex unless one with the same group and name exists
    pub fn add_vertex(&mut self, name: String, group: String, shape: Shape) {
        self.vertices
            .entry((group.clone(), name.clone()))
            .or_insert(Vertex { name, group, shape });
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Render as an undirected GraphViz graph with one cluster per group
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str(&format!("graph \"{}\" {{\n", self.name));
        dot.push_str(&format!("    label=\"{}\";\n", self.name));
        dot.push_str("    labelloc=t;\n");

        let mut groups: IndexMap<&str, Vec<&Vertex>> = IndexMap::new();
        for vertex in self.vertices.values() {
            groups.entry(vertex.group.as_str()).or_default().push(vertex);
        }
        for (i, (group, vertices)) in groups.iter().enumerate() {
            dot.push_str(&format!("    subgraph cluster_{} {{\n", i));
            dot.push_str(&format!("        label=\"{}\";\n", group));
            for vertex in vertices {
                dot.push_str(&format!(
                    "        \"{}_{}\" [label=\"{}\", shape={}];\n",
                    vertex.group, vertex.name, vertex.name, vertex.shape
                ));
            }
            dot.push_str("    }\n");
        }

        dot.push('\n');
        for edge in &self.edges {
            let mut attrs = Vec::new();
            if let Some(label) = &edge.label {
                attrs.push(format!("label=\"{}\"", label));
            }
            if let Some(label) = &edge.a_label {
                attrs.push(format!("taillabel=\"{}\"", label));
            }
            if let Some(label) = &edge.b_label {
                attrs.push(format!("headlabel=\"{}\"", label));
            }
            match edge.style {
                EdgeStyle::Solid => {}
                EdgeStyle::Bold => attrs.push("style=bold".to_string()),
                EdgeStyle::Dashed => attrs.push("style=dashed".to_string()),
            }
            dot.push_str(&format!(
                "    \"{}_{}\" -- \"{}_{}\"",
                edge.a.0, edge.a.1, edge.b.0, edge.b.1
            ));
            if !attrs.is_empty() {
                dot.push_str(&format!(" [{}]", attrs.join(", ")));
            }
            dot.push_str(";\n");
        }
        dot.push_str("}\n");
        dot
    }
}

fn add_link(graph: &mut Graph, emulation: &Emulation, ends: &LinkEnds, label: Option<String>, count: u32) {
    for ia in [ends.a, ends.b] {
        let shape = if emulation.is_core_as(ia) {
            Shape::DoubleCircle
        } else {
            Shape::Circle
        };
        let (group, name) = vertex_key(ia);
        graph.add_vertex(name, group, shape);
    }

    let (style, a_label, b_label) = match ends.link_type {
        LinkType::Core => (EdgeStyle::Bold, None, None),
        LinkType::Transit => (EdgeStyle::Solid, Some("P".to_string()), Some("C".to_string())),
        LinkType::Peer => (EdgeStyle::Dashed, None, None),
    };
    for _ in 0..count {
        graph.add_edge(Edge {
            a: vertex_key(ends.a),
            b: vertex_key(ends.b),
            label: label.clone(),
            a_label: a_label.clone(),
            b_label: b_label.clone(),
            style,
        });
    }
}

/// Graph of all declared links, cross-connects first
pub fn build_link_graph(links: &LinkRegistry, emulation: &Emulation) -> Graph {
    log::info!("Creating SCION graphs...");
    let mut graph = Graph::new("Scion Connections");
    for (ends, count) in links.cross_connects() {
        add_link(&mut graph, emulation, ends, None, count);
    }
    for (exchange, ends, count) in links.exchange_links() {
        add_link(&mut graph, emulation, ends, Some(format!("IX{}", exchange)), count);
    }
    graph
}
