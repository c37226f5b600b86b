//! GraphML encoder.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use quick_xml::escape::escape;
use std::path::{Path, PathBuf};

use crate::topology::{NetworkNode, NetworkTopology};
use crate::utils::bitcoin_conf;

use super::keys::{NodeAttribute, NODE_KEYS};

/// File name offered for every export
pub const EXPORT_FILE_NAME: &str = "graph.graphml";

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

fn data_value(node: &NetworkNode, attribute: NodeAttribute) -> String {
    match attribute {
        NodeAttribute::Label => node.label.clone(),
        NodeAttribute::Size => node.size.to_string(),
        NodeAttribute::Version => node.version.clone().unwrap_or_default(),
        NodeAttribute::Latency => node.latency_profile.clone().unwrap_or_default(),
        NodeAttribute::BitcoinConf => bitcoin_conf::flatten(&node.bitcoin_conf_overrides),
        NodeAttribute::X => node.position.x.to_string(),
        NodeAttribute::Y => node.position.y.to_string(),
        NodeAttribute::Ram => node.resource_profile.map(|p| p.ram.to_string()).unwrap_or_default(),
        NodeAttribute::Cpu => node.resource_profile.map(|p| p.cpu.to_string()).unwrap_or_default(),
        NodeAttribute::BaseFee => node.base_fee_rate.map(|fee| fee.to_string()).unwrap_or_default(),
    }
}

/// Encode a topology as a GraphML document
///
/// Every declared key is written on every node, with an empty element for
/// unset fields. Edges carry no data; their id repeats the source id.
pub fn encode(topology: &NetworkTopology) -> String {
    let mut output = String::new();
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str(&format!("<graphml xmlns=\"{}\">\n", GRAPHML_NS));

    for key in NODE_KEYS {
        output.push_str(&format!(
            "  <key id=\"{}\" for=\"node\" attr.name=\"{}\" attr.type=\"{}\"/>\n",
            key.id, key.attr_name, key.attr_type
        ));
    }

    output.push_str("  <graph edgedefault=\"directed\">\n");

    for node in &topology.nodes {
        output.push_str(&format!("    <node id=\"{}\">\n", escape(node.id.as_str())));
        for key in NODE_KEYS {
            let value = NodeAttribute::from_name(key.attr_name)
                .map(|attribute| data_value(node, attribute))
                .unwrap_or_default();
            output.push_str(&format!(
                "      <data key=\"{}\">{}</data>\n",
                key.id,
                escape(value.as_str())
            ));
        }
        output.push_str("    </node>\n");
    }

    for edge in &topology.edges {
        let source = escape(edge.source.as_str());
        output.push_str(&format!(
            "    <edge id=\"{}\" source=\"{}\" target=\"{}\"/>\n",
            source,
            source,
            escape(edge.target.as_str())
        ));
    }

    output.push_str("  </graph>\n");
    output.push_str("</graphml>\n");

    log::debug!(
        "Encoded topology '{}' ({} nodes, {} edges, {} bytes)",
        topology.name,
        topology.nodes.len(),
        topology.edges.len(),
        output.len()
    );
    output
}

/// An encoded topology ready to be handed to the user as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn from_topology(topology: &NetworkTopology) -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            bytes: encode(topology).into_bytes(),
        }
    }

    /// Write the artifact into `dir` under its file name
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .wrap_err_with(|| format!("Failed to write export to '{}'", path.display()))?;
        log::info!("Exported {} bytes to {:?}", self.bytes.len(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{NetworkEdge, TopologyKind};
    use std::collections::BTreeMap;

    fn sample() -> NetworkTopology {
        let mut topology = NetworkTopology::new(0, "sample", TopologyKind::Custom);
        topology.nodes.push(NetworkNode::new("0", "alice").with_position(1.5, -2.0).with_version("26.0"));
        topology.nodes.push(NetworkNode::new("1", "bob & co"));
        topology.edges.push(NetworkEdge::new("0", "1"));
        topology
    }

    #[test]
    fn test_every_key_on_every_node() {
        let xml = encode(&sample());
        for key in NODE_KEYS {
            assert_eq!(xml.matches(&format!("<data key=\"{}\">", key.id)).count(), 2);
            assert!(xml.contains(&format!("<key id=\"{}\" for=\"node\"", key.id)));
        }
    }

    #[test]
    fn test_empty_overrides_encode_as_empty_element() {
        let xml = encode(&sample());
        assert!(xml.contains("<data key=\"bitcoin_conf\"></data>"));
        assert!(xml.contains("<data key=\"version\"></data>"));
    }

    #[test]
    fn test_overrides_and_escaping() {
        let mut topology = sample();
        let mut overrides = BTreeMap::new();
        overrides.insert("txindex".to_string(), "1".to_string());
        overrides.insert("uacomment".to_string(), "a<b".to_string());
        topology.nodes[0].bitcoin_conf_overrides = overrides;

        let xml = encode(&topology);
        assert!(xml.contains("<data key=\"bitcoin_conf\">txindex=1,uacomment=a&lt;b</data>"));
        assert!(xml.contains("<data key=\"label\">bob &amp; co</data>"));
    }

    #[test]
    fn test_edge_shape() {
        let xml = encode(&sample());
        assert!(xml.contains("<graph edgedefault=\"directed\">"));
        assert!(xml.contains("<edge id=\"0\" source=\"0\" target=\"1\"/>"));
    }

    #[test]
    fn test_export_artifact_write() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact::from_topology(&sample());
        assert_eq!(artifact.file_name, "graph.graphml");

        let path = artifact.write_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "graph.graphml");
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    }
}
