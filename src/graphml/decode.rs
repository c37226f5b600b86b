//! GraphML decoder.
//!
//! [`decode_str`] is strict and reports why a document was rejected.
//! [`decode`] and [`decode_file`] never fail: a document that cannot be read
//! or parsed yields an empty [`PartialTopology`] and a warning, so a broken
//! preset can never take the editor down with it.

use log::{debug, info, warn};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

use crate::topology::{NetworkEdge, NetworkNode, NodeId, ResourceProfile};
use crate::utils::bitcoin_conf;

use super::keys::NodeAttribute;
use super::{DecodeError, PartialTopology};

fn malformed(err: impl std::fmt::Display) -> DecodeError {
    DecodeError::Malformed(err.to_string())
}

fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>, DecodeError> {
    for attr in element.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value().map_err(malformed)?.into_owned()));
        }
    }
    Ok(None)
}

fn required(element: &BytesStart, name: &'static str, tag: &'static str) -> Result<String, DecodeError> {
    attribute(element, name.as_bytes())?.ok_or(DecodeError::MissingAttribute {
        element: tag,
        attribute: name,
    })
}

/// A node being read, with resource fields collected separately since a
/// document may carry only one of them
struct NodeBuilder {
    node: NetworkNode,
    ram: Option<u32>,
    cpu: Option<u32>,
}

impl NodeBuilder {
    fn new(id: String) -> Self {
        Self {
            node: NetworkNode::new(id, ""),
            ram: None,
            cpu: None,
        }
    }

    fn assign(&mut self, name: &str, value: &str) {
        let node = &mut self.node;
        let Some(attribute) = NodeAttribute::from_name(name) else {
            debug!("Ignoring unknown attribute '{}' on node {}", name, node.id);
            return;
        };

        match attribute {
            NodeAttribute::Label => node.label = value.to_string(),
            NodeAttribute::Size => {
                if let Some(size) = parse_number::<f64>(value, "size", &node.id) {
                    node.size = size;
                }
            }
            NodeAttribute::Version => node.version = non_empty(value),
            NodeAttribute::Latency => node.latency_profile = non_empty(value),
            NodeAttribute::BitcoinConf => node.bitcoin_conf_overrides = bitcoin_conf::unflatten(value),
            NodeAttribute::X => {
                if let Some(x) = parse_number::<f64>(value, "x", &node.id) {
                    node.position.x = x;
                }
            }
            NodeAttribute::Y => {
                if let Some(y) = parse_number::<f64>(value, "y", &node.id) {
                    node.position.y = y;
                }
            }
            NodeAttribute::Ram => self.ram = parse_number::<u32>(value, "ram", &node.id),
            NodeAttribute::Cpu => self.cpu = parse_number::<u32>(value, "cpu", &node.id),
            NodeAttribute::BaseFee => node.base_fee_rate = parse_number::<f64>(value, "base_fee", &node.id),
        }
    }

    fn finish(self) -> NetworkNode {
        let mut node = self.node;
        if node.label.is_empty() {
            node.label = node.id.to_string();
        }
        if self.ram.is_some() || self.cpu.is_some() {
            node.resource_profile = Some(ResourceProfile {
                ram: self.ram.unwrap_or_default(),
                cpu: self.cpu.unwrap_or_default(),
            });
        }
        node
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str, node: &NodeId) -> Option<T> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            warn!("Node {}: '{}' is not a valid {} value", node, value, name);
            None
        }
    }
}

fn read_edge(element: &BytesStart) -> Result<NetworkEdge, DecodeError> {
    let source = required(element, "source", "edge")?;
    let target = required(element, "target", "edge")?;
    Ok(NetworkEdge::new(source, target))
}

/// Decode a GraphML document, reporting the first problem found
pub fn decode_str(text: &str) -> Result<PartialTopology, DecodeError> {
    let mut reader = Reader::from_str(text);
    let mut result = PartialTopology::default();

    // <key id> -> attr.name
    let mut keys: HashMap<String, String> = HashMap::new();
    let mut current: Option<NodeBuilder> = None;
    // (key, accumulated text) of the <data> being read inside a node
    let mut data: Option<(String, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(ref e) => {
                depth += 1;
                match e.name().as_ref() {
                    b"key" => register_key(e, &mut keys)?,
                    b"node" => current = Some(NodeBuilder::new(required(e, "id", "node")?)),
                    b"data" if current.is_some() => data = Some((required(e, "key", "data")?, String::new())),
                    b"edge" => result.edges.push(read_edge(e)?),
                    _ => {}
                }
            }
            Event::Empty(ref e) => match e.name().as_ref() {
                b"key" => register_key(e, &mut keys)?,
                b"node" => result.nodes.push(NodeBuilder::new(required(e, "id", "node")?).finish()),
                b"data" => {
                    if let Some(builder) = current.as_mut() {
                        let key = required(e, "key", "data")?;
                        let name = keys.get(&key).map(String::as_str).unwrap_or(key.as_str());
                        builder.assign(name, "");
                    }
                }
                b"edge" => result.edges.push(read_edge(e)?),
                _ => {}
            },
            Event::Text(e) => {
                if let Some((_, text)) = data.as_mut() {
                    text.push_str(&e.xml_content().map_err(malformed)?);
                }
            }
            Event::CData(e) => {
                if let Some((_, text)) = data.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let Some((_, text)) = data.as_mut() {
                    match e.resolve_char_ref().map_err(malformed)? {
                        Some(ch) => text.push(ch),
                        None => {
                            let name = e.decode().map_err(malformed)?;
                            let resolved = resolve_predefined_entity(&name)
                                .ok_or_else(|| DecodeError::Malformed(format!("unknown entity &{};", name)))?;
                            text.push_str(resolved);
                        }
                    }
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"data" => {
                        if let (Some((key, text)), Some(builder)) = (data.take(), current.as_mut()) {
                            let name = keys.get(&key).map(String::as_str).unwrap_or(key.as_str());
                            builder.assign(name, &text);
                        }
                    }
                    b"node" => {
                        if let Some(builder) = current.take() {
                            result.nodes.push(builder.finish());
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(DecodeError::Truncated(depth));
                }
                break;
            }
            _ => {}
        }
    }

    debug!(
        "Decoded {} nodes and {} edges using {} declared keys",
        result.nodes.len(),
        result.edges.len(),
        keys.len()
    );
    Ok(result)
}

fn register_key(element: &BytesStart, keys: &mut HashMap<String, String>) -> Result<(), DecodeError> {
    let id = required(element, "id", "key")?;
    let name = attribute(element, b"attr.name")?.unwrap_or_else(|| id.clone());
    keys.insert(id, name);
    Ok(())
}

/// Decode a document, returning an empty result on any failure
///
/// `source` identifies the document in log output.
pub fn decode(text: &str, source: &str) -> PartialTopology {
    match decode_str(text) {
        Ok(partial) => {
            info!(
                "Loaded {} nodes and {} edges from {}",
                partial.nodes.len(),
                partial.edges.len(),
                source
            );
            partial
        }
        Err(e) => {
            warn!("Failed to decode GraphML from {}: {}", source, e);
            PartialTopology::default()
        }
    }
}

/// Read and strictly decode a GraphML file
pub fn try_decode_file(path: &Path) -> Result<PartialTopology, DecodeError> {
    let text = std::fs::read_to_string(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_str(&text)
}

/// Read and decode a GraphML file, returning an empty result on any failure
pub fn decode_file(path: &Path) -> PartialTopology {
    match std::fs::read_to_string(path) {
        Ok(text) => decode(&text, &path.display().to_string()),
        Err(e) => {
            warn!("Failed to read GraphML file {:?}: {}", path, e);
            PartialTopology::default()
        }
    }
}
