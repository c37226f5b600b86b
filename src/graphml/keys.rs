//! GraphML attribute key dictionary.

/// One `<key>` declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDecl {
    pub id: &'static str,
    pub attr_name: &'static str,
    pub attr_type: &'static str,
}

/// Keys declared on every exported document, in the order their `<data>`
/// children appear on each node.
pub const NODE_KEYS: [KeyDecl; 7] = [
    KeyDecl { id: "label", attr_name: "label", attr_type: "string" },
    KeyDecl { id: "size", attr_name: "size", attr_type: "double" },
    KeyDecl { id: "version", attr_name: "version", attr_type: "string" },
    KeyDecl { id: "latency", attr_name: "latency", attr_type: "string" },
    KeyDecl { id: "bitcoin_conf", attr_name: "bitcoin_conf", attr_type: "string" },
    KeyDecl { id: "x", attr_name: "x", attr_type: "float" },
    KeyDecl { id: "y", attr_name: "y", attr_type: "float" },
];

/// Node attributes the decoder knows how to assign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAttribute {
    Label,
    Size,
    Version,
    Latency,
    BitcoinConf,
    X,
    Y,
    Ram,
    Cpu,
    BaseFee,
}

impl NodeAttribute {
    /// Resolve a declared `attr.name`. Older assets spell some names in
    /// camelCase.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "label" => Some(Self::Label),
            "size" => Some(Self::Size),
            "version" => Some(Self::Version),
            "latency" | "latencyProfile" => Some(Self::Latency),
            "bitcoin_conf" | "bitcoinConf" => Some(Self::BitcoinConf),
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "ram" => Some(Self::Ram),
            "cpu" => Some(Self::Cpu),
            "base_fee" | "baseFee" => Some(Self::BaseFee),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_keys_resolve() {
        for key in NODE_KEYS {
            assert!(NodeAttribute::from_name(key.attr_name).is_some(), "{} unresolved", key.id);
        }
        assert_eq!(NodeAttribute::from_name("baseFee"), Some(NodeAttribute::BaseFee));
        assert_eq!(NodeAttribute::from_name("tc_netem"), None);
    }
}
