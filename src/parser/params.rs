//! Parameter-list parsing for function and constructor signatures.

use crate::model::Parameter;
use regex::Regex;
use std::sync::LazyLock;

// `type [location] name`, e.g. `bytes calldata inputProof`, `mapping(address => uint) storage m`
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)(?:\s+(memory|storage|calldata|payable|indexed))?\s+([A-Za-z_$][\w$]*)$",
    )
    .unwrap()
});

/// Keywords that can never be a parameter name.
const RESERVED: &[&str] = &["memory", "storage", "calldata", "payable", "indexed"];

/// Split on commas that are not nested inside parentheses or brackets.
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = list[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Parse a parameter list into named parameters, skipping segments that
/// do not have the `type [location] name` shape (e.g. unnamed parameters).
pub fn parse_params(list: &str) -> Vec<Parameter> {
    split_top_level(list)
        .into_iter()
        .filter_map(parse_param)
        .collect()
}

fn parse_param(segment: &str) -> Option<Parameter> {
    let normalized = segment.split_whitespace().collect::<Vec<_>>().join(" ");
    let caps = RE_PARAM.captures(&normalized)?;
    let name = caps[3].to_string();
    if RESERVED.contains(&name.as_str()) {
        return None;
    }
    Some(Parameter {
        name,
        ty: caps[1].trim().to_string(),
        location: caps.get(2).map(|m| m.as_str().to_string()),
        description: None,
    })
}

/// Render the types of a `returns (...)` list, keeping names out.
pub fn parse_return_types(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .map(|segment| match parse_param(segment) {
            Some(param) => param.ty,
            None => segment.split_whitespace().collect::<Vec<_>>().join(" "),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_signature() {
        let params = parse_params("externalEuint8 inputA, bytes calldata inputProof");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "inputA");
        assert_eq!(params[0].ty, "externalEuint8");
        assert_eq!(params[1].name, "inputProof");
        assert_eq!(params[1].ty, "bytes");
        assert_eq!(params[1].location.as_deref(), Some("calldata"));
    }

    #[test]
    fn nested_commas() {
        let parts = split_top_level("mapping(address => uint256) storage m, uint256[2] memory xs");
        assert_eq!(parts.len(), 2);
        let params = parse_params("function(uint, uint) external cb, address payable to");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].location.as_deref(), Some("payable"));
    }

    #[test]
    fn unnamed_parameters_are_skipped() {
        assert!(parse_params("uint256, bytes memory").is_empty());
        assert!(parse_params("").is_empty());
        assert!(parse_params("   ").is_empty());
    }

    #[test]
    fn multiline_whitespace() {
        let params = parse_params("\n        euint32 a,\n        euint32   b\n    ");
        assert_eq!(params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn return_types() {
        assert_eq!(parse_return_types("euint32"), vec!["euint32"]);
        assert_eq!(parse_return_types("ebool ok, uint256 count"), vec!["ebool", "uint256"]);
    }
}
