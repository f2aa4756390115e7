//! Capability vocabulary and detection of `FHE.<op>(...)` calls.

use crate::parser::mask::mask;
use regex::Regex;
use std::sync::LazyLock;

static RE_FHE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bFHE\s*\.\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

/// The fixed concept vocabulary, in presentation order.
pub const CONCEPTS: &[&str] = &[
    "encryption",
    "input-proof",
    "arithmetic",
    "comparison",
    "bitwise",
    "conditional-logic",
    "random",
    "access-control",
    "decryption",
];

/// Map one FHE library operation to its concept.
fn concept_for(op: &str) -> Option<&'static str> {
    let concept = match op {
        "add" | "sub" | "mul" | "div" | "rem" | "neg" | "min" | "max" => "arithmetic",
        "eq" | "ne" | "gt" | "ge" | "lt" | "le" => "comparison",
        "and" | "or" | "xor" | "not" | "shl" | "shr" | "rotl" | "rotr" => "bitwise",
        "select" => "conditional-logic",
        "fromExternal" => "input-proof",
        "allow" | "allowThis" | "allowTransient" | "isSenderAllowed" | "isAllowed" => {
            "access-control"
        }
        "makePubliclyDecryptable" | "requestDecryption" | "checkSignatures" => "decryption",
        "asEbool" | "asEaddress" => "encryption",
        _ if op.starts_with("asEuint") || op.starts_with("asEint") => "encryption",
        _ if op.starts_with("randEuint") || op == "randEbool" => "random",
        _ => return None,
    };
    Some(concept)
}

/// Distinct `FHE.<op>` names referenced in code, in first-occurrence order.
pub fn detect_operations(source: &str) -> Vec<String> {
    let masked = mask(source);
    let mut ops: Vec<String> = Vec::new();
    for caps in RE_FHE_CALL.captures_iter(&masked) {
        let op = format!("FHE.{}", &caps[1]);
        if !ops.contains(&op) {
            ops.push(op);
        }
    }
    ops
}

/// Concepts exercised by the source, deduplicated, in vocabulary order.
pub fn detect_concepts(source: &str) -> Vec<String> {
    let found: Vec<&str> = detect_operations(source)
        .iter()
        .filter_map(|op| concept_for(op.trim_start_matches("FHE.")))
        .collect();
    CONCEPTS
        .iter()
        .filter(|c| found.contains(*c))
        .map(|c| c.to_string())
        .collect()
}

pub fn is_concept(name: &str) -> bool {
    CONCEPTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"
contract C {
    function f(externalEuint32 x, bytes calldata proof) external {
        euint32 v = FHE.fromExternal(x, proof);
        ebool big = FHE.gt(v, FHE.asEuint32(10));
        v = FHE.select(big, FHE.add(v, v), v);
        FHE.allowThis(v);
        FHE.allow(v, msg.sender);
        // FHE.randEuint8() is only mentioned here
    }
}
"#;

    #[test]
    fn detects_operations_in_order() {
        assert_eq!(
            detect_operations(SRC),
            vec![
                "FHE.fromExternal",
                "FHE.gt",
                "FHE.asEuint32",
                "FHE.select",
                "FHE.add",
                "FHE.allowThis",
                "FHE.allow"
            ]
        );
    }

    #[test]
    fn concepts_follow_vocabulary_order() {
        assert_eq!(
            detect_concepts(SRC),
            vec![
                "encryption",
                "input-proof",
                "arithmetic",
                "comparison",
                "conditional-logic",
                "access-control"
            ]
        );
    }

    #[test]
    fn unknown_operations_are_ignored() {
        assert!(detect_concepts("x = FHE.isInitialized(v);").is_empty());
        assert!(detect_concepts("").is_empty());
    }

    #[test]
    fn vocabulary_membership() {
        assert!(is_concept("random"));
        assert!(!is_concept("magic"));
    }
}
