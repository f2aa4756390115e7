//! Solidity declaration extractor.
//!
//! Pattern-matches declaration shapes against comment-masked source text,
//! pairs each one with the doc comment right above it and attaches the parsed
//! tags. There is no grammar here: odd input yields fewer entities, never an
//! error.

use super::mask::{brace_depths, mask, matching};
use super::params::{parse_params, parse_return_types, split_top_level};
use super::tags::parse_tags;
use crate::docblock;
use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

static RE_CONTRACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(abstract[ \t]+)?(contract|library|interface)\s+([A-Za-z_$][\w$]*)([^{;]*)\{")
        .unwrap()
});

static RE_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfunction\s+([A-Za-z_$][\w$]*)\s*\(").unwrap());

static RE_CONSTRUCTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bconstructor\s*\(").unwrap());

// `fallback(...)` and `receive()` are declared without the `function` keyword
static RE_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(fallback|receive)\s*\(").unwrap());

static RE_STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bstruct\s+([A-Za-z_$][\w$]*)\s*\{").unwrap());

static RE_ENUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\benum\s+([A-Za-z_$][\w$]*)\s*\{").unwrap());

// `<type> [qualifiers] <name> [= value];` at the start of a line
static RE_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*(mapping\s*\(.*?\)|[A-Za-z_$][\w$.]*(?:\s*\[[^\]]*\])*)",
        r"((?:\s+(?:public|private|internal|constant|immutable|override|transient))*)",
        r"\s+([A-Za-z_$][\w$]*)\s*(?:=\s*([^;]*))?;"
    ))
    .unwrap()
});

static RE_RETURNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\breturns\s*\(").unwrap());

static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_$][\w$]*").unwrap());

static RE_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+([A-Za-z_$][\w$]*)$").unwrap());

/// Statement keywords that look like `<type> <name>;` to the variable pattern.
const NOT_A_TYPE: &[&str] = &[
    "return", "emit", "delete", "using", "import", "pragma", "revert", "else", "new", "throw",
];

const VISIBILITY: &[&str] = &["public", "private", "internal", "external"];
const MUTABILITY: &[&str] = &["view", "pure", "payable"];
const SPECIFIERS: &[&str] = &["virtual", "override"];

/// A contract body: offsets of its braces and the brace depth of its members.
struct Body {
    open: usize,
    close: usize,
    depth: usize,
}

/// Shared per-file scan state.
struct Scan<'a> {
    source: &'a str,
    masked: String,
    depths: Vec<usize>,
    bodies: Vec<Body>,
}

impl<'a> Scan<'a> {
    fn new(source: &'a str) -> Self {
        let masked = mask(source);
        let depths = brace_depths(&masked);
        let mut scan = Scan {
            source,
            masked,
            depths,
            bodies: Vec::new(),
        };
        scan.bodies = RE_CONTRACT
            .captures_iter(&scan.masked)
            .filter_map(|caps| {
                let open = caps.get(0)?.end() - 1;
                let close = matching(&scan.masked, open).unwrap_or(scan.masked.len());
                Some(Body {
                    open,
                    close,
                    depth: scan.depth_at(open) + 1,
                })
            })
            .collect();
        scan
    }

    fn depth_at(&self, offset: usize) -> usize {
        self.depths.get(offset).copied().unwrap_or(0)
    }

    /// True when `offset` sits directly in a contract body, not in a nested block.
    fn at_contract_level(&self, offset: usize) -> bool {
        let depth = self.depth_at(offset);
        self.bodies
            .iter()
            .any(|b| b.open < offset && offset < b.close && b.depth == depth)
    }

    fn docs(&self, kind: EntityKind, offset: usize) -> TagRecord {
        match preceding_docblock(self.source, offset) {
            Some(raw) => parse_tags(kind, &docblock::normalize(raw)),
            None => TagRecord::default(),
        }
    }
}

/// Extract every declaration of every kind, ordered by position in the source.
pub fn extract_entities(source: &str) -> Vec<SourceEntity> {
    let scan = Scan::new(source);
    let mut entities = Vec::new();
    entities.extend(contracts(&scan));
    entities.extend(functions(&scan));
    entities.extend(constructors(&scan));
    entities.extend(special_functions(&scan));
    entities.extend(structs(&scan));
    entities.extend(enums(&scan));
    entities.extend(variables(&scan));
    entities.sort_by_key(|e| e.offset);
    entities
}

fn contracts(scan: &Scan) -> Vec<SourceEntity> {
    RE_CONTRACT
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let keyword = caps.get(2)?;
            let offset = caps.get(1).unwrap_or(keyword).start();
            let heritage = caps.get(4).map_or("", |m| m.as_str()).trim();
            let inherits = heritage
                .strip_prefix("is")
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .map(|rest| {
                    split_top_level(rest)
                        .into_iter()
                        .filter_map(|base| RE_IDENT.find(base).map(|m| m.as_str().to_string()))
                        .collect()
                })
                .unwrap_or_default();
            Some(SourceEntity {
                kind: EntityKind::Contract,
                name: caps[3].to_string(),
                offset,
                facts: EntityFacts::Contract(ContractFacts {
                    keyword: keyword.as_str().to_string(),
                    is_abstract: caps.get(1).is_some(),
                    inherits,
                }),
                docs: scan.docs(EntityKind::Contract, offset),
            })
        })
        .collect()
}

fn functions(scan: &Scan) -> Vec<SourceEntity> {
    RE_FUNCTION
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let docs = scan.docs(EntityKind::Function, whole.start());
            let facts = signature(scan, whole.end() - 1, &docs)?;
            Some(SourceEntity {
                kind: EntityKind::Function,
                name: caps[1].to_string(),
                offset: whole.start(),
                facts: EntityFacts::Function(facts),
                docs,
            })
        })
        .collect()
}

fn constructors(scan: &Scan) -> Vec<SourceEntity> {
    RE_CONSTRUCTOR
        .find_iter(&scan.masked)
        .filter_map(|m| {
            let docs = scan.docs(EntityKind::Constructor, m.start());
            let facts = signature(scan, m.end() - 1, &docs)?;
            Some(SourceEntity {
                kind: EntityKind::Constructor,
                name: "constructor".to_string(),
                offset: m.start(),
                facts: EntityFacts::Constructor(facts),
                docs,
            })
        })
        .collect()
}

fn special_functions(scan: &Scan) -> Vec<SourceEntity> {
    RE_SPECIAL
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let preceding = scan.masked[..whole.start()].trim_end();
            if !scan.at_contract_level(whole.start()) || preceding.ends_with("function") {
                return None;
            }
            let docs = scan.docs(EntityKind::Function, whole.start());
            let facts = signature(scan, whole.end() - 1, &docs)?;
            Some(SourceEntity {
                kind: EntityKind::Function,
                name: caps[1].to_string(),
                offset: whole.start(),
                facts: EntityFacts::Function(facts),
                docs,
            })
        })
        .collect()
}

/// Parse `( params ) tail` starting at the opening parenthesis.
fn signature(scan: &Scan, open: usize, docs: &TagRecord) -> Option<FunctionFacts> {
    let close = matching(&scan.masked, open)?;
    let mut params = parse_params(&scan.masked[open + 1..close]);
    for param in &mut params {
        param.description = docs.param(&param.name).map(str::to_string);
    }

    // Everything up to the body or the terminating semicolon
    let rest = &scan.masked[close + 1..];
    let end = rest.find(|c: char| c == '{' || c == ';').unwrap_or(rest.len());
    let mut tail = rest[..end].to_string();

    let mut returns = Vec::new();
    if let Some((start, paren)) = RE_RETURNS.find(&tail).map(|m| (m.start(), m.end() - 1)) {
        if let Some(ret_close) = matching(&tail, paren) {
            returns = parse_return_types(&tail[paren + 1..ret_close]);
            tail.replace_range(start..=ret_close, " ");
        }
    }

    let mut facts = FunctionFacts {
        params,
        returns,
        ..Default::default()
    };
    let mut words = RE_IDENT.find_iter(&tail).peekable();
    while let Some(word) = words.next() {
        let w = word.as_str();
        if VISIBILITY.contains(&w) {
            facts.visibility = Some(w.to_string());
        } else if MUTABILITY.contains(&w) {
            facts.mutability = Some(w.to_string());
        } else if !SPECIFIERS.contains(&w) {
            facts.modifiers.push(w.to_string());
        }
        // Skip modifier arguments and `override(A, B)` lists
        let after = tail[word.end()..].trim_start();
        if after.starts_with('(') {
            let paren = tail.len() - after.len();
            if let Some(arg_close) = matching(&tail, paren) {
                while words.peek().is_some_and(|next| next.start() < arg_close) {
                    words.next();
                }
            }
        }
    }
    Some(facts)
}

fn structs(scan: &Scan) -> Vec<SourceEntity> {
    RE_STRUCT
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let open = whole.end() - 1;
            let close = matching(&scan.masked, open)?;
            let docs = scan.docs(EntityKind::Struct, whole.start());
            let members = scan.masked[open + 1..close]
                .split(';')
                .filter_map(|decl| {
                    let decl = decl.split_whitespace().collect::<Vec<_>>().join(" ");
                    let member = RE_MEMBER.captures(&decl)?;
                    let name = member[2].to_string();
                    Some(Member {
                        description: field_doc(&docs, &name),
                        ty: Some(member[1].to_string()),
                        name,
                    })
                })
                .collect();
            Some(SourceEntity {
                kind: EntityKind::Struct,
                name: caps[1].to_string(),
                offset: whole.start(),
                facts: EntityFacts::Struct(StructFacts { members }),
                docs,
            })
        })
        .collect()
}

fn enums(scan: &Scan) -> Vec<SourceEntity> {
    RE_ENUM
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let open = whole.end() - 1;
            let close = matching(&scan.masked, open)?;
            let docs = scan.docs(EntityKind::Enum, whole.start());
            let members = scan.masked[open + 1..close]
                .split(',')
                .map(str::trim)
                .filter(|name| RE_IDENT.find(name).is_some_and(|m| m.as_str() == *name))
                .map(|name| Member {
                    name: name.to_string(),
                    ty: None,
                    description: docs
                        .values
                        .iter()
                        .find(|v| v.name == name)
                        .map(|v| v.description.clone())
                        .filter(|d| !d.is_empty())
                        .or_else(|| field_doc(&docs, name)),
                })
                .collect();
            Some(SourceEntity {
                kind: EntityKind::Enum,
                name: caps[1].to_string(),
                offset: whole.start(),
                facts: EntityFacts::Enum(EnumFacts { members }),
                docs,
            })
        })
        .collect()
}

fn field_doc(docs: &TagRecord, name: &str) -> Option<String> {
    docs.fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.description.clone())
        .filter(|d| !d.is_empty())
}

/// State variables (contract level) and constants (file or contract level).
fn variables(scan: &Scan) -> Vec<SourceEntity> {
    RE_VARIABLE
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let ty_match = caps.get(1)?;
            let ty = ty_match.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
            if NOT_A_TYPE.contains(&ty.as_str()) {
                return None;
            }
            let offset = ty_match.start();
            let qualifiers: Vec<&str> = caps
                .get(2)
                .map_or("", |m| m.as_str())
                .split_whitespace()
                .collect();
            let name = caps[3].to_string();
            let contract_level = scan.at_contract_level(offset);

            if qualifiers.contains(&"constant") {
                if !(contract_level || scan.depth_at(offset) == 0) {
                    return None;
                }
                let docs = scan.docs(EntityKind::Constant, offset);
                let value = caps
                    .get(4)
                    .and_then(|m| scan.source.get(m.range()))
                    .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
                    .filter(|v| !v.is_empty());
                return Some(SourceEntity {
                    kind: EntityKind::Constant,
                    name,
                    offset,
                    facts: EntityFacts::Constant(ConstantFacts { ty, value }),
                    docs,
                });
            }

            if !contract_level {
                return None;
            }
            let visibility = qualifiers
                .iter()
                .find(|q| VISIBILITY.contains(q))
                .map(|q| q.to_string());
            Some(SourceEntity {
                kind: EntityKind::StateVariable,
                docs: scan.docs(EntityKind::StateVariable, offset),
                name,
                offset,
                facts: EntityFacts::StateVariable(VariableFacts {
                    ty,
                    visibility,
                    immutable: qualifiers.contains(&"immutable"),
                }),
            })
        })
        .collect()
}

/// The doc comment immediately above `offset`, separated only by whitespace.
///
/// Either one `/** ... */` block or a run of consecutive `///` lines.
pub fn preceding_docblock(source: &str, offset: usize) -> Option<&str> {
    let before = source.get(..offset)?.trim_end();

    if before.ends_with("*/") {
        let start = before.rfind("/*")?;
        return before[start..].starts_with("/**").then(|| &before[start..]);
    }

    let mut start = None;
    let mut cursor = before.len();
    loop {
        let line_start = before[..cursor].rfind('\n').map_or(0, |i| i + 1);
        if !before[line_start..cursor].trim_start().starts_with("///") {
            break;
        }
        start = Some(line_start);
        if line_start == 0 {
            break;
        }
        cursor = line_start - 1;
    }
    start.map(|s| &before[s..])
}
