//! Data model for extracted documentation, format-agnostic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declaration kinds recognized by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Contract,
    Function,
    StateVariable,
    Struct,
    Enum,
    Constant,
    Constructor,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Contract => "contract",
            EntityKind::Function => "function",
            EntityKind::StateVariable => "stateVariable",
            EntityKind::Struct => "struct",
            EntityKind::Enum => "enum",
            EntityKind::Constant => "constant",
            EntityKind::Constructor => "constructor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured tags parsed from one doc block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagRecord {
    /// @title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// @author entries, raw text
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// @notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub dev: DevNotes,
    /// @param entries in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDoc>,
    /// @return / @returns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    /// @name (variables and constants)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// @type (variables and constants)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// @field entries or `- name (type): description` bullets
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDoc>,
    /// @value entries or `- NAME: description` bullets
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ValueDoc>,
    /// @custom:<key> entries
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl TagRecord {
    pub fn is_empty(&self) -> bool {
        *self == TagRecord::default()
    }

    /// Description of a documented parameter, looked up by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn custom(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }
}

/// @dev content. Contracts split it into sub-sections; other kinds only use `notes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DevNotes {
    /// Lines after a `Usage summary:` marker
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
    /// Lines after a `Prerequisites:` marker
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    /// Unmarked @dev content
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl DevNotes {
    pub fn is_empty(&self) -> bool {
        self.usage.is_empty() && self.prerequisites.is_empty() && self.notes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDoc {
    pub name: String,
    pub description: String,
}

/// One declaration found in a source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntity {
    pub kind: EntityKind,
    pub name: String,
    /// Byte offset of the declaration keyword in the source
    pub offset: usize,
    pub facts: EntityFacts,
    pub docs: TagRecord,
}

impl SourceEntity {
    pub fn is_documented(&self) -> bool {
        !self.docs.is_empty()
    }
}

/// Kind-specific structural facts read from the declaration itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityFacts {
    Contract(ContractFacts),
    Function(FunctionFacts),
    Constructor(FunctionFacts),
    StateVariable(VariableFacts),
    Constant(ConstantFacts),
    Struct(StructFacts),
    Enum(EnumFacts),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContractFacts {
    /// `contract`, `library` or `interface`
    pub keyword: String,
    pub is_abstract: bool,
    pub inherits: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionFacts {
    pub params: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutability: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<String>,
}

/// A parameter parsed from a signature, with its @param description if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// `memory`, `calldata`, `storage`, `payable`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VariableFacts {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub immutable: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConstantFacts {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StructFacts {
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnumFacts {
    pub members: Vec<Member>,
}

/// Struct member or enum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
