//! Handlebars rendering of the README document.
//!
//! The context handed to the template is flattened from [`Metadata`] and the
//! entity list. Sections are grouped by kind so the template controls the
//! order, and every text field is filled, falling back to a placeholder.
//!
//! ## Template variables
//!
//! - `{{title}}`, `{{name}}`, `{{description}}`, `{{details}}`, `{{category}}`,
//!   `{{chapter}}`, `{{version}}`, `{{concepts}}`, `{{tags}}`, `{{authors}}`
//! - `{{contract}}`: `name`, `keyword`, `inherits`
//! - `{{usage}}`, `{{prerequisites}}`, `{{notes}}`: dev sub-sections
//! - `{{custom}}`: `key`, `value` pairs not consumed by metadata
//! - `{{enums}}`, `{{constants}}`, `{{structs}}`, `{{state_variables}}`,
//!   `{{constructor}}`, `{{functions}}`
//! - `{{index}}`: pre-rendered function index lines

use crate::metadata::Metadata;
use crate::model::{EntityFacts, EntityKind, FunctionFacts, Member, SourceEntity, TagRecord};
use crate::render::{Document, RenderError, Renderer};
use crate::toc::{render_toc_item, Slugger};
use handlebars::Handlebars;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Built-in README template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/README.md.hbs");

const NO_DESCRIPTION: &str = "No description available.";
const NO_DETAILS: &str = "No details provided.";
const NO_RETURNS: &str = "No return value documented.";
const NO_VALUE: &str = "Not specified.";

/// `@custom:` keys already surfaced through metadata.
const METADATA_KEYS: &[&str] = &[
    "name", "details", "version", "category", "chapter", "concepts", "tags", "has-ui", "has_ui",
];

pub struct TemplateRenderer {
    template: String,
}

impl TemplateRenderer {
    pub fn new(template: String) -> Self {
        Self { template }
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, doc: &Document) -> Result<String, RenderError> {
        render_document(&self.template, doc.metadata, doc.entities)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Read a template file. A missing file is reported with its path.
pub fn read_template(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => RenderError::TemplateNotFound(path.to_path_buf()),
        _ => RenderError::ReadTemplate {
            path: path.to_path_buf(),
            source,
        },
    })
}

pub fn render_document(
    template: &str,
    metadata: &Metadata,
    entities: &[SourceEntity],
) -> Result<String, RenderError> {
    let mut hb = Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("document", template)?;
    let context = DocContext::build(metadata, entities);
    Ok(hb.render("document", &context)?)
}

// -- Context --

#[derive(Debug, Serialize)]
struct DocContext {
    title: String,
    name: String,
    description: String,
    details: String,
    category: String,
    chapter: String,
    version: String,
    concepts: Vec<String>,
    tags: Vec<String>,
    authors: Vec<AuthorView>,
    contract: Option<ContractView>,
    usage: Vec<String>,
    prerequisites: Vec<String>,
    notes: Vec<String>,
    custom: Vec<CustomView>,
    enums: Vec<TypeView>,
    constants: Vec<ValueView>,
    structs: Vec<TypeView>,
    state_variables: Vec<ValueView>,
    constructor: Option<FunctionView>,
    functions: Vec<FunctionView>,
    index: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AuthorView {
    name: String,
    email: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContractView {
    name: String,
    keyword: String,
    inherits: String,
}

#[derive(Debug, Serialize)]
struct CustomView {
    key: String,
    value: String,
}

/// Struct or enum.
#[derive(Debug, Serialize)]
struct TypeView {
    name: String,
    description: String,
    details: Vec<String>,
    members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
struct MemberView {
    name: String,
    ty: String,
    description: String,
}

/// Constant or state variable.
#[derive(Debug, Serialize)]
struct ValueView {
    name: String,
    ty: String,
    value: String,
    visibility: String,
    immutable: bool,
    description: String,
    details: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FunctionView {
    name: String,
    anchor: String,
    signature: String,
    description: String,
    details: Vec<String>,
    params: Vec<ParamView>,
    returns: String,
    modifiers: String,
}

#[derive(Debug, Serialize)]
struct ParamView {
    name: String,
    ty: String,
    description: String,
}

impl DocContext {
    fn build(metadata: &Metadata, entities: &[SourceEntity]) -> Self {
        let contract = entities.iter().find(|e| e.kind == EntityKind::Contract);
        let empty = TagRecord::default();
        let contract_docs = contract.map_or(&empty, |c| &c.docs);

        let mut ctx = DocContext {
            title: non_empty(&metadata.label)
                .or_else(|| contract.map(|c| c.name.clone()))
                .unwrap_or_else(|| metadata.name.clone()),
            name: metadata.name.clone(),
            description: non_empty(&metadata.description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            details: metadata
                .details
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| NO_DETAILS.to_string()),
            category: non_empty(&metadata.category).unwrap_or_else(|| NO_VALUE.to_string()),
            chapter: non_empty(&metadata.chapter).unwrap_or_else(|| NO_VALUE.to_string()),
            version: metadata.version.clone().unwrap_or_default(),
            concepts: metadata.concepts.clone().unwrap_or_default(),
            tags: metadata.tags.clone().unwrap_or_default(),
            authors: metadata
                .authors
                .iter()
                .map(|a| AuthorView {
                    name: a.name.clone(),
                    email: a.email.clone(),
                    url: a.url.clone(),
                })
                .collect(),
            contract: contract.map(contract_view),
            usage: contract_docs.dev.usage.clone(),
            prerequisites: contract_docs.dev.prerequisites.clone(),
            notes: contract_docs.dev.notes.clone(),
            custom: contract_docs
                .custom
                .iter()
                .filter(|(k, _)| !METADATA_KEYS.contains(&k.as_str()))
                .map(|(k, v)| CustomView {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect(),
            enums: Vec::new(),
            constants: Vec::new(),
            structs: Vec::new(),
            state_variables: Vec::new(),
            constructor: None,
            functions: Vec::new(),
            index: Vec::new(),
        };

        let mut slugger = Slugger::default();
        for entity in entities {
            match &entity.facts {
                EntityFacts::Contract(_) => {}
                EntityFacts::Enum(facts) => ctx.enums.push(type_view(entity, &facts.members)),
                EntityFacts::Struct(facts) => ctx.structs.push(type_view(entity, &facts.members)),
                EntityFacts::Constant(facts) => ctx.constants.push(ValueView {
                    name: entity.name.clone(),
                    ty: facts.ty.clone(),
                    value: facts.value.clone().unwrap_or_default(),
                    visibility: String::new(),
                    immutable: false,
                    description: description(&entity.docs),
                    details: entity.docs.dev.notes.clone(),
                }),
                EntityFacts::StateVariable(facts) => ctx.state_variables.push(ValueView {
                    name: entity.name.clone(),
                    ty: facts.ty.clone(),
                    value: String::new(),
                    visibility: facts.visibility.clone().unwrap_or_default(),
                    immutable: facts.immutable,
                    description: description(&entity.docs),
                    details: entity.docs.dev.notes.clone(),
                }),
                // first constructor wins
                EntityFacts::Constructor(facts) => {
                    if ctx.constructor.is_none() {
                        ctx.constructor = Some(function_view(entity, facts, String::new()));
                    }
                }
                EntityFacts::Function(facts) => {
                    let anchor = slugger.slug(&entity.name);
                    ctx.index.push(render_toc_item(&entity.name, &anchor));
                    ctx.functions.push(function_view(entity, facts, anchor));
                }
            }
        }
        ctx
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn description(docs: &TagRecord) -> String {
    docs.notice
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

fn contract_view(entity: &SourceEntity) -> ContractView {
    let (keyword, inherits) = match &entity.facts {
        EntityFacts::Contract(facts) => (facts.keyword.clone(), facts.inherits.join(", ")),
        _ => (String::from("contract"), String::new()),
    };
    ContractView {
        name: entity.name.clone(),
        keyword,
        inherits,
    }
}

fn type_view(entity: &SourceEntity, members: &[Member]) -> TypeView {
    TypeView {
        name: entity.name.clone(),
        description: description(&entity.docs),
        details: entity.docs.dev.notes.clone(),
        members: members
            .iter()
            .map(|m| MemberView {
                name: m.name.clone(),
                ty: m.ty.clone().unwrap_or_default(),
                description: m
                    .description
                    .as_deref()
                    .and_then(non_empty)
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            })
            .collect(),
    }
}

fn function_view(entity: &SourceEntity, facts: &FunctionFacts, anchor: String) -> FunctionView {
    FunctionView {
        name: entity.name.clone(),
        anchor,
        signature: signature(entity, facts),
        description: description(&entity.docs),
        details: entity.docs.dev.notes.clone(),
        params: facts
            .params
            .iter()
            .map(|p| ParamView {
                name: p.name.clone(),
                ty: p.ty.clone(),
                description: p
                    .description
                    .as_deref()
                    .and_then(non_empty)
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            })
            .collect(),
        returns: if facts.returns.is_empty() {
            String::new()
        } else {
            entity
                .docs
                .returns
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| NO_RETURNS.to_string())
        },
        modifiers: facts.modifiers.join(", "),
    }
}

/// Canonical one-line declaration, e.g. `function setA(externalEuint8 inputA, bytes calldata inputProof) external`.
fn signature(entity: &SourceEntity, facts: &FunctionFacts) -> String {
    let params: Vec<String> = facts
        .params
        .iter()
        .map(|p| match &p.location {
            Some(loc) => format!("{} {} {}", p.ty, loc, p.name),
            None => format!("{} {}", p.ty, p.name),
        })
        .collect();
    let mut sig = match entity.kind {
        EntityKind::Constructor => format!("constructor({})", params.join(", ")),
        _ if matches!(entity.name.as_str(), "fallback" | "receive") => {
            format!("{}({})", entity.name, params.join(", "))
        }
        _ => format!("function {}({})", entity.name, params.join(", ")),
    };
    for word in facts.visibility.iter().chain(facts.mutability.iter()) {
        sig.push(' ');
        sig.push_str(word);
    }
    if !facts.returns.is_empty() {
        sig.push_str(&format!(" returns ({})", facts.returns.join(", ")));
    }
    sig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Author, Metadata};
    use crate::parser::extract_entities;

    const SOURCE: &str = r#"
/// @title FHE Counter
/// @notice A counter whose value stays encrypted.
/// @dev Usage summary: call increment with an encrypted input.
/// @custom:security-contact security@example.com
/// @custom:chapter basics
contract FHECounter {
    /// @notice Maximum step.
    uint32 public constant MAX_STEP = 10;

    euint32 private _count;

    /// @notice Adds to the counter.
    /// @param inputEuint32 encrypted step
    /// @param inputProof proof for the step
    function increment(externalEuint32 inputEuint32, bytes calldata inputProof) external {}

    function getCount() external view returns (euint32) {
        return _count;
    }
}
"#;

    fn metadata() -> Metadata {
        Metadata {
            name: "fhe-counter".into(),
            label: "FHE Counter".into(),
            description: "A counter whose value stays encrypted.".into(),
            category: "fundamental".into(),
            chapter: "basics".into(),
            authors: vec![Author {
                name: "Zama".into(),
                email: None,
                url: None,
            }],
            ..Default::default()
        }
    }

    fn render() -> String {
        let entities = extract_entities(SOURCE);
        render_document(DEFAULT_TEMPLATE, &metadata(), &entities).unwrap()
    }

    #[test]
    fn renders_sections_in_order() {
        let out = render();
        let positions: Vec<usize> = [
            "# FHE Counter",
            "## Usage",
            "## Custom Tags",
            "## Constants",
            "## State Variables",
            "## Functions",
        ]
        .iter()
        .map(|h| out.find(h).unwrap_or_else(|| panic!("missing {h}\n{out}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
    }

    #[test]
    fn omits_empty_sections() {
        let out = render();
        assert!(!out.contains("## Structs"));
        assert!(!out.contains("## Enums"));
        assert!(!out.contains("## Constructor"));
        assert!(!out.contains("## Prerequisites"));
    }

    #[test]
    fn dev_sections_render_as_bullets() {
        let out = render();
        assert!(out.contains("\n* call increment with an encrypted input.\n"), "{out}");

        let src = r#"
/// @notice Holds deposits.
/// @dev Usage summary: deposit first.
/// @dev Withdrawals are delayed.
/// @dev Fees are waived.
contract Vault {
    /// @notice Accepts plain transfers.
    receive() external payable {}
}
"#;
        let out = render_document(DEFAULT_TEMPLATE, &metadata(), &extract_entities(src)).unwrap();
        assert!(out.contains("## Usage\n\n* deposit first.\n"), "{out}");
        assert!(
            out.contains("## Notes\n\n* Withdrawals are delayed.\n* Fees are waived.\n"),
            "{out}"
        );
        assert!(out.contains("receive() external payable"), "{out}");
        assert!(!out.contains("function receive"), "{out}");
    }

    #[test]
    fn placeholders_fill_missing_text() {
        let out = render();
        assert!(out.contains("No description available."));
        assert!(out.contains("No details provided."));
        assert!(!out.contains("null"));
        assert!(!out.contains("undefined"));
    }

    #[test]
    fn functions_and_index() {
        let out = render();
        assert!(out.contains("* [increment](#increment)"));
        assert!(out.contains(
            "function increment(externalEuint32 inputEuint32, bytes calldata inputProof) external"
        ));
        assert!(out.contains("function getCount() external view returns (euint32)"));
        assert!(out.contains("encrypted step"));
        assert!(out.contains("security-contact"));
        // no escaping of markdown-sensitive text
        assert!(out.contains("security@example.com"));
    }

    #[test]
    fn rendering_is_idempotent() {
        assert_eq!(render(), render());
    }

    #[test]
    fn custom_template() {
        let entities = extract_entities(SOURCE);
        let out = render_document(
            "{{title}}|{{#each functions}}{{name}} {{/each}}",
            &metadata(),
            &entities,
        )
        .unwrap();
        assert_eq!(out, "FHE Counter|increment getCount ");
    }

    #[test]
    fn invalid_template() {
        assert!(matches!(
            render_document("{{#if}}", &metadata(), &[]),
            Err(RenderError::Template(_))
        ));
    }

    #[test]
    fn missing_template_file() {
        let err = read_template(Path::new("/nonexistent/README.md.hbs")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "template not found: /nonexistent/README.md.hbs"
        );
    }
}
