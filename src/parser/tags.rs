//! NatSpec tag parser: turns normalized doc lines into a [`TagRecord`].
//!
//! Each line is classified in priority order: `@custom:<key>`, a standard
//! `@<tag>`, a struct/enum bullet, and finally a continuation of whatever tag
//! was opened last. The open tag is an explicit [`Section`] value threaded
//! through the loop, so every line can be processed (and tested) on its own.
//!
//! Nothing here fails: unknown tags and stray text degrade to absent fields.

use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

static RE_CUSTOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@custom:([A-Za-z0-9_.\-]+)\s*(.*)$").unwrap());

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z]+)(?:\s+(.*))?$").unwrap());

// `- name (type): description`
static RE_FIELD_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*([A-Za-z_$][\w$]*)\s*\(([^)]+)\)\s*:?\s*(.*)$").unwrap()
});

// `- NAME: description`
static RE_VALUE_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*([A-Za-z_$][\w$]*)\s*:\s*(.*)$").unwrap());

static RE_DEV_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(usage summary|prerequisites)\s*:\s*(.*)$").unwrap());

/// Which tag continuation lines currently extend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Nothing opened yet; untagged leading text counts as @notice.
    Start,
    /// An unrecognized tag was opened; its continuation lines are dropped.
    Ignored,
    Title,
    Author,
    Notice,
    Dev(DevSection),
    Param,
    Returns,
    Name,
    Type,
    Field,
    Value,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevSection {
    Usage,
    Prerequisites,
    Notes,
}

/// Parse the normalized lines of one doc block for the given entity kind.
pub fn parse_tags(kind: EntityKind, lines: &[String]) -> TagRecord {
    let mut record = TagRecord::default();
    let mut section = Section::Start;
    for line in lines {
        section = step(kind, &mut record, section, line);
    }
    record
}

/// Process one line and return the section that is open afterwards.
pub fn step(kind: EntityKind, record: &mut TagRecord, section: Section, line: &str) -> Section {
    let line = line.trim();
    if line.is_empty() {
        return section;
    }

    if let Some(caps) = RE_CUSTOM.captures(line) {
        let key = caps[1].to_string();
        let value = caps[2].trim();
        if !value.is_empty() {
            record.custom.insert(key.clone(), value.to_string());
        }
        return Section::Custom(key);
    }

    if let Some(caps) = RE_TAG.captures(line) {
        let tag = caps[1].to_string();
        let value = caps.get(2).map_or("", |m| m.as_str()).trim();
        return open_tag(kind, record, &tag, value);
    }

    if matches!(kind, EntityKind::Struct | EntityKind::Enum) && bullet(kind, record, line) {
        return Section::Field;
    }

    continue_section(kind, record, section, line)
}

/// Handle a standard `@tag value` line.
fn open_tag(kind: EntityKind, record: &mut TagRecord, tag: &str, value: &str) -> Section {
    use EntityKind::*;

    match (tag, kind) {
        ("notice", _) => {
            extend(&mut record.notice, value);
            Section::Notice
        }
        ("dev", Contract) => {
            let target = dev_target(record, DevSection::Notes, value);
            Section::Dev(target)
        }
        ("dev", _) => {
            push_line(&mut record.dev.notes, value);
            Section::Dev(DevSection::Notes)
        }
        ("title", Contract) => {
            extend(&mut record.title, value);
            Section::Title
        }
        ("author", Contract) => {
            push_line(&mut record.authors, value);
            Section::Author
        }
        ("param", Function | Constructor) => {
            let (name, description) = split_word(value);
            if name.is_empty() {
                return Section::Ignored;
            }
            record.params.push(ParamDoc {
                name: name.to_string(),
                description: description.to_string(),
            });
            Section::Param
        }
        ("return" | "returns", Function | Constructor) => {
            extend(&mut record.returns, value);
            Section::Returns
        }
        ("name", StateVariable | Constant) => {
            extend(&mut record.name, value);
            Section::Name
        }
        ("type", StateVariable | Constant) => {
            extend(&mut record.ty, value);
            Section::Type
        }
        ("field", Struct | Enum) => {
            let (name, rest) = split_word(value);
            if name.is_empty() {
                return Section::Ignored;
            }
            let (ty, description) = split_word(rest);
            record.fields.push(FieldDoc {
                name: name.to_string(),
                ty: (!ty.is_empty()).then(|| ty.to_string()),
                description: description.to_string(),
            });
            Section::Field
        }
        ("value", Enum) => {
            let (name, description) = split_word(value);
            if name.is_empty() {
                return Section::Ignored;
            }
            record.values.push(ValueDoc {
                name: name.to_string(),
                description: description.to_string(),
            });
            Section::Value
        }
        _ => Section::Ignored,
    }
}

/// Struct/enum bullet shorthand. Returns true when the line was consumed.
fn bullet(kind: EntityKind, record: &mut TagRecord, line: &str) -> bool {
    if let Some(caps) = RE_FIELD_BULLET.captures(line) {
        record.fields.push(FieldDoc {
            name: caps[1].to_string(),
            ty: Some(caps[2].trim().to_string()),
            description: caps[3].trim().to_string(),
        });
        return true;
    }
    if kind == EntityKind::Enum {
        if let Some(caps) = RE_VALUE_BULLET.captures(line) {
            record.values.push(ValueDoc {
                name: caps[1].to_string(),
                description: caps[2].trim().to_string(),
            });
            return true;
        }
    }
    false
}

/// Append a continuation line to the open section.
fn continue_section(kind: EntityKind, record: &mut TagRecord, section: Section, line: &str) -> Section {
    let text = line.strip_prefix("- ").unwrap_or(line).trim();

    match section {
        Section::Start | Section::Notice => {
            extend(&mut record.notice, text);
            Section::Notice
        }
        Section::Ignored => Section::Ignored,
        Section::Title => {
            extend(&mut record.title, text);
            Section::Title
        }
        Section::Author => {
            if let Some(last) = record.authors.last_mut() {
                append(last, text);
            }
            Section::Author
        }
        Section::Dev(current) => {
            if kind == EntityKind::Contract {
                Section::Dev(dev_target(record, current, text))
            } else {
                push_line(&mut record.dev.notes, text);
                Section::Dev(DevSection::Notes)
            }
        }
        Section::Param => {
            if let Some(last) = record.params.last_mut() {
                append(&mut last.description, text);
            }
            Section::Param
        }
        Section::Returns => {
            extend(&mut record.returns, text);
            Section::Returns
        }
        Section::Name => {
            extend(&mut record.name, text);
            Section::Name
        }
        Section::Type => {
            extend(&mut record.ty, text);
            Section::Type
        }
        Section::Field => {
            if let Some(last) = record.fields.last_mut() {
                append(&mut last.description, text);
            }
            Section::Field
        }
        Section::Value => {
            if let Some(last) = record.values.last_mut() {
                append(&mut last.description, text);
            }
            Section::Value
        }
        Section::Custom(key) => {
            let entry = record.custom.entry(key.clone()).or_default();
            append(entry, text);
            Section::Custom(key)
        }
    }
}

/// Route a contract @dev line, switching sub-section on a line-initial marker.
fn dev_target(record: &mut TagRecord, current: DevSection, text: &str) -> DevSection {
    let (target, rest) = match RE_DEV_MARKER.captures(text) {
        Some(caps) => {
            let target = if caps[1].eq_ignore_ascii_case("prerequisites") {
                DevSection::Prerequisites
            } else {
                DevSection::Usage
            };
            (target, caps.get(2).map_or("", |m| m.as_str()))
        }
        None => (current, text),
    };
    let rest = rest.strip_prefix("- ").unwrap_or(rest);
    let list = match target {
        DevSection::Usage => &mut record.dev.usage,
        DevSection::Prerequisites => &mut record.dev.prerequisites,
        DevSection::Notes => &mut record.dev.notes,
    };
    push_line(list, rest);
    target
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

fn extend(slot: &mut Option<String>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match slot {
        Some(existing) => append(existing, text),
        None => *slot = Some(text.to_string()),
    }
}

fn append(dest: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !dest.is_empty() {
        dest.push(' ');
    }
    dest.push_str(text);
}

fn push_line(list: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        list.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn contract_tags() {
        let rec = parse_tags(
            EntityKind::Contract,
            &lines(&[
                "@title FHE Counter",
                "@author Zama Team <hello@zama.ai>",
                "@notice A counter over encrypted values.",
                "It never reveals the count.",
                "@custom:chapter basics",
            ]),
        );
        assert_eq!(rec.title.as_deref(), Some("FHE Counter"));
        assert_eq!(rec.authors, vec!["Zama Team <hello@zama.ai>"]);
        assert_eq!(
            rec.notice.as_deref(),
            Some("A counter over encrypted values. It never reveals the count.")
        );
        assert_eq!(rec.custom("chapter"), Some("basics"));
    }

    #[test]
    fn dev_markers_switch_sections() {
        let rec = parse_tags(
            EntityKind::Contract,
            &lines(&[
                "@dev Usage summary:",
                "- Call increment with an encrypted input",
                "- Read the handle",
                "Prerequisites: a configured relayer",
                "- Sepolia funds",
            ]),
        );
        assert_eq!(
            rec.dev.usage,
            vec!["Call increment with an encrypted input", "Read the handle"]
        );
        assert_eq!(rec.dev.prerequisites, vec!["a configured relayer", "Sepolia funds"]);
        assert!(rec.dev.notes.is_empty());
    }

    #[test]
    fn dev_marker_is_case_insensitive_on_first_line() {
        let rec = parse_tags(
            EntityKind::Contract,
            &lines(&["@dev USAGE SUMMARY: deploy then call", "@dev plain note"]),
        );
        assert_eq!(rec.dev.usage, vec!["deploy then call"]);
        assert_eq!(rec.dev.notes, vec!["plain note"]);
    }

    #[test]
    fn unmarked_dev_goes_to_notes() {
        let rec = parse_tags(EntityKind::Contract, &lines(&["@dev Uses FHE.add", "and FHE.sub"]));
        assert_eq!(rec.dev.notes, vec!["Uses FHE.add", "and FHE.sub"]);
    }

    #[test]
    fn params_keep_declaration_order() {
        let rec = parse_tags(
            EntityKind::Function,
            &lines(&[
                "@notice Stores A.",
                "@param inputA the encrypted value",
                "@param inputProof the proof",
                "spanning two lines",
                "@return nothing",
            ]),
        );
        assert_eq!(rec.params.len(), 2);
        assert_eq!(rec.params[0].name, "inputA");
        assert_eq!(rec.params[1].description, "the proof spanning two lines");
        assert_eq!(rec.returns.as_deref(), Some("nothing"));
        assert_eq!(rec.param("inputA"), Some("the encrypted value"));
        assert_eq!(rec.param("missing"), None);
    }

    #[test]
    fn unknown_tags_are_dropped() {
        let rec = parse_tags(
            EntityKind::Function,
            &lines(&["@notice Hi", "@since 0.1", "continued", "@title not for functions"]),
        );
        assert_eq!(rec.notice.as_deref(), Some("Hi"));
        assert!(rec.title.is_none());
        assert!(rec.custom.is_empty());
    }

    #[test]
    fn variable_name_and_type() {
        let rec = parse_tags(
            EntityKind::StateVariable,
            &lines(&["@notice The count", "@name count", "@type euint32"]),
        );
        assert_eq!(rec.name.as_deref(), Some("count"));
        assert_eq!(rec.ty.as_deref(), Some("euint32"));
    }

    #[test]
    fn struct_fields_tag_and_bullet() {
        let rec = parse_tags(
            EntityKind::Struct,
            &lines(&[
                "@notice An order",
                "@field amount euint64 encrypted amount",
                "- owner (address): who placed it",
                "still the owner",
            ]),
        );
        assert_eq!(rec.fields.len(), 2);
        assert_eq!(rec.fields[0].ty.as_deref(), Some("euint64"));
        assert_eq!(rec.fields[1].name, "owner");
        assert_eq!(rec.fields[1].description, "who placed it still the owner");
    }

    #[test]
    fn enum_values() {
        let rec = parse_tags(
            EntityKind::Enum,
            &lines(&["@notice State", "@value OPEN accepting bids", "- CLOSED: done"]),
        );
        assert_eq!(rec.values.len(), 2);
        assert_eq!(rec.values[1].name, "CLOSED");
        assert_eq!(rec.values[1].description, "done");
    }

    #[test]
    fn value_bullets_only_for_enums() {
        let rec = parse_tags(EntityKind::Struct, &lines(&["@notice x", "- NAME: desc"]));
        assert!(rec.values.is_empty());
        assert_eq!(rec.notice.as_deref(), Some("x NAME: desc"));
    }

    #[test]
    fn untagged_text_is_notice() {
        let rec = parse_tags(EntityKind::Function, &lines(&["Adds two numbers."]));
        assert_eq!(rec.notice.as_deref(), Some("Adds two numbers."));
    }

    #[test]
    fn step_is_reentrant_per_line() {
        let mut rec = TagRecord::default();
        let next = step(EntityKind::Function, &mut rec, Section::Start, "@param a first");
        assert_eq!(next, Section::Param);
        let next = step(EntityKind::Function, &mut rec, next, "more");
        assert_eq!(next, Section::Param);
        assert_eq!(rec.params[0].description, "first more");
    }

    #[test]
    fn empty_custom_value_filled_by_continuation() {
        let rec = parse_tags(EntityKind::Contract, &lines(&["@custom:security-contact", "sec@x.io"]));
        assert_eq!(rec.custom("security-contact"), Some("sec@x.io"));
    }
}
