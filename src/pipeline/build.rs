use super::fs::{copy_tree, find_sources, remove_path};
use super::{
    BuildOptions, BuildOutput, PipelineError, Stage, CONTRACTS_DIR, DIST_DIR, DRAFT_TEMPLATE,
    README_FILE, TEST_DIR,
};
use crate::config::Config;
use crate::metadata::{
    detect_concepts, detect_operations, synthesize, validate, MetadataDefaults, Profile,
    METADATA_FILE,
};
use crate::model::{EntityFacts, SourceEntity};
use crate::parser::extract_entities;
use crate::render::{read_template, render_document, RenderError, DEFAULT_TEMPLATE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Run every build stage over a draft directory.
pub fn build(draft: &Path, options: &BuildOptions) -> Result<BuildOutput, PipelineError> {
    // -- Verifying --
    info!(stage = %Stage::Verifying, draft = %draft.display());
    verify_layout(draft)?;
    let config = Config::load(draft).map_err(|e| {
        PipelineError::new(Stage::Verifying, "invalid configuration").with_errors(vec![e.to_string()])
    })?;

    // -- Detecting --
    info!(stage = %Stage::Detecting);
    let contract_path = detect_contract(draft, options.contract.as_deref())?;
    debug!(contract = %contract_path.display(), "contract detected");

    // -- ExtractingMetadata --
    info!(stage = %Stage::ExtractingMetadata);
    let source = fs::read_to_string(&contract_path)
        .map_err(|e| PipelineError::io(Stage::ExtractingMetadata, &contract_path, e))?;
    let entities = extract_entities(&source);
    report_undocumented(&entities);
    let concepts = detect_concepts(&source);
    let operations = detect_operations(&source);
    debug!(?concepts, ?operations, "capabilities detected");

    let overrides = MetadataDefaults {
        name: options.starter_name.clone(),
        category: options.category.clone(),
        chapter: options.chapter.clone(),
        authors: Vec::new(),
    };
    let mut defaults = config.defaults(&overrides);
    if defaults.name.is_none() {
        defaults.name = draft_name(draft);
    }
    let contract = entities.iter().find(|e| matches!(e.facts, EntityFacts::Contract(_)));
    let metadata = synthesize(contract, &defaults, &concepts, &operations).map_err(|e| {
        PipelineError::new(Stage::ExtractingMetadata, "metadata synthesis failed")
            .with_errors(vec![e.to_string()])
    })?;

    // -- Validating --
    info!(stage = %Stage::Validating, name = %metadata.name);
    let profile = if options.lenient {
        Profile::Lenient
    } else {
        Profile::Strict
    };
    validate(&metadata, profile).map_err(|report| {
        PipelineError::new(Stage::Validating, "metadata invalid").with_errors(report.errors)
    })?;
    let metadata_json = metadata.to_json().map_err(|e| {
        PipelineError::new(Stage::Validating, "metadata serialization failed")
            .with_errors(vec![e.to_string()])
    })?;
    let metadata_path = draft.join(METADATA_FILE);
    fs::write(&metadata_path, &metadata_json)
        .map_err(|e| PipelineError::io(Stage::Validating, &metadata_path, e))?;

    // -- Rendering --
    info!(stage = %Stage::Rendering);
    let template_path = options
        .template_path
        .clone()
        .or_else(|| config.template.clone());
    let template = resolve_template(draft, template_path.as_deref())?;
    let readme = render_document(&template, &metadata, &entities).map_err(render_error)?;

    // -- Packaging --
    let dist = options
        .output_path
        .clone()
        .unwrap_or_else(|| draft.join(DIST_DIR));
    info!(stage = %Stage::Packaging, dist = %dist.display());
    package(draft, &dist, &contract_path, &metadata_json, &readme)?;

    let file_name = contract_path.file_name().map(PathBuf::from).unwrap_or_default();
    info!(name = %metadata.name, dist = %dist.display(), "build complete");
    Ok(BuildOutput {
        contract: dist.join(CONTRACTS_DIR).join(file_name),
        readme_path: dist.join(README_FILE),
        dist,
        metadata_path,
        metadata,
        entity_count: entities.len(),
    })
}

fn verify_layout(draft: &Path) -> Result<(), PipelineError> {
    let mut missing = Vec::new();
    if !draft.is_dir() {
        missing.push(draft.display().to_string());
    } else {
        let contracts = draft.join(CONTRACTS_DIR);
        if !contracts.is_dir() {
            missing.push(format!("{}/", contracts.display()));
        } else if find_sources(&contracts).is_empty() {
            missing.push(format!("{}/*.sol", contracts.display()));
        }
        let tests = draft.join(TEST_DIR);
        if !tests.is_dir() {
            missing.push(format!("{}/", tests.display()));
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::new(Stage::Verifying, "missing structure").with_errors(missing))
    }
}

fn detect_contract(draft: &Path, explicit: Option<&Path>) -> Result<PathBuf, PipelineError> {
    let ambiguous = |errors| {
        PipelineError::new(Stage::Detecting, "ambiguous or missing contract file").with_errors(errors)
    };
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            draft.join(path)
        };
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ambiguous(vec![format!("{} does not exist", path.display())]))
        };
    }
    let mut candidates = find_sources(&draft.join(CONTRACTS_DIR));
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(ambiguous(vec![format!(
            "no .sol file under {}",
            draft.join(CONTRACTS_DIR).display()
        )])),
        _ => Err(ambiguous(
            candidates.iter().map(|p| p.display().to_string()).collect(),
        )),
    }
}

fn report_undocumented(entities: &[SourceEntity]) {
    for entity in entities {
        if !entity.is_documented() {
            warn!(kind = %entity.kind, name = %entity.name, "undocumented declaration");
        }
        if let EntityFacts::Function(facts) | EntityFacts::Constructor(facts) = &entity.facts {
            for param in facts.params.iter().filter(|p| p.description.is_none()) {
                warn!(function = %entity.name, param = %param.name, "parameter without @param");
            }
        }
    }
}

fn draft_name(draft: &Path) -> Option<String> {
    let resolved = fs::canonicalize(draft).unwrap_or_else(|_| draft.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

/// Explicit path, then `<draft>/README.md.hbs`, then the built-in template.
fn resolve_template(draft: &Path, explicit: Option<&Path>) -> Result<String, PipelineError> {
    if let Some(path) = explicit {
        return read_template(path).map_err(render_error);
    }
    let local = draft.join(DRAFT_TEMPLATE);
    if local.is_file() {
        debug!(template = %local.display(), "using draft template");
        return read_template(&local).map_err(render_error);
    }
    Ok(DEFAULT_TEMPLATE.to_string())
}

fn render_error(err: RenderError) -> PipelineError {
    match err {
        RenderError::TemplateNotFound(_) => PipelineError::new(Stage::Rendering, err.to_string()),
        other => PipelineError::new(Stage::Rendering, "rendering failed")
            .with_errors(vec![other.to_string()]),
    }
}

fn package(
    draft: &Path,
    dist: &Path,
    contract: &Path,
    metadata_json: &str,
    readme: &str,
) -> Result<(), PipelineError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |e| PipelineError::io(Stage::Packaging, &path, e)
    };

    let draft_canonical = fs::canonicalize(draft).map_err(io(draft))?;
    if let Ok(dist_canonical) = fs::canonicalize(dist) {
        if draft_canonical.starts_with(&dist_canonical)
            || dist_canonical == draft_canonical.join(CONTRACTS_DIR)
            || dist_canonical == draft_canonical.join(TEST_DIR)
        {
            return Err(PipelineError::new(Stage::Packaging, "output overlaps the draft")
                .with_errors(vec![dist.display().to_string()]));
        }
    }

    remove_path(dist).map_err(io(dist))?;
    let contracts_out = dist.join(CONTRACTS_DIR);
    fs::create_dir_all(&contracts_out).map_err(io(&contracts_out))?;
    let dist_canonical = fs::canonicalize(dist).map_err(io(dist))?;

    let file_name = contract.file_name().unwrap_or_default();
    let contract_out = contracts_out.join(file_name);
    fs::copy(contract, &contract_out).map_err(io(&contract_out))?;

    let tests = draft.join(TEST_DIR);
    copy_tree(&tests, &dist.join(TEST_DIR), &[dist_canonical]).map_err(io(&tests))?;

    let metadata_out = dist.join(METADATA_FILE);
    fs::write(&metadata_out, metadata_json).map_err(io(&metadata_out))?;
    let readme_out = dist.join(README_FILE);
    fs::write(&readme_out, readme).map_err(io(&readme_out))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTRACT: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.24;

/// @title FHE Counter
/// @author Zama <hello@zama.ai>
/// @notice A counter whose value stays encrypted on chain.
/// @custom:category fundamental
/// @custom:chapter basics
contract FHECounter {
    euint32 private _count;

    /// @notice Adds an encrypted step.
    /// @param inputEuint32 encrypted step
    /// @param inputProof proof for the step
    function increment(externalEuint32 inputEuint32, bytes calldata inputProof) external {
        euint32 step = FHE.fromExternal(inputEuint32, inputProof);
        _count = FHE.add(_count, step);
        FHE.allowThis(_count);
    }
}
"#;

    /// A draft directory named `fhe-counter` inside a temp dir.
    fn draft() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("fhe-counter");
        fs::create_dir_all(root.join("contracts")).unwrap();
        fs::create_dir_all(root.join("test")).unwrap();
        fs::write(root.join("contracts/FHECounter.sol"), CONTRACT).unwrap();
        fs::write(root.join("test/FHECounter.ts"), "// test").unwrap();
        (tmp, root)
    }

    #[test]
    fn builds_dist() {
        let (_tmp, dir) = draft();
        let out = build(&dir, &BuildOptions::default()).unwrap();
        assert_eq!(out.dist, dir.join("dist"));
        assert_eq!(out.metadata.name, "fhe-counter");
        assert_eq!(
            out.metadata.concepts,
            Some(vec![
                "input-proof".to_string(),
                "arithmetic".to_string(),
                "access-control".to_string()
            ])
        );
        assert!(out.contract.is_file());
        assert!(out.dist.join("test/FHECounter.ts").is_file());
        assert!(out.dist.join("metadata.json").is_file());
        assert!(dir.join("metadata.json").is_file());
        let readme = fs::read_to_string(&out.readme_path).unwrap();
        assert!(readme.starts_with("# FHE Counter"));
    }

    #[test]
    fn name_override_and_rebuild() {
        let (_tmp, dir) = draft();
        let options = BuildOptions {
            starter_name: Some("counter".into()),
            ..Default::default()
        };
        build(&dir, &options).unwrap();
        fs::write(dir.join("dist/stale.txt"), "x").unwrap();
        let out = build(&dir, &options).unwrap();
        assert_eq!(out.metadata.name, "counter");
        assert!(!out.dist.join("stale.txt").exists());
    }

    #[test]
    fn missing_structure_lists_every_path() {
        let dir = TempDir::new().unwrap();
        let err = build(dir.path(), &BuildOptions::default()).unwrap_err();
        assert_eq!(err.stage, Stage::Verifying);
        assert_eq!(err.reason, "missing structure");
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn ambiguous_contract() {
        let (_tmp, dir) = draft();
        fs::write(dir.join("contracts/Other.sol"), "contract Other {}").unwrap();
        let err = build(&dir, &BuildOptions::default()).unwrap_err();
        assert_eq!(err.stage, Stage::Detecting);
        assert_eq!(err.errors.len(), 2);

        let options = BuildOptions {
            contract: Some("contracts/FHECounter.sol".into()),
            ..Default::default()
        };
        assert!(build(&dir, &options).is_ok());
    }

    #[test]
    fn invalid_metadata_aborts_before_packaging() {
        let (_tmp, dir) = draft();
        let source = CONTRACT.replace("@custom:category fundamental", "@custom:category misc");
        fs::write(dir.join("contracts/FHECounter.sol"), source).unwrap();
        let err = build(&dir, &BuildOptions::default()).unwrap_err();
        assert_eq!(err.stage, Stage::Validating);
        assert_eq!(err.reason, "metadata invalid");
        assert!(!dir.join("dist").exists());
    }

    #[test]
    fn missing_template() {
        let (_tmp, dir) = draft();
        let options = BuildOptions {
            template_path: Some(dir.join("nope.hbs")),
            ..Default::default()
        };
        let err = build(&dir, &options).unwrap_err();
        assert_eq!(err.stage, Stage::Rendering);
        assert!(err.reason.starts_with("template not found: "));
    }

    #[test]
    fn draft_template_is_used() {
        let (_tmp, dir) = draft();
        fs::write(dir.join("README.md.hbs"), "custom {{name}}\n").unwrap();
        let out = build(&dir, &BuildOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(out.readme_path).unwrap(), "custom fhe-counter\n");
    }

    #[test]
    fn config_file_supplies_defaults() {
        let (_tmp, dir) = draft();
        let source = CONTRACT.replace("/// @custom:chapter basics\n", "");
        fs::write(dir.join("contracts/FHECounter.sol"), source).unwrap();
        fs::write(dir.join("natdoc.toml"), "chapter = \"handles\"\n").unwrap();
        let out = build(&dir, &BuildOptions::default()).unwrap();
        assert_eq!(out.metadata.chapter, "handles");
    }
}
