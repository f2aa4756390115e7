use super::fs::{copy_tree, remove_path};
use super::{PipelineError, PublishOptions, PublishOutput, Stage};
use crate::metadata::{validate_value, Metadata, Profile, METADATA_FILE};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Copy a built dist into `<catalog>/<name>`.
///
/// An existing entry aborts with `name collision` unless `force` is set, in
/// which case it is removed and replaced, never merged.
pub fn publish(
    dist: &Path,
    catalog: &Path,
    options: &PublishOptions,
) -> Result<PublishOutput, PipelineError> {
    info!(stage = %Stage::Publishing, dist = %dist.display(), catalog = %catalog.display());
    let metadata = read_metadata(dist, options)?;

    let target = catalog.join(&metadata.name);
    let exists = target.exists();
    if exists && !options.force {
        return Err(PipelineError::new(Stage::Publishing, "name collision")
            .with_errors(vec![format!(
                "{} already exists; use force to replace it",
                target.display()
            )]));
    }
    if exists {
        warn!(target = %target.display(), "replacing existing catalog entry");
        remove_path(&target).map_err(|e| PipelineError::io(Stage::Publishing, &target, e))?;
    }

    copy_tree(dist, &target, &[]).map_err(|e| PipelineError::io(Stage::Publishing, &target, e))?;
    info!(name = %metadata.name, target = %target.display(), "published");
    Ok(PublishOutput {
        name: metadata.name,
        target,
        replaced: exists,
    })
}

fn read_metadata(dist: &Path, options: &PublishOptions) -> Result<Metadata, PipelineError> {
    let invalid = |errors| PipelineError::new(Stage::Publishing, "metadata invalid").with_errors(errors);

    let path = dist.join(METADATA_FILE);
    let text = fs::read_to_string(&path).map_err(|e| PipelineError::io(Stage::Publishing, &path, e))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| invalid(vec![format!("{}: {}", path.display(), e)]))?;

    let profile = if options.lenient {
        Profile::Lenient
    } else {
        Profile::Strict
    };
    validate_value(&value, profile).map_err(|report| invalid(report.errors))?;
    serde_json::from_value(value).map_err(|e| invalid(vec![format!("{}: {}", path.display(), e)]))
}
