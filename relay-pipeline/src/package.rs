//! Package & deliver stage.
//!
//! 1. Re-check the build requirement.
//! 2. Compress `build/` into `<name>_<version>_<author>（bot）.7z`.
//! 3. Move the archive into `builds/<category>/`.
//! 4. Drop any record the new archive replaced, then evict the oldest builds
//!    so the new one fits under `max_builds`.
//! 5. Record the delivery on a copy of the database node.
//! 6. Mirror the archive to the remote.
//!
//! The caller's node is never mutated; the updated copy is only returned
//! once mirroring succeeded.

use relay_core::layout::archive_name;
use relay_core::{DatabaseNode, TaskDefinition, Version};

use crate::context::Pipeline;
use crate::error::{PipelineError, StageResult};
use crate::fsutil::{first_missing, move_path};

/// Builds retained before the incoming one is appended.
pub fn retention_slots(max_builds: usize) -> usize {
    max_builds.max(1) - 1
}

pub fn package(
    pipeline: &Pipeline<'_>,
    task: &TaskDefinition,
    version: &Version,
    database: &DatabaseNode,
) -> StageResult<DatabaseNode> {
    let layout = &pipeline.layout;
    let tools = &pipeline.tools;
    let name = &task.name;
    let packaging = |message: String| PipelineError::Packaging {
        task: name.0.clone(),
        message,
    };

    if pipeline.config.max_builds == 0 {
        return Err(packaging("max_builds must be at least 1".to_string()));
    }

    let build_dir = layout.build_dir(name);
    if let Some(missing) = first_missing(&build_dir, &task.build_requirement) {
        return Err(packaging(format!("missing {missing} in final build")));
    }

    // Compress next to build/ so the archive never includes itself.
    let zname = archive_name(name, version, &task.author);
    let staged = layout.workshop(name).join(&zname);
    tracing::info!(task = %name, archive = %zname, "start compressing");
    tools
        .archiver
        .compress(&staged, &build_dir)
        .map_err(|e| packaging(format!("compress {zname} failed: {e}")))?;
    if !staged.exists() {
        return Err(packaging(format!("compress {zname} failed: archive not created")));
    }

    let repository = layout.repository(&task.category);
    std::fs::create_dir_all(&repository)
        .map_err(|e| packaging(format!("can't create {}: {e}", repository.display())))?;
    let delivered = repository.join(&zname);
    move_path(&staged, &delivered)
        .map_err(|e| packaging(format!("can't move {zname} into repository: {e}")))?;
    if !delivered.exists() {
        return Err(packaging(format!("{zname} not present in repository after move")));
    }

    let mut updated = database.clone();
    // A rebuild of a recorded version overwrote that record's archive in place.
    updated.builds.retain(|record| record.name != zname);
    let max_builds = pipeline.config.max_builds;
    if updated.builds.len() >= max_builds {
        updated = tools
            .evictor
            .evict(updated, &repository, &task.category, retention_slots(max_builds))
            .map_err(|e| packaging(format!("can't remove extra builds: {e}")))?;
    }
    updated.record_delivery(version.clone(), zname.clone());

    tools
        .remote
        .upload(&delivered, &task.category)
        .map_err(|e| PipelineError::Delivery {
            task: name.0.clone(),
            message: format!("can't upload {zname}: {e}"),
        })?;

    tracing::info!(task = %name, version = %version, archive = %zname, "delivered");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_reserves_a_slot_for_the_new_build() {
        assert_eq!(retention_slots(3), 2);
        assert_eq!(retention_slots(1), 0);
    }
}
