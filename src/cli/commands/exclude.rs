//! CLI implementation for `esmake exclude` and `esmake include`
//!
//! Exclusion marks are user intent recorded in the build state: an
//! excluded file or folder is skipped by every pass, and an excluded
//! folder dominates any `included` mark on its children. The marks
//! survive `esmake clean`.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{print_detail, print_success, print_warning};
use crate::config::defaults::MANIFEST_FILE;
use crate::core::resource::ResourceId;
use crate::infra::scan::ProjectTree;
use crate::infra::state::{ExclusionMark, ProjectState};

/// Execute the exclude or include command
pub fn execute(project_dir: &Path, paths: &[String], mark: ExclusionMark) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!(
            "No {MANIFEST_FILE} found in {}. Run 'esmake init' to create a project.",
            project_dir.display()
        );
    }

    let tree = ProjectTree::new(project_dir);
    let mut state =
        ProjectState::open(project_dir).with_context(|| "Failed to open build state")?;

    let mut marked = 0usize;
    for raw in paths {
        let raw_path = Path::new(raw);
        let resource = if raw_path.is_absolute() {
            match tree.relativize(raw_path) {
                Some(resource) => resource,
                None => {
                    print_warning(&format!("{raw} is outside the project, skipped"));
                    continue;
                }
            }
        } else {
            ResourceId::new(raw)
        };

        if !tree.exists(&resource) {
            print_warning(&format!(
                "{resource} does not exist in the project (mark recorded anyway)"
            ));
        }

        state.set_exclusion(&resource, Some(mark));
        tracing::debug!("Marked {} as {:?}", resource, mark);
        marked += 1;
    }

    state.save().with_context(|| "Failed to save build state")?;

    let verb = match mark {
        ExclusionMark::Excluded => "Excluded",
        ExclusionMark::Included => "Included",
    };
    print_success(&format!("{verb} {marked} path(s)"));
    if mark == ExclusionMark::Excluded && marked > 0 {
        print_detail("Run 'esmake build --full' to rebuild configurations that contained them.");
    }

    Ok(())
}
