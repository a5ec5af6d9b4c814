//! `sfdx-project.json` handling: locating a project and its package roots.

use std::path::Path;

use serde::Deserialize;

use orgdocs_shared::{OrgDocsError, PackageDirectory, Result};

/// Project descriptor file name.
pub const SFDX_PROJECT_FILE: &str = "sfdx-project.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SfdxProject {
    #[serde(default)]
    package_directories: Vec<PackageDirectory>,
}

/// Whether `dir` contains an `sfdx-project.json`.
pub fn is_sfdx_project(dir: &Path) -> bool {
    dir.join(SFDX_PROJECT_FILE).is_file()
}

/// Package directories declared by the project at `project_root`, in
/// declaration order, with relative paths joined onto the root.
pub fn load_package_directories(project_root: &Path) -> Result<Vec<PackageDirectory>> {
    let path = project_root.join(SFDX_PROJECT_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| OrgDocsError::io(&path, e))?;

    let project: SfdxProject = serde_json::from_str(&content)
        .map_err(|e| OrgDocsError::parse(format!("{}: {e}", path.display())))?;

    if project.package_directories.is_empty() {
        return Err(OrgDocsError::config(format!(
            "{} declares no packageDirectories",
            path.display()
        )));
    }

    Ok(project
        .package_directories
        .into_iter()
        .map(|dir| PackageDirectory {
            path: if dir.path.is_absolute() {
                dir.path
            } else {
                project_root.join(dir.path)
            },
            default: dir.default,
        })
        .collect())
}
