//! Artifact writer

use tracing::debug;

use crate::errors::PagesmithError;
use crate::filesys::workdir::WorkDir;
use crate::models::task::{GeneratedFiles, Task};

pub const README_FILE: &str = "README.md";
pub const LICENSE_FILE: &str = "LICENSE";

pub const LICENSE_TEXT: &str = r#"MIT License

Copyright (c) 2025 LLM Deployment

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#;

/// Render the README for a task
pub fn render_readme(repo_name: &str, task: &Task) -> String {
    let checks = task
        .checks
        .iter()
        .map(|check| format!("- {}", check))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# {repo_name}\n\nGenerated application.\n\n## Brief\n{brief}\n\n## Checks\n{checks}\n\n## License\nMIT License\n",
        brief = task.brief,
    )
}

/// Write the generated files.
///
/// Existing files with the same names are overwritten; anything else in the
/// directory is left alone.
pub async fn write_generated_files(
    workdir: &WorkDir,
    files: &GeneratedFiles,
) -> Result<(), PagesmithError> {
    for (name, content) in files {
        workdir.file(name)?.write_string(content).await?;
        debug!("Wrote generated file {} ({} bytes)", name, content.len());
    }
    Ok(())
}

/// Write README and LICENSE, replacing whatever is there.
///
/// Must run after every other writer so that neither generated files nor
/// attachments can replace them.
pub async fn write_metadata(
    workdir: &WorkDir,
    repo_name: &str,
    task: &Task,
) -> Result<(), PagesmithError> {
    workdir
        .file(README_FILE)?
        .write_string(&render_readme(repo_name, task))
        .await?;
    workdir.file(LICENSE_FILE)?.write_string(LICENSE_TEXT).await?;
    Ok(())
}
