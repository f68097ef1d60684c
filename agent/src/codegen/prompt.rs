//! Prompt construction

use crate::models::task::{Attachment, Task};

/// Attachment URLs are cut to this many characters in the prompt
const ATTACHMENT_URL_PREVIEW: usize = 100;

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(url: &str) -> &str {
    match url.char_indices().nth(ATTACHMENT_URL_PREVIEW) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// Build the prompt asking the agent for a single-page web application
pub fn build_web_app_prompt(task: &Task, attachments: &[Attachment]) -> String {
    let mut prompt = format!(
        r#"
Create a complete single-page web application based on the following brief:

{brief}

Requirements and checks to pass:
{checks}

Please generate the following files:
1. index.html - Main HTML file
2. styles.css - CSS styles
3. script.js - JavaScript functionality

"#,
        brief = task.brief,
        checks = bullet_list(&task.checks),
    );

    if !attachments.is_empty() {
        prompt.push_str("\nAttachments provided:\n");
        for attachment in attachments {
            prompt.push_str(&format!(
                "- {}: {}...\n",
                attachment.name,
                preview(&attachment.url)
            ));
        }
        prompt.push_str("Use these attachments in your application as needed.\n");
    }

    prompt.push_str(
        r#"
Ensure the application:
- Is self-contained (no external dependencies unless specified)
- Passes all the checks listed
- Has professional, clean code
- Includes proper HTML structure, styling, and interactivity

Output the code for each file clearly labeled.
"#,
    );
    prompt
}
