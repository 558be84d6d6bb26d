//! Writing the finished post to disk.
//!
//! The file lands at `<output_dir>/blog_<sanitized topic>.md`. The write is
//! atomic (temp file, then rename) and an optional tidy pass normalizes the
//! Markdown before it is written.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use blogsmith_shared::{BlogsmithError, DefaultsConfig, Result};

/// How the post is written.
#[derive(Debug, Clone)]
pub struct ArtifactOptions {
    pub output_dir: PathBuf,
    /// Prepend `# <topic>` when the text has no H1 of its own.
    pub include_heading: bool,
    pub tidy: bool,
}

impl ArtifactOptions {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&defaults.output_dir),
            include_heading: defaults.include_heading,
            tidy: defaults.tidy_markdown,
        }
    }
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self::from_defaults(&DefaultsConfig::default())
    }
}

/// The file that was written.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// File-name-safe form of a topic.
///
/// Whitespace, `/` and `\` become `_`; characters other than alphanumerics,
/// `-` and `_` are dropped. Runs of `_` collapse to one and are
/// trimmed from both ends. An empty result becomes `untitled`.
pub fn sanitize_topic(topic: &str) -> String {
    let mut out = String::with_capacity(topic.len());
    for c in topic.chars() {
        let mapped = if c.is_whitespace() || c == '/' || c == '\\' {
            '_'
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            continue;
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "untitled".into()
    } else {
        trimmed.to_string()
    }
}

/// Path the post for `topic` is written to.
pub fn blog_path(output_dir: &Path, topic: &str) -> PathBuf {
    output_dir.join(format!("blog_{}.md", sanitize_topic(topic)))
}

/// Write `text` as the post for `topic`, creating the output directory.
#[instrument(skip_all, fields(output_dir = %options.output_dir.display(), topic = %topic))]
pub fn write_blog(options: &ArtifactOptions, topic: &str, text: &str) -> Result<ArtifactRecord> {
    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| BlogsmithError::io(&options.output_dir, e))?;

    let mut content = if options.tidy {
        tidy_markdown(text)
    } else {
        text.to_string()
    };
    if options.include_heading && !has_h1(&content) && !topic.trim().is_empty() {
        content = format!("# {}\n\n{content}", topic.trim());
    }

    let target = blog_path(&options.output_dir, topic);
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blog.md".into());
    let temp = options.output_dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &content).map_err(|e| BlogsmithError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| BlogsmithError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(size = content.len(), "wrote blog file");
    info!(path = %target.display(), "blog written");

    Ok(ArtifactRecord {
        path: target,
        sha256,
        size_bytes: content.len(),
    })
}

// ---------------------------------------------------------------------------
// Markdown tidy pass
// ---------------------------------------------------------------------------

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("valid regex"));

/// Lines of `md`, each paired with whether it is prose (outside fenced code
/// and not a fence line itself).
fn prose_lines(md: &str) -> impl Iterator<Item = (&str, bool)> {
    let mut in_code = false;
    md.lines().map(move |line| {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            (line, false)
        } else {
            (line, !in_code)
        }
    })
}

fn has_h1(md: &str) -> bool {
    prose_lines(md).any(|(line, prose)| prose && H1_RE.is_match(line))
}

/// Normalize model-written Markdown before it is saved.
pub fn tidy_markdown(md: &str) -> String {
    let mut result = strip_wrapping_fence(md);
    result = demote_extra_h1s(&result);
    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);
    ensure_trailing_newline(&result)
}

/// Remove a `markdown`/`md`/bare code fence wrapped around the whole document.
fn strip_wrapping_fence(md: &str) -> String {
    let trimmed = md.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return md.to_string();
    }

    let opener = lines[0].trim();
    let wrapped = matches!(opener, "```" | "```markdown" | "```md")
        && lines[lines.len() - 1].trim() == "```";
    if !wrapped {
        return md.to_string();
    }
    lines.remove(0);
    lines.pop();
    lines.join("\n")
}

/// Keep the first H1 and turn later ones into H2s. Fenced code is left alone.
fn demote_extra_h1s(md: &str) -> String {
    let mut seen_h1 = false;
    let mut lines = Vec::new();

    for (line, prose) in prose_lines(md) {
        if prose {
            if let Some(caps) = H1_RE.captures(line) {
                if seen_h1 {
                    lines.push(format!("## {}", &caps[1]));
                    continue;
                }
                seen_h1 = true;
            }
        }
        lines.push(line.to_string());
    }

    lines.join("\n")
}

fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Collapse runs of 3+ blank lines into one.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

fn ensure_trailing_newline(md: &str) -> String {
    let mut out = md.trim_end().to_string();
    out.push('\n');
    out
}
