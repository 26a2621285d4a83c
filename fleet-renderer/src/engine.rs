//! Tera rendering engine: [`TemplateKind`] enum and [`Renderer`].
//!
//! | Kind              | Template name                          |
//! |-------------------|----------------------------------------|
//! | `PullRequestBody` | `pull_request/body.md.tera`            |
//!
//! Partials live under `shared/` and may be overridden like any other
//! template.

use std::collections::BTreeMap;
use std::path::Path;

use tera::Tera;

use crate::context::PullRequestContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded defaults (compiled in with include_str!)
// ---------------------------------------------------------------------------

const EMBEDDED: &[(&str, &str)] = &[
    ("shared/_footer.tera", include_str!("templates/_partials/footer.tera")),
    (
        "pull_request/body.md.tera",
        include_str!("templates/pull_request_body.md.tera"),
    ),
];

// ---------------------------------------------------------------------------
// Override discovery
// ---------------------------------------------------------------------------

/// Template names always use `/` and lowercase, whatever the platform.
fn template_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

/// Add every `*.tera` file below `dir` to `sources`, keyed relative to `root`.
fn read_overrides(
    root: &Path,
    dir: &Path,
    sources: &mut BTreeMap<String, String>,
) -> Result<(), RenderError> {
    let io = |path: &Path, source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(|e| io(dir, e))? {
        let path = entry.map_err(|e| io(dir, e))?.path();
        if path.is_dir() {
            read_overrides(root, &path, sources)?;
            continue;
        }
        if path.extension().map_or(true, |ext| ext != "tera") {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let body = std::fs::read_to_string(&path).map_err(|e| io(&path, e))?;
        sources.insert(template_key(rel), body);
    }
    Ok(())
}

/// Embedded templates first, then overrides from `override_dir` replacing
/// them by name. A missing override directory is not an error.
fn compile(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut sources: BTreeMap<String, String> = EMBEDDED
        .iter()
        .map(|(name, body)| (template_key(Path::new(name)), (*body).to_string()))
        .collect();
    if let Some(dir) = override_dir.filter(|d| d.is_dir()) {
        read_overrides(dir, dir, &mut sources)?;
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

/// Text the fleet tool generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    PullRequestBody,
}

impl TemplateKind {
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::PullRequestBody]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::PullRequestBody => "pull_request/body.md.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Tera-based renderer with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that replace embedded
/// defaults by relative name (e.g. `pull_request/body.md.tera`). Create once
/// and reuse across repositories.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Construct a [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    pub fn with_overrides(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: compile(user_template_dir)?,
        })
    }

    /// Render `kind` with `ctx`. Line endings are normalised to LF.
    pub fn render(
        &self,
        ctx: &PullRequestContext,
        kind: TemplateKind,
    ) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(kind.template_name(), &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }

    pub fn pull_request_body(&self, ctx: &PullRequestContext) -> Result<String, RenderError> {
        self.render(ctx, TemplateKind::PullRequestBody)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
