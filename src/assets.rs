//! Web content compiled into the binary.
use include_dir::{Dir, include_dir};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

/// Everything under `web/ui`: `static/` assets and `html/` fragments.
pub static WEB_CONTENT: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/web/ui");

/// Fragments composing the home page. Order matters: later fragments extend
/// or override blocks declared by earlier ones.
pub const HOME_FRAGMENTS: [&str; 4] = [
    "index.html",
    "partials/shared/head-meta.html",
    "pages/landing.html",
    "partials/shared/dash-script.html",
];

/// Fragment rendered as the entry point of the chain.
const HOME_ENTRY: &str = "pages/landing.html";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("embedded directory `{0}` does not exist")]
    MissingDirectory(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template fragment `{0}` is missing")]
    MissingFragment(String),
    #[error("template fragment `{name}` is not valid UTF-8")]
    Encoding { name: String },
    #[error("unable to parse templates: {0}")]
    Parse(#[source] tera::Error),
    #[error("unable to render template: {0}")]
    Render(#[source] tera::Error),
}

fn subdir(root: &'static Dir<'static>, name: &str) -> Result<&'static Dir<'static>, AssetError> {
    let path = root.path().join(name);
    root.get_dir(&path)
        .ok_or_else(|| AssetError::MissingDirectory(path.display().to_string()))
}

/// Static asset tree served under `/static/`.
#[derive(Clone, Copy, Debug)]
pub struct StaticAssets {
    dir: &'static Dir<'static>,
}

impl StaticAssets {
    pub fn new(root: &'static Dir<'static>, name: &str) -> Result<Self, AssetError> {
        subdir(root, name).map(|dir| Self { dir })
    }

    pub fn embedded() -> Result<Self, AssetError> {
        Self::new(&WEB_CONTENT, "static")
    }

    /// Contents of the asset at `relative`, if it exists.
    pub fn get(&self, relative: &str) -> Option<&'static [u8]> {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return None;
        }
        self.dir
            .get_file(self.dir.path().join(relative))
            .map(|file| file.contents())
    }

    pub fn content_type(relative: &str) -> String {
        mime_guess::from_path(relative)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Ordered HTML fragment chain, parsed fresh for every render.
#[derive(Clone, Copy, Debug)]
pub struct TemplateChain {
    dir: &'static Dir<'static>,
}

impl TemplateChain {
    pub fn new(root: &'static Dir<'static>, name: &str) -> Result<Self, AssetError> {
        subdir(root, name).map(|dir| Self { dir })
    }

    pub fn embedded() -> Result<Self, AssetError> {
        Self::new(&WEB_CONTENT, "html")
    }

    fn fragment(&self, name: &str) -> Result<&'static str, TemplateError> {
        let file = self
            .dir
            .get_file(self.dir.path().join(name))
            .ok_or_else(|| TemplateError::MissingFragment(name.to_string()))?;
        file.contents_utf8().ok_or_else(|| TemplateError::Encoding {
            name: name.to_string(),
        })
    }

    fn parse(&self) -> Result<Tera, TemplateError> {
        let sources = HOME_FRAGMENTS
            .iter()
            .map(|name| self.fragment(name).map(|source| (*name, source)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(TemplateError::Parse)?;
        Ok(tera)
    }

    pub fn render_home<T: Serialize>(&self, view: &T) -> Result<String, TemplateError> {
        let tera = self.parse()?;
        let context = Context::from_serialize(view).map_err(TemplateError::Render)?;
        tera.render(HOME_ENTRY, &context)
            .map_err(TemplateError::Render)
    }
}
