use crate::decode::{DocumentFormat, decode_file};
use crate::error::LogTagError;
use crate::rules::{
    Category, RuleFileName, UNNUMBERED_PRIORITY, load_rule_directory, load_rule_file,
};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

/// Name of the per-location config directory.
pub const DOTDIR: &str = ".logtag";

/// Base name of the display config document inside a config directory.
pub const CONFIG_STEM: &str = "config";

/// The value a report column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Messages of every matching rule
    Tag,
    /// Category of every matching rule
    Category,
    /// Source file path
    File,
    /// Raw log text
    Log,
}

impl FromStr for ColumnKind {
    type Err = LogTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAG" => Ok(ColumnKind::Tag),
            "CATEGORY" => Ok(ColumnKind::Category),
            "FILE" => Ok(ColumnKind::File),
            "LOG" => Ok(ColumnKind::Log),
            _ => Err(LogTagError::UnknownColumnKind(s.to_string())),
        }
    }
}

impl ColumnKind {
    /// Header used when a column entry has no `display` title.
    pub fn default_title(&self) -> &'static str {
        match self {
            ColumnKind::Tag => "Tag",
            ColumnKind::Category => "Category",
            ColumnKind::File => "File",
            ColumnKind::Log => "Log",
        }
    }
}

/// One column of the report, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub title: String,
    pub enabled: bool,
}

impl ColumnSpec {
    pub fn new(kind: ColumnKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Display settings after resolution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub columns: Vec<ColumnSpec>,
    /// Categories to evaluate. `None` or an empty set means all categories.
    pub allow_list: Option<BTreeSet<String>>,
    /// Document the settings came from, `None` for the built-in default.
    pub source: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new(ColumnKind::Tag, ColumnKind::Tag.default_title()),
                ColumnSpec::new(ColumnKind::Category, ColumnKind::Category.default_title()),
                ColumnSpec::new(ColumnKind::File, ColumnKind::File.default_title()),
                ColumnSpec::new(ColumnKind::Log, ColumnKind::Log.default_title()),
            ],
            allow_list: None,
            source: None,
        }
    }
}

impl ResolvedConfig {
    /// Replace the category allow-list. An empty list clears it.
    pub fn with_allow_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.allow_list = if set.is_empty() { None } else { Some(set) };
        self
    }
}

pub fn default_config() -> &'static ResolvedConfig {
    static DEFAULT_CONFIG: LazyLock<ResolvedConfig> = LazyLock::new(ResolvedConfig::default);
    &DEFAULT_CONFIG
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    #[serde(default)]
    display: Option<String>,
    #[serde(default = "default_enable")]
    enable: bool,
}

fn default_enable() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDisplayConfig {
    column: Option<Vec<RawColumn>>,
    category: Option<Vec<String>>,
}

impl RawDisplayConfig {
    fn resolve(self, source: &Path) -> Result<ResolvedConfig, LogTagError> {
        let columns = match self.column {
            Some(raw) => raw
                .into_iter()
                .map(|col| -> Result<ColumnSpec, LogTagError> {
                    let kind: ColumnKind = col.name.parse()?;
                    let title = col
                        .display
                        .unwrap_or_else(|| kind.default_title().to_string());
                    Ok(ColumnSpec {
                        kind,
                        title,
                        enabled: col.enable,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => default_config().columns.clone(),
        };

        let resolved = ResolvedConfig {
            columns,
            allow_list: None,
            source: Some(source.to_path_buf()),
        };
        Ok(resolved.with_allow_list(self.category.unwrap_or_default()))
    }
}

/// Load a display config document named directly by the user.
///
/// Any read or decode failure is returned to the caller.
pub fn load_config_from_path(path: &Path) -> Result<ResolvedConfig, LogTagError> {
    let raw: RawDisplayConfig = decode_file(path)?;
    raw.resolve(path)
}

/// Ordered candidate directories, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Use exactly these directories, in this priority order. Duplicates keep
    /// their first position.
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        Self { dirs: unique }
    }

    /// Production search order: the explicit directory, then `.logtag` next to
    /// the executable, in the home directory and in the working directory.
    pub fn discover(explicit: Option<&Path>) -> Self {
        let install = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DOTDIR)));
        let home = dirs::home_dir().map(|dir| dir.join(DOTDIR));
        let working = env::current_dir().ok().map(|dir| dir.join(DOTDIR));

        Self::new(
            explicit
                .map(Path::to_path_buf)
                .into_iter()
                .chain(install)
                .chain(home)
                .chain(working),
        )
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Resolved display settings plus categories in evaluation order.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub categories: Vec<Category>,
}

/// Discovers and merges config and rule sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    search: SearchPaths,
    config_file: Option<PathBuf>,
    tag_files: Vec<PathBuf>,
}

impl ConfigResolver {
    pub fn new(search: SearchPaths) -> Self {
        Self {
            search,
            config_file: None,
            tag_files: Vec::new(),
        }
    }

    /// Use this display config instead of searching. Decode failures are fatal.
    pub fn config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Extra rule files merged after every directory. Decode failures are fatal.
    pub fn tag_files(mut self, paths: Vec<PathBuf>) -> Self {
        self.tag_files = paths;
        self
    }

    pub fn resolve(&self) -> Result<Resolution, LogTagError> {
        let config = self.resolve_display()?;
        let categories = self.resolve_categories()?;
        let source = config
            .source
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string());
        tracing::info!(
            config = %source,
            categories = categories.len(),
            "resolved configuration"
        );
        Ok(Resolution { config, categories })
    }

    /// First directory, in priority order, holding a decodable config wins.
    pub fn resolve_display(&self) -> Result<ResolvedConfig, LogTagError> {
        if let Some(path) = &self.config_file {
            return load_config_from_path(path);
        }

        for dir in self.search.dirs() {
            let Some(path) = find_config_document(dir) else {
                continue;
            };
            let raw: RawDisplayConfig = match decode_file(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config file");
                    continue;
                }
            };
            tracing::debug!(path = %path.display(), "using config file");
            return raw.resolve(&path);
        }

        Ok(default_config().clone())
    }

    /// Merge rule files from every directory, then sort by (priority, name).
    ///
    /// Directories are merged from lowest to highest priority so keywords
    /// from a higher-priority directory overwrite colliding ones; explicitly
    /// named rule files are merged last.
    pub fn resolve_categories(&self) -> Result<Vec<Category>, LogTagError> {
        let mut contributions = Vec::new();
        for dir in self.search.dirs().iter().rev() {
            contributions.extend(load_rule_directory(dir)?);
        }
        for path in &self.tag_files {
            let name = explicit_rule_file_name(path);
            contributions.extend(load_rule_file(path, &name)?);
        }
        Ok(merge_categories(contributions))
    }
}

/// Resolve with the production search order rooted at `explicit_dir`
/// followed by `builtin_dirs`.
pub fn resolve(
    explicit_dir: Option<&Path>,
    builtin_dirs: &[PathBuf],
) -> Result<Resolution, LogTagError> {
    let search = SearchPaths::new(
        explicit_dir
            .map(Path::to_path_buf)
            .into_iter()
            .chain(builtin_dirs.iter().cloned()),
    );
    ConfigResolver::new(search).resolve()
}

/// Fold contributions (in merge order) into one category per name, sorted by
/// priority then name.
pub fn merge_categories(contributions: impl IntoIterator<Item = Category>) -> Vec<Category> {
    let mut merged: Vec<Category> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for contribution in contributions {
        match index.get(&contribution.name) {
            Some(&i) => merged[i].absorb(contribution),
            None => {
                index.insert(contribution.name.clone(), merged.len());
                merged.push(contribution);
            }
        }
    }

    merged.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    merged
}

fn find_config_document(dir: &Path) -> Option<PathBuf> {
    DocumentFormat::EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{CONFIG_STEM}.{ext}")))
        .find(|path| path.is_file())
}

// A directly named rule file need not follow the naming convention; when it
// does not, its stem is the category and it sorts after numbered files.
fn explicit_rule_file_name(path: &Path) -> RuleFileName {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(RuleFileName::parse)
        .unwrap_or_else(|| RuleFileName::Categorized {
            category: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            priority: UNNUMBERED_PRIORITY,
        })
}
