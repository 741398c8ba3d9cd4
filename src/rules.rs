use crate::decode::decode_file;
use crate::error::LogTagError;
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Priority given to categories loaded from files without a numeric prefix.
pub const UNNUMBERED_PRIORITY: u32 = u32::MAX;

static RULE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]+)-(.+)-tag|([0-9]+)-tag|tag)\.(?:json|hjson|json5|yaml|yml)$")
        .expect("valid rule file regex")
});

/// How a rule is tested against a line
#[derive(Debug, Clone)]
enum Pattern {
    Substring,
    Regex(Regex),
}

/// A keyword (or regex) and the tag message shown when it matches.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub keyword: String,
    pub message: String,
    pattern: Pattern,
}

impl KeywordRule {
    /// Plain substring rule.
    pub fn substring(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            message: message.into(),
            pattern: Pattern::Substring,
        }
    }

    /// Regex rule. The pattern is compiled here so bad syntax fails at load time.
    pub fn regex(
        category: &str,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, LogTagError> {
        let keyword = keyword.into();
        let regex = Regex::new(&keyword).map_err(|source| LogTagError::RegexCompile {
            category: category.to_string(),
            keyword: keyword.clone(),
            source,
        })?;
        Ok(Self {
            keyword,
            message: message.into(),
            pattern: Pattern::Regex(regex),
        })
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.pattern, Pattern::Regex(_))
    }

    /// Returns true if the rule finds its keyword anywhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        match &self.pattern {
            Pattern::Substring => text.contains(&self.keyword),
            Pattern::Regex(re) => re.is_match(text),
        }
    }
}

/// A named, prioritised group of keyword rules.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub priority: u32,
    pub rules: Vec<KeywordRule>,
}

impl Category {
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: KeywordRule) -> Self {
        self.insert(rule);
        self
    }

    /// Add a rule, replacing any existing rule with the same keyword in place.
    pub fn insert(&mut self, rule: KeywordRule) {
        match self.rules.iter_mut().find(|r| r.keyword == rule.keyword) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Merge a later contribution for the same category into this one.
    ///
    /// Keywords from `other` overwrite ours. The category keeps the lowest
    /// priority number seen, which is where it first appears in priority order.
    pub fn absorb(&mut self, other: Category) {
        debug_assert_eq!(self.name, other.name);
        self.priority = self.priority.min(other.priority);
        for rule in other.rules {
            self.insert(rule);
        }
    }

    /// Ordering key used for evaluation: priority, then name.
    pub fn sort_key(&self) -> (u32, &str) {
        (self.priority, self.name.as_str())
    }
}

/// What a rule file name says about its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFileName {
    /// `NNN-<category>-tag.<ext>`: the body holds one category's rules.
    Categorized { category: String, priority: u32 },
    /// `NNN-tag.<ext>` or `tag.<ext>`: the body maps category names to rules.
    Uncategorized { priority: u32 },
}

impl RuleFileName {
    /// Classify a bare file name. Returns `None` for files that are not rule files.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = RULE_FILE_RE.captures(file_name)?;
        if let (Some(prefix), Some(category)) = (caps.get(1), caps.get(2)) {
            return Some(RuleFileName::Categorized {
                category: category.as_str().to_string(),
                priority: parse_priority(prefix.as_str()),
            });
        }
        let priority = caps
            .get(3)
            .map(|prefix| parse_priority(prefix.as_str()))
            .unwrap_or(UNNUMBERED_PRIORITY);
        Some(RuleFileName::Uncategorized { priority })
    }

    pub fn priority(&self) -> u32 {
        match self {
            RuleFileName::Categorized { priority, .. } => *priority,
            RuleFileName::Uncategorized { priority } => *priority,
        }
    }
}

// Prefixes too large for u32 saturate instead of failing the whole file.
fn parse_priority(digits: &str) -> u32 {
    digits.parse().unwrap_or(UNNUMBERED_PRIORITY)
}

/// Map entries in document order.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    keyword: String,
    message: String,
    #[serde(default)]
    regex: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRules {
    List(Vec<RawRule>),
    Map(Ordered<String>),
}

impl RawRules {
    fn into_category(self, name: &str, priority: u32) -> Result<Category, LogTagError> {
        let mut category = Category::new(name, priority);
        match self {
            RawRules::List(rules) => {
                for raw in rules {
                    let rule = if raw.regex {
                        KeywordRule::regex(name, raw.keyword, raw.message)?
                    } else {
                        KeywordRule::substring(raw.keyword, raw.message)
                    };
                    category.insert(rule);
                }
            }
            RawRules::Map(Ordered(pairs)) => {
                for (keyword, message) in pairs {
                    category.insert(KeywordRule::substring(keyword, message));
                }
            }
        }
        Ok(category)
    }
}

/// Load every category defined by one rule file.
///
/// `NNN-<category>-tag.<ext>` holds one category's rules; `NNN-tag.<ext>`
/// and `tag.<ext>` map category names to rules. Rules are a list of
/// `{keyword, message, regex}` entries or a `{keyword: message}` mapping.
pub fn load_rule_file(path: &Path, name: &RuleFileName) -> Result<Vec<Category>, LogTagError> {
    match name {
        RuleFileName::Categorized { category, priority } => {
            let raw: RawRules = decode_file(path)?;
            Ok(vec![raw.into_category(category, *priority)?])
        }
        RuleFileName::Uncategorized { priority } => {
            let Ordered(entries): Ordered<RawRules> = decode_file(path)?;
            entries
                .into_iter()
                .map(|(category, raw)| raw.into_category(&category, *priority))
                .collect()
        }
    }
}

/// List rule files in `dir`, sorted by file name. A missing directory has none.
pub fn list_rule_files(dir: &Path) -> Vec<(PathBuf, RuleFileName)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<(PathBuf, RuleFileName)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let name = RuleFileName::parse(file_name.to_str()?)?;
            Some((entry.path(), name))
        })
        .collect();
    files.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    files
}

/// Load one directory's rule files as contributions in merge order.
///
/// Files are returned in reverse listing order so that, once merged, the
/// first-listed file wins colliding keywords. Undecodable files are logged
/// and skipped; an invalid regex aborts the load.
pub fn load_rule_directory(dir: &Path) -> Result<Vec<Category>, LogTagError> {
    let files = list_rule_files(dir);
    tracing::debug!(dir = %dir.display(), count = files.len(), "scanning rule files");

    let mut contributions = Vec::new();
    for (path, name) in files.into_iter().rev() {
        match load_rule_file(&path, &name) {
            Ok(mut categories) => {
                tracing::debug!(
                    path = %path.display(),
                    categories = categories.len(),
                    "loaded rule file"
                );
                contributions.append(&mut categories);
            }
            Err(e @ LogTagError::RegexCompile { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping rule file");
            }
        }
    }
    Ok(contributions)
}
