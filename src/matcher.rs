use crate::input::LogLine;
use crate::rules::{Category, KeywordRule};
use std::collections::BTreeSet;

/// Short-circuit and filtering controls for matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Only these categories are evaluated. `None` or empty means all.
    pub allow_list: Option<BTreeSet<String>>,
    pub stop_first_tag: bool,
    pub stop_first_category: bool,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_list(mut self, allow_list: Option<BTreeSet<String>>) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn stop_first_tag(mut self, stop: bool) -> Self {
        self.stop_first_tag = stop;
        self
    }

    pub fn stop_first_category(mut self, stop: bool) -> Self {
        self.stop_first_category = stop;
        self
    }

    fn allows(&self, category: &Category) -> bool {
        match &self.allow_list {
            Some(names) if !names.is_empty() => names.contains(&category.name),
            _ => true,
        }
    }
}

/// A rule that matched, with the category it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct TagMatch<'a> {
    pub category: &'a Category,
    pub rule: &'a KeywordRule,
}

/// Every match for one line, in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct MatchResult<'a> {
    pub matches: Vec<TagMatch<'a>>,
}

impl<'a> MatchResult<'a> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn messages(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.matches.iter().map(|m| m.rule.message.as_str())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.matches.iter().map(|m| m.category.name.as_str())
    }
}

/// Matches lines against categories already sorted into evaluation order.
#[derive(Debug, Clone)]
pub struct TagMatcher<'a> {
    categories: &'a [Category],
    options: MatchOptions,
}

impl<'a> TagMatcher<'a> {
    pub fn new(categories: &'a [Category], options: MatchOptions) -> Self {
        Self {
            categories,
            options,
        }
    }

    pub fn match_line(&self, line: &LogLine) -> MatchResult<'a> {
        match_text(&line.text, self.categories, &self.options)
    }
}

/// Match raw text against `categories` in order.
pub fn match_text<'a>(
    text: &str,
    categories: &'a [Category],
    options: &MatchOptions,
) -> MatchResult<'a> {
    let mut result = MatchResult::default();

    for category in categories {
        if !options.allows(category) {
            continue;
        }

        for rule in &category.rules {
            if rule.matches(text) {
                result.matches.push(TagMatch { category, rule });
                if options.stop_first_tag {
                    break;
                }
            }
        }

        if options.stop_first_category && !result.is_empty() {
            break;
        }
    }

    result
}
