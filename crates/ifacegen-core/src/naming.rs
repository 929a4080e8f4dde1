//! Naming rules shared by the resolver and every emitter.
//!
//! Wire names in an IDL document are free-form: `snake_case`, `kebab-case`,
//! or even `items[0].value`. Generated code needs identifiers, so every field
//! and method name goes through [`make_alias`] before it reaches an emitter.
//!
//! Type names additionally pick up the optional product prefix configured in
//! [`NamingConfig`]. The prefix is threaded explicitly from the driver; there
//! is no global naming state.

use serde::{Deserialize, Serialize};

/// Characters that cannot appear in an identifier and are turned into `_`
/// before the camel-case join.
const SEPARATOR_SYMBOLS: &[char] = &['[', ']', '.'];

/// Aliases that clash with keywords or well-known selectors in the target
/// runtimes.
const RESERVED_NAMES: &[&str] = &["void", "id", "description", "new", "type"];

/// Selector prefixes with memory-ownership meaning in the target runtime.
/// Compared case-insensitively.
const RESERVED_PREFIXES: &[&str] = &["new", "alloc", "copy", "mutableCopy"];

/// Uppercase the first character, leave the rest untouched.
///
/// # Examples
/// ```
/// use ifacegen_core::naming::capitalize_first;
/// assert_eq!(capitalize_first("point"), "Point");
/// assert_eq!(capitalize_first("getOrigin"), "GetOrigin");
/// assert_eq!(capitalize_first(""), "");
/// ```
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Turn a wire-level name into an identifier that is safe to emit.
///
/// `[`, `]` and `.` become underscores, then the name is camel-cased on `_`
/// (or on `-` when there is no underscore). Aliases that hit a reserved name
/// or a reserved selector prefix are rewritten to `the` + capitalized alias.
///
/// # Examples
/// ```
/// use ifacegen_core::naming::make_alias;
/// assert_eq!(make_alias("foo_bar"), "fooBar");
/// assert_eq!(make_alias("foo-bar"), "fooBar");
/// assert_eq!(make_alias("items[0]"), "items0");
/// assert_eq!(make_alias("id"), "theId");
/// assert_eq!(make_alias("new_file"), "theNewFile");
/// assert_eq!(make_alias("plain"), "plain");
/// ```
pub fn make_alias(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| if SEPARATOR_SYMBOLS.contains(&c) { '_' } else { c })
        .collect();

    let alias = camel_join(&normalized, '_')
        .or_else(|| camel_join(&normalized, '-'))
        .unwrap_or(normalized);

    if is_reserved(&alias) {
        format!("the{}", capitalize_first(&alias))
    } else {
        alias
    }
}

/// Whether an alias would break generated code if emitted verbatim.
pub fn is_reserved(alias: &str) -> bool {
    if RESERVED_NAMES.contains(&alias) {
        return true;
    }
    let lowered = alias.to_lowercase();
    RESERVED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(&prefix.to_lowercase()))
}

/// Joins `name` split on `separator` in camel case. `None` when the separator
/// does not split the name.
fn camel_join(name: &str, separator: char) -> Option<String> {
    let mut tokens = name.split(separator);
    let first = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }

    let mut alias = first.to_string();
    for token in rest {
        alias.push_str(&capitalize_first(token));
    }
    Some(alias)
}

/// Naming options that apply to every type and module of one compiler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Product prefix prepended to type and module names, e.g. `IF`.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl NamingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty prefix is the same as no prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: if prefix.is_empty() { None } else { Some(prefix) },
        }
    }

    /// Apply the configured prefix unless `name` already carries it.
    ///
    /// # Examples
    /// ```
    /// use ifacegen_core::naming::NamingConfig;
    /// let naming = NamingConfig::with_prefix("IF");
    /// assert_eq!(naming.qualify("point"), "IFPoint");
    /// assert_eq!(naming.qualify("IFPoint"), "IFPoint");
    /// assert_eq!(NamingConfig::new().qualify("point"), "point");
    /// ```
    pub fn qualify(&self, name: &str) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() && !name.starts_with(prefix) => {
                format!("{}{}", prefix, capitalize_first(name))
            }
            _ => name.to_string(),
        }
    }

    /// Full display name of a type synthesized for `candidate` inside the
    /// scope named `decoration`.
    ///
    /// # Examples
    /// ```
    /// use ifacegen_core::naming::NamingConfig;
    /// let naming = NamingConfig::new();
    /// assert_eq!(naming.decorate(Some("GetOrigin"), "point"), "GetOriginPoint");
    /// assert_eq!(naming.decorate(None, "user_info"), "userInfo");
    /// ```
    pub fn decorate(&self, decoration: Option<&str>, candidate: &str) -> String {
        let alias = make_alias(candidate);
        match decoration {
            Some(decoration) if !decoration.is_empty() => {
                self.qualify(&format!("{}{}", decoration, capitalize_first(&alias)))
            }
            _ => self.qualify(&alias),
        }
    }
}
