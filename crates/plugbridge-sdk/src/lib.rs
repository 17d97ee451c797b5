//! # plugbridge-sdk
//!
//! The surface plugin authors write against: a fluent
//! [`PluginBuilder`], the [`filters!`] macro for id and code filter
//! specs, and a prelude re-exporting the types hooks work with.
//! Hosts and adapters never appear here.

pub mod builder;
pub mod prelude;

pub use builder::PluginBuilder;
pub use plugbridge_filter::FilterSpec;

/// Builds a [`FilterSpec`] from pattern lists.
///
/// Bare patterns are include patterns; `include:`/`exclude:` lists
/// spell out both sides. Patterns may be string globs or
/// `regex::Regex` values, mixed freely.
///
/// ```
/// use plugbridge_sdk::filters;
///
/// let spec = filters!("**/*.ts", "**/*.tsx");
/// assert_eq!(spec.include.len(), 2);
///
/// let spec = filters!(include: ["src/**"], exclude: ["**/vendor/**"]);
/// assert_eq!(spec.exclude.len(), 1);
/// ```
#[macro_export]
macro_rules! filters {
    (include: [$($inc:expr),* $(,)?], exclude: [$($exc:expr),* $(,)?] $(,)?) => {
        $crate::FilterSpec::new()$(.include($inc))*$(.exclude($exc))*
    };
    (include: [$($inc:expr),* $(,)?] $(,)?) => {
        $crate::FilterSpec::new()$(.include($inc))*
    };
    (exclude: [$($exc:expr),* $(,)?] $(,)?) => {
        $crate::FilterSpec::new()$(.exclude($exc))*
    };
    ($($inc:expr),+ $(,)?) => {
        $crate::FilterSpec::new()$(.include($inc))+
    };
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use crate::FilterSpec;

    #[test]
    fn test_filters_macro_shapes() {
        let spec = filters!("**/*.ts");
        assert_eq!(spec.include.len(), 1);
        assert!(spec.exclude.is_empty());

        let spec = filters!(include: ["a/**", "b/**"], exclude: ["**/skip/**"]);
        assert_eq!(spec.include.len(), 2);
        assert_eq!(spec.exclude.len(), 1);

        let spec = filters!(exclude: ["**/*.min.js"]);
        assert!(spec.include.is_empty());
        assert_eq!(spec.exclude.len(), 1);
    }

    #[test]
    fn test_filters_macro_accepts_regexes() {
        let spec = filters!("src/**", Regex::new(r"\.css$").unwrap());
        assert_eq!(spec.include.len(), 2);
        let empty = FilterSpec::new();
        assert!(empty.is_empty());
    }
}
