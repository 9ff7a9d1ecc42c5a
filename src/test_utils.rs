//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::diagnostic::Diagnostic;

    /// Generate a valid configuration name
    pub fn configuration_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_]{0,24}"
    }

    /// Generate a project-relative source file path
    pub fn resource_path() -> impl Strategy<Value = String> {
        (
            proptest::collection::vec("[a-z][a-z0-9]{0,8}", 0..3),
            "[a-z][a-z0-9_]{0,12}",
        )
            .prop_map(|(dirs, stem)| {
                let mut segments = dirs;
                segments.push(format!("{stem}.es"));
                segments.join("/")
            })
    }

    /// Generate a severity label as the compiler prints it
    ///
    /// Anything other than `error` reports as a warning, so the labels
    /// include one the mapping has never heard of.
    pub fn severity_label() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("error".to_string()),
            Just("warning".to_string()),
            Just("fatal".to_string()),
        ]
    }

    /// Generate a compiler options string
    pub fn options_string() -> impl Strategy<Value = String> {
        proptest::collection::vec("--[a-z]{2,10}", 0..5).prop_map(|flags| flags.join(" "))
    }

    /// Generate a structured diagnostic whose fields survive the wire format
    ///
    /// Field values avoid the `": "` separator, matching what the compiler
    /// itself emits.
    pub fn diagnostic() -> impl Strategy<Value = Diagnostic> {
        (
            "[a-z]{2,8}",
            resource_path(),
            1i64..5000,
            0i64..100,
            severity_label(),
            "[A-Za-z][A-Za-z0-9_' ]{0,40}",
        )
            .prop_map(|(program, file_name, line, code, severity, message)| Diagnostic {
                program,
                file_name,
                line,
                code,
                severity,
                message: message.trim_end().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    use crate::core::diagnostic::Diagnostic;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_configuration_name_generator(name in configuration_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn test_resource_path_generator(path in resource_path()) {
            prop_assert!(path.ends_with(".es"));
            prop_assert!(!path.starts_with('/'));
            prop_assert!(!path.contains("//"));
        }

        #[test]
        fn test_options_string_generator(options in options_string()) {
            prop_assert!(options.split_whitespace().all(|t| t.starts_with("--")));
        }

        #[test]
        fn test_diagnostic_survives_the_wire_format(diag in diagnostic()) {
            let line = format!(
                "{}: {}: {}: {}: {}: {}",
                diag.program, diag.file_name, diag.line, diag.code, diag.severity, diag.message
            );
            prop_assert_eq!(Diagnostic::parse(&line), Some(diag));
        }
    }
}
