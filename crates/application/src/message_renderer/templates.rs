/// Named message patterns with `{placeholder}` markers.
///
/// Substitution is literal text replacement in a single pass: substituted
/// values are never escaped or re-templated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplates {
    /// Field change with a meaningful old value.
    pub changed_with_old_value: String,
    /// Field change without a meaningful old value.
    pub changed_no_old_value: String,
    /// Field change recorded without values.
    pub changed_without_values: String,
    /// Subject record creation.
    pub created: String,
    /// Subject record deletion.
    pub deleted: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            changed_with_old_value: r#"changed "{fieldName}" from "{oldValue}" to "{newValue}""#
                .to_owned(),
            changed_no_old_value: r#"set "{fieldName}" to "{newValue}""#.to_owned(),
            changed_without_values: r#"changed "{fieldName}""#.to_owned(),
            created: "created {modelCaption}".to_owned(),
            deleted: "deleted {modelCaption}".to_owned(),
        }
    }
}

/// Replaces `{name}` markers with their values in one left-to-right pass.
///
/// Unknown markers stay verbatim; markers appearing inside substituted values
/// are not expanded.
pub(crate) fn render_template(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let marker = &rest[start..];
        let Some(end) = marker.find('}') else {
            rendered.push_str(marker);
            return rendered;
        };

        let name = &marker[1..end];
        match replacements.iter().find(|(known, _)| *known == name) {
            Some((_, value)) => rendered.push_str(value),
            None => rendered.push_str(&marker[..=end]),
        }
        rest = &marker[end + 1..];
    }

    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use super::render_template;

    #[test]
    fn replaces_named_markers() {
        let rendered = render_template(
            r#"changed "{fieldName}" from "{oldValue}" to "{newValue}""#,
            &[("fieldName", "Name"), ("oldValue", "a"), ("newValue", "b")],
        );
        assert_eq!(rendered, r#"changed "Name" from "a" to "b""#);
    }

    #[test]
    fn unknown_markers_stay_verbatim() {
        let rendered = render_template("set {fieldName} to {newValue}", &[("fieldName", "Name")]);
        assert_eq!(rendered, "set Name to {newValue}");
    }

    #[test]
    fn substituted_values_are_not_re_templated() {
        let rendered = render_template(
            "set {fieldName} to {newValue}",
            &[("fieldName", "{newValue}"), ("newValue", "x")],
        );
        assert_eq!(rendered, "set {newValue} to x");
    }
}
