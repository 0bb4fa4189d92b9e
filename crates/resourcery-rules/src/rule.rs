use resourcery_core::FieldSpec;

/// One entry of a rule table.
pub struct Rule<O: 'static> {
    /// Stable name reported when the rule fires.
    pub name: &'static str,
    pub when: fn(&FieldSpec) -> bool,
    pub then: fn(&FieldSpec) -> O,
}

/// Outcome of resolving a table against one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<O> {
    pub rule: &'static str,
    pub outcome: O,
}

/// First-match-wins resolution over an ordered table.
pub fn resolve<O>(table: &'static [Rule<O>], field: &FieldSpec) -> Option<Selection<O>> {
    table
        .iter()
        .find(|rule| (rule.when)(field))
        .map(|rule| Selection {
            rule: rule.name,
            outcome: (rule.then)(field),
        })
}

/// Case-insensitive substring test on the field name.
pub(crate) fn name_has(field: &FieldSpec, needle: &str) -> bool {
    field.name.to_ascii_lowercase().contains(needle)
}

pub(crate) fn name_has_any(field: &FieldSpec, needles: &[&str]) -> bool {
    let lower = field.name.to_ascii_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourcery_core::FieldType;

    static TABLE: &[Rule<u8>] = &[
        Rule {
            name: "first",
            when: |field| field.nullable,
            then: |_| 1,
        },
        Rule {
            name: "second",
            when: |_| true,
            then: |_| 2,
        },
    ];

    #[test]
    fn earlier_rules_win() {
        let field = FieldSpec::new("title", FieldType::String).nullable();
        let selection = resolve(TABLE, &field).expect("rule fires");
        assert_eq!(selection.rule, "first");
        assert_eq!(selection.outcome, 1);

        let field = FieldSpec::new("title", FieldType::String);
        assert_eq!(resolve(TABLE, &field).map(|s| s.outcome), Some(2));
    }
}
