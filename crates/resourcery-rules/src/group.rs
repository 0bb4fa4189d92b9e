use resourcery_core::{FieldSpec, FieldType};

use crate::rule::{Rule, resolve};

/// Section of the record view a column is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisplayGroup {
    Basic,
    Boolean,
    Content,
    Numeric,
    Dates,
    Structured,
}

impl DisplayGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayGroup::Basic => "basic",
            DisplayGroup::Boolean => "boolean",
            DisplayGroup::Content => "content",
            DisplayGroup::Numeric => "numeric",
            DisplayGroup::Dates => "dates",
            DisplayGroup::Structured => "structured",
        }
    }
}

/// Display grouping table. Timestamp columns resolve to `None`.
pub static DISPLAY_GROUP_RULES: &[Rule<Option<DisplayGroup>>] = &[
    Rule {
        name: "timestamps",
        when: |field| field.is_timestamp_column(),
        then: |_| None,
    },
    Rule {
        name: "long_text",
        when: |field| field.field_type.is_long_text(),
        then: |_| Some(DisplayGroup::Content),
    },
    Rule {
        name: "numeric",
        when: |field| field.field_type.is_numeric(),
        then: |_| Some(DisplayGroup::Numeric),
    },
    Rule {
        name: "dates",
        when: |field| field.field_type.is_temporal(),
        then: |_| Some(DisplayGroup::Dates),
    },
    Rule {
        name: "json",
        when: |field| field.field_type.is_json(),
        then: |_| Some(DisplayGroup::Structured),
    },
    Rule {
        name: "boolean",
        when: |field| field.field_type == FieldType::Boolean,
        then: |_| Some(DisplayGroup::Boolean),
    },
    Rule {
        name: "basic",
        when: |_| true,
        then: |_| Some(DisplayGroup::Basic),
    },
];

pub fn display_group(field: &FieldSpec) -> Option<DisplayGroup> {
    resolve(DISPLAY_GROUP_RULES, field).and_then(|selection| selection.outcome)
}
