use std::fmt;

use resourcery_core::{FieldSpec, FieldType};

use crate::rule::{Rule, resolve};

/// Attribute cast declared on the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCast {
    Boolean,
    Integer,
    Decimal2,
    Array,
    Date,
    Datetime,
}

impl StorageCast {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageCast::Boolean => "boolean",
            StorageCast::Integer => "integer",
            StorageCast::Decimal2 => "decimal:2",
            StorageCast::Array => "array",
            StorageCast::Date => "date",
            StorageCast::Datetime => "datetime",
        }
    }
}

impl fmt::Display for StorageCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-type cast table. `None` means the column is left uncast.
pub static CAST_RULES: &[Rule<Option<StorageCast>>] = &[
    // nullable booleans stay uncast
    Rule {
        name: "nullable_boolean",
        when: |field| field.field_type == FieldType::Boolean && field.nullable,
        then: |_| None,
    },
    Rule {
        name: "boolean",
        when: |field| field.field_type == FieldType::Boolean,
        then: |_| Some(StorageCast::Boolean),
    },
    Rule {
        name: "integer",
        when: |field| field.field_type.is_integer(),
        then: |_| Some(StorageCast::Integer),
    },
    Rule {
        name: "decimal",
        when: |field| field.field_type.is_decimal(),
        then: |_| Some(StorageCast::Decimal2),
    },
    Rule {
        name: "json",
        when: |field| field.field_type.is_json(),
        then: |_| Some(StorageCast::Array),
    },
    Rule {
        name: "date",
        when: |field| field.field_type == FieldType::Date,
        then: |_| Some(StorageCast::Date),
    },
    Rule {
        name: "datetime",
        when: |field| matches!(field.field_type, FieldType::Datetime | FieldType::Timestamp),
        then: |_| Some(StorageCast::Datetime),
    },
];

/// Cast for a single column, if any.
pub fn storage_cast(field: &FieldSpec) -> Option<StorageCast> {
    resolve(CAST_RULES, field).and_then(|selection| {
        tracing::trace!(field = %field.name, rule = selection.rule, "cast rule matched");
        selection.outcome
    })
}

/// Ordered `(column, cast)` pairs for every cast column.
pub fn cast_map(fields: &[FieldSpec]) -> Vec<(String, StorageCast)> {
    fields
        .iter()
        .filter_map(|field| storage_cast(field).map(|cast| (field.name.clone(), cast)))
        .collect()
}
