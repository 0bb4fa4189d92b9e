use resourcery_core::{FieldSpec, FieldType};

use crate::rule::{Rule, Selection, name_has, name_has_any, resolve};

/// Sample-data expression for one factory attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeValue {
    /// A fixed PHP literal taken from the column default.
    Literal(String),
    /// A faker call such as `safeEmail()`, rendered on `fake()`.
    Faker(&'static str),
}

impl FakeValue {
    /// PHP expression for the factory definition array.
    ///
    /// Nullable columns draw through `optional()` so some rows are null.
    /// Literals are never wrapped.
    pub fn render(&self, nullable: bool) -> String {
        match self {
            FakeValue::Literal(literal) => literal.clone(),
            FakeValue::Faker(call) if nullable => format!("fake()->optional()->{call}"),
            FakeValue::Faker(call) => format!("fake()->{call}"),
        }
    }
}

fn string_or(field: &FieldSpec, bounded: &'static str, otherwise: &'static str) -> FakeValue {
    if field.field_type == FieldType::String {
        FakeValue::Faker(bounded)
    } else {
        FakeValue::Faker(otherwise)
    }
}

/// Default literal, then name heuristics, then storage type.
pub static FAKE_VALUE_RULES: &[Rule<FakeValue>] = &[
    Rule {
        name: "default",
        when: |field| field.default.is_some(),
        then: |field| match &field.default {
            Some(value) => FakeValue::Literal(value.php_literal(field.field_type)),
            None => FakeValue::Faker("word()"),
        },
    },
    Rule {
        name: "email",
        when: |field| name_has(field, "email"),
        then: |_| FakeValue::Faker("unique()->safeEmail()"),
    },
    Rule {
        name: "phone",
        when: |field| name_has_any(field, &["phone", "mobile", "tel", "contact"]),
        then: |_| FakeValue::Faker("phoneNumber()"),
    },
    Rule {
        name: "address",
        when: |field| name_has(field, "address"),
        then: |_| FakeValue::Faker("address()"),
    },
    Rule {
        name: "city",
        when: |field| name_has(field, "city"),
        then: |_| FakeValue::Faker("city()"),
    },
    Rule {
        name: "country",
        when: |field| name_has(field, "country"),
        then: |_| FakeValue::Faker("country()"),
    },
    Rule {
        name: "state",
        when: |field| name_has(field, "state"),
        then: |_| FakeValue::Faker("state()"),
    },
    Rule {
        name: "postcode",
        when: |field| name_has_any(field, &["zip", "postal"]),
        then: |_| FakeValue::Faker("postcode()"),
    },
    Rule {
        name: "company",
        when: |field| name_has(field, "company"),
        then: |_| FakeValue::Faker("company()"),
    },
    Rule {
        name: "person_name",
        when: |field| name_has(field, "name") && !name_has_any(field, &["user", "file"]),
        then: |field| {
            if name_has(field, "first") {
                FakeValue::Faker("firstName()")
            } else if name_has(field, "last") {
                FakeValue::Faker("lastName()")
            } else {
                FakeValue::Faker("name()")
            }
        },
    },
    Rule {
        name: "title",
        when: |field| name_has(field, "title"),
        then: |field| string_or(field, "text(100)", "sentence(3)"),
    },
    Rule {
        name: "slug",
        when: |field| name_has(field, "slug"),
        then: |_| FakeValue::Faker("slug()"),
    },
    Rule {
        name: "url",
        when: |field| name_has_any(field, &["url", "website"]),
        then: |_| FakeValue::Faker("url()"),
    },
    Rule {
        name: "image",
        when: |field| name_has_any(field, &["image", "photo", "avatar"]),
        then: |_| FakeValue::Faker("imageUrl(640, 480)"),
    },
    Rule {
        name: "description",
        when: |field| name_has_any(field, &["description", "bio"]),
        then: |field| string_or(field, "text(200)", "paragraph()"),
    },
    Rule {
        name: "content",
        when: |field| name_has_any(field, &["content", "body"]),
        then: |field| string_or(field, "text(200)", "paragraphs(3, true)"),
    },
    Rule {
        name: "note",
        when: |field| name_has_any(field, &["note", "comment", "remark"]),
        then: |field| string_or(field, "text(200)", "paragraph()"),
    },
    Rule {
        name: "summary",
        when: |field| name_has(field, "summary"),
        then: |field| string_or(field, "text(200)", "paragraph()"),
    },
    Rule {
        name: "color",
        when: |field| name_has(field, "color"),
        then: |_| FakeValue::Faker("hexColor()"),
    },
    Rule {
        name: "price",
        when: |field| name_has_any(field, &["price", "amount"]),
        then: |_| FakeValue::Faker("randomFloat(2, 10, 1000)"),
    },
    Rule {
        name: "quantity",
        when: |field| name_has_any(field, &["quantity", "stock"]),
        then: |_| FakeValue::Faker("numberBetween(0, 100)"),
    },
    Rule {
        name: "rating",
        when: |field| name_has(field, "rating"),
        then: |_| FakeValue::Faker("numberBetween(1, 5)"),
    },
    Rule {
        name: "percentage",
        when: |field| name_has_any(field, &["percentage", "percent"]),
        then: |_| FakeValue::Faker("numberBetween(0, 100)"),
    },
    Rule {
        name: "age",
        when: |field| name_has(field, "age"),
        then: |_| FakeValue::Faker("numberBetween(18, 80)"),
    },
    Rule {
        name: "year",
        when: |field| name_has(field, "year"),
        then: |_| FakeValue::Faker("year()"),
    },
    Rule {
        name: "month",
        when: |field| name_has(field, "month"),
        then: |_| FakeValue::Faker("month()"),
    },
    Rule {
        name: "day",
        when: |field| name_has(field, "day"),
        then: |_| FakeValue::Faker("dayOfMonth()"),
    },
    Rule {
        name: "status",
        when: |field| name_has(field, "status"),
        then: |_| FakeValue::Faker("randomElement(['active', 'inactive', 'pending'])"),
    },
    Rule {
        name: "type",
        when: |field| name_has(field, "type"),
        then: |_| FakeValue::Faker("randomElement(['type1', 'type2', 'type3'])"),
    },
    Rule {
        name: "category",
        when: |field| name_has(field, "category"),
        then: |_| FakeValue::Faker("word()"),
    },
    Rule {
        name: "tag",
        when: |field| name_has(field, "tag"),
        then: |_| FakeValue::Faker("word()"),
    },
    Rule {
        name: "type:string",
        when: |field| field.field_type == FieldType::String,
        then: |_| FakeValue::Faker("text(200)"),
    },
    Rule {
        name: "type:long_text",
        when: |field| field.field_type == FieldType::LongText,
        then: |_| FakeValue::Faker("paragraphs(3, true)"),
    },
    Rule {
        name: "type:text",
        when: |field| matches!(field.field_type, FieldType::Text | FieldType::MediumText),
        then: |_| FakeValue::Faker("paragraph()"),
    },
    Rule {
        name: "type:integer",
        when: |field| field.field_type.is_integer(),
        then: |_| FakeValue::Faker("numberBetween(1, 100)"),
    },
    Rule {
        name: "type:boolean",
        when: |field| field.field_type == FieldType::Boolean,
        then: |_| FakeValue::Faker("boolean()"),
    },
    Rule {
        name: "type:date",
        when: |field| field.field_type == FieldType::Date,
        then: |_| FakeValue::Faker("date()"),
    },
    Rule {
        name: "type:datetime",
        when: |field| matches!(field.field_type, FieldType::Datetime | FieldType::Timestamp),
        then: |_| FakeValue::Faker("dateTime()"),
    },
    Rule {
        name: "type:decimal",
        when: |field| field.field_type.is_decimal(),
        then: |_| FakeValue::Faker("randomFloat(2, 0, 1000)"),
    },
    Rule {
        name: "type:json",
        when: |field| field.field_type.is_json(),
        then: |_| FakeValue::Faker("json()"),
    },
    Rule {
        name: "fallback",
        when: |_| true,
        then: |_| FakeValue::Faker("word()"),
    },
];

/// Select the sample-data generator for `field`.
pub fn fake_value(field: &FieldSpec) -> Selection<FakeValue> {
    resolve(FAKE_VALUE_RULES, field).unwrap_or(Selection {
        rule: "fallback",
        outcome: FakeValue::Faker("word()"),
    })
}
