use std::collections::HashSet;
use std::fmt;

use jsonschema::JSONSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::field::FieldSpec;
use crate::naming::{is_identifier, is_pascal_identifier};
use crate::policy::RolePermissions;
use crate::request::GenerationRequest;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(code, path, message)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Returns true when an error with `code` was recorded.
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    fn single(issue: ValidationIssue) -> Self {
        let mut report = Self::default();
        report.push(issue);
        report
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .errors
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect::<Vec<_>>();
        f.write_str(&rendered.join("; "))
    }
}

/// JSON Schema for the field-schema wire format.
pub fn fields_schema() -> Value {
    serde_json::to_value(schema_for!(Vec<FieldSpec>)).unwrap_or(Value::Null)
}

/// JSON Schema for the role-permission wire format.
pub fn role_permissions_schema() -> Value {
    serde_json::to_value(schema_for!(RolePermissions)).unwrap_or(Value::Null)
}

/// Validate a JSON document against a JSON Schema.
pub fn validate_json(instance: &Value, schema: &Value) -> ValidationReport {
    let compiled = match JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(err) => {
            return ValidationReport::single(ValidationIssue::error(
                "schema_compile_error",
                "/",
                err.to_string(),
            ));
        }
    };

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(instance) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }
    report
}

/// Parse and validate a field schema from its wire form.
pub fn parse_fields(raw: &str) -> Result<Vec<FieldSpec>, ValidationReport> {
    let json = parse_raw(raw, "invalid_fields_json")?;
    let structural = validate_json(&json, &fields_schema());
    if !structural.is_ok() {
        return Err(structural);
    }

    let fields: Vec<FieldSpec> = serde_json::from_value(json).map_err(|err| {
        ValidationReport::single(ValidationIssue::error("invalid_fields_json", "/", err.to_string()))
    })?;

    let report = validate_fields(&fields);
    if !report.is_ok() {
        return Err(report);
    }
    Ok(fields)
}

/// Parse and validate a role-permission mapping from its wire form.
pub fn parse_role_permissions(raw: &str) -> Result<RolePermissions, ValidationReport> {
    let json = parse_raw(raw, "invalid_role_permissions_json")?;
    let structural = validate_json(&json, &role_permissions_schema());
    if !structural.is_ok() {
        return Err(structural);
    }

    let permissions: RolePermissions = serde_json::from_value(json).map_err(|err| {
        ValidationReport::single(ValidationIssue::error(
            "invalid_role_permissions_json",
            "/",
            err.to_string(),
        ))
    })?;

    let report = validate_role_permissions(&permissions);
    if report.is_ok() { Ok(permissions) } else { Err(report) }
}

/// Check that a role mapping is non-empty and every role is an identifier.
pub fn validate_role_permissions(permissions: &RolePermissions) -> ValidationReport {
    let mut report = ValidationReport::default();
    if permissions.is_empty() {
        report.push(ValidationIssue::error(
            "role_permissions_empty",
            "/",
            "Invalid role permissions format",
        ));
    }
    for role in permissions.roles() {
        if !is_identifier(role) {
            report.push(ValidationIssue::error(
                "role_name_invalid",
                format!("/{role}"),
                format!("role '{role}' is not a valid identifier"),
            ));
        }
    }
    report
}

/// Check the semantic invariants of a field schema.
pub fn validate_fields(fields: &[FieldSpec]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if fields.is_empty() {
        report.push(ValidationIssue::error(
            "fields_empty",
            "/",
            "At least one field is required",
        ));
        return report;
    }

    let mut seen = HashSet::new();
    for (index, field) in fields.iter().enumerate() {
        let path = format!("/{index}/name");
        let name = field.name.as_str();

        if name.trim().is_empty() {
            report.push(ValidationIssue::error(
                "field_name_empty",
                path,
                "All fields must have a name",
            ));
            continue;
        }
        if !is_identifier(name) {
            report.push(
                ValidationIssue::error(
                    "field_name_invalid",
                    path.clone(),
                    format!("field name '{name}' is not a valid identifier"),
                )
                .with_hint("use letters, digits and underscores, not starting with a digit"),
            );
        }
        if !seen.insert(name) {
            report.push(ValidationIssue::error(
                "field_name_duplicate",
                path.clone(),
                format!("duplicate field name '{name}'"),
            ));
        }
        if name == "id" {
            report.push(ValidationIssue::error(
                "field_name_reserved",
                path.clone(),
                "'id' is managed by the migration skeleton",
            ));
        }
        if field.is_timestamp_column() {
            report.push(ValidationIssue::warning(
                "field_name_timestamp",
                path,
                format!("'{name}' is managed by the migration skeleton"),
            ));
        }
    }

    report
}

/// Check that an entity name is a PascalCase identifier.
pub fn validate_entity_name(name: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if name.trim().is_empty() {
        report.push(ValidationIssue::error(
            "entity_name_required",
            "/entityName",
            "Model name is required",
        ));
    } else if !is_pascal_identifier(name) {
        report.push(
            ValidationIssue::error(
                "entity_name_invalid",
                "/entityName",
                format!("model name '{name}' must be a PascalCase identifier"),
            )
            .with_hint("for example: Post, BlogPost"),
        );
    }
    report
}

/// Validate a whole request before any step runs.
pub fn validate_request(request: &GenerationRequest) -> ValidationReport {
    let mut report = validate_entity_name(&request.entity_name);
    let mut fields = validate_fields(&request.fields);
    for issue in fields.errors.iter_mut().chain(fields.warnings.iter_mut()) {
        issue.path = format!("/fields{}", issue.path.trim_end_matches('/'));
    }
    report.merge(fields);
    report
}

fn parse_raw(raw: &str, code: &str) -> Result<Value, ValidationReport> {
    serde_json::from_str(raw)
        .map_err(|err| ValidationReport::single(ValidationIssue::error(code, "/", err.to_string())))
}

fn normalized_json_pointer(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
