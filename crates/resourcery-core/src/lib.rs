//! Core contracts for Resourcery.
//!
//! This crate defines the field schema, the generation request, the step and
//! process result wire formats, the error taxonomy shared by every step, and
//! the validation and naming helpers used across the pipeline.

pub mod error;
pub mod field;
pub mod naming;
pub mod policy;
pub mod request;
pub mod result;
pub mod validation;

pub use error::{Result, StepError};
pub use field::{DefaultValue, FieldSpec, FieldType, TIMESTAMP_FIELDS};
pub use policy::{PolicyAction, RolePermissions};
pub use request::{GenerationFlags, GenerationRequest};
pub use result::{ProcessArtifacts, ProcessResult, ProcessStatus, StepResult};
pub use validation::{
    IssueSeverity, ValidationIssue, ValidationReport, fields_schema, parse_fields,
    parse_role_permissions, role_permissions_schema, validate_entity_name, validate_fields,
    validate_json, validate_request, validate_role_permissions,
};
