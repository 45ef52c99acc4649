use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::FieldType;
use super::value::ExtractedDetails;

/// A single typed field an admin wants collected/extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Uuid,
    pub name: String,
    pub field_type: FieldType,
}

/// A document template: what to extract from uploads referencing it.
///
/// Admin-created. Definitions are create/read only — once uploads reference
/// one, there is no mutation path, so extracted keys stay consistent with
/// the declared fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDefinition {
    pub id: Uuid,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    /// Most recent successful extraction against this definition,
    /// mirrored here for the admin overview.
    pub last_extracted_details: Option<ExtractedDetails>,
    pub created_at: NaiveDateTime,
}
