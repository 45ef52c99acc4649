//! Prompt construction for field extraction.
//!
//! The field list is embedded as a natural-language instruction; the system
//! prompt pins the output contract to a flat JSON object.

use crate::models::{DocumentDefinition, FieldType};

const SYSTEM_PROMPT: &str = "\
You are a compliance document data extractor. You will be shown a scanned \
business document and a list of fields to extract. Respond with a single \
flat JSON object mapping each requested field name to the value visible in \
the document, or null when the value is not present. Do not invent values. \
Do not include any field that was not requested. No prose before or after \
the JSON.";

/// A built prompt pair for one extraction call.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for a document definition.
pub fn build_prompt(document: &DocumentDefinition) -> Prompt {
    let mut user = format!(
        "Extract the following fields from this document (\"{}\"):\n",
        document.name
    );
    for field in &document.fields {
        user.push_str(&format!(
            "- {} ({})\n",
            field.name,
            type_hint(field.field_type)
        ));
    }
    user.push_str(
        "\nReturn a JSON object with exactly these field names as keys. \
         Use null for anything you cannot read.",
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Per-type formatting hint shown next to the field name.
fn type_hint(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "text",
        FieldType::Number => "number, digits only",
        FieldType::Date => "date, format YYYY-MM-DD",
        FieldType::Email => "email address",
        FieldType::Phone => "phone number",
    }
}
