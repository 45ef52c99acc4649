pub mod company;
pub mod document;
pub mod enums;
pub mod upload;
pub mod value;

pub use company::Company;
pub use document::{DocumentDefinition, FieldDefinition};
pub use enums::{FieldType, UploadStatus};
pub use upload::UploadRecord;
pub use value::{ExtractedDetails, FieldValue};
