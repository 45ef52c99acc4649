pub mod company;
pub mod document;
pub mod upload;

pub use company::*;
pub use document::*;
pub use upload::*;
