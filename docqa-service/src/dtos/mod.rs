pub mod query;
pub mod quiz;

pub use query::{QueryDocumentRequest, QueryDocumentResponse, UploadAndQueryResponse};
pub use quiz::GenerateMcqRequest;
