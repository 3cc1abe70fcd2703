//! Object storage for event posters and admin documents
//! 活动海报与管理文档的对象存储

pub mod documents;
pub mod gateway;


pub use documents::DocumentLibrary;
pub use gateway::{generate_object_name, object_path_from_url, StorageGateway};
