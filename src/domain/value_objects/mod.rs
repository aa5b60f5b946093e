mod bucket_name;
mod credential;
mod object_key;

pub use bucket_name::BucketName;
pub use credential::Credential;
pub use object_key::ObjectKey;
