//! AWS implementations of the collaborator ports.

pub mod cognito;
pub mod dynamodb;
pub mod s3;
