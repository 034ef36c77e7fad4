pub mod parsers;
pub mod postgres;
pub mod s3_adapter;
pub mod sqs_publisher;
