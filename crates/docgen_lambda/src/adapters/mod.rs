#[cfg(feature = "test-helpers")]
pub mod memory;
pub mod object_store;
pub mod s3;
pub mod scratch;
