pub mod key;
pub mod message;
pub mod policy;
pub mod record;
pub mod result_code;
pub mod value;
