pub mod cdt;
pub mod op;
pub mod record;
