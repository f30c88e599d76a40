use std::fmt::{Display, Formatter};

/// Integer outcome of a database operation. Negative values are produced
/// client side, positive values by the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const BATCH_FAILED: ResultCode = ResultCode(-16);
    pub const SERVER_NOT_AVAILABLE: ResultCode = ResultCode(-8);
    pub const INVALID_NODE_ERROR: ResultCode = ResultCode(-3);
    pub const CLIENT_ERROR: ResultCode = ResultCode(-1);
    pub const OK: ResultCode = ResultCode(0);
    pub const SERVER_ERROR: ResultCode = ResultCode(1);
    pub const KEY_NOT_FOUND_ERROR: ResultCode = ResultCode(2);
    pub const GENERATION_ERROR: ResultCode = ResultCode(3);
    pub const PARAMETER_ERROR: ResultCode = ResultCode(4);
    pub const KEY_EXISTS_ERROR: ResultCode = ResultCode(5);
    pub const BIN_EXISTS_ERROR: ResultCode = ResultCode(6);
    pub const TIMEOUT: ResultCode = ResultCode(9);
    pub const BIN_TYPE_ERROR: ResultCode = ResultCode(12);
    pub const RECORD_TOO_BIG: ResultCode = ResultCode(13);
    pub const KEY_BUSY: ResultCode = ResultCode(14);
    pub const BIN_NOT_FOUND: ResultCode = ResultCode(17);
    pub const ELEMENT_NOT_FOUND: ResultCode = ResultCode(23);
    pub const ELEMENT_EXISTS: ResultCode = ResultCode(24);
    pub const OP_NOT_APPLICABLE: ResultCode = ResultCode(26);
    pub const FILTERED_OUT: ResultCode = ResultCode(27);

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Self::BATCH_FAILED => "BATCH_FAILED",
            Self::SERVER_NOT_AVAILABLE => "SERVER_NOT_AVAILABLE",
            Self::INVALID_NODE_ERROR => "INVALID_NODE_ERROR",
            Self::CLIENT_ERROR => "CLIENT_ERROR",
            Self::OK => "OK",
            Self::SERVER_ERROR => "SERVER_ERROR",
            Self::KEY_NOT_FOUND_ERROR => "KEY_NOT_FOUND_ERROR",
            Self::GENERATION_ERROR => "GENERATION_ERROR",
            Self::PARAMETER_ERROR => "PARAMETER_ERROR",
            Self::KEY_EXISTS_ERROR => "KEY_EXISTS_ERROR",
            Self::BIN_EXISTS_ERROR => "BIN_EXISTS_ERROR",
            Self::TIMEOUT => "TIMEOUT",
            Self::BIN_TYPE_ERROR => "BIN_TYPE_ERROR",
            Self::RECORD_TOO_BIG => "RECORD_TOO_BIG",
            Self::KEY_BUSY => "KEY_BUSY",
            Self::BIN_NOT_FOUND => "BIN_NOT_FOUND",
            Self::ELEMENT_NOT_FOUND => "ELEMENT_NOT_FOUND",
            Self::ELEMENT_EXISTS => "ELEMENT_EXISTS",
            Self::OP_NOT_APPLICABLE => "OP_NOT_APPLICABLE",
            Self::FILTERED_OUT => "FILTERED_OUT",
            _ => "UNKNOWN",
        }
    }
}

impl From<i32> for ResultCode {
    fn from(value: i32) -> Self {
        ResultCode(value)
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}
