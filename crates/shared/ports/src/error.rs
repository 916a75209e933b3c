use thiserror::Error;

/// Status code returned by every gateway call.
///
/// Non-negative codes are successes (`FALSE` is a success that carries
/// "nothing there"), negative codes are failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("gateway result code {0:#010X}")]
pub struct ResultCode(pub i32);

const fn failure(code: u32) -> ResultCode {
    ResultCode(code as i32)
}

/// Facility wrapping operating system error numbers
const FACILITY_OS: i32 = 7;

impl ResultCode {
    pub const OK: Self = Self(0);
    pub const FALSE: Self = Self(1);

    pub const NOT_IMPL: Self = failure(0x8000_4001);
    pub const NO_INTERFACE: Self = failure(0x8000_4002);
    pub const POINTER: Self = failure(0x8000_4003);
    pub const ABORT: Self = failure(0x8000_4004);
    pub const FAIL: Self = failure(0x8000_4005);
    pub const UNEXPECTED: Self = failure(0x8000_FFFF);
    pub const DISCONNECTED: Self = failure(0x8001_0108);
    pub const ACCESS_DENIED: Self = failure(0x8007_0005);
    pub const HANDLE: Self = failure(0x8007_0006);
    pub const OUT_OF_MEMORY: Self = failure(0x8007_000E);
    pub const INVALID_ARG: Self = failure(0x8007_0057);

    /// Wrap an operating system error number
    pub const fn from_os_error(errno: i32) -> Self {
        failure(0x8000_0000 | ((FACILITY_OS as u32) << 16) | (errno as u32 & 0xFFFF))
    }

    pub const fn is_success(&self) -> bool {
        self.0 >= 0
    }

    pub const fn is_failure(&self) -> bool {
        self.0 < 0
    }

    pub const fn facility(&self) -> i32 {
        (self.0 >> 16) & 0x1FFF
    }

    /// Operating system error number for OS-wrapped failures
    pub const fn os_error(&self) -> Option<i32> {
        if self.is_failure() && self.facility() == FACILITY_OS {
            Some(self.0 & 0xFFFF)
        } else {
            None
        }
    }

    /// Turn a raw status into a `Result`, keeping successes as `Ok(())`
    pub fn check(self) -> GwResult<()> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }
}

/// Result of a gateway call
pub type GwResult<T> = std::result::Result<T, ResultCode>;

/// Errors loading connector configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes() {
        assert!(ResultCode::OK.is_success());
        assert!(ResultCode::FALSE.is_success());
        assert!(ResultCode::FAIL.is_failure());
        assert_eq!(ResultCode::FALSE.check(), Ok(()));
        assert_eq!(ResultCode::FAIL.check(), Err(ResultCode::FAIL));
    }

    #[test]
    fn test_os_error_round_trip() {
        let code = ResultCode::from_os_error(2);
        assert!(code.is_failure());
        assert_eq!(code.os_error(), Some(2));
        assert_eq!(ResultCode::FAIL.os_error(), None);
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(
            ResultCode::FAIL.to_string(),
            "gateway result code 0x80004005"
        );
    }
}
