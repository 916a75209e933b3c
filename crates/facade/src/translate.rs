//! Error Translator
//!
//! Renders a gateway result code into text, preferring the structured
//! description of the object that raised it.

use cqg_ports::{GwObject, ResultCode};

/// Describe `code` raised by `source`
///
/// Success codes yield an empty string; failures always yield some text.
pub fn describe<O: GwObject + ?Sized>(code: ResultCode, source: Option<&O>) -> String {
    if code.is_success() {
        return String::new();
    }

    let rich = source
        .filter(|object| object.supports_error_info())
        .and_then(|object| object.error_description())
        .filter(|description| !description.is_empty());

    match rich {
        Some(description) => format!("Gateway error occurred. Description: {description}"),
        None => describe_code(code),
    }
}

/// Describe a result code without a source object
pub fn describe_code(code: ResultCode) -> String {
    if code.is_success() {
        return String::new();
    }

    let known = match code {
        ResultCode::NOT_IMPL => Some("Not implemented."),
        ResultCode::NO_INTERFACE => Some("No such interface supported."),
        ResultCode::POINTER => Some("Invalid pointer."),
        ResultCode::ABORT => Some("Operation aborted."),
        ResultCode::FAIL => Some("Unspecified error."),
        ResultCode::UNEXPECTED => Some("Catastrophic failure."),
        ResultCode::DISCONNECTED => Some("The object invoked has disconnected from its clients."),
        ResultCode::ACCESS_DENIED => Some("Access is denied."),
        ResultCode::HANDLE => Some("The handle is invalid."),
        ResultCode::OUT_OF_MEMORY => Some("Not enough memory resources are available."),
        ResultCode::INVALID_ARG => Some("The parameter is incorrect."),
        _ => None,
    };

    if let Some(text) = known {
        return text.to_string();
    }

    match code.os_error() {
        Some(errno) => std::io::Error::from_raw_os_error(errno).to_string(),
        None => format!("Unspecified error ({:#010X}).", code.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl GwObject for Plain {}

    struct Rich(Option<String>);
    impl GwObject for Rich {
        fn supports_error_info(&self) -> bool {
            true
        }

        fn error_description(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_success_is_empty() {
        assert_eq!(describe(ResultCode::OK, Some(&Plain)), "");
        assert_eq!(describe(ResultCode::FALSE, None::<&Plain>), "");
    }

    #[test]
    fn test_rich_description_preferred() {
        let source = Rich(Some("Invalid account".to_string()));
        assert_eq!(
            describe(ResultCode::FAIL, Some(&source)),
            "Gateway error occurred. Description: Invalid account"
        );
    }

    #[test]
    fn test_empty_rich_description_falls_back() {
        let source = Rich(Some(String::new()));
        assert_eq!(describe(ResultCode::FAIL, Some(&source)), "Unspecified error.");
        assert_eq!(describe(ResultCode::FAIL, Some(&Rich(None))), "Unspecified error.");
    }

    #[test]
    fn test_plain_source_uses_code_table() {
        assert_eq!(
            describe(ResultCode::INVALID_ARG, Some(&Plain)),
            "The parameter is incorrect."
        );
    }

    #[test]
    fn test_os_errors_use_io_error_text() {
        let code = ResultCode::from_os_error(2);
        assert_eq!(
            describe_code(code),
            std::io::Error::from_raw_os_error(2).to_string()
        );
    }

    #[test]
    fn test_unknown_code_renders_hex() {
        let text = describe_code(ResultCode(0x8004_1234_u32 as i32));
        assert_eq!(text, "Unspecified error (0x80041234).");
    }
}
