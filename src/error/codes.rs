/// Error code registry for inferbridge
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Server errors
/// - 3000-3999: Inference errors
/// - 4000-4999: Execution errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_PATH_ERROR: u16 = 1006;

    // Server errors (2000-2999)
    pub const SERVER_BIND_FAILED: u16 = 2001;
    pub const SERVER_SHUTDOWN_FAILED: u16 = 2002;

    // Inference errors (3000-3999)
    pub const INFERENCE_FATAL: u16 = 3001;
    pub const INFERENCE_NON_FATAL: u16 = 3002;
    pub const INFERENCE_UNAVAILABLE: u16 = 3003;

    // Execution errors (4000-4999)
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_TIMEOUT: u16 = 4002;
    pub const EXEC_SPAWN_FAILED: u16 = 4007;
    pub const EXEC_OUTPUT_ERROR: u16 = 4008;

    // Validation errors (7000-7999)
    pub const VALIDATION_REQUIRED_FIELD: u16 = 7001;
    pub const VALIDATION_OUT_OF_RANGE: u16 = 7003;

    // Other errors (9000-9999)
    pub const OTHER_INTERNAL_ERROR: u16 = 9004;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Configuration errors
        1001 => "Configuration file not found",
        1002 => "Invalid TOML syntax in configuration",
        1005 => "Invalid value in configuration",
        1006 => "Configuration path error",

        // Server errors
        2001 => "Failed to bind listen address",
        2002 => "Server did not shut down cleanly",

        // Inference errors
        3001 => "Inference binary hit a fatal internal check",
        3002 => "Inference binary exited with an error",
        3003 => "Inference capacity unavailable",

        // Execution errors
        4001 => "Command not found",
        4002 => "Command execution timeout",
        4007 => "Failed to spawn subprocess",
        4008 => "Command output error",

        // Validation errors
        7001 => "Required field is missing",
        7003 => "Value out of allowed range",

        // Other errors
        9004 => "Internal error",

        _ => "Unknown error code",
    }
}
