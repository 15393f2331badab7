use crate::error::{describe_error_code, GatewayError};
use tracing::error;

/// Report a fatal error and exit with its status code
///
/// `GatewayError`s print their user message, plus the full source chain when
/// `verbose >= 1`. Anything else exits with 1.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    let exit_code = if let Some(gateway_err) = error.downcast_ref::<GatewayError>() {
        eprintln!("{}", gateway_err.user_message());
        if verbose >= 1 {
            let code = gateway_err.code();
            eprintln!("\nError code E{code:04}: {}", describe_error_code(code));
            eprintln!("\nContext Chain:\n{}", gateway_err.developer_message());
        }
        gateway_err.exit_code()
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
        1
    };

    std::process::exit(exit_code)
}
