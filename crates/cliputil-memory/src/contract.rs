/// Report a broken lock/ownership contract.
///
/// Always logs at error level. Debug builds then panic with the same message;
/// optimized builds continue and let the caller fall back to a no-op.
#[macro_export]
macro_rules! contract_violation {
    ($($arg:tt)+) => {{
        ::tracing::error!(target: "cliputil::contract", $($arg)+);
        if cfg!(debug_assertions) {
            panic!("contract violation: {}", format_args!($($arg)+));
        }
    }};
}
