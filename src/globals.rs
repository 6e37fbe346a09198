pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

/// Global pairbreak version number
///
/// All client code should refer directly to this copy instead of using the environment variable
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
