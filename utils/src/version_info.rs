//! Version information for the service, populated at build time.
//!
//! Version display format:
//! - Prod: `stable:{version}`
//! - Local/Test: `main:{commit}`

/// Runtime environment enum for services that determine environment at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    /// Local development
    Local,
    /// Production
    Prod,
    /// Test environment
    Test,
}

/// Get the build date in RFC3339 format
pub fn build_date() -> &'static str {
    env!("BUILD_DATE")
}

/// Get the git commit hash (short)
pub fn build_commit() -> &'static str {
    env!("BUILD_COMMIT")
}

/// Get the package version
pub fn build_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Format version string for a runtime-determined environment.
///
/// Format: `{env}:{info}` where:
/// - Local/Test: `main:{commit}`
/// - Prod: `stable:{version}`
pub fn format_version_for_runtime_env(env: RuntimeEnv) -> String {
    match env {
        RuntimeEnv::Local | RuntimeEnv::Test => format!("main:{}", build_commit()),
        RuntimeEnv::Prod => format!("stable:{}", build_version()),
    }
}
