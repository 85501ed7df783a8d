pub const PADRON_VERSION: &str = "v0.1.0";

pub fn git_commit_hash() -> &'static str {
    option_env!("GIT_COMMIT_HASH").unwrap_or("unknown")
}
