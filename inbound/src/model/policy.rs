use serde::Deserialize;

/// Options shared by every database call. The values are opaque to this
/// crate and only carried through to the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Policy {
    pub total_timeout_ms: u32,
    pub socket_timeout_ms: u32,
    pub max_retries: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            total_timeout_ms: 1000,
            socket_timeout_ms: 30000,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchPolicy {
    #[serde(flatten)]
    pub base: Policy,
    /// 0 issues requests to all nodes in parallel.
    pub max_concurrent_threads: u32,
    pub allow_inline: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            base: Policy::default(),
            max_concurrent_threads: 1,
            allow_inline: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordExistsAction {
    #[default]
    Update,
    UpdateOnly,
    Replace,
    ReplaceOnly,
    CreateOnly,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationPolicy {
    #[default]
    None,
    ExpectGenEqual,
    ExpectGenGt,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitLevel {
    #[default]
    CommitAll,
    CommitMaster,
}

/// Per-write options controlling how a write is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WritePolicy {
    #[serde(flatten)]
    pub base: Policy,
    pub record_exists_action: RecordExistsAction,
    pub generation_policy: GenerationPolicy,
    pub generation: u32,
    /// Record TTL in seconds. 0 uses the namespace default, -1 never
    /// expires, -2 leaves the current TTL untouched.
    pub expiration: i32,
    pub commit_level: CommitLevel,
    pub durable_delete: bool,
    pub send_key: bool,
}
