use confidential_ciphertext::EncryptionKey;

/// Immutable per-client configuration (`spec.md` §9's redesign note:
/// replaces a shared mutable configuration object with a value fixed at
/// construction; the one field that may legitimately change post-hoc —
/// the default auditor key — is supplied per-call instead of mutated in
/// place).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    default_auditor_key: Option<EncryptionKey>,
    max_retries: u32,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn default_auditor_key(&self) -> Option<&EncryptionKey> {
        self.default_auditor_key.as_ref()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    default_auditor_key: Option<EncryptionKey>,
    max_retries: Option<u32>,
}

impl ClientConfigBuilder {
    pub fn default_auditor_key(mut self, key: EncryptionKey) -> Self {
        self.default_auditor_key = Some(key);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            default_auditor_key: self.default_auditor_key,
            max_retries: self.max_retries.unwrap_or(3),
        }
    }
}
