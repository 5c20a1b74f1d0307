//! Node configuration.

use std::net::SocketAddr;

use powchain_core::Difficulty;
use powchain_protocol::{limits, PayloadPolicy};

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:65432";

/// Default proof-of-work difficulty.
pub const DEFAULT_DIFFICULTY: u32 = 4;

const DEFAULT: Difficulty = match Difficulty::checked(DEFAULT_DIFFICULTY) {
    Some(difficulty) => difficulty,
    None => panic!("DEFAULT_DIFFICULTY is out of range"),
};

/// Configuration for a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the server binds to.
    pub listen_addr: SocketAddr,
    /// Leading zero hex characters required of every mined block.
    pub difficulty: Difficulty,
    /// How `ADD` treats arguments that are not valid JSON.
    pub payload_policy: PayloadPolicy,
    /// Longest accepted command line, in bytes.
    pub max_line_bytes: usize,
    /// Capacity of the actor's request queue.
    pub request_buffer: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 65432)),
            difficulty: DEFAULT,
            payload_policy: PayloadPolicy::default(),
            max_line_bytes: limits::MAX_LINE_BYTES,
            request_buffer: 256,
        }
    }
}

impl NodeConfig {
    /// Set the listen address.
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the payload policy.
    pub fn with_payload_policy(mut self, policy: PayloadPolicy) -> Self {
        self.payload_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.difficulty.get(), DEFAULT_DIFFICULTY);
        assert_eq!(config.payload_policy, PayloadPolicy::Lenient);
        assert_eq!(config.max_line_bytes, limits::MAX_LINE_BYTES);
    }

    #[test]
    fn test_builders() {
        let config = NodeConfig::default()
            .with_difficulty(Difficulty::new(2).unwrap())
            .with_payload_policy(PayloadPolicy::Strict);
        assert_eq!(config.difficulty.get(), 2);
        assert_eq!(config.payload_policy, PayloadPolicy::Strict);
    }
}
