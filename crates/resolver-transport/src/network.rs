//! Cluster endpoints and endpoint resolution.

use executor_resolver_types::env_string_or;

pub const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_RPC: &str = "https://api.devnet.solana.com";
pub const TESTNET_RPC: &str = "https://api.testnet.solana.com";
pub const LOCALNET_RPC: &str = "http://127.0.0.1:8899";

/// Environment variable that overrides the RPC endpoint.
pub const RPC_ENDPOINT_ENV: &str = "RESOLVER_RPC_ENDPOINT";

/// Cluster name for a well-known endpoint, used in log fields.
pub fn infer_cluster_from_url(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    if lower.contains("devnet") {
        Some("devnet")
    } else if lower.contains("testnet") {
        Some("testnet")
    } else if lower.contains("mainnet") {
        Some("mainnet-beta")
    } else if lower.contains("127.0.0.1") || lower.contains("localhost") {
        Some("localnet")
    } else {
        None
    }
}

pub fn default_rpc_endpoint(cluster: &str) -> &'static str {
    match cluster {
        "mainnet" | "mainnet-beta" => MAINNET_RPC,
        "devnet" => DEVNET_RPC,
        "testnet" => TESTNET_RPC,
        _ => LOCALNET_RPC,
    }
}

/// Endpoint from `RESOLVER_RPC_ENDPOINT`, falling back to localnet.
pub fn resolve_rpc_endpoint() -> String {
    env_string_or(RPC_ENDPOINT_ENV, LOCALNET_RPC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_cluster() {
        assert_eq!(infer_cluster_from_url(DEVNET_RPC), Some("devnet"));
        assert_eq!(infer_cluster_from_url(MAINNET_RPC), Some("mainnet-beta"));
        assert_eq!(infer_cluster_from_url(LOCALNET_RPC), Some("localnet"));
        assert_eq!(infer_cluster_from_url("https://rpc.example.org"), None);
    }

    #[test]
    fn test_default_endpoint_falls_back_to_localnet() {
        assert_eq!(default_rpc_endpoint("mainnet"), MAINNET_RPC);
        assert_eq!(default_rpc_endpoint("unknown"), LOCALNET_RPC);
    }
}
