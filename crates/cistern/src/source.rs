// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract for the authoritative data source a cache hydrates from.

/// The pluggable source of record behind a cache.
///
/// Implementations are called without external synchronization from both
/// foreground readers and the background poller, so the trait requires
/// `Send + Sync`; thread safety is part of the contract.
///
/// Absence and failure are indistinguishable here by design: `None` means
/// "the source did not produce a value", whether because the key does not
/// exist or because the fetch failed. A cache cannot act differently on the
/// two, and a richer encoding would only invite it to try.
pub trait CacheDataSource<K, V>: Send + Sync {
    /// Fetches the value for a key.
    fn retrieve(&self, key: &K) -> Option<V>;

    /// Fetches the value for a key, given the value currently cached.
    ///
    /// Sources that can exploit the current value should override this.
    /// For example, an HTTP source that receives a `304 Not Modified` can
    /// replay `current` instead of transferring the body again. The default
    /// ignores the hint and delegates to [`retrieve`](Self::retrieve).
    fn retrieve_with_current(&self, key: &K, current: &V) -> Option<V> {
        let _ = current;
        self.retrieve(key)
    }

    /// Returns true if the cached value is still acceptable without
    /// contacting the source. Only consulted by pull-style hydration;
    /// polling hydration defines freshness by the last successful poll.
    fn is_valid(&self, key: &K, value: &V) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperCaseSource;

    impl CacheDataSource<String, String> for UpperCaseSource {
        fn retrieve(&self, key: &String) -> Option<String> {
            Some(key.to_uppercase())
        }

        fn is_valid(&self, _key: &String, _value: &String) -> bool {
            true
        }
    }

    #[test]
    fn retrieve_with_current_defaults_to_retrieve() {
        let source = UpperCaseSource;
        let current = "stale".to_string();
        assert_eq!(
            source.retrieve_with_current(&"key".to_string(), &current),
            Some("KEY".to_string())
        );
    }
}
