//! Named defaults for the keyspace layer, checked at compile time.

/// Default number of indices per batch when splitting a scan.
pub const DEFAULT_BATCH_SIZE: i64 = 1_000;

const _: () = assert!(DEFAULT_BATCH_SIZE > 0);
