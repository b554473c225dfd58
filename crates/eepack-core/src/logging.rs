//! Structured logging schema and field name constants for eepack.
//!
//! Every structured `tracing` field emitted by the eepack crates is listed
//! here. `tracing` macros take field names as identifiers, so call sites
//! spell them out; this module is the reference they must agree with.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | Tamper or forgery detected, lookup outage |
//! | DEBUG | Operation completions, lookup decisions |
//! | TRACE | Per-reader iteration |
//!
//! Key material, shared secrets, and plaintext are never logged.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event. Values: "pack", "lookup"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem. Example: "key_dir"
pub const COMPONENT: &str = "component";

/// Logical operation name. Examples: "pack", "unpack", "lookup"
pub const OPERATION: &str = "op";

/// Packing variant in use (`ee.p256`, `ee.p521`).
pub const PACKING: &str = "packing";

/// User performing the operation.
pub const USER: &str = "user";

/// Owner of the blob being packed or unpacked.
pub const OWNER: &str = "owner";

/// Reader a wrapped key is produced or looked up for.
pub const READER: &str = "reader";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of readers on a blob (owner included).
pub const READER_COUNT: &str = "reader_count";

/// Plaintext byte length.
pub const PLAINTEXT_LEN: &str = "plaintext_len";

/// Cipher blob byte length.
pub const CIPHER_LEN: &str = "cipher_len";

/// Number of public keys returned by a lookup.
pub const KEY_COUNT: &str = "key_count";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
