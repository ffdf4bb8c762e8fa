//! Escrow adapter constants.

use std::time::Duration;

/// Micro-units per whole unit of the native currency.
pub const MICRO_UNITS_PER_UNIT: u64 = 1_000_000;

/// Domain separation prefix for transaction ids.
pub const TX_ID_PREFIX: &[u8] = b"TX";

/// Domain separation prefix for group ids.
pub const GROUP_ID_PREFIX: &[u8] = b"TG";

/// Prefix hashed with the application id to derive the application account.
pub const APP_ID_PREFIX: &[u8] = b"appID";

/// Bytes a signature adds to an encoded transaction, used for fee estimation.
pub const SIGNATURE_OVERHEAD: u64 = 75;

/// Default number of rounds to wait for a transaction confirmation.
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 10;

/// Default number of rounds a composed transaction stays valid for.
pub const DEFAULT_VALIDITY_WINDOW: u64 = 1000;

/// Default payment sent to the application account alongside the approval call.
pub const DEFAULT_APPROVE_PAYMENT: u64 = 100_000;

/// Method invoked to release the escrowed funds.
pub const DEFAULT_APPROVE_METHOD: &str = "approve_work(pay)void";

/// Method invoked to refund the escrowed funds.
pub const DEFAULT_CANCEL_METHOD: &str = "cancel_escrow()void";

/// Public TestNet node endpoint.
pub const TESTNET_NODE_URL: &str = "https://testnet-api.algonode.cloud";

/// Default local key-management daemon endpoint.
pub const DEFAULT_KMD_URL: &str = "http://localhost:4002";

/// Default Firestore REST endpoint.
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default collection holding escrow records.
pub const DEFAULT_ESCROW_COLLECTION: &str = "escrows";

/// Timeout applied to every HTTP request made to the node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum number of concurrent RPC connections.
pub const DEFAULT_RPC_DEFAULT_MAX_CONNECTIONS: u32 = 500;
