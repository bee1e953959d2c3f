//! Constants shared between the ledger gateway and its clients.
//!
//! Keep these stable: the gateway routes and authorizes on them.

/// Header announcing which plugin issued the request.
pub const PLUGIN_TYPE_HEADER: &str = "lc-plugin-type";

/// Plugin type value for notarization clients.
pub const PLUGIN_TYPE_VALUE: &str = "vcn";

/// Header carrying the ledger API key.
pub const API_KEY_HEADER: &str = "lc-api-key";

/// Gateway route for ordered-set scans.
pub const ROUTE_ZSCAN: &str = "db/zscan";

/// Gateway route for key history.
pub const ROUTE_HISTORY: &str = "db/history";

/// Gateway route for integrity-checked single-key reads.
pub const ROUTE_VERIFIED_GET: &str = "db/verified/get";

/// Default cap on items returned by an unbounded query.
pub const DEFAULT_MAX_RESULT_SIZE: usize = 1000;

/// Longest key the ledger accepts.
pub const MAX_KEY_LEN: usize = 1024;

/// Version string sent in the user agent.
pub const CLIENT_VERSION: &str = "v1";
