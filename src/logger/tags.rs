/// Log tags identifying the subsystem that emitted a message
///
/// Each tag has a debug key used by `--debug <key>` to enable debug-level
/// output for that subsystem only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Cart,
    Fees,
    Quote,
    Swap,
    Wallet,
    Rpc,
    Tokens,
    Cache,
}

impl LogTag {
    pub const ALL: [LogTag; 10] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Cart,
        LogTag::Fees,
        LogTag::Quote,
        LogTag::Swap,
        LogTag::Wallet,
        LogTag::Rpc,
        LogTag::Tokens,
        LogTag::Cache,
    ];

    /// Lowercase key matched against `--debug <key>`
    pub fn to_debug_key(&self) -> String {
        self.to_plain_string().to_lowercase()
    }

    /// Uppercase label used in console and file output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Cart => "CART",
            LogTag::Fees => "FEES",
            LogTag::Quote => "QUOTE",
            LogTag::Swap => "SWAP",
            LogTag::Wallet => "WALLET",
            LogTag::Rpc => "RPC",
            LogTag::Tokens => "TOKENS",
            LogTag::Cache => "CACHE",
        }
        .to_string()
    }

    pub fn from_debug_key(key: &str) -> Option<LogTag> {
        let key = key.trim().to_lowercase();
        LogTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_debug_key() == key)
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
