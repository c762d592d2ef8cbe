//! Inbound commands to the application core.
//!
//! Two sources feed commands in:
//!
//! - **Remote** — MQTT RPC requests, `{"method": "...", "params": ...}`.
//!   Decoded into [`RemoteCommand`] and handed to the control engine
//!   through the connectivity mailbox.
//! - **Console** — one command per serial line, handled by
//!   [`AppService::handle_console`](super::service::AppService::handle_console).

use serde::Deserialize;
use serde_json::Value;

use crate::error::CommandError;

/// Commands the cloud can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// `setRelay`: desired heater state.  Also a training label.
    SetRelay(bool),
    /// `setBuzzer`: desired alarm state.
    SetAlarm(bool),
    /// `dumpLogs`: dump the black-box log to the console.
    RequestLogDump,
    /// Any other method.  Ignored by the engine.
    Unrecognized,
}

#[derive(Deserialize)]
struct RpcRequest<'a> {
    #[serde(borrow)]
    method: &'a str,
    #[serde(default)]
    params: Value,
}

impl RemoteCommand {
    /// Decode an RPC request body.
    ///
    /// Bodies that are not an object with a string `method` are
    /// [`CommandError::Malformed`].  A known method whose `params` is not a
    /// boolean is [`CommandError::InvalidParams`].  Unknown methods decode
    /// to [`RemoteCommand::Unrecognized`].
    pub fn from_json(payload: &[u8]) -> Result<Self, CommandError> {
        let req: RpcRequest<'_> =
            serde_json::from_slice(payload).map_err(|_| CommandError::Malformed)?;

        let flag = || req.params.as_bool().ok_or(CommandError::InvalidParams);

        Ok(match req.method {
            "setRelay" => Self::SetRelay(flag()?),
            "setBuzzer" => Self::SetAlarm(flag()?),
            "dumpLogs" => Self::RequestLogDump,
            _ => Self::Unrecognized,
        })
    }
}

/// Commands accepted on the serial console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    DumpLogs,
    ClearLogs,
}

impl ConsoleCommand {
    /// Parse one console line.  Surrounding whitespace is ignored;
    /// anything unknown is `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "dumpLogs" => Some(Self::DumpLogs),
            "clearLogs" => Some(Self::ClearLogs),
            _ => None,
        }
    }
}
