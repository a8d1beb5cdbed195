use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle phase of a single socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// What the status indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// No socket is "disconnected", an open socket is "connected", and every other
    /// phase counts as still connecting.
    pub fn from_ready_state(ready_state: Option<ReadyState>) -> Self {
        match ready_state {
            None => ConnectionStatus::Disconnected,
            Some(ReadyState::Open) => ConnectionStatus::Connected,
            Some(_) => ConnectionStatus::Connecting,
        }
    }
}

impl Display for ConnectionStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let text = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        };
        formatter.write_str(text)
    }
}
