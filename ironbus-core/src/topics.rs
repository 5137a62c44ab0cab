/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Topic names known to the bus.

/// Streaming tick data.
pub const TICK_DATA_STREAM: &str = "TickDataStream";
/// Tick data snapshots.
pub const TICK_DATA_SNAP: &str = "TickDataSnap";
/// Depth-of-market stream.
pub const TICK_DOM_STREAM: &str = "TickDomStream";
/// Indicative open prices.
pub const TICK_INDICATIVE_OPEN_STREAM: &str = "TickIndicativeOpenStream";
/// Commands sent to an application.
pub const COMMAND: &str = "Command";
/// Responses to commands.
pub const COMMAND_RESPONSE: &str = "CommandResponse";
/// Informational broadcasts.
pub const INFO: &str = "Info";
/// Liveness heartbeats.
pub const HEARTBEAT: &str = "Heartbeat";
/// Special realtime data.
pub const SPECIAL_RT_DATA: &str = "SpecialRTData";

/// Every known topic.
pub const ALL: [&str; 9] = [
    TICK_DATA_STREAM,
    TICK_DATA_SNAP,
    TICK_DOM_STREAM,
    TICK_INDICATIVE_OPEN_STREAM,
    COMMAND,
    COMMAND_RESPONSE,
    INFO,
    HEARTBEAT,
    SPECIAL_RT_DATA,
];

/// Returns true for topics that carry high-volume streams.
///
/// Transports use this to pick a throughput-oriented delivery profile.
#[must_use]
pub fn is_high_throughput(topic: &str) -> bool {
    matches!(
        topic,
        TICK_DATA_STREAM | TICK_DOM_STREAM | TICK_INDICATIVE_OPEN_STREAM
    )
}

/// Returns true if the topic is one of the known topics.
#[must_use]
pub fn is_known(topic: &str) -> bool {
    ALL.contains(&topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_throughput_topics() {
        assert!(is_high_throughput(TICK_DATA_STREAM));
        assert!(is_high_throughput(TICK_DOM_STREAM));
        assert!(is_high_throughput(TICK_INDICATIVE_OPEN_STREAM));
        assert!(!is_high_throughput(TICK_DATA_SNAP));
        assert!(!is_high_throughput(COMMAND));
        assert!(!is_high_throughput(HEARTBEAT));
    }

    #[test]
    fn test_known_topics() {
        assert!(is_known("SpecialRTData"));
        assert!(!is_known("TickDataFull"));
    }
}
