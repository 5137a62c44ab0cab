/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Well-known codes carried in command and info messages.
//!
//! Codes travel on the wire as plain `i32` values; these enumerations give
//! them names. Unknown codes are legal on the wire and simply fail to convert.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Command and command response codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandCode {
    /// Subscribe to a security price feed.
    RegisterSecurityPriceFeed = 1,
    /// Response to [`CommandCode::RegisterSecurityPriceFeed`].
    RegisterSecurityPriceFeedResponse = 2,
    /// Unsubscribe from a security price feed.
    UnregisterSecurityPriceFeed = 3,
    /// Response to [`CommandCode::UnregisterSecurityPriceFeed`].
    UnregisterSecurityPriceFeedResponse = 4,
    /// Request a price snapshot.
    RequestPriceSnapshot = 5,
    /// Response to [`CommandCode::RequestPriceSnapshot`].
    RequestPriceSnapshotResponse = 6,
    /// Place an order set.
    PlaceOrderset = 7,
    /// Response to [`CommandCode::PlaceOrderset`].
    PlaceOrdersetResponse = 8,
    /// Read new fills.
    ReadNewFills = 9,
    /// Response to [`CommandCode::ReadNewFills`].
    ReadNewFillsResponse = 10,
    /// Register a CQG realtime price.
    RegisterCqgRealtimePrice = 11,
    /// Unregister a CQG realtime price.
    UnregisterCqgRealtimePrice = 12,
    /// Request CQG historical prices.
    RequestCqgHistoPrice = 13,
    /// Internal static request.
    StaticInternalRequest = 14,
    /// Response to [`CommandCode::StaticInternalRequest`].
    StaticInternalResponse = 15,
}

impl CommandCode {
    /// Converts a wire value into a command code.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        <Self as num_traits::FromPrimitive>::from_i32(value)
    }

    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns the response code paired with this request, if any.
    #[must_use]
    pub const fn response_code(self) -> Option<Self> {
        match self {
            Self::RegisterSecurityPriceFeed => Some(Self::RegisterSecurityPriceFeedResponse),
            Self::UnregisterSecurityPriceFeed => Some(Self::UnregisterSecurityPriceFeedResponse),
            Self::RequestPriceSnapshot => Some(Self::RequestPriceSnapshotResponse),
            Self::PlaceOrderset => Some(Self::PlaceOrdersetResponse),
            Self::ReadNewFills => Some(Self::ReadNewFillsResponse),
            Self::StaticInternalRequest => Some(Self::StaticInternalResponse),
            _ => None,
        }
    }

    /// Returns true if this code denotes a response.
    #[must_use]
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            Self::RegisterSecurityPriceFeedResponse
                | Self::UnregisterSecurityPriceFeedResponse
                | Self::RequestPriceSnapshotResponse
                | Self::PlaceOrdersetResponse
                | Self::ReadNewFillsResponse
                | Self::StaticInternalResponse
        )
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisterSecurityPriceFeed => "REGISTER_SECURITY_PRICE_FEED",
            Self::RegisterSecurityPriceFeedResponse => "REGISTER_SECURITY_PRICE_FEED_RESPONSE",
            Self::UnregisterSecurityPriceFeed => "UNREGISTER_SECURITY_PRICE_FEED",
            Self::UnregisterSecurityPriceFeedResponse => "UNREGISTER_SECURITY_PRICE_FEED_RESPONSE",
            Self::RequestPriceSnapshot => "REQUEST_PRICE_SNAPSHOT",
            Self::RequestPriceSnapshotResponse => "REQUEST_PRICE_SNAPSHOT_RESPONSE",
            Self::PlaceOrderset => "PLACE_ORDERSET",
            Self::PlaceOrdersetResponse => "PLACE_ORDERSET_RESPONSE",
            Self::ReadNewFills => "READ_NEW_FILLS",
            Self::ReadNewFillsResponse => "READ_NEW_FILLS_RESPONSE",
            Self::RegisterCqgRealtimePrice => "REGISTER_CQG_REALTIME_PRICE",
            Self::UnregisterCqgRealtimePrice => "UNREGISTER_CQG_REALTIME_PRICE",
            Self::RequestCqgHistoPrice => "REQUEST_CQG_HISTO_PRICE",
            Self::StaticInternalRequest => "STATIC_INTERNAL_REQUEST",
            Self::StaticInternalResponse => "STATIC_INTERNAL_RESPONSE",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CommandCode> for i32 {
    fn from(code: CommandCode) -> Self {
        code.as_i32()
    }
}

/// Info message codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoCode {
    /// The sending application restarted.
    ApplicationRestarted = 100,
    /// Periodic liveness signal.
    Heartbeat = 101,
    /// The sending application is shutting down.
    Shutdown = 102,
    /// A price feed was disrupted.
    PriceFeedDisrupted = 103,
}

impl InfoCode {
    /// Converts a wire value into an info code.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        <Self as num_traits::FromPrimitive>::from_i32(value)
    }

    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationRestarted => "APPLICATION_RESTARTED",
            Self::Heartbeat => "HEARTBEAT",
            Self::Shutdown => "SHUTDOWN",
            Self::PriceFeedDisrupted => "PRICE_FEED_DISRUPTED",
        }
    }
}

impl fmt::Display for InfoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<InfoCode> for i32 {
    fn from(code: InfoCode) -> Self {
        code.as_i32()
    }
}

/// Applications that exchange commands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Application {
    /// Tick capture program.
    TickProgram = 1,
    /// Tick persistence writer.
    TickWriter = 2,
}

impl Application {
    /// Converts a wire value into an application id.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        <Self as num_traits::FromPrimitive>::from_i32(value)
    }

    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TickProgram => f.write_str("TICK_PROGRAM"),
            Self::TickWriter => f.write_str("TICK_WRITER"),
        }
    }
}

impl From<Application> for i32 {
    fn from(app: Application) -> Self {
        app.as_i32()
    }
}

/// Order set categories carried in `PLACE_ORDERSET` command data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSetCategory {
    /// New limit order set.
    NewLimit,
    /// New FX limit order set.
    NewFxLimit,
    /// New MR1 order set.
    NewMr1,
    /// New trend order set.
    NewTrnd,
    /// New trend strip.
    NewTrndStrip,
    /// New counter-trend strip.
    NewCntrStrip,
    /// Rebalance and post-rebalance limit.
    RblAndPostRblLimit,
    /// Stop and post-stop limit.
    StopAndPostStopLimit,
    /// High/low and post high/low limit.
    HiloAndPostHiloLimit,
    /// Contract roll.
    Roll,
    /// Update existing orders.
    UpdateOrders,
    /// Equity order set.
    Eqt,
}

impl OrderSetCategory {
    /// All categories in declaration order.
    pub const ALL: [Self; 12] = [
        Self::NewLimit,
        Self::NewFxLimit,
        Self::NewMr1,
        Self::NewTrnd,
        Self::NewTrndStrip,
        Self::NewCntrStrip,
        Self::RblAndPostRblLimit,
        Self::StopAndPostStopLimit,
        Self::HiloAndPostHiloLimit,
        Self::Roll,
        Self::UpdateOrders,
        Self::Eqt,
    ];

    /// Returns the ordinal of this category.
    #[must_use]
    pub fn ordinal(self) -> i32 {
        self.to_i32().unwrap_or_default()
    }

    /// Looks up a category by ordinal.
    #[must_use]
    pub fn from_ordinal(value: i32) -> Option<Self> {
        Self::from_i32(value)
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewLimit => "NEW_LIMIT",
            Self::NewFxLimit => "NEW_FX_LIMIT",
            Self::NewMr1 => "NEW_MR1",
            Self::NewTrnd => "NEW_TRND",
            Self::NewTrndStrip => "NEW_TRND_STRIP",
            Self::NewCntrStrip => "NEW_CNTR_STRIP",
            Self::RblAndPostRblLimit => "RBL_AND_POST_RBL_LIMIT",
            Self::StopAndPostStopLimit => "STOP_AND_POST_STOP_LIMIT",
            Self::HiloAndPostHiloLimit => "HILO_AND_POST_HILO_LIMIT",
            Self::Roll => "ROLL",
            Self::UpdateOrders => "UPDATE_ORDERS",
            Self::Eqt => "EQT",
        }
    }
}

impl fmt::Display for OrderSetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order set category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for OrderSetCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_wire_values() {
        assert_eq!(CommandCode::RegisterSecurityPriceFeed.as_i32(), 1);
        assert_eq!(CommandCode::StaticInternalResponse.as_i32(), 15);
        assert_eq!(CommandCode::from_i32(7), Some(CommandCode::PlaceOrderset));
        assert_eq!(CommandCode::from_i32(0), None);
        assert_eq!(CommandCode::from_i32(16), None);
    }

    #[test]
    fn test_command_code_response_pairs() {
        assert_eq!(
            CommandCode::PlaceOrderset.response_code(),
            Some(CommandCode::PlaceOrdersetResponse)
        );
        assert!(CommandCode::PlaceOrdersetResponse.is_response());
        assert!(!CommandCode::RequestCqgHistoPrice.is_response());
        assert_eq!(CommandCode::RequestCqgHistoPrice.response_code(), None);
    }

    #[test]
    fn test_command_code_display() {
        assert_eq!(
            CommandCode::RegisterSecurityPriceFeedResponse.to_string(),
            "REGISTER_SECURITY_PRICE_FEED_RESPONSE"
        );
    }

    #[test]
    fn test_info_code_values() {
        assert_eq!(InfoCode::Heartbeat.as_i32(), 101);
        assert_eq!(InfoCode::from_i32(102), Some(InfoCode::Shutdown));
        assert_eq!(InfoCode::from_i32(99), None);
        assert_eq!(InfoCode::PriceFeedDisrupted.to_string(), "PRICE_FEED_DISRUPTED");
    }

    #[test]
    fn test_application_values() {
        assert_eq!(i32::from(Application::TickWriter), 2);
        assert_eq!(Application::from_i32(1), Some(Application::TickProgram));
        assert_eq!(Application::TickProgram.to_string(), "TICK_PROGRAM");
    }

    #[test]
    fn test_order_set_category_names() {
        for category in OrderSetCategory::ALL {
            assert_eq!(category.as_str().parse::<OrderSetCategory>(), Ok(category));
        }
        assert!("NEW_THING".parse::<OrderSetCategory>().is_err());
        assert!("new_limit".parse::<OrderSetCategory>().is_err());
    }

    #[test]
    fn test_order_set_category_ordinal() {
        assert_eq!(OrderSetCategory::NewLimit.ordinal(), 0);
        assert_eq!(OrderSetCategory::Eqt.ordinal(), 11);
        assert_eq!(
            OrderSetCategory::from_ordinal(9),
            Some(OrderSetCategory::Roll)
        );
    }
}
