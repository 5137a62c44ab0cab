/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Payload encoding for `PLACE_ORDERSET` commands.
//!
//! The payload is `"{order_set_id},{CATEGORY}"`, e.g. `"42,NEW_LIMIT"`.

use ironbus_core::codes::OrderSetCategory;
use tracing::error;

/// Encodes and decodes command payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSerializer;

impl DataSerializer {
    /// Creates a serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Encodes an order set reference.
    #[must_use]
    pub fn serialize_place_order_set(
        &self,
        order_set_id: i32,
        category: OrderSetCategory,
    ) -> String {
        format!("{order_set_id},{category}")
    }

    /// Decodes an order set reference.
    ///
    /// Returns `None` and logs the reason if the payload is malformed.
    #[must_use]
    pub fn deserialize_place_order_set(&self, data: &str) -> Option<(i32, OrderSetCategory)> {
        let mut parts = data.split(',');
        let (Some(id), Some(category)) = (parts.next(), parts.next()) else {
            error!(data, "order set payload is missing a category");
            return None;
        };

        let id = match id.trim().parse::<i32>() {
            Ok(id) => id,
            Err(e) => {
                error!(data, error = %e, "invalid order set id");
                return None;
            }
        };
        match category.trim().parse::<OrderSetCategory>() {
            Ok(category) => Some((id, category)),
            Err(e) => {
                error!(data, error = %e, "invalid order set category");
                None
            }
        }
    }
}
