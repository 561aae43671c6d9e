//! The sixteen recognized tool-dispatcher function names and their required
//! argument schemas (§4.4).

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetAvailability,
    GetReservation,
    CreateReservation,
    ModifyReservation,
    CancelReservation,
    GetUpsellingOptions,
    ProcessUpsell,
    BookRestaurant,
    BookSpaService,
    RequestRoomService,
    GetConciergeRecommendations,
    HandleComplaint,
    TransferToHuman,
    GetHotelInfo,
    ProcessPayment,
    GetRatePackage,
}

impl ToolName {
    pub const ALL: &'static [ToolName] = &[
        ToolName::GetAvailability,
        ToolName::GetReservation,
        ToolName::CreateReservation,
        ToolName::ModifyReservation,
        ToolName::CancelReservation,
        ToolName::GetUpsellingOptions,
        ToolName::ProcessUpsell,
        ToolName::BookRestaurant,
        ToolName::BookSpaService,
        ToolName::RequestRoomService,
        ToolName::GetConciergeRecommendations,
        ToolName::HandleComplaint,
        ToolName::TransferToHuman,
        ToolName::GetHotelInfo,
        ToolName::ProcessPayment,
        ToolName::GetRatePackage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetAvailability => "get_availability",
            ToolName::GetReservation => "get_reservation",
            ToolName::CreateReservation => "create_reservation",
            ToolName::ModifyReservation => "modify_reservation",
            ToolName::CancelReservation => "cancel_reservation",
            ToolName::GetUpsellingOptions => "get_upselling_options",
            ToolName::ProcessUpsell => "process_upsell",
            ToolName::BookRestaurant => "book_restaurant",
            ToolName::BookSpaService => "book_spa_service",
            ToolName::RequestRoomService => "request_room_service",
            ToolName::GetConciergeRecommendations => "get_concierge_recommendations",
            ToolName::HandleComplaint => "handle_complaint",
            ToolName::TransferToHuman => "transfer_to_human",
            ToolName::GetHotelInfo => "get_hotel_info",
            ToolName::ProcessPayment => "process_payment",
            ToolName::GetRatePackage => "get_rate_package",
        }
    }

    /// Required argument field names, validated before dispatch.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ToolName::GetAvailability => &["check_in_date", "check_out_date"],
            ToolName::GetReservation => &["confirmation_number"],
            ToolName::CreateReservation => &["check_in_date", "check_out_date", "guest_count"],
            ToolName::ModifyReservation => &["confirmation_number"],
            ToolName::CancelReservation => &["confirmation_number"],
            ToolName::GetUpsellingOptions => &["confirmation_number"],
            ToolName::ProcessUpsell => &["confirmation_number", "upgrade_type"],
            ToolName::BookRestaurant => &["date", "time", "party_size"],
            ToolName::BookSpaService => &["service_type", "date", "time"],
            ToolName::RequestRoomService => &["room_number"],
            ToolName::GetConciergeRecommendations => &["service_type"],
            ToolName::HandleComplaint => &["complaint_details"],
            ToolName::TransferToHuman => &["reason"],
            ToolName::GetHotelInfo => &[],
            ToolName::ProcessPayment => &["confirmation_number", "amount"],
            ToolName::GetRatePackage => &[],
        }
    }

    pub fn validate(self, arguments: &Value) -> Result<(), String> {
        let obj = arguments.as_object();
        for field in self.required_fields() {
            let present = obj.and_then(|o| o.get(*field)).map(|v| !v.is_null()).unwrap_or(false);
            if !present {
                return Err(format!("missing required field: {field}"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL.iter().copied().find(|t| t.as_str() == s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_field() {
        let err = ToolName::GetReservation.validate(&serde_json::json!({})).unwrap_err();
        assert!(err.contains("confirmation_number"));
    }

    #[test]
    fn validate_accepts_full_arguments() {
        ToolName::GetReservation
            .validate(&serde_json::json!({"confirmation_number": "ABC123"}))
            .unwrap();
    }

    #[test]
    fn from_str_roundtrips_with_as_str() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_str(tool.as_str()), Ok(*tool));
        }
    }
}
