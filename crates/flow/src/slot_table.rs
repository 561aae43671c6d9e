//! Per-intent required/optional slot table (§4.3).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use voice_agent_core::slot::SlotName;
use voice_agent_core::Intent;

fn names(values: &[&str]) -> Vec<SlotName> {
    values.iter().map(|v| SlotName::new(*v)).collect()
}

pub struct SlotRequirement {
    pub required: Vec<SlotName>,
    pub optional: Vec<SlotName>,
}

pub static SLOT_TABLE: Lazy<HashMap<Intent, SlotRequirement>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        Intent::BookingInquiry,
        SlotRequirement {
            required: names(&["check_in_date", "check_out_date", "guest_count"]),
            optional: names(&["room_type", "special_requests", "budget_range"]),
        },
    );
    m.insert(
        Intent::ExistingReservationModify,
        SlotRequirement {
            required: names(&["confirmation_number"]),
            optional: names(&["new_check_in", "new_check_out", "new_room_type", "modification_type"]),
        },
    );
    m.insert(
        Intent::ExistingReservationCancel,
        SlotRequirement {
            required: names(&["confirmation_number"]),
            optional: names(&["cancellation_reason"]),
        },
    );
    m.insert(
        Intent::RestaurantBooking,
        SlotRequirement {
            required: names(&["date", "time", "party_size"]),
            optional: names(&["special_requests", "seating_preference"]),
        },
    );
    m.insert(
        Intent::SpaBooking,
        SlotRequirement {
            required: names(&["service_type", "date", "time"]),
            optional: names(&["duration", "therapist_preference"]),
        },
    );
    m.insert(
        Intent::RoomService,
        SlotRequirement {
            required: names(&["room_number"]),
            optional: names(&["items", "delivery_time"]),
        },
    );
    m.insert(
        Intent::UpsellingOpportunity,
        SlotRequirement {
            required: names(&["current_reservation"]),
            optional: names(&["upgrade_type", "budget_range", "special_occasion"]),
        },
    );
    m.insert(
        Intent::ConciergeServices,
        SlotRequirement {
            required: names(&["service_type"]),
            optional: names(&["date", "time", "location", "budget_range"]),
        },
    );
    m
});
