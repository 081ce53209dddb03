//! Venue adapter contract and the live venue binding.

mod adapter;
mod live;

pub use adapter::VenueAdapter;
pub use live::LiveVenue;
