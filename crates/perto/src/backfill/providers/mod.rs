//! Built-in geocoding providers.
//!
//! Each provider is a thin typed client over one public geocoding API.
//! ViaCEP is the odd one out: it maps a Brazilian postal code to a street
//! address and carries no coordinates, so it participates as a
//! query-expansion step rather than as a [`Geocoder`](super::Geocoder).

mod mapbox;
mod nominatim;
mod opencage;
mod viacep;

pub use mapbox::MapBox;
pub use nominatim::Nominatim;
pub use opencage::OpenCage;
pub use viacep::expand_postal_code;

/// Identifying user agent, required by Nominatim's usage policy and polite
/// everywhere else.
pub(crate) const USER_AGENT: &str = concat!("perto/", env!("CARGO_PKG_VERSION"));
