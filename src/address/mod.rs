mod matcher;
mod normalize;
mod parsed;
mod tagger;

pub use matcher::{
    AddressMatcher, AddressRangeSegment, GeocodeResult, INTERPOLATED_SCORE, MatchType, Parity, Side, SideRange,
    interpolation_fraction,
};
pub use normalize::{clean, generate_variants, is_directional, is_street_type, normalize};
pub use parsed::{AddressTagger, Label, ParsedAddress, TagError, parse_address};
pub use tagger::RuleTagger;
