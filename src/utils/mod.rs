// Low-level helpers shared by the block decoders

pub mod bits;
pub mod encoding;
