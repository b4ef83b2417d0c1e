pub mod prelude;

pub mod episodes;
pub mod meta;
pub mod shows;
