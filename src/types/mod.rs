pub mod creative;
pub mod lookup;

pub use creative::{CreativeFormatPatch, CreativeRefs, CreativeRow, NewCreative};
pub use lookup::{LookupEntry, LookupRow, LookupTable, RowKey};
