mod load;
mod types;

pub use load::{get_data_dir, load_default, load_explicit, load_from_path};
pub use types::*;
